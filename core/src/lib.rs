// src/lib.rs

//! Forno: a small asynchronous step-pipeline engine.
//!
//! A request workflow such as "authenticate, authorize, validate, persist" is
//! described as a [`Pipeline`] of named steps. Each step can carry `before`,
//! `on` and `after` handlers operating on a shared [`ContextData`]. Steps can
//! be optional, skipped by a condition evaluated against the context, or stop
//! the whole run early. A [`Registry`] keys pipelines by their context data
//! type so callers only need to build a context and call `run`.
//!
//! ```ignore
//! let mut p = Pipeline::<MyCtx, MyError>::new(&[("validate", false, None), ("persist", false, None)]);
//! p.on_root("validate", |ctx| Box::pin(async move { /* ... */ Ok::<_, MyError>(PipelineControl::Continue) }));
//! p.on_root("persist", |ctx| Box::pin(async move { /* ... */ Ok::<_, MyError>(PipelineControl::Continue) }));
//!
//! let registry = Registry::<MyError>::new();
//! registry.register_pipeline(p);
//! registry.run(ContextData::new(MyCtx::default())).await?;
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Registry;
