// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use forno::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("knead", false, None), ("top", false, None), ("bake", false, None)]);

  pipeline.on_root("knead", create_simple_handler("knead", " K"));
  pipeline.on_root("top", create_simple_handler("top", " T"));
  pipeline.on_root("bake", create_simple_handler("bake", " B"));

  let ctx = ContextData::new(TicketContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);

  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.log, " K T B");
  assert_eq!(guard.steps_executed, vec!["knead", "top", "bake"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("knead", false, None), ("top", false, None), ("bake", false, None)]);

  pipeline.on_root("knead", create_simple_handler("knead", "K"));
  pipeline.on_root("top", create_simple_handler("top", "T"));
  pipeline.on_root("bake", create_simple_handler("bake", "B"));

  let ctx = ContextData::new(TicketContext {
    should_stop_at: Some("top".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.log, "KT");
  assert_eq!(guard.steps_executed, vec!["knead", "top"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[
    ("knead", false, None),
    ("burn", false, None),
    ("serve", false, None),
  ]);

  pipeline.on_root("knead", create_simple_handler("knead", "K"));
  pipeline.on_root("burn", create_failing_handler("burn", "oven on fire"));
  pipeline.on_root("serve", create_simple_handler("serve", "NeverRun"));

  let ctx = ContextData::new(TicketContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("oven on fire".to_string()));

  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["knead", "burn"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[
    ("knead", false, None),
    (
      "rest_dough",
      false,
      Some(Arc::new(|ctx: ContextData<TicketContext>| ctx.read().rush)),
    ),
    ("bake", false, None),
  ]);

  pipeline.on_root("knead", create_simple_handler("knead", " K"));
  pipeline.on_root("rest_dough", create_simple_handler("rest_dough", " R"));
  pipeline.on_root("bake", create_simple_handler("bake", " B"));

  let ctx = ContextData::new(TicketContext {
    rush: true,
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["knead", "bake"]);

  let relaxed = ContextData::new(TicketContext::default());
  pipeline.run(relaxed.clone()).await.unwrap();
  assert_eq!(relaxed.read().steps_executed, vec!["knead", "rest_dough", "bake"]);
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_missing_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TicketContext, TestError>::new(&[("step_with_no_handler", false, None)]);

  let result = pipeline.run(ContextData::new(TicketContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("step_with_no_handler"));
    }
    other => panic!("Expected FlowError::HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_missing_handler_succeeds() {
  setup_tracing();
  let pipeline = Pipeline::<TicketContext, TestError>::new(&[("optional_step_no_handler", true, None)]);

  let result = pipeline.run(ContextData::new(TicketContext::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("bake", false, None)]);

  pipeline.after_root("bake", create_simple_handler("after_bake", "After;"));
  pipeline.on_root("bake", create_simple_handler("on_bake", "On;"));
  pipeline.before_root("bake", create_simple_handler("before_bake", "Before;"));

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.log, "Before;On;After;");
  assert_eq!(guard.steps_executed, vec!["before_bake", "on_bake", "after_bake"]);
}

#[tokio::test]
#[serial]
async fn test_handlers_of_one_phase_run_in_registration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("top", false, None)]);
  pipeline.on_root("top", create_simple_handler("sauce", "S;"));
  pipeline.on_root("top", create_simple_handler("cheese", "C;"));
  pipeline.on_root("top", create_simple_handler("basil", "B;"));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  let guard = ctx.read();
  assert_eq!(guard.log, "S;C;B;");
  assert_eq!(guard.counter, 3);
}

#[tokio::test]
#[serial]
async fn test_stop_in_before_skips_on_and_after() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("bake", false, None)]);

  pipeline.before_root("bake", |_ctx: ContextData<TicketContext>| {
    Box::pin(async move { Ok::<_, FlowError>(PipelineControl::Stop) })
  });
  pipeline.on_root("bake", create_simple_handler("on_bake", "On;"));
  pipeline.after_root("bake", create_simple_handler("after_bake", "After;"));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.read().steps_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_step_insertion_and_removal() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("knead", false, None), ("bake", false, None)]);

  pipeline.insert_after_step("knead", "top", false, None);
  pipeline.insert_before_step("knead", "weigh", true, None);
  assert_eq!(pipeline.step_names(), vec!["weigh", "knead", "top", "bake"]);

  pipeline.on_root("knead", create_simple_handler("knead", "K"));
  pipeline.on_root("top", create_simple_handler("top", "T"));
  pipeline.on_root("bake", create_simple_handler("bake", "B"));

  pipeline.remove_step("top");
  pipeline.remove_step("not_a_step");
  assert_eq!(pipeline.step_names(), vec!["weigh", "knead", "bake"]);

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().log, "KB");
}

#[tokio::test]
#[serial]
async fn test_set_optional_and_skip_condition_after_construction() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("box", false, None), ("bake", false, None)]);
  pipeline.on_root("bake", create_simple_handler("bake", "B"));

  pipeline.set_optional("box", true);
  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  pipeline.set_skip_condition("bake", Some(Arc::new(|_ctx: ContextData<TicketContext>| true)));
  let skipped = ContextData::new(TicketContext::default());
  pipeline.run(skipped.clone()).await.unwrap();
  assert_eq!(skipped.read().counter, 0);
}

#[test]
#[should_panic(expected = "already exists")]
fn test_inserting_duplicate_step_panics() {
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("knead", false, None)]);
  pipeline.insert_after_step("knead", "knead", false, None);
}

#[test]
#[should_panic(expected = "not found")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("knead", false, None)]);
  pipeline.on_root("kneed", create_simple_handler("kneed", "typo"));
}
