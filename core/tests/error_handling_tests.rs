// tests/error_handling_tests.rs
mod common;

use common::*;
use forno::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, FlowError>::new(&[("task", false, None)]);

  pipeline.on_root("task", |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      ctx.write().counter = 1;
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 1);

  let mut failing_pipeline = Pipeline::<TicketContext, FlowError>::new(&[("fail_task", false, None)]);
  failing_pipeline.on_root("fail_task", |_ctx| {
    Box::pin(async move { Err(FlowError::Internal("Intentional FlowError".to_string())) })
  });
  let fail_result = failing_pipeline.run(ContextData::new(TicketContext::default())).await;
  match fail_result {
    Err(FlowError::Internal(s)) => assert_eq!(s, "Intentional FlowError"),
    other => panic!("Expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_anyhow_errors_become_handler_errors() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, FlowError>::new(&[("call_supplier", false, None)]);

  pipeline.on_root("call_supplier", |_ctx: ContextData<TicketContext>| {
    Box::pin(async move { Err::<PipelineControl, anyhow::Error>(anyhow::anyhow!("supplier offline")) })
  });

  let result = pipeline.run(ContextData::new(TicketContext::default())).await;
  match result {
    Err(FlowError::HandlerError { source }) => assert_eq!(source.to_string(), "supplier offline"),
    other => panic!("Expected FlowError::HandlerError, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_narrow_handler_error_converts_into_pipeline_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("check_stock", false, None)]);

  pipeline.on_root("check_stock", |_ctx: ContextData<TicketContext>| {
    Box::pin(async move { Err::<PipelineControl, FlowError>(FlowError::Internal("no mozzarella".to_string())) })
  });

  let result = pipeline.run(ContextData::new(TicketContext::default())).await;
  match result {
    Err(TestError::Flow(s)) => assert!(s.contains("no mozzarella")),
    other => panic!("Expected TestError::Flow, got {:?}", other),
  }
}
