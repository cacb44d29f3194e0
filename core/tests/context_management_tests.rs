// tests/context_management_tests.rs
mod common;

use common::*;
use forno::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_context_data_is_shared_and_modified() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("write_ticket", false, None), ("amend_ticket", false, None)]);

  pipeline.on_root("write_ticket", |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter = 10;
      guard.log = "Margherita".to_string();
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });

  pipeline.on_root("amend_ticket", |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      assert_eq!(guard.counter, 10);
      guard.counter += 5;
      guard.log.push_str(" + olives");
      Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.counter, 15);
  assert_eq!(guard.log, "Margherita + olives");
}

#[tokio::test]
#[serial]
async fn test_context_data_clone_shares_data() {
  setup_tracing();
  let original_ctx = ContextData::new(TicketContext {
    counter: 1,
    ..Default::default()
  });
  let cloned_ctx = original_ctx.clone();

  original_ctx.write().counter = 5;
  assert_eq!(cloned_ctx.read().counter, 5);

  cloned_ctx.write().counter = 10;
  assert_eq!(original_ctx.read().counter, 10);
}

#[tokio::test]
#[serial]
async fn test_try_write_fails_while_read_guard_is_held() {
  setup_tracing();
  let ctx = ContextData::new(TicketContext::default());

  let reader = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(reader);

  assert!(ctx.try_write().is_some());
}

#[tokio::test]
#[serial]
async fn test_context_data_locks_with_await() {
  setup_tracing();
  let ctx = ContextData::new(TicketContext::default());

  let initial_count = ctx.read().counter;
  tokio::time::sleep(std::time::Duration::from_millis(1)).await;
  ctx.write().counter = initial_count + 1;

  assert_eq!(ctx.read().counter, 1);
}
