use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mediatr_core::{
    BoxError, Context, DispatchError, ErrorCode, Mediator, NotificationHandler,
    NotificationHandlerFactory, PublishStrategy,
};
use pretty_assertions::assert_eq;

use crate::{CallLog, DomainError};

struct OrderPlaced {
    order_id: u32,
    processed: AtomicBool,
}

impl OrderPlaced {
    fn new(order_id: u32) -> Self {
        Self {
            order_id,
            processed: AtomicBool::new(false),
        }
    }
}

/// Records its name, and fails when `fail` is set.
struct Step {
    name: &'static str,
    fail: bool,
    log: CallLog,
}

impl Step {
    fn ok(name: &'static str, log: &CallLog) -> Arc<dyn NotificationHandler<OrderPlaced>> {
        Arc::new(Self {
            name,
            fail: false,
            log: log.clone(),
        })
    }

    fn failing(name: &'static str, log: &CallLog) -> Arc<dyn NotificationHandler<OrderPlaced>> {
        Arc::new(Self {
            name,
            fail: true,
            log: log.clone(),
        })
    }
}

#[async_trait]
impl NotificationHandler<OrderPlaced> for Step {
    async fn handle(&self, _ctx: &Context, notification: &OrderPlaced) -> Result<(), BoxError> {
        self.log.push(format!("{}:{}", self.name, notification.order_id));
        if self.fail {
            return Err(Box::new(DomainError));
        }
        Ok(())
    }
}

struct MarkProcessed;

#[async_trait]
impl NotificationHandler<OrderPlaced> for MarkProcessed {
    async fn handle(&self, _ctx: &Context, notification: &OrderPlaced) -> Result<(), BoxError> {
        notification.processed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_publish_without_handlers_succeeds() {
    let mediator = Mediator::default();
    let result = mediator
        .publish(&Context::background(), &OrderPlaced::new(1))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_every_handler_runs_once_in_registration_order() {
    let mediator = Mediator::default();
    let log = CallLog::default();
    mediator
        .register_notification_handlers(vec![
            Step::ok("a", &log),
            Step::ok("b", &log),
            Step::ok("c", &log),
        ])
        .unwrap();

    mediator
        .publish(&Context::background(), &OrderPlaced::new(7))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["a:7", "b:7", "c:7"]);
}

#[tokio::test]
async fn test_handlers_can_mutate_the_notification() {
    let mediator = Mediator::default();
    mediator.register_notification_handler(MarkProcessed);

    let event = OrderPlaced::new(3);
    mediator.publish(&Context::background(), &event).await.unwrap();
    assert!(event.processed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let mediator = Mediator::default();
    let log = CallLog::default();
    mediator
        .register_notification_handlers(vec![
            Step::ok("a", &log),
            Step::failing("b", &log),
            Step::ok("c", &log),
        ])
        .unwrap();

    let err = mediator
        .publish(&Context::background(), &OrderPlaced::new(1))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::NotificationHandler { .. }));
    assert_eq!(err.code(), ErrorCode::NotificationHandlerFailed);
    assert!(err.to_string().contains("error handling request"));
    assert_eq!(log.entries(), vec!["a:1", "b:1"]);
}

#[tokio::test]
async fn test_continue_on_error_runs_all_and_aggregates() {
    let mediator = Mediator::builder()
        .publish_strategy(PublishStrategy::ContinueOnError)
        .build()
        .unwrap();
    let log = CallLog::default();
    mediator
        .register_notification_handlers(vec![
            Step::failing("a", &log),
            Step::ok("b", &log),
            Step::failing("c", &log),
        ])
        .unwrap();

    let err = mediator
        .publish(&Context::background(), &OrderPlaced::new(2))
        .await
        .unwrap_err();

    assert_eq!(log.entries(), vec!["a:2", "b:2", "c:2"]);
    match err {
        DispatchError::NotificationHandlers { failures, .. } => {
            assert_eq!(failures.len(), 2);
            assert!(failures
                .iter()
                .all(|failure| failure.code() == ErrorCode::NotificationHandlerFailed));
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_continue_on_error_without_failures_is_ok() {
    let mediator = Mediator::builder()
        .publish_strategy(PublishStrategy::ContinueOnError)
        .build()
        .unwrap();
    let log = CallLog::default();
    mediator.register_notification_handlers(vec![Step::ok("a", &log)]).unwrap();

    mediator
        .publish(&Context::background(), &OrderPlaced::new(4))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["a:4"]);
}

#[tokio::test]
async fn test_bulk_registration_rejects_empty_lists() {
    let mediator = Mediator::default();

    let err = mediator
        .register_notification_handlers::<OrderPlaced>(Vec::new())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoHandlersProvided);

    let err = mediator
        .register_notification_handler_factories::<OrderPlaced>(Vec::new())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoHandlersProvided);
    assert_eq!(mediator.notification_handler_count::<OrderPlaced>(), 0);
}

#[tokio::test]
async fn test_factories_build_fresh_handlers_per_publish() {
    let mediator = Mediator::default();
    let log = CallLog::default();
    let built = Arc::new(AtomicUsize::new(0));

    let factory_log = log.clone();
    let factory_built = Arc::clone(&built);
    let factory: NotificationHandlerFactory<OrderPlaced> = Arc::new(move || {
        factory_built.fetch_add(1, Ordering::SeqCst);
        Box::new(Step {
            name: "fresh",
            fail: false,
            log: factory_log.clone(),
        }) as Box<dyn NotificationHandler<OrderPlaced>>
    });
    mediator
        .register_notification_handler_factories(vec![factory])
        .unwrap();

    let ctx = Context::background();
    mediator.publish(&ctx, &OrderPlaced::new(1)).await.unwrap();
    mediator.publish(&ctx, &OrderPlaced::new(2)).await.unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(log.entries(), vec!["fresh:1", "fresh:2"]);
}

#[tokio::test]
async fn test_clear_forgets_handlers() {
    let mediator = Mediator::default();
    let log = CallLog::default();
    mediator.register_notification_handlers(vec![Step::failing("a", &log)]).unwrap();

    mediator.clear_notification_registrations();
    assert_eq!(mediator.notification_handler_count::<OrderPlaced>(), 0);

    mediator
        .publish(&Context::background(), &OrderPlaced::new(1))
        .await
        .unwrap();
    assert!(log.entries().is_empty());
}
