use std::sync::Arc;

use async_trait::async_trait;
use mediatr_core::{
    respond, BoxError, Context, DispatchError, ErrorCode, Mediator, Next, PipelineBehavior,
    PipelineResult, RequestEnvelope, RequestHandler, RequestLoggerBehavior, LOGGER_PIPELINE_KEY,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{CallLog, DomainError, FailingPingHandler, Ping, PingHandler, Pong};

/// Records `L{N}` on the way in and `L{N}-after` on the way out.
struct Layer<const N: usize> {
    log: CallLog,
}

#[async_trait]
impl<const N: usize> PipelineBehavior for Layer<N> {
    async fn handle(&self, ctx: Context, _request: RequestEnvelope<'_>, next: Next<'_>) -> PipelineResult {
        self.log.push(format!("L{}", N));
        let response = next(ctx).await;
        self.log.push(format!("L{}-after", N));
        response
    }
}

fn layer(index: usize, log: &CallLog) -> Arc<dyn PipelineBehavior> {
    let log = log.clone();
    match index {
        0 => Arc::new(Layer::<0> { log }),
        1 => Arc::new(Layer::<1> { log }),
        2 => Arc::new(Layer::<2> { log }),
        3 => Arc::new(Layer::<3> { log }),
        4 => Arc::new(Layer::<4> { log }),
        _ => Arc::new(Layer::<5> { log }),
    }
}

/// Answers pings from a canned response without calling the handler.
struct CannedPong;

#[async_trait]
impl PipelineBehavior for CannedPong {
    async fn handle(&self, ctx: Context, request: RequestEnvelope<'_>, next: Next<'_>) -> PipelineResult {
        match request.downcast_ref::<Ping>() {
            Some(ping) if ping.message == "cached" => respond(Pong {
                message: "from cache".to_string(),
            }),
            _ => next(ctx).await,
        }
    }
}

/// Substitutes a response of the wrong type.
struct WrongAnswer;

#[async_trait]
impl PipelineBehavior for WrongAnswer {
    async fn handle(&self, _ctx: Context, _request: RequestEnvelope<'_>, _next: Next<'_>) -> PipelineResult {
        respond(42u64)
    }
}

/// Rejects every request before it reaches the handler.
struct Guard;

#[async_trait]
impl PipelineBehavior for Guard {
    async fn handle(&self, _ctx: Context, _request: RequestEnvelope<'_>, _next: Next<'_>) -> PipelineResult {
        Err(Box::new(DomainError))
    }
}

/// Fails after the handler has already succeeded.
struct AfterFailure;

#[async_trait]
impl PipelineBehavior for AfterFailure {
    async fn handle(&self, ctx: Context, _request: RequestEnvelope<'_>, next: Next<'_>) -> PipelineResult {
        next(ctx).await?;
        Err("rejected on the way out".into())
    }
}

fn mediator_with_ping(log: &CallLog) -> Mediator {
    let mediator = Mediator::default();
    mediator
        .register_request_handler(PingHandler { log: log.clone() })
        .unwrap();
    mediator
}

#[tokio::test]
async fn test_behaviors_wrap_handler_in_registration_order() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([layer(1, &log), layer(2, &log)])
        .unwrap();

    let pong: Pong = mediator
        .send(&Context::background(), Ping::new("ordered"))
        .await
        .unwrap();

    assert_eq!(pong.message, "ordered");
    assert_eq!(log.entries(), vec!["L1", "L2", "H", "L2-after", "L1-after"]);
}

#[tokio::test]
async fn test_short_circuit_skips_handler() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([
            layer(0, &log),
            Arc::new(CannedPong) as Arc<dyn PipelineBehavior>,
            layer(1, &log),
        ])
        .unwrap();

    let pong: Pong = mediator
        .send(&Context::background(), Ping::new("cached"))
        .await
        .unwrap();
    assert_eq!(pong.message, "from cache");
    assert_eq!(log.entries(), vec!["L0", "L0-after"]);

    let pong: Pong = mediator
        .send(&Context::background(), Ping::new("fresh"))
        .await
        .unwrap();
    assert_eq!(pong.message, "fresh");
    assert_eq!(
        log.entries(),
        vec!["L0", "L0-after", "L0", "L1", "H", "L1-after", "L0-after"]
    );
}

#[tokio::test]
async fn test_substituted_response_of_wrong_type_fails() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([Arc::new(WrongAnswer) as Arc<dyn PipelineBehavior>])
        .unwrap();

    let err = mediator
        .send::<Ping, Pong>(&Context::background(), Ping::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::ResponseTypeMismatch { .. }));
    assert_eq!(err.code(), ErrorCode::ResponseTypeMismatch);
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_behavior_failure_is_pipeline_error() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([layer(0, &log), Arc::new(Guard) as Arc<dyn PipelineBehavior>])
        .unwrap();

    let err = mediator
        .send::<Ping, Pong>(&Context::background(), Ping::new("x"))
        .await
        .unwrap_err();

    match &err {
        DispatchError::Pipeline { behavior, source } => {
            assert!(behavior.ends_with("Guard"));
            assert_eq!(source.to_string(), "error handling request");
        }
        other => panic!("expected pipeline error, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::PipelineFailed);
    assert_eq!(log.entries(), vec!["L0", "L0-after"]);
}

#[tokio::test]
async fn test_failure_after_next_is_pipeline_error() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([Arc::new(AfterFailure) as Arc<dyn PipelineBehavior>])
        .unwrap();

    let err = mediator
        .send::<Ping, Pong>(&Context::background(), Ping::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PipelineFailed);
    assert_eq!(log.entries(), vec!["H"]);
}

#[tokio::test]
async fn test_handler_error_stays_handler_through_behaviors() {
    let log = CallLog::default();
    let mediator = Mediator::default();
    mediator
        .register_request_handler(FailingPingHandler { log: log.clone() })
        .unwrap();
    mediator
        .register_pipeline_behaviors([layer(0, &log), layer(1, &log)])
        .unwrap();

    let err = mediator
        .send::<Ping, Pong>(&Context::background(), Ping::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::HandlerFailed);
    assert_eq!(log.entries(), vec!["L0", "L1", "H", "L1-after", "L0-after"]);
}

#[tokio::test]
async fn test_duplicate_behavior_keeps_earlier_registrations() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator.register_pipeline_behaviors([layer(0, &log)]).unwrap();

    let err = mediator
        .register_pipeline_behaviors([layer(1, &log), layer(0, &log), layer(2, &log)])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequestPipelineBehaviorAlreadyExists);
    assert_eq!(mediator.pipeline_len(), 2);

    let _: Pong = mediator
        .send(&Context::background(), Ping::new("x"))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["L0", "L1", "H", "L1-after", "L0-after"]);
}

#[tokio::test]
async fn test_cleared_pipeline_is_bypassed() {
    let log = CallLog::default();
    let mediator = mediator_with_ping(&log);
    mediator
        .register_pipeline_behaviors([layer(0, &log), Arc::new(Guard) as Arc<dyn PipelineBehavior>])
        .unwrap();

    mediator.clear_pipeline_behaviors();
    assert_eq!(mediator.pipeline_len(), 0);

    let _: Pong = mediator
        .send(&Context::background(), Ping::new("x"))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["H"]);

    // Same behavior types register again after a clear.
    mediator.register_pipeline_behaviors([layer(0, &log)]).unwrap();
}

#[tokio::test]
async fn test_request_logger_marks_context() {
    struct SeesLogger;

    #[async_trait]
    impl RequestHandler<Ping, bool> for SeesLogger {
        async fn handle(&self, ctx: &Context, _request: &Ping) -> Result<bool, BoxError> {
            Ok(ctx.value::<bool>(LOGGER_PIPELINE_KEY) == Some(&true))
        }
    }

    let mediator = Mediator::builder()
        .behavior(RequestLoggerBehavior::new())
        .build()
        .unwrap();
    mediator.register_request_handler(SeesLogger).unwrap();

    let marked: bool = mediator
        .send(&Context::background(), Ping::new("x"))
        .await
        .unwrap();
    assert!(marked);
}

proptest! {
    #[test]
    fn prop_nesting_follows_registration_order(
        order in Just((0..6).collect::<Vec<usize>>()).prop_shuffle(),
        count in 0usize..=6,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let log = CallLog::default();
        let mediator = mediator_with_ping(&log);
        let chosen = &order[..count];
        mediator
            .register_pipeline_behaviors(chosen.iter().map(|&index| layer(index, &log)))
            .unwrap();

        let pong: Pong = runtime
            .block_on(mediator.send(&Context::background(), Ping::new("p")))
            .unwrap();
        prop_assert_eq!(pong.message, "p");

        let mut expected: Vec<String> = chosen.iter().map(|i| format!("L{}", i)).collect();
        expected.push("H".to_string());
        expected.extend(chosen.iter().rev().map(|i| format!("L{}-after", i)));
        prop_assert_eq!(log.entries(), expected);
    }
}
