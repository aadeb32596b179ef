//! Ready-made pipeline behaviors.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::pipeline::{Next, PipelineBehavior, PipelineResult, RequestEnvelope};

/// Context key set by [`RequestLoggerBehavior`] for the layers inside it.
pub const LOGGER_PIPELINE_KEY: &str = "logger_pipeline";

/// Logs every request around the rest of the chain and marks the context
/// with [`LOGGER_PIPELINE_KEY`] so inner layers and the handler can tell it ran.
///
/// The response and error are passed through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLoggerBehavior;

impl RequestLoggerBehavior {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineBehavior for RequestLoggerBehavior {
    async fn handle(
        &self,
        ctx: Context,
        request: RequestEnvelope<'_>,
        next: Next<'_>,
    ) -> PipelineResult {
        let name = request.request_shape().short_name();
        info!(request = name, "handling request");

        let started = Instant::now();
        let result = next(ctx.with_value(LOGGER_PIPELINE_KEY, true)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(request = name, elapsed_ms, "request handled"),
            Err(e) => warn!(request = name, elapsed_ms, error = %e, "request failed"),
        }
        result
    }
}
