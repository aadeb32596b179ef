//! # Pipeline Behaviors
//!
//! Behaviors wrap every dispatched request, in registration order: the first
//! registered behavior is the outermost layer, it sees the request first and
//! the response last.
//!
//! ```text
//! send ─▶ B1 ─▶ B2 ─▶ handler
//!                        │
//! caller ◀─ B1 ◀─ B2 ◀───┘
//! ```
//!
//! Each layer receives the rest of the chain as a [`Next`] continuation and
//! decides whether and when to call it. Not calling `next` short-circuits
//! every inner layer including the handler. `Next` is `FnOnce`, so the
//! handler can never run more than once per dispatch.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::trace;

use crate::context::Context;
use crate::error::{BoxError, DispatchError};
use crate::handler::RequestHandler;
use crate::shape::ShapeKey;

/// Response travelling through the pipeline with its type erased.
pub type ErasedResponse = Box<dyn Any + Send>;

pub type PipelineResult = Result<ErasedResponse, BoxError>;

/// The remaining chain: inner behaviors followed by the handler.
pub type Next<'a> = Box<dyn FnOnce(Context) -> BoxFuture<'a, PipelineResult> + Send + 'a>;

/// Type-erased view of the request being dispatched.
#[derive(Clone, Copy)]
pub struct RequestEnvelope<'a> {
    request_shape: ShapeKey,
    response_shape: ShapeKey,
    request: &'a (dyn Any + Send + Sync),
}

impl<'a> RequestEnvelope<'a> {
    pub(crate) fn new<TRequest, TResponse>(request: &'a TRequest) -> Self
    where
        TRequest: Send + Sync + 'static,
        TResponse: 'static,
    {
        Self {
            request_shape: ShapeKey::of::<TRequest>(),
            response_shape: ShapeKey::of::<TResponse>(),
            request,
        }
    }

    pub fn request_shape(&self) -> ShapeKey {
        self.request_shape
    }

    pub fn response_shape(&self) -> ShapeKey {
        self.response_shape
    }

    /// The request as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        let request: &'a (dyn Any + Send + Sync) = self.request;
        request.downcast_ref::<T>()
    }
}

mod sealed {
    use crate::shape::ShapeKey;

    /// Shape of the concrete behavior type. The blanket impl covers every
    /// type, so implementors cannot choose their own key.
    pub trait Shaped {
        fn concrete_shape(&self) -> ShapeKey;
    }

    impl<T: Send + Sync + 'static> Shaped for T {
        fn concrete_shape(&self) -> ShapeKey {
            ShapeKey::of::<T>()
        }
    }
}

/// Middleware applied to every request sent through a mediator.
///
/// Behaviors are deduplicated by their concrete type: two values of one
/// behavior type can never both be registered.
#[async_trait]
pub trait PipelineBehavior: sealed::Shaped + Send + Sync + 'static {
    async fn handle(
        &self,
        ctx: Context,
        request: RequestEnvelope<'_>,
        next: Next<'_>,
    ) -> PipelineResult;
}

/// Shape of the concrete type behind `behavior`.
pub(crate) fn behavior_shape(behavior: &dyn PipelineBehavior) -> ShapeKey {
    // Fully qualified so the call goes through the vtable of the trait
    // object, not the blanket impl for a reference or smart pointer.
    <dyn PipelineBehavior as sealed::Shaped>::concrete_shape(behavior)
}

/// Wraps a substitute response for a behavior that answers without calling `next`.
pub fn respond<T: Any + Send>(response: T) -> PipelineResult {
    Ok(Box::new(response))
}

/// Builds the chain around `handler` and runs it once with `ctx`.
pub(crate) async fn run<TRequest, TResponse>(
    behaviors: &[Arc<dyn PipelineBehavior>],
    handler: Arc<dyn RequestHandler<TRequest, TResponse>>,
    ctx: Context,
    request: &TRequest,
) -> Result<TResponse, DispatchError>
where
    TRequest: Send + Sync + 'static,
    TResponse: Send + 'static,
{
    let envelope = RequestEnvelope::new::<TRequest, TResponse>(request);
    let request_name = envelope.request_shape().name();

    let terminal: Next<'_> = Box::new(move |ctx: Context| {
        async move {
            match handler.handle(&ctx, request).await {
                Ok(response) => Ok(Box::new(response) as ErasedResponse),
                Err(source) => Err(Box::new(DispatchError::Handler {
                    request: request_name,
                    source,
                }) as BoxError),
            }
        }
        .boxed()
    });

    let chain = compose(behaviors, envelope, terminal);
    let response = chain(ctx).await.map_err(|error| {
        DispatchError::classify(error, |source| DispatchError::Pipeline {
            behavior: "pipeline",
            source,
        })
    })?;

    response
        .downcast::<TResponse>()
        .map(|response| *response)
        .map_err(|_| DispatchError::ResponseTypeMismatch {
            request: request_name,
            response: envelope.response_shape().name(),
        })
}

// Folding from the innermost behavior outwards leaves the first registered
// behavior as the outermost call.
fn compose<'a>(
    behaviors: &[Arc<dyn PipelineBehavior>],
    envelope: RequestEnvelope<'a>,
    terminal: Next<'a>,
) -> Next<'a> {
    behaviors.iter().rev().fold(terminal, |next, behavior| {
        let behavior = Arc::clone(behavior);
        let layer: Next<'a> = Box::new(move |ctx: Context| {
            async move {
                let shape = behavior_shape(behavior.as_ref());
                trace!(behavior = shape.short_name(), "entering pipeline behavior");
                behavior
                    .handle(ctx, envelope, next)
                    .await
                    .map_err(|error| {
                        Box::new(DispatchError::classify(error, |source| {
                            DispatchError::Pipeline {
                                behavior: shape.name(),
                                source,
                            }
                        })) as BoxError
                    })
            }
            .boxed()
        });
        layer
    })
}
