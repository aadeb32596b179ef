//! Handler traits and the bindings the registries store for them.
//!
//! A binding is either a shared instance, used by every dispatch, or a
//! factory that builds a fresh handler for each dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;

/// Handles one request type and produces one response type.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use mediatr_core::{BoxError, Context, RequestHandler};
///
/// struct Echo;
///
/// #[async_trait]
/// impl RequestHandler<String, usize> for Echo {
///     async fn handle(&self, _ctx: &Context, request: &String) -> Result<usize, BoxError> {
///         Ok(request.len())
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<TRequest, TResponse>: Send + Sync {
    async fn handle(&self, ctx: &Context, request: &TRequest) -> Result<TResponse, BoxError>;
}

/// Handles a notification. Any number of handlers may observe the same type.
#[async_trait]
pub trait NotificationHandler<TNotification>: Send + Sync {
    async fn handle(&self, ctx: &Context, notification: &TNotification) -> Result<(), BoxError>;
}

/// Builds a fresh request handler per dispatch.
pub type RequestHandlerFactory<TRequest, TResponse> =
    Arc<dyn Fn() -> Box<dyn RequestHandler<TRequest, TResponse>> + Send + Sync>;

/// Builds a fresh notification handler per dispatch.
pub type NotificationHandlerFactory<TNotification> =
    Arc<dyn Fn() -> Box<dyn NotificationHandler<TNotification>> + Send + Sync>;

pub(crate) enum RequestBinding<TRequest, TResponse> {
    Instance(Arc<dyn RequestHandler<TRequest, TResponse>>),
    Factory(RequestHandlerFactory<TRequest, TResponse>),
}

impl<TRequest, TResponse> Clone for RequestBinding<TRequest, TResponse> {
    fn clone(&self) -> Self {
        match self {
            Self::Instance(handler) => Self::Instance(Arc::clone(handler)),
            Self::Factory(factory) => Self::Factory(Arc::clone(factory)),
        }
    }
}

impl<TRequest, TResponse> RequestBinding<TRequest, TResponse> {
    pub(crate) fn instantiate(&self) -> Arc<dyn RequestHandler<TRequest, TResponse>> {
        match self {
            Self::Instance(handler) => Arc::clone(handler),
            Self::Factory(factory) => Arc::from(factory()),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Factory(_) => "factory",
        }
    }
}

pub(crate) enum NotificationBinding<TNotification> {
    Instance(Arc<dyn NotificationHandler<TNotification>>),
    Factory(NotificationHandlerFactory<TNotification>),
}

impl<TNotification> Clone for NotificationBinding<TNotification> {
    fn clone(&self) -> Self {
        match self {
            Self::Instance(handler) => Self::Instance(Arc::clone(handler)),
            Self::Factory(factory) => Self::Factory(Arc::clone(factory)),
        }
    }
}

impl<TNotification> NotificationBinding<TNotification> {
    pub(crate) fn instantiate(&self) -> Arc<dyn NotificationHandler<TNotification>> {
        match self {
            Self::Instance(handler) => Arc::clone(handler),
            Self::Factory(factory) => Arc::from(factory()),
        }
    }
}
