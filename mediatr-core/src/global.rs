//! Process-wide mediator for callers that do not want to pass one around.
//!
//! Every function here forwards to one lazily built [`Mediator`] with the
//! default configuration. Code that can hold its own `Mediator` should;
//! this module exists for call sites that only see free functions.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::context::Context;
use crate::error::{DispatchError, RegistrationError};
use crate::handler::{NotificationHandler, NotificationHandlerFactory, RequestHandler};
use crate::mediator::Mediator;
use crate::pipeline::PipelineBehavior;

lazy_static! {
    static ref MEDIATOR: Mediator = Mediator::default();
}

/// The shared instance. Clones share its registries.
pub fn mediator() -> &'static Mediator {
    &MEDIATOR
}

pub fn register_request_handler<TRequest, TResponse, H>(handler: H) -> Result<(), RegistrationError>
where
    TRequest: Send + Sync + 'static,
    TResponse: Send + 'static,
    H: RequestHandler<TRequest, TResponse> + 'static,
{
    MEDIATOR.register_request_handler(handler)
}

pub fn register_request_handler_factory<TRequest, TResponse, F, H>(
    factory: F,
) -> Result<(), RegistrationError>
where
    TRequest: Send + Sync + 'static,
    TResponse: Send + 'static,
    F: Fn() -> H + Send + Sync + 'static,
    H: RequestHandler<TRequest, TResponse> + 'static,
{
    MEDIATOR.register_request_handler_factory(factory)
}

pub fn register_notification_handler<TNotification, H>(handler: H)
where
    TNotification: Send + Sync + 'static,
    H: NotificationHandler<TNotification> + 'static,
{
    MEDIATOR.register_notification_handler(handler);
}

pub fn register_notification_handler_factory<TNotification, F, H>(factory: F)
where
    TNotification: Send + Sync + 'static,
    F: Fn() -> H + Send + Sync + 'static,
    H: NotificationHandler<TNotification> + 'static,
{
    MEDIATOR.register_notification_handler_factory(factory);
}

pub fn register_notification_handlers<TNotification>(
    handlers: Vec<Arc<dyn NotificationHandler<TNotification>>>,
) -> Result<(), RegistrationError>
where
    TNotification: Send + Sync + 'static,
{
    MEDIATOR.register_notification_handlers(handlers)
}

pub fn register_notification_handler_factories<TNotification>(
    factories: Vec<NotificationHandlerFactory<TNotification>>,
) -> Result<(), RegistrationError>
where
    TNotification: Send + Sync + 'static,
{
    MEDIATOR.register_notification_handler_factories(factories)
}

pub fn register_pipeline_behaviors(
    behaviors: impl IntoIterator<Item = Arc<dyn PipelineBehavior>>,
) -> Result<(), RegistrationError> {
    MEDIATOR.register_pipeline_behaviors(behaviors)
}

pub async fn send<TRequest, TResponse>(
    ctx: &Context,
    request: TRequest,
) -> Result<TResponse, DispatchError>
where
    TRequest: Send + Sync + 'static,
    TResponse: Send + 'static,
{
    MEDIATOR.send(ctx, request).await
}

pub async fn publish<TNotification>(
    ctx: &Context,
    notification: &TNotification,
) -> Result<(), DispatchError>
where
    TNotification: Send + Sync + 'static,
{
    MEDIATOR.publish(ctx, notification).await
}

/// Test teardown only; not safe while dispatches are in flight.
pub fn clear_request_registrations() {
    MEDIATOR.clear_request_registrations();
}

pub fn clear_notification_registrations() {
    MEDIATOR.clear_notification_registrations();
}

pub fn clear_pipeline_behaviors() {
    MEDIATOR.clear_pipeline_behaviors();
}
