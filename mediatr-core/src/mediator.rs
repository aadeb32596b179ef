//! # Mediator
//!
//! [`Mediator`] owns the three registries and implements dispatch:
//!
//! - [`Mediator::send`] routes a request to its single handler through the
//!   pipeline and returns the typed response.
//! - [`Mediator::publish`] hands a notification to every handler registered
//!   for its type, in registration order.
//!
//! Register everything during setup, then share the mediator (it is cheap
//! to clone) with whatever serves traffic. Dispatch runs inline on the
//! calling task; nothing is spawned.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};

use tracing::{debug, instrument, warn};

use crate::config::{self, MediatorConfig, PublishStrategy};
use crate::context::Context;
use crate::error::{DispatchError, MediatorResult, RegistrationError};
use crate::handler::{
    NotificationBinding, NotificationHandler, NotificationHandlerFactory, RequestBinding,
    RequestHandler, RequestHandlerFactory,
};
use crate::pipeline::{self, PipelineBehavior};
use crate::registry::{NotificationRegistry, PipelineRegistry, RequestRegistry};
use crate::shape::ShapeKey;

#[derive(Clone)]
pub struct Mediator {
    requests: Arc<RequestRegistry>,
    notifications: Arc<NotificationRegistry>,
    pipeline: Arc<PipelineRegistry>,
    config: MediatorConfig,
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(MediatorConfig::default())
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("request_handlers", &self.requests.len())
            .field("pipeline_behaviors", &self.pipeline.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Mediator {
    pub fn new(config: MediatorConfig) -> Self {
        Self {
            requests: Arc::new(RequestRegistry::new()),
            notifications: Arc::new(NotificationRegistry::new()),
            pipeline: Arc::new(PipelineRegistry::new()),
            config,
        }
    }

    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Builds a mediator from a JSON [`MediatorConfig`] file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> MediatorResult<Self> {
        let config: MediatorConfig = config::from_file(path)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Non-owning handle to this mediator. Handlers that dispatch through the
    /// mediator they are registered on should hold one of these, since a
    /// cloned [`Mediator`] inside a registered handler keeps the registries
    /// alive forever.
    pub fn downgrade(&self) -> WeakMediator {
        WeakMediator {
            requests: Arc::downgrade(&self.requests),
            notifications: Arc::downgrade(&self.notifications),
            pipeline: Arc::downgrade(&self.pipeline),
            config: self.config.clone(),
        }
    }

    pub fn register_request_handler<TRequest, TResponse, H>(
        &self,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        TRequest: Send + Sync + 'static,
        TResponse: Send + 'static,
        H: RequestHandler<TRequest, TResponse> + 'static,
    {
        self.requests
            .register(RequestBinding::Instance(Arc::new(handler)))
    }

    /// Registers a constructor that is called once per `send` for a fresh handler.
    pub fn register_request_handler_factory<TRequest, TResponse, F, H>(
        &self,
        factory: F,
    ) -> Result<(), RegistrationError>
    where
        TRequest: Send + Sync + 'static,
        TResponse: Send + 'static,
        F: Fn() -> H + Send + Sync + 'static,
        H: RequestHandler<TRequest, TResponse> + 'static,
    {
        let factory: RequestHandlerFactory<TRequest, TResponse> =
            Arc::new(move || Box::new(factory()) as Box<dyn RequestHandler<TRequest, TResponse>>);
        self.requests.register(RequestBinding::Factory(factory))
    }

    pub fn register_notification_handler<TNotification, H>(&self, handler: H)
    where
        TNotification: Send + Sync + 'static,
        H: NotificationHandler<TNotification> + 'static,
    {
        self.notifications
            .register(NotificationBinding::Instance(Arc::new(handler)));
    }

    pub fn register_notification_handler_factory<TNotification, F, H>(&self, factory: F)
    where
        TNotification: Send + Sync + 'static,
        F: Fn() -> H + Send + Sync + 'static,
        H: NotificationHandler<TNotification> + 'static,
    {
        let factory: NotificationHandlerFactory<TNotification> =
            Arc::new(move || Box::new(factory()) as Box<dyn NotificationHandler<TNotification>>);
        self.notifications
            .register(NotificationBinding::Factory(factory));
    }

    /// Registers several handlers for one notification type, in order.
    /// Fails with `NoHandlersProvided` on an empty list.
    pub fn register_notification_handlers<TNotification>(
        &self,
        handlers: Vec<Arc<dyn NotificationHandler<TNotification>>>,
    ) -> Result<(), RegistrationError>
    where
        TNotification: Send + Sync + 'static,
    {
        self.notifications.register_all(
            handlers
                .into_iter()
                .map(NotificationBinding::Instance)
                .collect(),
        )
    }

    pub fn register_notification_handler_factories<TNotification>(
        &self,
        factories: Vec<NotificationHandlerFactory<TNotification>>,
    ) -> Result<(), RegistrationError>
    where
        TNotification: Send + Sync + 'static,
    {
        self.notifications.register_all(
            factories
                .into_iter()
                .map(NotificationBinding::Factory)
                .collect(),
        )
    }

    /// Appends behaviors to the pipeline. The first duplicate (by
    /// [`PipelineBehavior::shape`]) fails the call; behaviors before it stay
    /// registered.
    pub fn register_pipeline_behaviors(
        &self,
        behaviors: impl IntoIterator<Item = Arc<dyn PipelineBehavior>>,
    ) -> Result<(), RegistrationError> {
        self.pipeline.register_all(behaviors)
    }

    /// Sends `request` to its handler through every registered behavior.
    ///
    /// `TResponse` must be the response type the handler was registered
    /// with, otherwise the call fails with
    /// [`DispatchError::RequestHandlerNotValid`].
    #[instrument(
        level = "debug",
        skip_all,
        fields(request = ShapeKey::of::<TRequest>().short_name())
    )]
    pub async fn send<TRequest, TResponse>(
        &self,
        ctx: &Context,
        request: TRequest,
    ) -> Result<TResponse, DispatchError>
    where
        TRequest: Send + Sync + 'static,
        TResponse: Send + 'static,
    {
        let binding = self.requests.resolve::<TRequest, TResponse>()?;
        let handler = binding.instantiate();
        let behaviors = self.pipeline.snapshot();

        if self.config.log_dispatch {
            debug!(
                handler = binding.kind(),
                behaviors = behaviors.len(),
                "dispatching request"
            );
        }

        let result = if behaviors.is_empty() {
            handler
                .handle(ctx, &request)
                .await
                .map_err(|source| DispatchError::Handler {
                    request: ShapeKey::of::<TRequest>().name(),
                    source,
                })
        } else {
            pipeline::run(&behaviors, handler, ctx.clone(), &request).await
        };

        if self.config.log_dispatch {
            if let Err(e) = &result {
                debug!(code = %e.code(), error = %e, "request failed");
            }
        }
        result
    }

    /// Delivers `notification` to every handler registered for its type.
    ///
    /// With [`PublishStrategy::FailFast`] the first failing handler ends the
    /// call and later handlers do not run. With
    /// [`PublishStrategy::ContinueOnError`] every handler runs and failures
    /// are reported together as [`DispatchError::NotificationHandlers`].
    #[instrument(
        level = "debug",
        skip_all,
        fields(notification = ShapeKey::of::<TNotification>().short_name())
    )]
    pub async fn publish<TNotification>(
        &self,
        ctx: &Context,
        notification: &TNotification,
    ) -> Result<(), DispatchError>
    where
        TNotification: Send + Sync + 'static,
    {
        let bindings = self.notifications.resolve::<TNotification>()?;
        if bindings.is_empty() {
            if self.config.log_dispatch {
                debug!("no notification handlers registered");
            }
            return Ok(());
        }

        let name = ShapeKey::of::<TNotification>().name();
        let mut failures = Vec::new();
        for (position, binding) in bindings.iter().enumerate() {
            let handler = binding.instantiate();
            let Err(source) = handler.handle(ctx, notification).await else {
                continue;
            };
            let error = DispatchError::NotificationHandler {
                notification: name,
                source,
            };
            match self.config.publish_strategy {
                PublishStrategy::FailFast => {
                    if self.config.log_dispatch {
                        debug!(position, error = %error, "notification handler failed");
                    }
                    return Err(error);
                }
                PublishStrategy::ContinueOnError => {
                    if self.config.log_dispatch {
                        warn!(position, error = %error, "notification handler failed, continuing");
                    }
                    failures.push(error);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::NotificationHandlers {
                notification: name,
                failures,
            })
        }
    }

    pub fn clear_request_registrations(&self) {
        self.requests.clear();
    }

    pub fn clear_notification_registrations(&self) {
        self.notifications.clear();
    }

    pub fn clear_pipeline_behaviors(&self) {
        self.pipeline.clear();
    }

    pub fn has_request_handler<TRequest: 'static>(&self) -> bool {
        self.requests.contains::<TRequest>()
    }

    pub fn request_handler_count(&self) -> usize {
        self.requests.len()
    }

    pub fn notification_handler_count<TNotification: 'static>(&self) -> usize {
        self.notifications.count::<TNotification>()
    }

    pub fn pipeline_len(&self) -> usize {
        self.pipeline.len()
    }
}

/// Weak counterpart of [`Mediator`], created by [`Mediator::downgrade`].
#[derive(Clone)]
pub struct WeakMediator {
    requests: Weak<RequestRegistry>,
    notifications: Weak<NotificationRegistry>,
    pipeline: Weak<PipelineRegistry>,
    config: MediatorConfig,
}

impl WeakMediator {
    /// The mediator, or `None` once every strong handle has been dropped.
    pub fn upgrade(&self) -> Option<Mediator> {
        Some(Mediator {
            requests: self.requests.upgrade()?,
            notifications: self.notifications.upgrade()?,
            pipeline: self.pipeline.upgrade()?,
            config: self.config.clone(),
        })
    }
}

impl fmt::Debug for WeakMediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMediator")
            .field("alive", &(self.requests.strong_count() > 0))
            .finish()
    }
}

/// Builder for a [`Mediator`] with its configuration and pipeline set up front.
#[derive(Default)]
pub struct MediatorBuilder {
    config: MediatorConfig,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
}

impl MediatorBuilder {
    pub fn config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.config.publish_strategy = strategy;
        self
    }

    pub fn log_dispatch(mut self, enabled: bool) -> Self {
        self.config.log_dispatch = enabled;
        self
    }

    /// Appends a pipeline behavior. Order of calls is nesting order.
    pub fn behavior<B: PipelineBehavior>(mut self, behavior: B) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    pub fn build(self) -> Result<Mediator, RegistrationError> {
        let mediator = Mediator::new(self.config);
        mediator.register_pipeline_behaviors(self.behaviors)?;
        Ok(mediator)
    }
}
