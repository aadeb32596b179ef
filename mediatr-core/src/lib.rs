//! # mediatr-core: In-Process Mediator
//!
//! Decouples the code that issues work from the code that performs it.
//! Callers hand a typed message to a [`Mediator`] and never name the handler.
//!
//! ## Messages
//!
//! ### 1. Requests
//! A request has exactly one handler and exactly one response type.
//! [`Mediator::send`] resolves the handler by the request's type, runs it
//! through the pipeline and returns the typed response.
//!
//! ### 2. Notifications
//! A notification has zero or more handlers and no response.
//! [`Mediator::publish`] calls each handler in registration order.
//!
//! ### 3. Pipeline Behaviors
//! Middleware around every request ([`pipeline`]). The first registered
//! behavior is the outermost layer.
//!
//! ## Dispatch Flow
//!
//! ```text
//! send(ctx, request)
//!   → resolve handler by request shape      (RequestHandlerNotFound)
//!   → check response type                   (RequestHandlerNotValid)
//!   → instantiate (instance or factory)
//!   → snapshot pipeline
//!   → B1 → B2 → … → handler                 (Pipeline / Handler errors)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use mediatr_core::{BoxError, Context, Mediator, RequestHandler};
//!
//! struct Greet(String);
//!
//! struct GreetHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Greet, String> for GreetHandler {
//!     async fn handle(&self, _ctx: &Context, request: &Greet) -> Result<String, BoxError> {
//!         Ok(format!("hello, {}", request.0))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mediator = Mediator::default();
//! mediator.register_request_handler(GreetHandler).unwrap();
//!
//! let greeting: String = mediator
//!     .send(&Context::background(), Greet("world".into()))
//!     .await
//!     .unwrap();
//! assert_eq!(greeting, "hello, world");
//! # }
//! ```

pub mod behaviors;
pub mod config;
pub mod context;
pub mod error;
pub mod global;
pub mod handler;
pub mod mediator;
pub mod pipeline;
mod registry;
pub mod shape;

// Re-exports
pub use behaviors::{RequestLoggerBehavior, LOGGER_PIPELINE_KEY};
pub use config::{ConfigError, MediatorConfig, PublishStrategy};
pub use context::{CancelHandle, Context};
pub use error::*;
pub use handler::{
    NotificationHandler, NotificationHandlerFactory, RequestHandler, RequestHandlerFactory,
};
pub use mediator::{Mediator, MediatorBuilder, WeakMediator};
pub use pipeline::{respond, ErasedResponse, Next, PipelineBehavior, PipelineResult, RequestEnvelope};
pub use shape::ShapeKey;
