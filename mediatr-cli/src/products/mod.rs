//! # Products
//!
//! A small CQRS feature wired through a [`Mediator`]:
//!
//! - [`commands::CreateProduct`] stores a product and publishes
//!   [`events::ProductCreated`]
//! - [`queries::GetProductById`] reads it back
//!
//! The query handler is registered as a factory, so each query gets a
//! fresh handler over the shared repository.

pub mod commands;
pub mod error;
pub mod events;
pub mod queries;
pub mod repository;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mediatr_core::{Mediator, NotificationHandler, RegistrationError};
use serde::Serialize;
use uuid::Uuid;

use commands::CreateProductHandler;
use events::{CountProductCreated, LogProductCreated, ProductCreated};
use queries::GetProductByIdHandler;
use repository::InMemoryProductRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Handles to the state behind the registered product handlers.
#[derive(Debug, Clone)]
pub struct ProductsModule {
    pub repository: Arc<InMemoryProductRepository>,
    created_events: Arc<AtomicUsize>,
}

impl ProductsModule {
    /// Number of `ProductCreated` events observed so far.
    pub fn created_events(&self) -> usize {
        self.created_events.load(Ordering::SeqCst)
    }
}

/// Registers every product handler on `mediator`.
pub fn register(mediator: &Mediator) -> Result<ProductsModule, RegistrationError> {
    let repository = Arc::new(InMemoryProductRepository::new());
    let created_events = Arc::new(AtomicUsize::new(0));

    mediator.register_request_handler(CreateProductHandler::new(
        Arc::clone(&repository),
        mediator.downgrade(),
    ))?;

    let query_repository = Arc::clone(&repository);
    mediator.register_request_handler_factory(move || {
        GetProductByIdHandler::new(Arc::clone(&query_repository))
    })?;

    mediator.register_notification_handlers(vec![
        Arc::new(LogProductCreated) as Arc<dyn NotificationHandler<ProductCreated>>,
        Arc::new(CountProductCreated::new(Arc::clone(&created_events))),
    ])?;

    Ok(ProductsModule {
        repository,
        created_events,
    })
}
