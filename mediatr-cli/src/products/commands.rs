use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mediatr_core::{BoxError, Context, RequestHandler, WeakMediator};
use serde::Serialize;
use uuid::Uuid;

use super::error::ProductError;
use super::events::ProductCreated;
use super::repository::InMemoryProductRepository;
use super::Product;

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProductResponse {
    pub product_id: Uuid,
}

/// Validates and stores the product, then publishes [`ProductCreated`].
pub struct CreateProductHandler {
    repository: Arc<InMemoryProductRepository>,
    mediator: WeakMediator,
}

impl CreateProductHandler {
    pub fn new(repository: Arc<InMemoryProductRepository>, mediator: WeakMediator) -> Self {
        Self {
            repository,
            mediator,
        }
    }
}

fn validate(command: &CreateProduct) -> Result<(), ProductError> {
    if command.name.trim().is_empty() {
        return Err(ProductError::Invalid("name must not be empty".to_string()));
    }
    if !command.price.is_finite() || command.price <= 0.0 {
        return Err(ProductError::Invalid(format!(
            "price must be greater than zero, got {}",
            command.price
        )));
    }
    Ok(())
}

#[async_trait]
impl RequestHandler<CreateProduct, CreateProductResponse> for CreateProductHandler {
    async fn handle(
        &self,
        ctx: &Context,
        command: &CreateProduct,
    ) -> Result<CreateProductResponse, BoxError> {
        validate(command)?;
        let mediator = self.mediator.upgrade().ok_or(ProductError::MediatorDropped)?;

        let product = self.repository.create(Product {
            product_id: Uuid::new_v4(),
            name: command.name.clone(),
            description: command.description.clone(),
            price: command.price,
            created_at: Utc::now(),
        });

        mediator
            .publish(ctx, &ProductCreated::from(&product))
            .await?;

        Ok(CreateProductResponse {
            product_id: product.product_id,
        })
    }
}
