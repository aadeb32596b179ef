use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediatr_core::{BoxError, Context, NotificationHandler};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::Product;

/// Published after a product has been stored.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCreated {
    pub product_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Product> for ProductCreated {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            created_at: product.created_at,
        }
    }
}

pub struct LogProductCreated;

#[async_trait]
impl NotificationHandler<ProductCreated> for LogProductCreated {
    async fn handle(&self, _ctx: &Context, event: &ProductCreated) -> Result<(), BoxError> {
        info!(product_id = %event.product_id, name = %event.name, "product created");
        Ok(())
    }
}

/// Counts `ProductCreated` events into a shared counter.
pub struct CountProductCreated {
    count: Arc<AtomicUsize>,
}

impl CountProductCreated {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        Self { count }
    }
}

#[async_trait]
impl NotificationHandler<ProductCreated> for CountProductCreated {
    async fn handle(&self, _ctx: &Context, _event: &ProductCreated) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
