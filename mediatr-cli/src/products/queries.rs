use std::sync::Arc;

use async_trait::async_trait;
use mediatr_core::{BoxError, Context, RequestHandler};
use serde::Serialize;
use uuid::Uuid;

use super::error::ProductError;
use super::repository::InMemoryProductRepository;
use super::Product;

#[derive(Debug, Clone)]
pub struct GetProductById {
    pub product_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetProductByIdResponse {
    pub product: Product,
}

pub struct GetProductByIdHandler {
    repository: Arc<InMemoryProductRepository>,
}

impl GetProductByIdHandler {
    pub fn new(repository: Arc<InMemoryProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RequestHandler<GetProductById, GetProductByIdResponse> for GetProductByIdHandler {
    async fn handle(
        &self,
        _ctx: &Context,
        query: &GetProductById,
    ) -> Result<GetProductByIdResponse, BoxError> {
        let product = self
            .repository
            .get(&query.product_id)
            .ok_or(ProductError::NotFound(query.product_id))?;
        Ok(GetProductByIdResponse { product })
    }
}
