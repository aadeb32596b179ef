use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::Product;

/// Product store shared by the command and query handlers.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: DashMap<Uuid, Product>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, product: Product) -> Product {
        debug!(product_id = %product.product_id, "storing product");
        self.products.insert(product.product_id, product.clone());
        product
    }

    pub fn get(&self, product_id: &Uuid) -> Option<Product> {
        self.products.get(product_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
