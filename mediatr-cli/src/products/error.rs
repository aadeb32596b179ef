use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProductError {
    #[error("invalid product: {0}")]
    Invalid(String),

    #[error("product with id {0} not found")]
    NotFound(Uuid),

    #[error("mediator was dropped")]
    MediatorDropped,
}
