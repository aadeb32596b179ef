//! Library half of `mediatr-cli`: the products feature and the wiring the
//! binary uses to build a ready mediator.

pub mod error;
pub mod products;

use std::path::Path;

use mediatr_core::{config, Context, Mediator, MediatorConfig, RequestLoggerBehavior};
use serde::Serialize;

use error::CliResult;
use products::commands::{CreateProduct, CreateProductResponse};
use products::queries::{GetProductById, GetProductByIdResponse};
use products::{Product, ProductsModule};

/// Loads the mediator config from `path`, or the defaults when there is none.
pub fn load_config(path: Option<&Path>) -> CliResult<MediatorConfig> {
    match path {
        Some(path) => Ok(config::from_file(path)?),
        None => Ok(MediatorConfig::default()),
    }
}

/// Builds a mediator with the request logger and every product handler.
pub fn bootstrap(config: MediatorConfig) -> CliResult<(Mediator, ProductsModule)> {
    let mediator = Mediator::builder()
        .config(config)
        .behavior(RequestLoggerBehavior::new())
        .build()?;
    let products = products::register(&mediator)?;
    Ok((mediator, products))
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub product: Product,
    pub created_events: usize,
}

/// Creates a product, reads it back and reports what the handlers saw.
pub async fn run_demo(
    mediator: &Mediator,
    products: &ProductsModule,
    command: CreateProduct,
) -> CliResult<DemoReport> {
    let ctx = Context::background();

    let created: CreateProductResponse = mediator.send(&ctx, command).await?;
    let found: GetProductByIdResponse = mediator
        .send(
            &ctx,
            GetProductById {
                product_id: created.product_id,
            },
        )
        .await?;

    Ok(DemoReport {
        product: found.product,
        created_events: products.created_events(),
    })
}

