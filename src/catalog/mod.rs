//! Where option sets and unit costs come from: the built-in tables, or the
//! remote config service when one is configured.

pub mod remote;
pub mod resolver;
pub mod static_catalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;

use crate::{
    models::{cost_table::CostAxis, option_set::OptionSet, product_family::ProductFamily},
    utils::http::HttpError,
};

pub use remote::HttpCatalog;
pub use resolver::OptionResolver;
pub use static_catalog::StaticCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] HttpError),

    #[error("Malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Product group '{0}' not found")]
    GroupNotFound(String),

    #[error("Invalid cost value for {value} in {table}: {raw}")]
    InvalidCost {
        table: &'static str,
        value: String,
        raw: String,
    },
}

#[typeshare]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductGroup {
    pub id: u32,
    #[serde(alias = "group_name")]
    pub name: String,
}

#[async_trait]
pub trait CostSource: Send + Sync {
    /// Unit cost of `value` on `axis`. A value with no cost row is `Ok(0.0)`.
    async fn cost_of(&self, axis: CostAxis, value: &str) -> Result<f64, CatalogError>;

    /// Per-order base price of a product group.
    async fn base_price(&self, product_group: &str) -> Result<f64, CatalogError>;

    /// Density in g/cm³, always resolvable (falls back to generic steel).
    fn density_of(&self, material: &str) -> f64;
}

#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn options_for(&self, family: ProductFamily) -> Result<OptionSet, CatalogError>;

    async fn product_groups(&self) -> Result<Vec<ProductGroup>, CatalogError>;
}
