//! The local store seam.
//!
//! The record database is owned by the platform; reports only read from
//! it through [`LocalStore`].

pub mod model;
pub mod query;
mod snapshot;

use async_trait::async_trait;
use model::{
    Category, PosOrder, ProductTemplate, ProductVariant, PurchaseOrder, StockQuant, ValuationLayer,
};
use query::{ProductQuery, PosOrderQuery, PurchaseOrderQuery, StockQuery, ValuationQuery};

pub use snapshot::{Snapshot, SnapshotStore};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("could not read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Read access to the business records of this instance
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn product_templates(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<ProductTemplate>, StoreError>;

    async fn product_template(&self, id: i64) -> Result<Option<ProductTemplate>, StoreError>;

    async fn product_variant(&self, id: i64) -> Result<Option<ProductVariant>, StoreError>;

    async fn category(&self, id: i64) -> Result<Option<Category>, StoreError>;

    /// Fixed price of the first item on an active pricelist for the template
    async fn active_price(&self, template_id: i64) -> Result<Option<f64>, StoreError>;

    async fn stock_quants(&self, query: &StockQuery) -> Result<Vec<StockQuant>, StoreError>;

    async fn pos_orders(&self, query: &PosOrderQuery) -> Result<Vec<PosOrder>, StoreError>;

    async fn purchase_orders(
        &self,
        query: &PurchaseOrderQuery,
    ) -> Result<Vec<PurchaseOrder>, StoreError>;

    async fn valuation_layers(
        &self,
        query: &ValuationQuery,
    ) -> Result<Vec<ValuationLayer>, StoreError>;

    /// Abandons whatever the current request started on the store. Reports
    /// never write, so stores without transactions have nothing to do.
    async fn rollback(&self) {}
}
