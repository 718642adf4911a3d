//! Report strategies.
//!
//! Every endpoint runs the same pipeline (authenticate, query the local
//! store, fetch the remote copy, concatenate, respond). A [`Report`]
//! supplies the parts that differ: which parameters it reads, how local
//! records are queried and projected, which remote records are kept and
//! how the combined list is finished.

mod dimension_product;
mod inventory;
mod pos_payments;
mod pos_sales;
mod purchase_orders;
mod stock_valuation;

use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::ReportContext;
use crate::store::LocalStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub use dimension_product::DimensionProductReport;
pub use inventory::InventoryReport;
pub use pos_payments::PosPaymentsReport;
pub use pos_sales::PosSalesReport;
pub use purchase_orders::PurchaseOrdersReport;
pub use stock_valuation::{StockValuationReport, TOTAL_VALUE_FIELD, VALUE_FIELD};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    DimensionProduct,
    PosSales,
    PosPayments,
    PurchaseOrders,
    Inventory,
    StockValuation,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::DimensionProduct,
        ReportKind::PosSales,
        ReportKind::PosPayments,
        ReportKind::PurchaseOrders,
        ReportKind::Inventory,
        ReportKind::StockValuation,
    ];

    /// Path of the endpoint, identical on both instances
    pub const fn path(&self) -> &'static str {
        match self {
            ReportKind::DimensionProduct => "/api/dimension_product",
            ReportKind::PosSales => "/api/pos_ventes",
            ReportKind::PosPayments => "/api/pos_payments",
            ReportKind::PurchaseOrders => "/api/purchase_orders",
            ReportKind::Inventory => "/api/inventory",
            ReportKind::StockValuation => "/api/stock_valuation",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportKind::DimensionProduct => "dimension_product",
            ReportKind::PosSales => "pos_sales",
            ReportKind::PosPayments => "pos_payments",
            ReportKind::PurchaseOrders => "purchase_orders",
            ReportKind::Inventory => "inventory",
            ReportKind::StockValuation => "stock_valuation",
        }
    }

    /// Human readable name used in error details
    pub const fn label(&self) -> &'static str {
        match self {
            ReportKind::DimensionProduct => "combined dimension products",
            ReportKind::PosSales => "POS orders",
            ReportKind::PosPayments => "POS payments",
            ReportKind::PurchaseOrders => "purchase orders",
            ReportKind::Inventory => "inventory data",
            ReportKind::StockValuation => "stock valuation data",
        }
    }

    /// Whether the endpoint is restricted to admin principals by default
    pub const fn requires_admin(&self) -> bool {
        matches!(self, ReportKind::DimensionProduct)
    }
}

#[async_trait]
pub trait Report: Send + Sync {
    fn kind(&self) -> ReportKind;

    /// Query parameters the report reads. Present ones are forwarded to the
    /// remote instance as-is.
    fn parameters(&self) -> &'static [&'static str];

    /// Queries the local store and projects every match into a report record.
    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError>;

    /// Whether an element of the remote response belongs in the output
    fn keep_remote(&self, _record: &Value) -> bool {
        true
    }

    /// Final pass over the concatenated records
    fn finish(&self, records: Vec<Value>) -> Vec<Value> {
        records
    }
}

/// One strategy per report kind, in [`ReportKind::ALL`] order.
pub fn all_reports(ctx: Arc<ReportContext>) -> Vec<Arc<dyn Report>> {
    ReportKind::ALL
        .iter()
        .map(|kind| -> Arc<dyn Report> {
            let ctx = ctx.clone();
            match kind {
                ReportKind::DimensionProduct => Arc::new(DimensionProductReport::new(ctx)),
                ReportKind::PosSales => Arc::new(PosSalesReport::new(ctx)),
                ReportKind::PosPayments => Arc::new(PosPaymentsReport::new(ctx)),
                ReportKind::PurchaseOrders => Arc::new(PurchaseOrdersReport::new(ctx)),
                ReportKind::Inventory => Arc::new(InventoryReport::new(ctx)),
                ReportKind::StockValuation => Arc::new(StockValuationReport::new(ctx)),
            }
        })
        .collect()
}
