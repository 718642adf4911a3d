use super::{Report, ReportKind};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{OrLabel, ReportContext, format_datetime, to_record};
use crate::store::LocalStore;
use crate::store::model::PurchaseOrder;
use crate::store::query::PurchaseOrderQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

const PARAMETERS: &[&str] = &["id_fournisseur", "id_user", "id_debut", "id_fin"];

/// States that never show up in the report
const EXCLUDED_STATES: &[&str] = &["cancel", "done"];

const DOMESTIC_PREFIX: &str = "MA - ";

#[derive(Serialize)]
struct PurchaseRecord<'a> {
    #[serde(rename = "Bon De Commande")]
    name: &'a str,
    #[serde(rename = "Date de confirmation")]
    date_approve: Option<String>,
    #[serde(rename = "Fournisseur")]
    supplier: Cow<'a, str>,
    #[serde(rename = "Livrer à")]
    deliver_to: &'a str,
    #[serde(rename = "Id du Magasin")]
    warehouse_id: OrLabel<i64>,
    #[serde(rename = "Nom du Magasin")]
    warehouse_name: &'a str,
    /// Carries the tax document number, like `DD Impot`
    #[serde(rename = "Document D'origine")]
    source_document: &'a str,
    #[serde(rename = "DD Impot")]
    dd_impot: &'a str,
    #[serde(rename = "Num Fact Fournisseur")]
    supplier_invoice: &'a str,
    #[serde(rename = "Total")]
    total: f64,
    #[serde(rename = "Quantité commandée")]
    ordered: f64,
    #[serde(rename = "Quantité reçue")]
    received: f64,
    #[serde(rename = "Instance")]
    instance: &'a str,
}

/// Supplier label; orders in the reporting currency are tagged as domestic.
fn supplier_label<'a>(name: &'a str, currency: &str, reporting: &str) -> Cow<'a, str> {
    if currency == reporting && !name.starts_with(DOMESTIC_PREFIX) {
        Cow::Owned(format!("{DOMESTIC_PREFIX}{name}"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Open purchase orders with totals in the reporting currency.
pub struct PurchaseOrdersReport {
    ctx: Arc<ReportContext>,
}

impl PurchaseOrdersReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    fn project(&self, order: &PurchaseOrder) -> Result<Value, ReportError> {
        let currencies = &self.ctx.currencies;
        let partner = order.partner.as_ref().map_or("", |p| p.name.as_str());
        let warehouse = order
            .picking_type
            .as_ref()
            .and_then(|t| t.warehouse.as_ref());
        let dd_impot = order.dd_impot.as_deref().unwrap_or_default();

        let record = PurchaseRecord {
            name: &order.name,
            date_approve: format_datetime(order.date_approve.as_ref()),
            supplier: supplier_label(partner, &order.currency, currencies.reporting()),
            deliver_to: order.picking_type.as_ref().map_or("", |t| t.name.as_str()),
            warehouse_id: OrLabel::or(warehouse.map(|w| w.id), ""),
            warehouse_name: warehouse.map_or("", |w| w.name.as_str()),
            source_document: dd_impot,
            dd_impot,
            supplier_invoice: order.supplier_invoice.as_deref().unwrap_or_default(),
            total: currencies.convert(order.amount_total, &order.currency),
            ordered: order.lines.iter().fold(0.0, |sum, l| sum + l.product_qty),
            received: order.lines.iter().fold(0.0, |sum, l| sum + l.qty_received),
            instance: &self.ctx.instance,
        };
        Ok(to_record(&record)?)
    }
}

#[async_trait]
impl Report for PurchaseOrdersReport {
    fn kind(&self) -> ReportKind {
        ReportKind::PurchaseOrders
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError> {
        let query = PurchaseOrderQuery {
            partner_id: params.int("id_fournisseur")?,
            user_id: params.int("id_user")?,
            date_approve: params.date_range("id_debut", "id_fin", self.ctx.range_policy)?,
            excluded_states: EXCLUDED_STATES.iter().map(|s| s.to_string()).collect(),
        };

        let orders = store.purchase_orders(&query).await?;
        orders.iter().map(|order| self.project(order)).collect()
    }
}
