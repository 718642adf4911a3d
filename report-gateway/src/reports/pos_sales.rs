use super::{Report, ReportKind};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{OrLabel, ReportContext, format_datetime, to_record};
use crate::store::LocalStore;
use crate::store::model::{PosOrder, PosOrderLine};
use crate::store::query::PosOrderQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PARAMETERS: &[&str] = &["id_produit", "id_magasin", "id_client", "id_debut", "id_fin"];

#[derive(Serialize)]
struct LineRecord<'a> {
    id_produit: i64,
    #[serde(rename = "Nom")]
    name: &'a str,
    #[serde(rename = "Quantité")]
    qty: f64,
    #[serde(rename = "Note du client")]
    customer_note: &'a str,
    discount: f64,
    #[serde(rename = "Prix")]
    price: f64,
}

impl<'a> From<&'a PosOrderLine> for LineRecord<'a> {
    fn from(line: &'a PosOrderLine) -> Self {
        LineRecord {
            id_produit: line.product_id,
            name: &line.product_name,
            qty: line.qty,
            customer_note: line.customer_note.as_deref().unwrap_or_default(),
            discount: line.discount,
            price: line.price_subtotal_incl,
        }
    }
}

#[derive(Serialize)]
struct SaleRecord<'a> {
    #[serde(rename = "Ref")]
    name: &'a str,
    #[serde(rename = "Session")]
    session: OrLabel<i64>,
    #[serde(rename = "Date de commande")]
    date_order: Option<String>,
    #[serde(rename = "Id Magasin")]
    config_id: Option<i64>,
    #[serde(rename = "Nom du Magasin")]
    config_name: &'a str,
    #[serde(rename = "Id Ticket")]
    id: i64,
    #[serde(rename = "Ticket de caisse")]
    pos_reference: &'a str,
    #[serde(rename = "Id Client")]
    partner_id: Option<i64>,
    #[serde(rename = "Nom du client")]
    partner_name: &'a str,
    #[serde(rename = "Caissier")]
    employee: &'a str,
    #[serde(rename = "Nom du vendeur")]
    suggestion: &'a str,
    #[serde(rename = "Produits achetés")]
    lines: Vec<LineRecord<'a>>,
    #[serde(rename = "Instance")]
    instance: &'a str,
}

/// Point of sale orders with their purchased lines.
pub struct PosSalesReport {
    ctx: Arc<ReportContext>,
}

impl PosSalesReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    /// `None` when the product filter leaves the order without lines.
    fn project(
        &self,
        order: &PosOrder,
        product: Option<i64>,
    ) -> Result<Option<Value>, ReportError> {
        let lines: Vec<LineRecord<'_>> = order
            .lines
            .iter()
            .filter(|line| product.is_none_or(|id| line.product_id == id))
            .map(LineRecord::from)
            .collect();
        if lines.is_empty() {
            return Ok(None);
        }

        let record = SaleRecord {
            name: &order.name,
            session: OrLabel::or(order.session.as_ref().map(|s| s.id), "None"),
            date_order: format_datetime(order.date_order.as_ref()),
            config_id: order.config.as_ref().map(|c| c.id),
            config_name: order.config.as_ref().map_or("None", |c| c.name.as_str()),
            id: order.id,
            pos_reference: &order.pos_reference,
            partner_id: order.partner.as_ref().map(|p| p.id),
            partner_name: order.partner.as_ref().map_or("", |p| p.name.as_str()),
            employee: order.employee.as_deref().unwrap_or_default(),
            suggestion: order.suggestion.as_deref().unwrap_or_default(),
            lines,
            instance: &self.ctx.instance,
        };
        Ok(Some(to_record(&record)?))
    }
}

#[async_trait]
impl Report for PosSalesReport {
    fn kind(&self) -> ReportKind {
        ReportKind::PosSales
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError> {
        // The product filter works on lines, not on the order query
        let product = params.int("id_produit")?;
        let query = PosOrderQuery {
            config_id: params.int("id_magasin")?,
            partner_id: params.int("id_client")?,
            date_order: params.date_range("id_debut", "id_fin", self.ctx.range_policy)?,
            ..Default::default()
        };

        let orders = store.pos_orders(&query).await?;
        let mut records = Vec::with_capacity(orders.len());
        for order in &orders {
            if let Some(record) = self.project(order, product)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
