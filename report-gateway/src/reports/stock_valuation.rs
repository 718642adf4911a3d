use super::{Report, ReportKind};
use crate::aggregate::append_total;
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{OrLabel, ReportContext, format_datetime, join_or, to_record};
use crate::store::LocalStore;
use crate::store::model::ValuationLayer;
use crate::store::query::ValuationQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PARAMETERS: &[&str] = &["id_val_start", "id_debut", "id_fin", "id_val_end"];

/// Per-record value summed into the trailing total
pub const VALUE_FIELD: &str = "Valeur en MAD";
/// Sole key of the trailing total record
pub const TOTAL_VALUE_FIELD: &str = "Total Valeur en MAD";

const PRODUCT_ID_FIELD: &str = "ID Du Produit";
const REFERENCE_FIELD: &str = "Référence";

#[derive(Serialize)]
struct ValuationRecord<'a> {
    #[serde(rename = "Date de création")]
    create_date: Option<String>,
    #[serde(rename = "Référence")]
    reference: Option<&'a str>,
    #[serde(rename = "ID Du Produit")]
    product_id: OrLabel<i64>,
    #[serde(rename = "Nom Produit")]
    product_name: String,
    #[serde(rename = "Magasin")]
    pos_categories: String,
    #[serde(rename = "Quantité")]
    quantity: f64,
    #[serde(rename = "Quantité restante")]
    remaining_qty: f64,
    #[serde(rename = "Valeur en MAD")]
    value: f64,
    #[serde(rename = "Valeur restante en MAD")]
    remaining_value: f64,
    #[serde(rename = "Instance")]
    instance: &'a str,
}

/// Stock valuation layers, closed by a combined value total.
pub struct StockValuationReport {
    ctx: Arc<ReportContext>,
}

impl StockValuationReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    async fn project(
        &self,
        store: &dyn LocalStore,
        layer: &ValuationLayer,
    ) -> Result<Value, ReportError> {
        let variant = match layer.product_id {
            Some(id) => store.product_variant(id).await?,
            None => None,
        };
        let template = match &variant {
            Some(variant) => store.product_template(variant.template_id).await?,
            None => None,
        };
        let pos_categories = template.map(|t| t.pos_categories).unwrap_or_default();

        let record = ValuationRecord {
            create_date: format_datetime(layer.create_date.as_ref()),
            reference: layer.reference.as_deref(),
            product_id: OrLabel::or(layer.product_id, ""),
            product_name: variant.map(|v| v.display_name).unwrap_or_default(),
            pos_categories: join_or(&pos_categories, " / ", "Aucune"),
            quantity: layer.quantity,
            remaining_qty: layer.remaining_qty,
            value: layer.value,
            remaining_value: layer.remaining_value,
            instance: &self.ctx.instance,
        };
        Ok(to_record(&record)?)
    }
}

#[async_trait]
impl Report for StockValuationReport {
    fn kind(&self) -> ReportKind {
        ReportKind::StockValuation
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError> {
        let policy = self.ctx.range_policy;
        let query = ValuationQuery {
            id: params.id_range("id_val_start", "id_val_end", policy)?,
            create_date: params.date_range("id_debut", "id_fin", policy)?,
        };

        let layers = store.valuation_layers(&query).await?;
        let mut records = Vec::with_capacity(layers.len());
        for layer in &layers {
            records.push(self.project(store, layer).await?);
        }
        Ok(records)
    }

    /// The remote instance appends its own total; that record and anything
    /// that is not a valuation line are dropped.
    fn keep_remote(&self, record: &Value) -> bool {
        let Some(fields) = record.as_object() else {
            return false;
        };
        if fields.contains_key(TOTAL_VALUE_FIELD) && fields.len() <= 2 {
            return false;
        }
        fields.contains_key(PRODUCT_ID_FIELD) || fields.contains_key(REFERENCE_FIELD)
    }

    fn finish(&self, records: Vec<Value>) -> Vec<Value> {
        append_total(records, VALUE_FIELD, TOTAL_VALUE_FIELD)
    }
}
