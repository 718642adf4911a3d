use super::{Report, ReportKind};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{OrLabel, ReportContext, category_path, join_or, to_record};
use crate::store::LocalStore;
use crate::store::model::StockQuant;
use crate::store::query::StockQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PARAMETERS: &[&str] = &["id_debut", "id_fin"];

#[derive(Serialize)]
struct InventoryRecord<'a> {
    #[serde(rename = "L'emplacement")]
    location: &'a str,
    #[serde(rename = "ID du Produit")]
    product_id: i64,
    #[serde(rename = "Nom du produit")]
    product_name: String,
    #[serde(rename = "Id Magasin")]
    warehouse_id: OrLabel<i64>,
    #[serde(rename = "Nom du Magasin")]
    warehouse_name: &'a str,
    #[serde(rename = "Categorie POS")]
    pos_categories: String,
    #[serde(rename = "Categorie")]
    category: String,
    #[serde(rename = "Quantité en stock")]
    quantity: f64,
    #[serde(rename = "Valeur en MAD")]
    value: f64,
    #[serde(rename = "Item ID")]
    item_id: Option<String>,
    #[serde(rename = "Prix de vente")]
    sale_price: Option<f64>,
    #[serde(rename = "Instance")]
    instance: &'a str,
}

/// Stock quantities per location, with the product's catalog details.
pub struct InventoryReport {
    ctx: Arc<ReportContext>,
}

impl InventoryReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    async fn project(
        &self,
        store: &dyn LocalStore,
        quant: &StockQuant,
    ) -> Result<Value, ReportError> {
        let variant = store.product_variant(quant.product_id).await?;
        let template = match &variant {
            Some(variant) => store.product_template(variant.template_id).await?,
            None => None,
        };

        let (path, sale_price) = match &template {
            Some(template) => (
                category_path(store, template.category_id).await?,
                store.active_price(template.id).await?,
            ),
            None => Default::default(),
        };
        let pos_categories = template
            .as_ref()
            .map_or_else(Vec::new, |t| t.pos_categories.clone());

        let record = InventoryRecord {
            location: &quant.location,
            product_id: quant.product_id,
            product_name: variant.map(|v| v.display_name).unwrap_or_default(),
            warehouse_id: OrLabel::or(quant.warehouse.as_ref().map(|w| w.id), "Aucun"),
            warehouse_name: quant
                .warehouse
                .as_ref()
                .map(|w| w.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or("Aucun"),
            pos_categories: join_or(&pos_categories, ", ", "Aucune"),
            category: if path.is_empty() {
                "Non classé".to_string()
            } else {
                path.join(" / ")
            },
            quantity: quant.quantity_auto_apply,
            value: quant.value,
            item_id: template.and_then(|t| t.item_id),
            sale_price,
            instance: &self.ctx.instance,
        };
        Ok(to_record(&record)?)
    }
}

#[async_trait]
impl Report for InventoryReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Inventory
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError> {
        let query = StockQuery {
            in_date: params.date_range("id_debut", "id_fin", self.ctx.range_policy)?,
            ..Default::default()
        };

        let quants = store.stock_quants(&query).await?;
        let mut records = Vec::with_capacity(quants.len());
        for quant in &quants {
            records.push(self.project(store, quant).await?);
        }
        Ok(records)
    }
}
