use super::{Report, ReportKind};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{ReportContext, category_path, to_record};
use crate::store::LocalStore;
use crate::store::model::ProductTemplate;
use crate::store::query::{ProductQuery, StockQuery};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PARAMETERS: &[&str] = &["id_pdt_start", "id_pdt_end"];

#[derive(Serialize)]
struct SupplierRecord<'a> {
    #[serde(rename = "Nom du fournisseur")]
    name: &'a str,
    #[serde(rename = "Prix")]
    price: f64,
    #[serde(rename = "Devise")]
    currency: Option<&'a str>,
}

#[derive(Serialize)]
struct ProductRecord<'a> {
    #[serde(rename = "Id du produit")]
    id: i64,
    #[serde(rename = "Nom du Produit")]
    name: &'a str,
    #[serde(rename = "Code barre")]
    barcode: Option<&'a str>,
    #[serde(rename = "default code")]
    default_code: Option<&'a str>,
    #[serde(rename = "Item ID")]
    item_id: Option<&'a str>,
    #[serde(rename = "Coût")]
    cost: f64,
    #[serde(rename = "Prix de vente")]
    sale_price: Option<f64>,
    #[serde(rename = "HS Code")]
    hs_code: Option<&'a str>,
    #[serde(rename = "Pays Origine")]
    origin_country: Option<&'a str>,
    #[serde(rename = "Magasin")]
    level_1: Option<&'a str>,
    #[serde(rename = "Gender")]
    level_2: Option<&'a str>,
    #[serde(rename = "Type d'article")]
    level_3: Option<&'a str>,
    #[serde(rename = "Sous-Marque")]
    level_4: Option<&'a str>,
    #[serde(rename = "Collection")]
    level_5: Option<&'a str>,
    #[serde(rename = "Catégorie d'article")]
    level_6: Option<&'a str>,
    #[serde(rename = "Composition")]
    composition: Option<&'a str>,
    #[serde(rename = "Type de produit")]
    detailed_type: &'a str,
    #[serde(rename = "Politique de fabrication")]
    invoice_policy: &'a str,
    #[serde(rename = "Stock selon l'emplacement")]
    stock_by_location: IndexMap<String, f64>,
    #[serde(rename = "Catégorie de produit")]
    category: Option<&'a str>,
    #[serde(rename = "Marque du produit")]
    pos_categories: Option<&'a [String]>,
    #[serde(rename = "Disponible en POS")]
    available_in_pos: bool,
    #[serde(rename = "Taxes")]
    taxes: Option<&'a [String]>,
    #[serde(rename = "Informations fournisseur")]
    suppliers: Vec<SupplierRecord<'a>>,
    #[serde(rename = "Instance")]
    instance: &'a str,
    #[serde(rename = "Instance_Product_ID")]
    instance_product_id: String,
}

fn non_empty(values: &[String]) -> Option<&[String]> {
    (!values.is_empty()).then_some(values)
}

/// Product catalog dimension. Restricted to admin principals.
pub struct DimensionProductReport {
    ctx: Arc<ReportContext>,
}

impl DimensionProductReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    /// Quantity per location over every quant of the product's variant.
    /// A location seen twice keeps the last quantity.
    async fn stock_by_location(
        &self,
        store: &dyn LocalStore,
        product: &ProductTemplate,
    ) -> Result<IndexMap<String, f64>, ReportError> {
        let Some(variant_id) = product.variant_id else {
            return Ok(IndexMap::new());
        };
        let query = StockQuery {
            product_id: Some(variant_id),
            ..Default::default()
        };

        let quants = store.stock_quants(&query).await?;
        Ok(quants
            .into_iter()
            .map(|quant| (quant.location, quant.quantity))
            .collect())
    }

    async fn project(
        &self,
        store: &dyn LocalStore,
        product: &ProductTemplate,
    ) -> Result<Value, ReportError> {
        let sale_price = store.active_price(product.id).await?;
        let stock_by_location = self.stock_by_location(store, product).await?;
        let path = category_path(store, product.category_id).await?;

        let record = ProductRecord {
            id: product.id,
            name: &product.name,
            barcode: product.barcode.as_deref(),
            default_code: product.default_code.as_deref(),
            item_id: product.item_id.as_deref(),
            cost: product.standard_price,
            sale_price,
            hs_code: product.hs_code.as_deref(),
            origin_country: product.origin_country.as_deref(),
            level_1: path.level(1),
            level_2: path.level(2),
            level_3: path.level(3),
            level_4: path.level(4),
            level_5: path.level(5),
            level_6: path.level(6),
            composition: product.composition.as_deref(),
            detailed_type: &product.detailed_type,
            invoice_policy: &product.invoice_policy,
            stock_by_location,
            category: path.leaf(),
            pos_categories: non_empty(&product.pos_categories),
            available_in_pos: product.available_in_pos,
            taxes: non_empty(&product.taxes),
            suppliers: product
                .sellers
                .iter()
                .map(|s| SupplierRecord {
                    name: &s.name,
                    price: s.price,
                    currency: s.currency.as_deref(),
                })
                .collect(),
            instance: &self.ctx.instance,
            instance_product_id: format!("{}_{}", self.ctx.instance, product.id),
        };

        Ok(to_record(&record)?)
    }
}

#[async_trait]
impl Report for DimensionProductReport {
    fn kind(&self) -> ReportKind {
        ReportKind::DimensionProduct
    }

    fn parameters(&self) -> &'static [&'static str] {
        PARAMETERS
    }

    async fn local_records(
        &self,
        store: &dyn LocalStore,
        params: &ReportParams,
    ) -> Result<Vec<Value>, ReportError> {
        let query = ProductQuery {
            id: params.id_range("id_pdt_start", "id_pdt_end", self.ctx.range_policy)?,
        };

        let products = store.product_templates(&query).await?;
        let mut records = Vec::with_capacity(products.len());
        for product in &products {
            records.push(self.project(store, product).await?);
        }
        Ok(records)
    }
}
