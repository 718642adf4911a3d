//! Business records as read from the local store.
//!
//! These mirror the subset of the platform's schema that the reports
//! project. Optional relations are `None` when the record has no link.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Any related record that is only referenced by id and display name
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SupplierInfo {
    pub name: String,
    pub price: f64,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProductTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub default_code: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub standard_price: f64,
    #[serde(default)]
    pub hs_code: Option<String>,
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub composition: Option<String>,
    pub detailed_type: String,
    pub invoice_policy: String,
    #[serde(default)]
    pub available_in_pos: bool,
    #[serde(default)]
    pub pos_categories: Vec<String>,
    #[serde(default)]
    pub taxes: Vec<String>,
    #[serde(default)]
    pub sellers: Vec<SupplierInfo>,
    /// The template's default variant, which owns the stock
    #[serde(default)]
    pub variant_id: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: i64,
    pub template_id: i64,
    pub display_name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PricelistItem {
    pub template_id: i64,
    pub fixed_price: f64,
    #[serde(default = "active_default")]
    pub pricelist_active: bool,
}

fn active_default() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StockQuant {
    pub id: i64,
    /// Variant id
    pub product_id: i64,
    /// Full location path, e.g. "WH/Stock/Shelf 1"
    pub location: String,
    pub quantity: f64,
    #[serde(default)]
    pub quantity_auto_apply: f64,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub in_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub warehouse: Option<NamedRef>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PosSession {
    pub id: i64,
    pub name: String,
    /// POS configuration (shop) the session was opened on
    #[serde(default)]
    pub config_id: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PosOrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub qty: f64,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub discount: f64,
    pub price_subtotal_incl: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PosPayment {
    pub method: String,
    pub amount: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PosOrder {
    pub id: i64,
    pub name: String,
    pub pos_reference: String,
    #[serde(default)]
    pub date_order: Option<NaiveDateTime>,
    #[serde(default)]
    pub session: Option<PosSession>,
    /// POS configuration (shop)
    #[serde(default)]
    pub config: Option<NamedRef>,
    #[serde(default)]
    pub partner: Option<NamedRef>,
    /// Cashier name
    #[serde(default)]
    pub employee: Option<String>,
    /// Salesperson entered at the till
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub lines: Vec<PosOrderLine>,
    #[serde(default)]
    pub payments: Vec<PosPayment>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PickingType {
    pub name: String,
    #[serde(default)]
    pub warehouse: Option<NamedRef>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PurchaseOrderLine {
    pub product_qty: f64,
    #[serde(default)]
    pub qty_received: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PurchaseOrder {
    pub id: i64,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub date_approve: Option<NaiveDateTime>,
    #[serde(default)]
    pub partner: Option<NamedRef>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub picking_type: Option<PickingType>,
    #[serde(default)]
    pub dd_impot: Option<String>,
    #[serde(default)]
    pub supplier_invoice: Option<String>,
    pub currency: String,
    pub amount_total: f64,
    #[serde(default)]
    pub lines: Vec<PurchaseOrderLine>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ValuationLayer {
    pub id: i64,
    #[serde(default)]
    pub create_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Variant id
    #[serde(default)]
    pub product_id: Option<i64>,
    pub quantity: f64,
    #[serde(default)]
    pub remaining_qty: f64,
    pub value: f64,
    #[serde(default)]
    pub remaining_value: f64,
}
