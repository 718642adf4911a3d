//! Typed queries against the local store.
//!
//! Each query carries the criteria a report derived from its parameters.
//! `matches` is the reference semantics; a database-backed store is free to
//! push the same criteria down instead.

use super::model::{PosOrder, ProductTemplate, PurchaseOrder, StockQuant, ValuationLayer};
use crate::filters::{DateRange, IdRange};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductQuery {
    pub id: Option<IdRange>,
}

impl ProductQuery {
    pub fn matches(&self, product: &ProductTemplate) -> bool {
        self.id.is_none_or(|range| range.contains(&product.id))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockQuery {
    /// Variant id
    pub product_id: Option<i64>,
    pub in_date: Option<DateRange>,
}

impl StockQuery {
    pub fn matches(&self, quant: &StockQuant) -> bool {
        self.product_id.is_none_or(|id| quant.product_id == id)
            && self
                .in_date
                .is_none_or(|range| range.contains_opt(quant.in_date.as_ref()))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PosOrderQuery {
    pub id: Option<IdRange>,
    /// POS configuration recorded on the order
    pub config_id: Option<i64>,
    /// POS configuration of the order's session
    pub session_config_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub date_order: Option<DateRange>,
    /// Order has at least one line for this variant
    pub line_product_id: Option<i64>,
}

impl PosOrderQuery {
    pub fn matches(&self, order: &PosOrder) -> bool {
        self.id.is_none_or(|range| range.contains(&order.id))
            && self
                .config_id
                .is_none_or(|id| order.config.as_ref().is_some_and(|c| c.id == id))
            && self.session_config_id.is_none_or(|id| {
                order
                    .session
                    .as_ref()
                    .is_some_and(|s| s.config_id == Some(id))
            })
            && self
                .partner_id
                .is_none_or(|id| order.partner.as_ref().is_some_and(|p| p.id == id))
            && self
                .date_order
                .is_none_or(|range| range.contains_opt(order.date_order.as_ref()))
            && self
                .line_product_id
                .is_none_or(|id| order.lines.iter().any(|l| l.product_id == id))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PurchaseOrderQuery {
    pub partner_id: Option<i64>,
    pub user_id: Option<i64>,
    pub date_approve: Option<DateRange>,
    pub excluded_states: Vec<String>,
}

impl PurchaseOrderQuery {
    pub fn matches(&self, order: &PurchaseOrder) -> bool {
        self.partner_id
            .is_none_or(|id| order.partner.as_ref().is_some_and(|p| p.id == id))
            && self.user_id.is_none_or(|id| order.user_id == Some(id))
            && self
                .date_approve
                .is_none_or(|range| range.contains_opt(order.date_approve.as_ref()))
            && !self.excluded_states.contains(&order.state)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValuationQuery {
    pub id: Option<IdRange>,
    pub create_date: Option<DateRange>,
}

impl ValuationQuery {
    pub fn matches(&self, layer: &ValuationLayer) -> bool {
        self.id.is_none_or(|range| range.contains(&layer.id))
            && self
                .create_date
                .is_none_or(|range| range.contains_opt(layer.create_date.as_ref()))
    }
}
