use super::{Report, ReportKind};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::projection::{ReportContext, format_datetime, to_record};
use crate::store::LocalStore;
use crate::store::model::PosOrder;
use crate::store::query::PosOrderQuery;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const PARAMETERS: &[&str] = &[
    "id_order_start",
    "id_order_end",
    "id_magasin",
    "id_client",
    "id_produit",
    "id_debut",
    "id_fin",
];

#[derive(Serialize)]
struct PaymentRecord<'a> {
    #[serde(rename = "Nom du Magasin")]
    config_name: &'a str,
    #[serde(rename = "Session")]
    session: &'a str,
    #[serde(rename = "Id Ticket")]
    id: i64,
    #[serde(rename = "Ticket de caisse")]
    pos_reference: &'a str,
    #[serde(rename = "Caissier")]
    employee: &'a str,
    #[serde(rename = "Date de commande")]
    date_order: Option<String>,
    #[serde(rename = "Vendeur")]
    suggestion: &'a str,
    #[serde(rename = "Nom du Client")]
    partner_name: &'a str,
    #[serde(rename = "Méthodes de paiement")]
    methods: IndexMap<&'a str, f64>,
    #[serde(rename = "Instance")]
    instance: &'a str,
}

/// Per-order payment summary, one amount per payment method.
pub struct PosPaymentsReport {
    ctx: Arc<ReportContext>,
}

impl PosPaymentsReport {
    pub fn new(ctx: Arc<ReportContext>) -> Self {
        Self { ctx }
    }

    fn project(&self, order: &PosOrder) -> Result<Value, ReportError> {
        // A method paid twice reports its last amount
        let mut methods = IndexMap::new();
        for payment in &order.payments {
            methods.insert(payment.method.as_str(), payment.amount);
        }

        let record = PaymentRecord {
            config_name: order.config.as_ref().map_or("None", |c| c.name.as_str()),
            session: order.session.as_ref().map_or("None", |s| s.name.as_str()),
            id: order.id,
            pos_reference: &order.pos_reference,
            employee: order.employee.as_deref().unwrap_or("None"),
            date_order: format_datetime(order.date_order.as_ref()),
            suggestion: order.suggestion.as_deref().unwrap_or_default(),
            partner_name: order.partner.as_ref().map_or("None", |p| p.name.as_str()),
            methods,
            instance: &self.ctx.instance,
        };
        Ok(to_record(&record)?)
    }
}

#[async_trait]
impl Report for PosPaymentsReport {
    fn kind(&self) -> ReportKind {
        ReportKind::PosPayments
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
        let query = PosOrderQuery {
            id: params.id_range("id_order_start", "id_order_end", policy)?,
            session_config_id: params.int("id_magasin")?,
            partner_id: params.int("id_client")?,
            date_order: params.date_range("id_debut", "id_fin", policy)?,
            line_product_id: params.int("id_produit")?,
            ..Default::default()
        };

        let orders = store.pos_orders(&query).await?;
        orders.iter().map(|order| self.project(order)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{fixture_store, test_context};
    use serde_json::json;

    async fn run(query: &str) -> Vec<Value> {
        PosPaymentsReport::new(test_context())
            .local_records(&fixture_store(), &ReportParams::from_query(Some(query)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_payment_record() {
        let records = run("").await;
        assert_eq!(records.len(), 2);

        let paid = &records[0];
        assert_eq!(paid["Nom du Magasin"], json!("Shop Maarif"));
        assert_eq!(paid["Session"], json!("POS/00003"));
        assert_eq!(paid["Caissier"], json!("Karim"));
        assert_eq!(paid["Vendeur"], json!("Sara"));
        assert_eq!(paid["Méthodes de paiement"], json!({"Cash": 300.0, "Card": 350.0}));

        let walk_in = &records[1];
        assert_eq!(walk_in["Nom du Magasin"], json!("None"));
        assert_eq!(walk_in["Session"], json!("None"));
        assert_eq!(walk_in["Caissier"], json!("None"));
        assert_eq!(walk_in["Nom du Client"], json!("None"));
        assert_eq!(walk_in["Vendeur"], json!(""));
        assert_eq!(walk_in["Méthodes de paiement"], json!({"Cash": 300.0}));
        assert_eq!(walk_in["Instance"], json!("10018"));
    }

    #[tokio::test]
    async fn test_payment_filters() {
        assert_eq!(run("id_order_start=11&id_order_end=20").await.len(), 1);
        // Filters on the session's shop, which only the first order has
        assert_eq!(run("id_magasin=1").await.len(), 1);
        // Whole order kept when any line matches
        assert_eq!(run("id_produit=102").await.len(), 2);
        assert_eq!(run("id_produit=101").await.len(), 1);
        assert!(run("id_client=1").await.is_empty());
    }

    #[tokio::test]
    async fn test_same_day_range() {
        let records = run("id_debut=2024-06-10&id_fin=2024-06-10").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Méthodes de paiement"], json!({"Cash": 300.0}));
    }

    #[tokio::test]
    async fn test_unparseable_filter_is_an_error() {
        let result = PosPaymentsReport::new(test_context())
            .local_records(
                &fixture_store(),
                &ReportParams::from_query(Some("id_client=abc")),
            )
            .await;
        assert!(matches!(result, Err(ReportError::InternalFailure(_))));
    }
}
