use super::model::{
    Category, PosOrder, PricelistItem, ProductTemplate, ProductVariant, PurchaseOrder, StockQuant,
    ValuationLayer,
};
use super::query::{ProductQuery, PosOrderQuery, PurchaseOrderQuery, StockQuery, ValuationQuery};
use super::{LocalStore, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A point-in-time export of the records the reports read
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub products: Vec<ProductTemplate>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub pricelist_items: Vec<PricelistItem>,
    #[serde(default)]
    pub stock_quants: Vec<StockQuant>,
    #[serde(default)]
    pub pos_orders: Vec<PosOrder>,
    #[serde(default)]
    pub purchase_orders: Vec<PurchaseOrder>,
    #[serde(default)]
    pub valuation_layers: Vec<ValuationLayer>,
}

/// In-memory store over a [`Snapshot`]. Records keep their snapshot order,
/// which stands in for the database's default ordering.
pub struct SnapshotStore {
    snapshot: Snapshot,
    variants: HashMap<i64, usize>,
    categories: HashMap<i64, usize>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        let variants = index_by(&snapshot.variants, |v| v.id);
        let categories = index_by(&snapshot.categories, |c| c.id);
        Self {
            snapshot,
            variants,
            categories,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            products = snapshot.products.len(),
            pos_orders = snapshot.pos_orders.len(),
            purchase_orders = snapshot.purchase_orders.len(),
            stock_quants = snapshot.stock_quants.len(),
            valuation_layers = snapshot.valuation_layers.len(),
            "loaded local snapshot"
        );
        Ok(Self::new(snapshot))
    }

    /// [`SnapshotStore::from_file`] on the blocking pool.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        tokio::task::spawn_blocking(move || Self::from_file(&path))
            .await
            .map_err(|e| StoreError::Backend(format!("snapshot loader failed: {e}")))?
    }
}

// First occurrence wins for duplicated ids
fn index_by<T>(items: &[T], id: impl Fn(&T) -> i64) -> HashMap<i64, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        index.entry(id(item)).or_insert(pos);
    }
    index
}

fn select<T: Clone>(items: &[T], matches: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().filter(|item| matches(item)).cloned().collect()
}

#[async_trait]
impl LocalStore for SnapshotStore {
    async fn product_templates(
        &self,
        query: &ProductQuery,
    ) -> Result<Vec<ProductTemplate>, StoreError> {
        Ok(select(&self.snapshot.products, |p| query.matches(p)))
    }

    async fn product_template(&self, id: i64) -> Result<Option<ProductTemplate>, StoreError> {
        Ok(self.snapshot.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_variant(&self, id: i64) -> Result<Option<ProductVariant>, StoreError> {
        Ok(self
            .variants
            .get(&id)
            .map(|&pos| self.snapshot.variants[pos].clone()))
    }

    async fn category(&self, id: i64) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories
            .get(&id)
            .map(|&pos| self.snapshot.categories[pos].clone()))
    }

    async fn active_price(&self, template_id: i64) -> Result<Option<f64>, StoreError> {
        Ok(self
            .snapshot
            .pricelist_items
            .iter()
            .find(|item| item.template_id == template_id && item.pricelist_active)
            .map(|item| item.fixed_price))
    }

    async fn stock_quants(&self, query: &StockQuery) -> Result<Vec<StockQuant>, StoreError> {
        Ok(select(&self.snapshot.stock_quants, |q| query.matches(q)))
    }

    async fn pos_orders(&self, query: &PosOrderQuery) -> Result<Vec<PosOrder>, StoreError> {
        Ok(select(&self.snapshot.pos_orders, |o| query.matches(o)))
    }

    async fn purchase_orders(
        &self,
        query: &PurchaseOrderQuery,
    ) -> Result<Vec<PurchaseOrder>, StoreError> {
        Ok(select(&self.snapshot.purchase_orders, |o| query.matches(o)))
    }

    async fn valuation_layers(
        &self,
        query: &ValuationQuery,
    ) -> Result<Vec<ValuationLayer>, StoreError> {
        Ok(select(&self.snapshot.valuation_layers, |l| query.matches(l)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{
                "categories": [{{"id": 1, "name": "All"}}, {{"id": 2, "name": "Shop", "parent_id": 1}}],
                "pricelist_items": [
                    {{"template_id": 4, "fixed_price": 10.0, "pricelist_active": false}},
                    {{"template_id": 4, "fixed_price": 12.5}}
                ],
                "valuation_layers": [
                    {{"id": 9, "create_date": "2024-02-01T08:30:00", "quantity": 2.0, "value": 30.0}}
                ]
            }}"#
        )
        .unwrap();

        let store = SnapshotStore::from_file(tmp.path()).unwrap();
        assert_eq!(store.category(2).await.unwrap().unwrap().parent_id, Some(1));
        assert!(store.category(3).await.unwrap().is_none());
        assert_eq!(store.active_price(4).await.unwrap(), Some(12.5));
        assert_eq!(store.active_price(5).await.unwrap(), None);

        let layers = store
            .valuation_layers(&ValuationQuery::default())
            .await
            .unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].create_date.is_some());
        assert!(layers[0].reference.is_none());
    }

    #[tokio::test]
    async fn test_load_off_the_runtime() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"categories": [{{"id": 7, "name": "Robe"}}]}}"#).unwrap();

        let store = SnapshotStore::load(tmp.path().to_path_buf()).await.unwrap();
        assert_eq!(store.category(7).await.unwrap().unwrap().name, "Robe");

        assert!(matches!(
            SnapshotStore::load(PathBuf::from("/nonexistent/snapshot.json")).await,
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn test_missing_and_invalid_file() {
        assert!(matches!(
            SnapshotStore::from_file(Path::new("/nonexistent/snapshot.json")),
            Err(StoreError::Io(_))
        ));

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"products": [{{"id": "x"}}]}}"#).unwrap();
        assert!(matches!(
            SnapshotStore::from_file(tmp.path()),
            Err(StoreError::Parse(_))
        ));
    }
}
