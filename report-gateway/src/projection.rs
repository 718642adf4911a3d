//! Derived fields shared by the report projectors.

use crate::config::{Config, CurrencyConfig};
use crate::filters::RangePolicy;
use crate::store::{LocalStore, StoreError};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Settings every projector reads
#[derive(Clone, Debug)]
pub struct ReportContext {
    /// Provenance tag for local records
    pub instance: String,
    pub currencies: CurrencyTable,
    pub range_policy: RangePolicy,
}

impl ReportContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            instance: config.instance.clone(),
            currencies: CurrencyTable::from_config(&config.currency),
            range_policy: config.filters.range_policy,
        }
    }
}

/// Hard-wired conversion into the reporting currency
#[derive(Clone, Debug)]
pub struct CurrencyTable {
    reporting: String,
    rates: HashMap<String, f64>,
}

impl CurrencyTable {
    pub fn from_config(config: &CurrencyConfig) -> Self {
        Self {
            reporting: config.reporting.clone(),
            rates: config.rates.clone(),
        }
    }

    pub fn reporting(&self) -> &str {
        &self.reporting
    }

    /// Converts `amount` expressed in `code`. Unknown codes pass through.
    pub fn convert(&self, amount: f64, code: &str) -> f64 {
        if code == self.reporting {
            return amount;
        }
        match self.rates.get(code) {
            Some(rate) => amount * rate,
            None => {
                tracing::debug!(currency = code, "no conversion rate, passing amount through");
                amount
            }
        }
    }
}

/// Category names from the root down to the record's own category
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// 1-based level; `None` past the depth of the hierarchy.
    pub fn level(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
    }

    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl<S: Into<String>> FromIterator<S> for CategoryPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CategoryPath(iter.into_iter().map(Into::into).collect())
    }
}

/// Walks parent links up from `category_id`. A dangling parent ends the
/// walk; so does a cycle.
pub async fn category_path(
    store: &dyn LocalStore,
    category_id: Option<i64>,
) -> Result<CategoryPath, StoreError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut next = category_id;

    while let Some(id) = next {
        if !seen.insert(id) {
            tracing::warn!(category_id = id, "category hierarchy contains a cycle");
            break;
        }
        let Some(category) = store.category(id).await? else {
            break;
        };
        names.push(category.name);
        next = category.parent_id;
    }

    names.reverse();
    Ok(CategoryPath(names))
}

/// A field that holds either a value or a fixed placeholder label
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrLabel<T> {
    Value(T),
    Label(&'static str),
}

impl<T> OrLabel<T> {
    pub fn or(value: Option<T>, label: &'static str) -> Self {
        match value {
            Some(v) => OrLabel::Value(v),
            None => OrLabel::Label(label),
        }
    }
}

pub fn format_datetime(value: Option<&NaiveDateTime>) -> Option<String> {
    value.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// `values` joined with `separator`, or `fallback` when there are none.
pub fn join_or(values: &[String], separator: &str, fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(separator)
    }
}

/// Serializes one projected record into a report record.
pub fn to_record<T: Serialize>(record: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(record)
}
