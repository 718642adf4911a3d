//! Combining local and remote report records.

use serde_json::{Map, Value};

/// Local records first, then remote ones, each in its own order. Nothing is
/// de-duplicated.
pub fn concat(mut local: Vec<Value>, remote: Vec<Value>) -> Vec<Value> {
    local.extend(remote);
    local
}

/// Sum of `field` over every record; absent and non-numeric values count as
/// zero.
pub fn sum_numeric(records: &[Value], field: &str) -> f64 {
    records
        .iter()
        .filter_map(|record| record.get(field).and_then(Value::as_f64))
        .fold(0.0, |total, value| total + value)
}

/// Appends `{total_field: sum of field}` to `records`.
pub fn append_total(mut records: Vec<Value>, field: &str, total_field: &str) -> Vec<Value> {
    let total = sum_numeric(&records, field);
    let mut summary = Map::new();
    summary.insert(total_field.to_string(), Value::from(total));
    records.push(Value::Object(summary));
    records
}
