//! JSON snapshot ingestion.
//!
//! Turns caller files into engine inputs:
//! - features: an array of row objects. Columns appear in first-seen order;
//!   `null` and missing cells become NaN; a column holding any non-numeric
//!   value is left out.
//! - claims: an array of objects. Keys are trimmed and lowercased, then
//!   `amount` / `paid_amount` / `total` map to `claim_amount` and `provider`
//!   maps to `provider_id`.
//! - events: an array of objects carrying `age_days`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use myrisk_core::types::{ClaimRecord, FeatureColumn, FeatureMatrix, ProviderId};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn as_records<'a>(value: &'a Value, what: &str) -> Result<Vec<&'a Map<String, Value>>> {
    let Some(items) = value.as_array() else {
        bail!("{what} must be a JSON array of objects");
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_object()
                .with_context(|| format!("{what} record {i} is not an object"))
        })
        .collect()
}

/// Build a feature matrix from row objects.
pub fn features_from_json(value: &Value) -> Result<FeatureMatrix> {
    let rows = as_records(value, "features")?;

    let mut names: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let mut values = Vec::with_capacity(rows.len());
        let mut numeric = true;
        for row in &rows {
            match row.get(name) {
                None | Some(Value::Null) => values.push(f64::NAN),
                Some(Value::Number(n)) => values.push(n.as_f64().unwrap_or(f64::NAN)),
                Some(_) => {
                    numeric = false;
                    break;
                }
            }
        }
        if numeric {
            columns.push(FeatureColumn::new(name, values));
        } else {
            warn!(column = name, "skipping non-numeric feature column");
        }
    }

    let matrix = FeatureMatrix::new(columns)?;
    debug!(rows = matrix.n_rows(), cols = matrix.n_cols(), "features loaded");
    Ok(matrix)
}

/// Canonical claim key for a raw column name.
pub fn normalize_claim_key(raw: &str) -> String {
    let key = raw.trim().to_lowercase();
    match key.as_str() {
        "amount" | "paid_amount" | "total" => "claim_amount".to_string(),
        "provider" => "provider_id".to_string(),
        _ => key,
    }
}

fn provider_id(value: &Value, index: usize) -> Result<ProviderId> {
    match value {
        Value::String(s) => Ok(ProviderId::from(s.trim())),
        Value::Number(n) => Ok(ProviderId::from(n.to_string())),
        other => bail!("claim {index}: provider_id must be a string or number, got {other}"),
    }
}

fn claim_amount(value: &Value, index: usize) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => Ok(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("claim {index}: claim_amount {s:?} is not a number")),
        other => bail!("claim {index}: claim_amount must be numeric, got {other}"),
    }
}

/// Build claim records, normalizing column names first.
///
/// When a record carries both a canonical key and an alias, the canonical
/// key wins. Null amounts become NaN and are rejected by the engine.
pub fn claims_from_json(value: &Value) -> Result<Vec<ClaimRecord>> {
    let records = as_records(value, "claims")?;
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut normalized = Map::new();
            for (key, v) in record.iter() {
                let canonical = normalize_claim_key(key);
                let is_alias = canonical != key.trim().to_lowercase();
                if is_alias && normalized.contains_key(&canonical) {
                    continue;
                }
                normalized.insert(canonical, v.clone());
            }
            let id = normalized
                .get("provider_id")
                .with_context(|| format!("claim {i} has no provider_id column"))?;
            let amount = normalized
                .get("claim_amount")
                .with_context(|| format!("claim {i} has no claim_amount column"))?;
            Ok(ClaimRecord { provider_id: provider_id(id, i)?, claim_amount: claim_amount(amount, i)? })
        })
        .collect()
}

/// Event ages in days.
pub fn event_ages_from_json(value: &Value) -> Result<Vec<f64>> {
    let records = as_records(value, "events")?;
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record
                .get("age_days")
                .and_then(Value::as_f64)
                .with_context(|| format!("event {i} has no numeric age_days"))
        })
        .collect()
}
