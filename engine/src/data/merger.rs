// Keyed aggregation and joins over region/year tables. Aggregation is always
// explicit: the caller names the function per column, and joins refuse inputs
// whose keys are not already unique.
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use shared::{KeyPart, Row, Table, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    First,
}

impl Aggregation {
    /// Missing cells are skipped; a group with nothing to aggregate is missing
    /// (count is 0).
    fn apply(&self, cells: &[&Value]) -> Value {
        let present = cells.iter().copied().filter(|c| !c.is_missing());
        match self {
            Aggregation::Count => Value::Int(present.count() as i64),
            Aggregation::First => present.cloned().next().unwrap_or(Value::Missing),
            Aggregation::Sum => numeric(cells, |v| v.iter().sum()),
            Aggregation::Mean => numeric(cells, |v| v.iter().sum::<f64>() / v.len() as f64),
            Aggregation::Min => numeric(cells, |v| v.iter().copied().fold(f64::INFINITY, f64::min)),
            Aggregation::Max => numeric(cells, |v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        }
    }
}

fn numeric<F>(cells: &[&Value], reduce: F) -> Value
where
    F: Fn(&[f64]) -> f64,
{
    let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
    if values.is_empty() {
        Value::Missing
    } else {
        Value::Float(reduce(&values))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub column: String,
    pub function: Aggregation,
}

impl AggregateSpec {
    pub fn new(column: &str, function: Aggregation) -> Self {
        AggregateSpec {
            column: column.to_string(),
            function,
        }
    }
}

fn require_columns(table: &Table, dataset: &str, names: &[&str]) -> Result<()> {
    match table.missing_columns(names).into_iter().next() {
        Some(column) => Err(EngineError::schema(dataset, column)),
        None => Ok(()),
    }
}

fn key_of(row: &Row<'_>, keys: &[&str]) -> Option<Vec<KeyPart>> {
    keys.iter().map(|k| row.get(k).and_then(Value::as_key)).collect()
}

fn describe_key(key: &[KeyPart]) -> String {
    let parts: Vec<String> = key.iter().map(|k| k.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Number of distinct, fully present key tuples.
pub fn distinct_keys(table: &Table, keys: &[&str]) -> Result<usize> {
    require_columns(table, "table", keys)?;
    let set: HashSet<Vec<KeyPart>> = table.rows().filter_map(|row| key_of(&row, keys)).collect();
    Ok(set.len())
}

/// Reduces `table` to one row per key tuple, sorted by key. Output columns are
/// the keys followed by one column per spec, named after its source column.
pub fn aggregate(table: &Table, dataset: &str, keys: &[&str], specs: &[AggregateSpec]) -> Result<Table> {
    require_columns(table, dataset, keys)?;
    let spec_columns: Vec<&str> = specs.iter().map(|s| s.column.as_str()).collect();
    require_columns(table, dataset, &spec_columns)?;
    if let Some(clash) = spec_columns.iter().find(|c| keys.contains(*c)) {
        return Err(EngineError::ConfigError(format!(
            "column '{}' cannot be both a key and an aggregate",
            clash
        )));
    }

    let mut groups: BTreeMap<Vec<KeyPart>, Vec<Row<'_>>> = BTreeMap::new();
    let mut dropped = 0usize;
    for row in table.rows() {
        match key_of(&row, keys) {
            Some(key) => groups.entry(key).or_default().push(row),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dataset, dropped, "Rows without a complete key left out of aggregation");
    }

    let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    columns.extend(spec_columns.iter().map(|c| c.to_string()));
    let mut out = Table::new(columns);

    for (key, rows) in groups {
        let mut record: Vec<Value> = key.into_iter().map(Value::from).collect();
        for spec in specs {
            let cells: Vec<&Value> = rows.iter().filter_map(|r| r.get(&spec.column)).collect();
            record.push(spec.function.apply(&cells));
        }
        out.push_row(record)?;
    }
    Ok(out)
}

/// Inner join on `keys`. Non-key columns present on both sides get
/// `suffixes.0` / `suffixes.1`. Keys must be unique in each input.
pub fn inner_join(left: &Table, right: &Table, keys: &[&str], suffixes: (&str, &str)) -> Result<Table> {
    require_columns(left, "left", keys)?;
    require_columns(right, "right", keys)?;

    let left_rest: Vec<&String> = left.columns().iter().filter(|c| !keys.contains(&c.as_str())).collect();
    let right_rest: Vec<&String> = right.columns().iter().filter(|c| !keys.contains(&c.as_str())).collect();

    let mut right_index: HashMap<Vec<KeyPart>, Row<'_>> = HashMap::new();
    for row in right.rows() {
        if let Some(key) = key_of(&row, keys) {
            if right_index.contains_key(&key) {
                return Err(EngineError::DuplicateKey {
                    table: "right".to_string(),
                    key: describe_key(&key),
                });
            }
            right_index.insert(key, row);
        }
    }

    let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    for name in &left_rest {
        if right_rest.contains(name) {
            columns.push(format!("{}{}", name, suffixes.0));
        } else {
            columns.push(name.to_string());
        }
    }
    for name in &right_rest {
        if left_rest.contains(name) {
            columns.push(format!("{}{}", name, suffixes.1));
        } else {
            columns.push(name.to_string());
        }
    }
    let mut out = Table::new(columns);

    let mut seen: HashSet<Vec<KeyPart>> = HashSet::new();
    for row in left.rows() {
        let Some(key) = key_of(&row, keys) else {
            continue;
        };
        if !seen.insert(key.clone()) {
            return Err(EngineError::DuplicateKey {
                table: "left".to_string(),
                key: describe_key(&key),
            });
        }
        let Some(other) = right_index.get(&key) else {
            continue;
        };
        let mut record: Vec<Value> = key.into_iter().map(Value::from).collect();
        record.extend(left_rest.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Missing)));
        record.extend(right_rest.iter().map(|c| other.get(c).cloned().unwrap_or(Value::Missing)));
        out.push_row(record)?;
    }

    tracing::debug!(left = left.len(), right = right.len(), joined = out.len(), "Inner join complete");
    Ok(out)
}

/// Stacks tables; the column set is the union in first-seen order and absent
/// cells are missing.
pub fn concat(tables: &[&Table]) -> Result<Table> {
    let mut columns: Vec<String> = Vec::new();
    for table in tables {
        for c in table.columns() {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }
    let mut out = Table::new(columns.clone());
    for table in tables {
        for row in table.rows() {
            let record = columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Missing))
                .collect();
            out.push_row(record)?;
        }
    }
    Ok(out)
}
