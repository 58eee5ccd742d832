use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single cell. `Missing` is the no-data sentinel and is never equal to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

impl Value {
    /// Infers the narrowest cell type for a raw field read from a delimited file.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            // "NaN" is how pandas-exported sheets spell an empty numeric cell
            Ok(f) if f.is_nan() => Value::Missing,
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) | Value::Missing => None,
        }
    }

    /// Integer view; floats qualify only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Grouping/join key for this cell. Missing cells have no key.
    pub fn as_key(&self) -> Option<KeyPart> {
        match self {
            Value::Missing => None,
            Value::Text(s) => Some(KeyPart::Text(s.clone())),
            other => match other.as_i64() {
                Some(i) => Some(KeyPart::Int(i)),
                None => other.as_f64().map(|f| KeyPart::Text(f.to_string())),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<KeyPart> for Value {
    fn from(key: KeyPart) -> Self {
        match key {
            KeyPart::Int(i) => Value::Int(i),
            KeyPart::Text(s) => Value::Text(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Totally ordered component of a grouping or join key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("row has {found} cells but the table has {expected} columns")]
    ArityMismatch { expected: usize, found: usize },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("year {0} appears more than once in the series; aggregate it first")]
    DuplicateYear(i32),

    #[error("year cell {0} is not an integer year")]
    InvalidYear(String),
}

/// Ordered rows sharing one column set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Names from `required` that this table does not carry, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Numeric cells of a column; non-numeric and missing cells are skipped.
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>, TableError> {
        Ok(self.column(name)?.filter_map(Value::as_f64).collect())
    }

    /// Returns a new table with `name` appended, or replaced when it already exists.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table, TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::ArityMismatch {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        let mut out = self.clone();
        match out.column_index(name) {
            Some(idx) => {
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                out.columns.push(name.to_string());
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(out)
    }

    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Row<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| predicate(row))
            .map(|row| row.values.to_vec())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| TableError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        })
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<Table, TableError> {
        let idx = self
            .column_index(from)
            .ok_or_else(|| TableError::MissingColumn(from.to_string()))?;
        let mut out = self.clone();
        out.columns[idx] = to.to_string();
        Ok(out)
    }

    /// Distinct text values of a column in first-seen order.
    pub fn unique_text(&self, name: &str) -> Result<Vec<String>, TableError> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.column(name)? {
            if let Some(s) = value.as_str() {
                if !seen.iter().any(|x| x == s) {
                    seen.push(s.to_string());
                }
            }
        }
        Ok(seen)
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| &self.values[idx])
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Year-indexed values with unique, ascending years.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn from_points<I>(points: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut points: Vec<SeriesPoint> = points
            .into_iter()
            .map(|(year, value)| SeriesPoint { year, value })
            .collect();
        points.sort_by_key(|p| p.year);
        if let Some(pair) = points.windows(2).find(|w| w[0].year == w[1].year) {
            return Err(TableError::DuplicateYear(pair[0].year));
        }
        Ok(TimeSeries { points })
    }

    /// Projects a table onto `(year, value)`. Rows with a missing year or value
    /// are skipped; a repeated year is an error.
    pub fn from_table(table: &Table, year_column: &str, value_column: &str) -> Result<Self, TableError> {
        let years = table.column(year_column)?;
        let values = table.column(value_column)?;
        let mut pairs = Vec::with_capacity(table.len());
        for (year, value) in years.zip(values) {
            if year.is_missing() || value.is_missing() {
                continue;
            }
            let year = year
                .as_i64()
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| TableError::InvalidYear(year.to_string()))?;
            if let Some(v) = value.as_f64() {
                pairs.push((year, v));
            }
        }
        Self::from_points(pairs)
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Years are unique by construction, so this is the point count.
    pub fn distinct_years(&self) -> usize {
        self.points.len()
    }

    pub fn min_year(&self) -> Option<i32> {
        self.points.first().map(|p| p.year)
    }

    pub fn max_year(&self) -> Option<i32> {
        self.points.last().map(|p| p.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelForecast {
    pub model: String,
    pub parameters: serde_json::Value,
    pub points: Vec<ForecastPoint>,
}

/// Independent projections of one series; disagreement between models is left
/// to the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub first_year: i32,
    pub terminal_year: i32,
    pub models: Vec<ModelForecast>,
}

impl ForecastResult {
    pub fn model(&self, name: &str) -> Option<&ModelForecast> {
        self.models.iter().find(|m| m.model == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn sample() -> Table {
        Table::from_rows(
            vec!["region".into(), "year".into(), "value".into()],
            vec![
                vec![text("World"), Value::Int(2020), Value::Float(100.0)],
                vec![text("Europe"), Value::Int(2020), Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer(" 4.6 "), Value::Float(4.6));
        assert_eq!(Value::infer("320 km"), text("320 km"));
        assert_eq!(Value::infer(""), Value::Missing);
        assert_eq!(Value::infer("NaN"), Value::Missing);
    }

    #[test]
    fn test_key_of_integral_float_is_int() {
        assert_eq!(Value::Float(2020.0).as_key(), Some(KeyPart::Int(2020)));
        assert_eq!(Value::Missing.as_key(), None);
    }

    #[test]
    fn test_push_row_checks_arity() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        let err = table.push_row(vec![Value::Int(1)]).unwrap_err();
        assert_eq!(err, TableError::ArityMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_with_column_appends_and_replaces() {
        let table = sample();
        let added = table
            .with_column("flag", vec![Value::Int(1), Value::Int(0)])
            .unwrap();
        assert_eq!(added.columns().len(), 4);
        assert_eq!(table.columns().len(), 3, "source table is untouched");

        let replaced = added
            .with_column("value", vec![Value::Float(1.0), Value::Float(2.0)])
            .unwrap();
        assert_eq!(replaced.columns().len(), 4);
        assert_eq!(replaced.row(1).unwrap().f64("value"), Some(2.0));
    }

    #[test]
    fn test_filter_select_rename() {
        let table = sample();
        let world = table.filter(|row| row.text("region") == Some("World"));
        assert_eq!(world.len(), 1);

        let projected = table.select(&["year", "value"]).unwrap();
        assert_eq!(projected.columns(), &["year".to_string(), "value".to_string()]);
        assert!(table.select(&["nope"]).is_err());

        let renamed = table.rename("value", "ev_sales").unwrap();
        assert!(renamed.has_column("ev_sales"));
        assert_eq!(renamed.missing_columns(&["region", "value"]), vec!["value".to_string()]);
    }

    #[test]
    fn test_column_f64_skips_missing() {
        assert_eq!(sample().column_f64("value").unwrap(), vec![100.0]);
    }

    #[test]
    fn test_series_from_table_rejects_duplicate_years() {
        let table = Table::from_rows(
            vec!["year".into(), "value".into()],
            vec![
                vec![Value::Int(2020), Value::Float(1.0)],
                vec![Value::Int(2020), Value::Float(2.0)],
            ],
        )
        .unwrap();
        assert_eq!(
            TimeSeries::from_table(&table, "year", "value").unwrap_err(),
            TableError::DuplicateYear(2020)
        );
    }

    #[test]
    fn test_series_sorted_and_skips_missing() {
        let table = Table::from_rows(
            vec!["year".into(), "value".into()],
            vec![
                vec![Value::Int(2018), Value::Float(4.0)],
                vec![Value::Int(2016), Value::Missing],
                vec![Value::Int(2015), Value::Int(1)],
            ],
        )
        .unwrap();
        let series = TimeSeries::from_table(&table, "year", "value").unwrap();
        assert_eq!(series.distinct_years(), 2);
        assert_eq!(series.min_year(), Some(2015));
        assert_eq!(series.max_year(), Some(2018));
    }
}
