// Field normalization: declarative (column, pattern, type) descriptors that turn
// formatted strings such as "320 km" or "AC:11,0 DC:150,0" into numeric columns.
use crate::error::{EngineError, Result};
use crate::models::columns;
use regex::Regex;
use serde::Serialize;
use shared::utils::locale;
use shared::{Table, Value};
use thiserror::Error;

/// First maximal digit run, optionally followed by `separator` and more digits.
pub fn first_number(separator: char) -> String {
    format!(r"(\d+(?:{}\d+)?)", regex::escape(&separator.to_string()))
}

fn foreign_separator(separator: char) -> char {
    if separator == ',' {
        '.'
    } else {
        ','
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
}

/// What a cell becomes when nothing can be parsed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    Sentinel,
    /// For features whose absence means zero capability (no fast-charge spec).
    Zero,
}

/// Per-cell parse failure. Always recovered by the normalizer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldParseError {
    #[error("cell is empty")]
    Empty,
    #[error("no number matches in '{0}'")]
    NoMatch(String),
    #[error("'{0}' is not a valid number")]
    Invalid(String),
    #[error("{0} is not an integer")]
    NotIntegral(f64),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub source: String,
    pub target: String,
    pub pattern: Regex,
    pub decimal_separator: char,
    pub kind: NumericKind,
    pub on_missing: MissingPolicy,
    custom_pattern: bool,
}

impl FieldSpec {
    pub fn new(source: &str, target: &str, kind: NumericKind) -> Result<Self> {
        Ok(FieldSpec {
            source: source.to_string(),
            target: target.to_string(),
            pattern: compile(&first_number('.'))?,
            decimal_separator: '.',
            kind,
            on_missing: MissingPolicy::Sentinel,
            custom_pattern: false,
        })
    }

    /// The first capture group (or the whole match without one) is the number.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = compile(pattern)?;
        self.custom_pattern = true;
        Ok(self)
    }

    /// Also rebuilds the default number pattern so that only `separator` can
    /// continue a number.
    pub fn with_decimal_separator(mut self, separator: char) -> Result<Self> {
        self.decimal_separator = separator;
        if !self.custom_pattern {
            self.pattern = compile(&first_number(separator))?;
        }
        Ok(self)
    }

    pub fn zero_when_missing(mut self) -> Self {
        self.on_missing = MissingPolicy::Zero;
        self
    }

    /// Parses one cell. Numeric cells pass through, so normalizing twice is a no-op.
    pub fn parse_cell(&self, value: &Value) -> std::result::Result<Value, FieldParseError> {
        let number = match value {
            Value::Missing => return Err(FieldParseError::Empty),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(text) => self.extract(text)?,
        };
        match self.kind {
            NumericKind::Float => Ok(Value::Float(number)),
            NumericKind::Integer => Value::Float(number)
                .as_i64()
                .map(Value::Int)
                .ok_or(FieldParseError::NotIntegral(number)),
        }
    }

    fn extract(&self, text: &str) -> std::result::Result<f64, FieldParseError> {
        if text.trim().is_empty() {
            return Err(FieldParseError::Empty);
        }
        let caps = self
            .pattern
            .captures(text)
            .ok_or_else(|| FieldParseError::NoMatch(text.to_string()))?;
        let Some(number) = caps.get(1).or_else(|| caps.get(0)) else {
            return Err(FieldParseError::NoMatch(text.to_string()));
        };
        let matched = number.as_str();
        // "4,6" read with '.' would otherwise come out as 4 or 46
        if self.touches_foreign_separator(text, number.start(), number.end()) {
            return Err(FieldParseError::Invalid(matched.to_string()));
        }
        locale::parse_decimal(matched, self.decimal_separator)
            .map_err(|_| FieldParseError::Invalid(matched.to_string()))
    }

    /// True when the digits at `start..end` continue across the other separator.
    fn touches_foreign_separator(&self, text: &str, start: usize, end: usize) -> bool {
        let foreign = foreign_separator(self.decimal_separator);
        let mut after = text[end..].chars();
        let mut before = text[..start].chars().rev();
        let digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        (after.next() == Some(foreign) && digit(after.next()))
            || (before.next() == Some(foreign) && digit(before.next()))
    }

    fn fallback(&self) -> Value {
        match (self.on_missing, self.kind) {
            (MissingPolicy::Sentinel, _) => Value::Missing,
            (MissingPolicy::Zero, NumericKind::Integer) => Value::Int(0),
            (MissingPolicy::Zero, NumericKind::Float) => Value::Float(0.0),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| EngineError::ConfigError(format!("invalid field pattern '{}': {}", pattern, e)))
}

/// `numerator / denominator`, missing when either side is missing or the denominator is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRatio {
    pub numerator: String,
    pub denominator: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnCoverage {
    pub target: String,
    pub parsed: usize,
    pub missing: usize,
    pub zero_filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub columns: Vec<ColumnCoverage>,
}

impl NormalizationReport {
    pub fn coverage(&self, target: &str) -> Option<&ColumnCoverage> {
        self.columns.iter().find(|c| c.target == target)
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub table: Table,
    pub report: NormalizationReport,
}

#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    dataset: String,
    fields: Vec<FieldSpec>,
    ratios: Vec<DerivedRatio>,
}

impl FieldNormalizer {
    pub fn new(dataset: &str) -> Self {
        FieldNormalizer {
            dataset: dataset.to_string(),
            fields: Vec::new(),
            ratios: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn ratio(mut self, numerator: &str, denominator: &str, target: &str) -> Self {
        self.ratios.push(DerivedRatio {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            target: target.to_string(),
        });
        self
    }

    /// Produces a new table with every derived column added. Source columns that
    /// are absent fail before any cell is parsed.
    pub fn apply(&self, table: &Table) -> Result<Normalized> {
        for spec in &self.fields {
            if !table.has_column(&spec.source) {
                return Err(EngineError::schema(&self.dataset, &spec.source));
            }
        }

        let mut out = table.clone();
        let mut report = NormalizationReport::default();

        for spec in &self.fields {
            let mut coverage = ColumnCoverage {
                target: spec.target.clone(),
                ..Default::default()
            };
            let values: Vec<Value> = out
                .column(&spec.source)?
                .map(|cell| match spec.parse_cell(cell) {
                    Ok(v) => {
                        coverage.parsed += 1;
                        v
                    }
                    Err(e) => {
                        tracing::debug!(dataset = %self.dataset, column = %spec.source, error = %e, "Cell not parsed, substituting fallback");
                        match spec.on_missing {
                            MissingPolicy::Sentinel => coverage.missing += 1,
                            MissingPolicy::Zero => coverage.zero_filled += 1,
                        }
                        spec.fallback()
                    }
                })
                .collect();
            out = out.with_column(&spec.target, values)?;
            report.columns.push(coverage);
        }

        for ratio in &self.ratios {
            for name in [&ratio.numerator, &ratio.denominator] {
                if !out.has_column(name) {
                    return Err(EngineError::schema(&self.dataset, name.as_str()));
                }
            }
            let mut coverage = ColumnCoverage {
                target: ratio.target.clone(),
                ..Default::default()
            };
            let values: Vec<Value> = out
                .rows()
                .map(|row| match (row.f64(&ratio.numerator), row.f64(&ratio.denominator)) {
                    (Some(n), Some(d)) if d != 0.0 => {
                        coverage.parsed += 1;
                        Value::Float(n / d)
                    }
                    _ => {
                        coverage.missing += 1;
                        Value::Missing
                    }
                })
                .collect();
            out = out.with_column(&ratio.target, values)?;
            report.columns.push(coverage);
        }

        for c in &report.columns {
            if c.missing > 0 {
                tracing::info!(dataset = %self.dataset, column = %c.target, parsed = c.parsed, missing = c.missing, "Normalized column has missing values");
            }
        }
        Ok(Normalized { table: out, report })
    }
}

/// Splits a designation such as "Tesla Model 3" into brand ("Tesla") and model
/// ("Model 3"). A single word has no model part.
pub fn split_name(table: &Table, source: &str, brand_target: &str, model_target: &str) -> Result<Table> {
    let (brands, models): (Vec<Value>, Vec<Value>) = table
        .column(source)?
        .map(|cell| match cell.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let mut parts = name.splitn(2, char::is_whitespace);
                let brand = parts.next().unwrap_or_default().to_string();
                let model = parts
                    .next()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(|m| Value::Text(m.to_string()))
                    .unwrap_or(Value::Missing);
                (Value::Text(brand), model)
            }
            _ => (Value::Missing, Value::Missing),
        })
        .unzip();
    Ok(table.with_column(brand_target, brands)?.with_column(model_target, models)?)
}

/// Derived numeric columns of the vehicle catalog.
pub fn vehicle_normalizer() -> Result<FieldNormalizer> {
    Ok(FieldNormalizer::new("vehicles")
        .field(FieldSpec::new(columns::RANGE, columns::RANGE_KM, NumericKind::Integer)?)
        .field(FieldSpec::new(columns::TOP_SPEED, columns::TOP_SPEED_KMH, NumericKind::Integer)?)
        .field(FieldSpec::new(columns::ACCEL, columns::ACCEL_SEC, NumericKind::Float)?)
        .field(FieldSpec::new(columns::EFFICIENCY, columns::EFFICIENCY_WH_KM, NumericKind::Float)?)
        .field(
            FieldSpec::new(columns::FAST_CHARGE, columns::FAST_CHARGE_KMH, NumericKind::Float)?
                .with_pattern(r"(\d+)")?
                .zero_when_missing(),
        ))
}

/// Derived numeric columns of the battery dataset; its figures use decimal commas.
pub fn battery_normalizer() -> Result<FieldNormalizer> {
    let comma = |source: &str, target: &str| -> Result<FieldSpec> {
        FieldSpec::new(source, target, NumericKind::Float)?.with_decimal_separator(',')
    };
    Ok(FieldNormalizer::new("battery")
        .field(comma(columns::CHARGING_POWER, columns::MAX_DC_POWER)?.with_pattern(r"DC:\s*(\d+(?:,\d+)?)")?)
        .field(comma(columns::WLTP_COMBINED, columns::WLTP_KWH_100KM)?)
        .field(comma(columns::ELECTRIC_RANGE, columns::ELECTRIC_RANGE)?)
        .field(comma(columns::NET_CAPACITY, columns::NET_CAPACITY)?)
        .field(comma(columns::GROSS_CAPACITY, columns::GROSS_CAPACITY)?)
        .field(comma(columns::POWER_KW, columns::POWER_KW)?)
        .ratio(columns::ELECTRIC_RANGE, columns::NET_CAPACITY, columns::RANGE_PER_KWH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn single_column(name: &str, cells: Vec<Value>) -> Table {
        Table::from_rows(vec![name.to_string()], cells.into_iter().map(|c| vec![c]).collect()).unwrap()
    }

    #[test]
    fn test_parse_range_with_unit() {
        let spec = FieldSpec::new("Range", "Range_km", NumericKind::Integer).unwrap();
        assert_eq!(spec.parse_cell(&text("320 km")), Ok(Value::Int(320)));
    }

    #[test]
    fn test_empty_is_missing_not_zero() {
        let spec = FieldSpec::new("Range", "Range_km", NumericKind::Integer).unwrap();
        assert_eq!(spec.parse_cell(&text("")), Err(FieldParseError::Empty));
        assert_eq!(spec.parse_cell(&Value::Missing), Err(FieldParseError::Empty));
        assert_eq!(spec.fallback(), Value::Missing);
    }

    #[test]
    fn test_numeric_cells_pass_through() {
        let spec = FieldSpec::new("Accel", "Accel_sec", NumericKind::Float).unwrap();
        assert_eq!(spec.parse_cell(&Value::Float(4.6)), Ok(Value::Float(4.6)));

        let int_spec = FieldSpec::new("Range", "Range_km", NumericKind::Integer).unwrap();
        assert_eq!(int_spec.parse_cell(&Value::Int(320)), Ok(Value::Int(320)));
        assert_eq!(int_spec.parse_cell(&Value::Float(320.5)), Err(FieldParseError::NotIntegral(320.5)));
    }

    #[test]
    fn test_normalizing_twice_is_idempotent() {
        let normalizer = FieldNormalizer::new("t")
            .field(FieldSpec::new("Range", "Range", NumericKind::Integer).unwrap());
        let table = single_column("Range", vec![text("320 km"), text("450"), Value::Missing]);
        let once = normalizer.apply(&table).unwrap().table;
        let twice = normalizer.apply(&once).unwrap().table;
        assert_eq!(once, twice);
        assert_eq!(once.column_f64("Range").unwrap(), vec![320.0, 450.0]);
    }

    #[test]
    fn test_dc_subpattern_ignores_ac_figure() {
        let spec = FieldSpec::new("Ladeleist", "dc", NumericKind::Float)
            .unwrap()
            .with_decimal_separator(',')
            .unwrap()
            .with_pattern(r"DC:\s*(\d+(?:,\d+)?)")
            .unwrap();
        assert_eq!(spec.parse_cell(&text("AC:11,0 DC:150,0")), Ok(Value::Float(150.0)));
        assert_eq!(spec.parse_cell(&text("AC:7,4 DC:50")), Ok(Value::Float(50.0)));
        assert_eq!(
            spec.parse_cell(&text("AC:11,0")),
            Err(FieldParseError::NoMatch("AC:11,0".to_string()))
        );
    }

    #[test]
    fn test_comma_decimal_with_trailing_unit() {
        let spec = FieldSpec::new("WLTP_komb", "wltp", NumericKind::Float)
            .unwrap()
            .with_decimal_separator(',')
            .unwrap();
        assert_eq!(spec.parse_cell(&text("14,9 kWh/100 km")), Ok(Value::Float(14.9)));
    }

    #[test]
    fn test_other_separator_is_rejected_not_rescaled() {
        let dot = FieldSpec::new("Accel", "Accel_sec", NumericKind::Float).unwrap();
        assert_eq!(dot.parse_cell(&text("4,6 sec")), Err(FieldParseError::Invalid("4".to_string())));
        assert_eq!(dot.parse_cell(&text("4.6 sec")), Ok(Value::Float(4.6)));

        let comma = FieldSpec::new("WLTP_komb", "wltp", NumericKind::Float)
            .unwrap()
            .with_decimal_separator(',')
            .unwrap();
        assert_eq!(comma.parse_cell(&text("14.9 kWh")), Err(FieldParseError::Invalid("14".to_string())));
        assert_eq!(comma.parse_cell(&text("1.234,5")), Err(FieldParseError::Invalid("1".to_string())));

        let normalizer = FieldNormalizer::new("t").field(comma);
        let table = single_column("WLTP_komb", vec![text("14.9 kWh"), text("14,9 kWh")]);
        let normalized = normalizer.apply(&table).unwrap();
        assert_eq!(normalized.table.row(0).unwrap().get("wltp"), Some(&Value::Missing));
        assert_eq!(normalized.table.row(1).unwrap().f64("wltp"), Some(14.9));
        let coverage = normalized.report.coverage("wltp").unwrap();
        assert_eq!((coverage.parsed, coverage.missing), (1, 1));
    }

    #[test]
    fn test_custom_pattern_survives_separator_change() {
        let spec = FieldSpec::new("Ladeleist", "dc", NumericKind::Float)
            .unwrap()
            .with_pattern(r"DC:\s*(\d+(?:,\d+)?)")
            .unwrap()
            .with_decimal_separator(',')
            .unwrap();
        assert_eq!(spec.parse_cell(&text("AC:11,0 DC:150,5")), Ok(Value::Float(150.5)));
    }

    #[test]
    fn test_fast_charge_absence_is_zero_capability() {
        let normalizer = vehicle_normalizer().unwrap();
        let table = Table::from_rows(
            ["Range", "TopSpeed", "Accel", "Efficiency", "FastCharge"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![
                vec![text("450 km"), text("233 km/h"), text("4.6 sec"), text("161 Wh/km"), text("940 km/h")],
                vec![text("135 km"), text("123 km/h"), text("12.3 sec"), text("167 Wh/km"), text("-")],
            ],
        )
        .unwrap();
        let normalized = normalizer.apply(&table).unwrap();
        let t = &normalized.table;
        assert_eq!(t.row(0).unwrap().get("Range_km"), Some(&Value::Int(450)));
        assert_eq!(t.row(0).unwrap().get("TopSpeed_kmh"), Some(&Value::Int(233)));
        assert_eq!(t.row(0).unwrap().get("Accel_sec"), Some(&Value::Float(4.6)));
        assert_eq!(t.row(0).unwrap().get("FastCharge_kmh"), Some(&Value::Float(940.0)));
        assert_eq!(t.row(1).unwrap().get("FastCharge_kmh"), Some(&Value::Float(0.0)));

        let coverage = normalized.report.coverage("FastCharge_kmh").unwrap();
        assert_eq!(coverage.parsed, 1);
        assert_eq!(coverage.zero_filled, 1);
        assert_eq!(coverage.missing, 0);
    }

    #[test]
    fn test_missing_source_column_fails_before_parsing() {
        let normalizer = vehicle_normalizer().unwrap();
        let table = single_column("Range", vec![text("320 km")]);
        match normalizer.apply(&table) {
            Err(EngineError::SchemaError { dataset, column }) => {
                assert_eq!(dataset, "vehicles");
                assert_eq!(column, "TopSpeed");
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_battery_ratio_and_sentinels() {
        let normalizer = battery_normalizer().unwrap();
        let table = Table::from_rows(
            [
                "Fahrzeug",
                "Ladeleist",
                "WLTP_komb",
                "Reichw_E_wert",
                "AntriebsbatterieKapazitaetNettoKwh",
                "AntriebsbatterieKapazitaetBruttoKwh",
                "LeistungKW",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            vec![
                vec![
                    text("Tesla Model 3"),
                    text("AC:11,0 DC:250,0"),
                    text("14,9 kWh/100 km"),
                    Value::Int(500),
                    text("62,5"),
                    Value::Int(60),
                    Value::Int(208),
                ],
                vec![
                    text("Dacia Spring"),
                    Value::Missing,
                    Value::Missing,
                    Value::Int(230),
                    Value::Missing,
                    text("26,8"),
                    Value::Int(33),
                ],
            ],
        )
        .unwrap();
        let normalized = normalizer.apply(&table).unwrap();
        let tesla = normalized.table.row(0).unwrap();
        assert_eq!(tesla.f64("Max_DC_Ladeleist"), Some(250.0));
        assert_eq!(tesla.f64("WLTP_komb_kWh100km"), Some(14.9));
        assert_eq!(tesla.f64("Efficiency_km_per_kWh"), Some(8.0));

        let spring = normalized.table.row(1).unwrap();
        assert_eq!(spring.get("Max_DC_Ladeleist"), Some(&Value::Missing));
        assert_eq!(spring.f64("AntriebsbatterieKapazitaetBruttoKwh"), Some(26.8));
        assert_eq!(spring.get("Efficiency_km_per_kWh"), Some(&Value::Missing));
        assert_eq!(normalized.report.coverage("Max_DC_Ladeleist").unwrap().missing, 1);
    }

    #[test]
    fn test_split_name() {
        let table = single_column("Fahrzeug", vec![text("Tesla Model 3"), text("Polestar"), Value::Missing]);
        let split = split_name(&table, "Fahrzeug", "Brand", "Model").unwrap();
        assert_eq!(split.row(0).unwrap().text("Brand"), Some("Tesla"));
        assert_eq!(split.row(0).unwrap().text("Model"), Some("Model 3"));
        assert_eq!(split.row(1).unwrap().text("Brand"), Some("Polestar"));
        assert_eq!(split.row(1).unwrap().get("Model"), Some(&Value::Missing));
        assert_eq!(split.row(2).unwrap().get("Brand"), Some(&Value::Missing));
    }
}
