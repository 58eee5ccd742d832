// Building blocks shared by the page handlers
use crate::analysis::stats;
use crate::data::merger::{aggregate, AggregateSpec, Aggregation};
use crate::data::normalizer::NormalizationReport;
use crate::error::{EngineError, Result};
use crate::forecast::LinearFit;
use crate::models::columns;
use shared::pages::{CorrelationSummary, NamedSeries, PageNotice, ScatterPoint, VehiclePoint};
use shared::{Table, TimeSeries};

/// Turns a recoverable failure into a page notice. Anything else propagates.
pub fn recover<T>(result: Result<T>, notices: &mut Vec<PageNotice>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "Page section omitted");
            notices.push(PageNotice::warning(e.to_string()));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn coverage_notices(dataset: &str, report: &NormalizationReport) -> Vec<PageNotice> {
    report
        .columns
        .iter()
        .filter(|c| c.missing > 0 || c.zero_filled > 0)
        .map(|c| {
            PageNotice::info(format!(
                "{}: {} of {} values in '{}' could not be read ({} set to zero)",
                dataset,
                c.missing + c.zero_filled,
                c.parsed + c.missing + c.zero_filled,
                c.target,
                c.zero_filled
            ))
        })
        .collect()
}

/// Rows of an IEA table for one `parameter`.
pub fn parameter_rows(table: &Table, parameter: &str) -> Table {
    table.filter(|row| row.text(columns::PARAMETER) == Some(parameter))
}

pub fn since_year(table: &Table, first_year: i32) -> Table {
    table.filter(|row| {
        row.get(columns::YEAR)
            .and_then(|v| v.as_i64())
            .is_some_and(|year| year >= i64::from(first_year))
    })
}

pub fn in_region(table: &Table, region: &str) -> Table {
    table.filter(|row| row.text(columns::REGION) == Some(region))
}

/// One `value` per (region, year), reduced with `function`.
pub fn per_region_year(table: &Table, dataset: &str, function: Aggregation) -> Result<Table> {
    aggregate(
        table,
        dataset,
        &[columns::REGION, columns::YEAR],
        &[AggregateSpec::new(columns::VALUE, function)],
    )
}

/// One `value` per year, reduced with `function`.
pub fn yearly_series(table: &Table, dataset: &str, function: Aggregation) -> Result<TimeSeries> {
    let yearly = aggregate(
        table,
        dataset,
        &[columns::YEAR],
        &[AggregateSpec::new(columns::VALUE, function)],
    )?;
    Ok(TimeSeries::from_table(&yearly, columns::YEAR, columns::VALUE)?)
}

pub fn named(label: impl Into<String>, series: &TimeSeries) -> NamedSeries {
    NamedSeries {
        label: label.into(),
        points: series.points().to_vec(),
    }
}

/// Splits an aggregated (region, year, value) table into one series per region,
/// in the order given. Regions without data are skipped and reported.
pub fn region_series<S: AsRef<str>>(
    aggregated: &Table,
    regions: &[S],
    label: impl Fn(&str) -> String,
    notices: &mut Vec<PageNotice>,
) -> Result<Vec<NamedSeries>> {
    let mut out = Vec::with_capacity(regions.len());
    for region in regions {
        let region = region.as_ref();
        let series = TimeSeries::from_table(&in_region(aggregated, region), columns::YEAR, columns::VALUE)?;
        if series.is_empty() {
            notices.push(PageNotice::info(format!("no data for region '{}'", region)));
            continue;
        }
        out.push(named(label(region), &series));
    }
    Ok(out)
}

/// Distinct text values of a column, sorted.
pub fn sorted_unique(table: &Table, column: &str) -> Result<Vec<String>> {
    let mut values = table.unique_text(column)?;
    values.sort();
    Ok(values)
}

pub fn vehicle_points(table: &Table, x: &str, y: &str) -> Result<Vec<VehiclePoint>> {
    if let Some(column) = table.missing_columns(&[columns::BRAND, columns::MODEL, x, y]).into_iter().next() {
        return Err(EngineError::schema("vehicles", column));
    }
    Ok(table
        .rows()
        .filter_map(|row| {
            Some(VehiclePoint {
                brand: row.text(columns::BRAND)?.to_string(),
                model: row.text(columns::MODEL)?.to_string(),
                x: row.f64(x)?,
                y: row.f64(y)?,
            })
        })
        .collect())
}

pub fn scatter(table: &Table, x: &str, y: &str, label: Option<&str>) -> Result<Vec<ScatterPoint>> {
    if let Some(column) = table.missing_columns(&[x, y]).into_iter().next() {
        return Err(EngineError::schema("table", column));
    }
    Ok(table
        .rows()
        .filter_map(|row| {
            Some(ScatterPoint {
                x: row.f64(x)?,
                y: row.f64(y)?,
                label: label.and_then(|l| row.get(l)).and_then(|v| v.as_key()).map(|k| k.to_string()),
            })
        })
        .collect())
}

/// Scatter points with Pearson's r and a least-squares trend line, each left
/// out (with a notice) when the data cannot support it.
pub fn correlation_summary(
    table: &Table,
    x: &str,
    y: &str,
    label: Option<&str>,
    notices: &mut Vec<PageNotice>,
) -> Result<CorrelationSummary> {
    let points = scatter(table, x, y, label)?;
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

    let pearson = recover(stats::pearson(&xs, &ys), notices)?;
    let trend = match LinearFit::fit(&xs, &ys) {
        Ok(fit) => Some(fit.to_trend_line()),
        Err(e) if e.is_recoverable() => None,
        Err(e) => return Err(e),
    };
    Ok(CorrelationSummary {
        x_label: x.to_string(),
        y_label: y.to_string(),
        points,
        pearson,
        trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Value;

    fn iea(rows: &[(&str, &str, i64, f64)]) -> Table {
        Table::from_rows(
            vec!["region".into(), "parameter".into(), "year".into(), "value".into()],
            rows.iter()
                .map(|(r, p, y, v)| vec![Value::from(*r), Value::from(*p), Value::Int(*y), Value::Float(*v)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_yearly_series_sums_duplicates() {
        let table = iea(&[("World", "EV sales", 2020, 1.0), ("World", "EV sales", 2020, 2.0), ("World", "EV sales", 2021, 4.0)]);
        let series = yearly_series(&table, "ev_history", Aggregation::Sum).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].value, 3.0);
    }

    #[test]
    fn test_region_series_reports_absent_regions() {
        let table = iea(&[("China", "EV sales", 2020, 1.0), ("USA", "EV sales", 2020, 2.0)]);
        let aggregated = per_region_year(&table, "ev_history", Aggregation::Sum).unwrap();
        let mut notices = Vec::new();
        let series = region_series(&aggregated, &["USA", "Mars", "China"], |r| r.to_string(), &mut notices).unwrap();
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["USA", "China"]);
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn test_since_year_and_parameter_filters() {
        let table = iea(&[("World", "EV sales", 2009, 1.0), ("World", "EV sales", 2010, 2.0), ("World", "EV stock", 2012, 3.0)]);
        let filtered = since_year(&parameter_rows(&table, "EV sales"), 2010);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_correlation_summary_with_single_point() {
        let table = iea(&[("World", "x", 2020, 1.0)]);
        let mut notices = Vec::new();
        let summary = correlation_summary(&table, "year", "value", Some("region"), &mut notices).unwrap();
        assert_eq!(summary.points.len(), 1);
        assert_eq!(summary.points[0].label.as_deref(), Some("World"));
        assert_eq!(summary.pearson, None);
        assert_eq!(summary.trend, None);
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn test_recover_passes_hard_errors_through() {
        let mut notices = Vec::new();
        let hard: Result<()> = Err(EngineError::ConfigError("bad".to_string()));
        assert!(recover(hard, &mut notices).is_err());
        assert!(notices.is_empty());
    }
}
