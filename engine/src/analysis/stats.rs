// Descriptive statistics over table columns. Missing cells never count as zero.
use crate::error::{EngineError, Result};
use shared::pages::{CorrelationMatrix, LabelCount, LabelValue, RankedVehicle};
use shared::Table;
use std::collections::BTreeMap;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation of paired observations.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(EngineError::ProcessingError(format!(
            "cannot correlate {} values against {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(EngineError::InsufficientData(format!(
            "correlation needs at least two pairs, got {}",
            xs.len()
        )));
    }
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - x_mean, y - y_mean);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(EngineError::InsufficientData(
            "correlation is undefined for a constant column".to_string(),
        ));
    }
    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Rows where both columns are numeric, as parallel vectors.
pub fn complete_pairs(table: &Table, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    for column in [x, y] {
        if !table.has_column(column) {
            return Err(EngineError::schema("table", column));
        }
    }
    Ok(table
        .rows()
        .filter_map(|row| Some((row.f64(x)?, row.f64(y)?)))
        .unzip())
}

/// Pairwise-complete correlation matrix; cells that cannot be computed are `None`.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<CorrelationMatrix> {
    let mut values = vec![vec![None; columns.len()]; columns.len()];
    for (i, a) in columns.iter().enumerate() {
        for (j, b) in columns.iter().enumerate().skip(i) {
            let (xs, ys) = complete_pairs(table, a, b)?;
            let r = match pearson(&xs, &ys) {
                Ok(r) => Some(r),
                Err(e) if e.is_recoverable() => None,
                Err(e) => return Err(e),
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// Occurrences of each text label, most frequent first, ties by label.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<LabelCount>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in table.column(column)? {
        if let Some(label) = value.as_key() {
            *counts.entry(label.to_string()).or_default() += 1;
        }
    }
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    Ok(out)
}

/// Mean of `value` per distinct `group`, sorted by group label.
pub fn group_mean(table: &Table, group: &str, value: &str) -> Result<Vec<LabelValue>> {
    if let Some(column) = table.missing_columns(&[group, value]).into_iter().next() {
        return Err(EngineError::schema("table", column));
    }
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let (Some(label), Some(v)) = (row.get(group).and_then(|g| g.as_key()), row.f64(value)) else {
            continue;
        };
        let entry = groups.entry(label.to_string()).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    Ok(groups
        .into_iter()
        .map(|(label, (sum, n))| LabelValue {
            label,
            value: sum / n as f64,
        })
        .collect())
}

/// The `n` best vehicles by `feature`. Lower is better when `ascending`.
/// Rows with a missing feature are excluded; equal values keep table order.
pub fn top_n(
    table: &Table,
    brand: &str,
    model: &str,
    feature: &str,
    n: usize,
    ascending: bool,
) -> Result<Vec<RankedVehicle>> {
    let missing = table.missing_columns(&[brand, model, feature]);
    if let Some(column) = missing.into_iter().next() {
        return Err(EngineError::schema("table", column));
    }
    let mut ranked: Vec<RankedVehicle> = table
        .rows()
        .filter_map(|row| {
            Some(RankedVehicle {
                brand: row.text(brand)?.to_string(),
                model: row.text(model)?.to_string(),
                value: row.f64(feature)?,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        let order = a.value.total_cmp(&b.value);
        if ascending {
            order
        } else {
            order.reverse()
        }
    });
    ranked.truncate(n);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Value;

    fn cars() -> Table {
        Table::from_rows(
            vec!["Brand".into(), "Model".into(), "PowerTrain".into(), "Accel_sec".into(), "PriceEuro".into()],
            vec![
                vec!["Tesla".into(), "Model 3".into(), "AWD".into(), Value::Float(4.6), Value::Int(55480)],
                vec!["Nissan".into(), "Leaf".into(), "FWD".into(), Value::Float(7.9), Value::Int(29234)],
                vec!["Porsche".into(), "Taycan".into(), "AWD".into(), Value::Float(2.8), Value::Int(180781)],
                vec!["Renault".into(), "Zoe".into(), "FWD".into(), Value::Missing, Value::Int(31184)],
                vec!["Smart".into(), "EQ".into(), "RWD".into(), Value::Float(11.6), Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_insufficient() {
        assert!(matches!(pearson(&[1.0], &[1.0]), Err(EngineError::InsufficientData(_))));
        assert!(matches!(
            pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_correlation_matrix_is_symmetric_with_unit_diagonal() {
        let matrix = correlation_matrix(&cars(), &["Accel_sec", "PriceEuro"]).unwrap();
        assert_eq!(matrix.columns, vec!["Accel_sec", "PriceEuro"]);
        assert!((matrix.values[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix.values[0][1], matrix.values[1][0]);
        // faster cars are pricier
        assert!(matrix.values[0][1].unwrap() < 0.0);
    }

    #[test]
    fn test_value_counts_sorted() {
        let counts = value_counts(&cars(), "PowerTrain").unwrap();
        let labels: Vec<(&str, usize)> = counts.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(labels, vec![("AWD", 2), ("FWD", 2), ("RWD", 1)]);
    }

    #[test]
    fn test_group_mean_skips_missing() {
        let means = group_mean(&cars(), "PowerTrain", "PriceEuro").unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].label, "AWD");
        assert_eq!(means[0].value, (55480.0 + 180781.0) / 2.0);
        assert_eq!(means[1].value, (29234.0 + 31184.0) / 2.0);
    }

    #[test]
    fn test_group_mean_unknown_column() {
        assert!(matches!(
            group_mean(&cars(), "BodyStyle", "PriceEuro"),
            Err(EngineError::SchemaError { .. })
        ));
    }

    #[test]
    fn test_top_n_ascending_for_lower_is_better() {
        let fastest = top_n(&cars(), "Brand", "Model", "Accel_sec", 2, true).unwrap();
        assert_eq!(fastest[0].model, "Taycan");
        assert_eq!(fastest[1].model, "Model 3");
    }

    #[test]
    fn test_top_n_excludes_missing_and_truncates() {
        let priciest = top_n(&cars(), "Brand", "Model", "PriceEuro", 10, false).unwrap();
        assert_eq!(priciest.len(), 4);
        assert_eq!(priciest[0].brand, "Porsche");
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }
}
