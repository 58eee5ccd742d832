use super::{ensure_fittable, Forecaster};
use crate::error::{EngineError, Result};
use serde_json::{json, Value};
use shared::pages::TrendLine;
use shared::TimeSeries;

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(EngineError::ProcessingError(format!(
                "cannot fit {} x values against {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(EngineError::InsufficientData(
                "a linear fit needs at least two points".to_string(),
            ));
        }

        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;
        let (mut sxx, mut sxy) = (0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - x_mean;
            sxx += dx * dx;
            sxy += dx * (y - y_mean);
        }
        if sxx == 0.0 {
            return Err(EngineError::InsufficientData(
                "all x values are identical".to_string(),
            ));
        }

        let slope = sxy / sxx;
        Ok(LinearFit {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn to_trend_line(self) -> TrendLine {
        TrendLine {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinearTrend {
    name: String,
}

impl LinearTrend {
    pub fn new() -> Self {
        LinearTrend {
            name: "linear_regression".to_string(),
        }
    }
}

impl Default for LinearTrend {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for LinearTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        json!({ "method": "ordinary_least_squares" })
    }

    fn predict(&self, series: &TimeSeries, years: &[i32]) -> Result<Vec<f64>> {
        ensure_fittable(series)?;
        let xs: Vec<f64> = series.points().iter().map(|p| p.year as f64).collect();
        let ys: Vec<f64> = series.points().iter().map(|p| p.value).collect();
        let fit = LinearFit::fit(&xs, &ys)?;
        Ok(years.iter().map(|&year| fit.predict(year as f64)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_perfect_line() {
        let fit = LinearFit::fit(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_noisy_points() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0, 3.0], &[0.5, 0.5, 2.5, 2.5]).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_data_cannot_be_fitted() {
        let result = LinearFit::fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(EngineError::InsufficientData(_))));
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(LinearFit::fit(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_trend_extrapolates_years() {
        let series = TimeSeries::from_points(vec![(2015, 1.0), (2016, 2.0), (2017, 3.0), (2018, 4.0)]).unwrap();
        let values = LinearTrend::new().predict(&series, &[2019, 2030]).unwrap();
        assert_eq!(values, vec![5.0, 16.0]);
    }

    #[test]
    fn test_trend_line_carries_coefficients() {
        let line = LinearFit { slope: 1.5, intercept: -2.0 }.to_trend_line();
        assert_eq!(line.slope, 1.5);
        assert_eq!(line.intercept, -2.0);
    }
}
