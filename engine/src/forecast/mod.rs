// Year -> value forecasting
pub mod linear;
pub mod random_forest;

pub use linear::{LinearFit, LinearTrend};
pub use random_forest::RandomForest;

use crate::config::settings::ForecastSettings;
use crate::error::{EngineError, Result};
use serde_json::Value;
use shared::models::{ForecastPoint, ForecastResult, ModelForecast};
use shared::TimeSeries;

// Common trait for all forecasting models. The year is the single real-valued
// feature; no seasonality is modelled.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this model instance
    fn predict(&self, series: &TimeSeries, years: &[i32]) -> Result<Vec<f64>>;
}

/// A series must span at least two distinct years before anything is fitted.
pub fn ensure_fittable(series: &TimeSeries) -> Result<()> {
    let distinct = series.distinct_years();
    if distinct < 2 {
        return Err(EngineError::InsufficientData(format!(
            "a forecast needs at least two distinct years, the series has {}",
            distinct
        )));
    }
    Ok(())
}

pub struct ForecastEngine {
    models: Vec<Box<dyn Forecaster>>,
}

impl ForecastEngine {
    /// Linear trend plus random forest, as configured.
    pub fn new(settings: &ForecastSettings) -> Self {
        Self::with_models(vec![
            Box::new(LinearTrend::new()),
            Box::new(RandomForest::new(settings.n_estimators, settings.seed)),
        ])
    }

    pub fn with_models(models: Vec<Box<dyn Forecaster>>) -> Self {
        ForecastEngine { models }
    }

    /// Predicts every integer year from the first observed year through
    /// `terminal_year` with each model independently. No attempt is made to
    /// reconcile models that disagree.
    pub fn forecast(&self, series: &TimeSeries, terminal_year: i32) -> Result<ForecastResult> {
        ensure_fittable(series)?;
        let first_year = series
            .min_year()
            .ok_or_else(|| EngineError::InsufficientData("empty series".to_string()))?;
        if terminal_year < first_year {
            return Err(EngineError::ConfigError(format!(
                "terminal year {} precedes the first observed year {}",
                terminal_year, first_year
            )));
        }
        let years: Vec<i32> = (first_year..=terminal_year).collect();

        let mut models = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let values = model.predict(series, &years)?;
            tracing::debug!(model = model.name(), points = values.len(), "Model forecast computed");
            models.push(ModelForecast {
                model: model.name().to_string(),
                parameters: model.parameters(),
                points: years
                    .iter()
                    .zip(values)
                    .map(|(&year, value)| ForecastPoint { year, value })
                    .collect(),
            });
        }

        tracing::info!(
            observed = series.len(),
            first_year,
            terminal_year,
            models = models.len(),
            "Forecast complete"
        );
        Ok(ForecastResult {
            first_year,
            terminal_year,
            models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ForecastSettings {
        ForecastSettings {
            region: "World".to_string(),
            parameter: "EV sales".to_string(),
            terminal_year: 2030,
            n_estimators: 50,
            seed: 42,
        }
    }

    fn linear_series() -> TimeSeries {
        TimeSeries::from_points(vec![(2015, 1.0), (2016, 2.0), (2017, 3.0), (2018, 4.0)]).unwrap()
    }

    #[test]
    fn test_linear_reaches_sixteen_in_2030() {
        let result = ForecastEngine::new(&settings()).forecast(&linear_series(), 2030).unwrap();
        let linear = result.model("linear_regression").unwrap();
        assert_eq!(linear.points.first(), Some(&ForecastPoint { year: 2015, value: 1.0 }));
        assert_eq!(linear.points.last(), Some(&ForecastPoint { year: 2030, value: 16.0 }));
        assert_eq!(linear.points.len(), 16);
    }

    #[test]
    fn test_both_models_cover_the_same_years() {
        let result = ForecastEngine::new(&settings()).forecast(&linear_series(), 2030).unwrap();
        assert_eq!(result.models.len(), 2);
        let years = |m: &ModelForecast| m.points.iter().map(|p| p.year).collect::<Vec<_>>();
        assert_eq!(years(&result.models[0]), years(&result.models[1]));
        assert_eq!(result.first_year, 2015);
        assert_eq!(result.terminal_year, 2030);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let engine = ForecastEngine::new(&settings());
        let a = engine.forecast(&linear_series(), 2030).unwrap();
        let b = engine.forecast(&linear_series(), 2030).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_or_one_year_is_insufficient() {
        let engine = ForecastEngine::new(&settings());
        let empty = TimeSeries::default();
        let single = TimeSeries::from_points(vec![(2020, 5.0)]).unwrap();
        assert!(matches!(engine.forecast(&empty, 2030), Err(EngineError::InsufficientData(_))));
        assert!(matches!(engine.forecast(&single, 2030), Err(EngineError::InsufficientData(_))));
    }

    #[test]
    fn test_terminal_year_before_data_is_config_error() {
        let engine = ForecastEngine::new(&settings());
        assert!(matches!(
            engine.forecast(&linear_series(), 2010),
            Err(EngineError::ConfigError(_))
        ));
    }
}
