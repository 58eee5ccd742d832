// Handler for the vehicle catalog page
use super::helpers::{coverage_notices, vehicle_points};
use crate::analysis::stats;
use crate::config::EngineSettings;
use crate::data::normalizer::{vehicle_normalizer, Normalized};
use crate::data::source_cache::SourceCache;
use crate::error::{EngineError, Result};
use crate::models::{columns, DatasetId};
use serde::{Deserialize, Serialize};
use shared::pages::{CatalogPage, TopModels};

/// Features the top-N ranking can be ordered by.
pub const RANKABLE_FEATURES: [&str; 5] = [
    columns::RANGE_KM,
    columns::FAST_CHARGE_KMH,
    columns::PRICE_EURO,
    columns::EFFICIENCY_WH_KM,
    columns::ACCEL_SEC,
];

const CORRELATED_FEATURES: [&str; 4] = [
    columns::PRICE_EURO,
    columns::ACCEL_SEC,
    columns::TOP_SPEED_KMH,
    columns::RANGE_KM,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub feature: Option<String>,
    pub top_n: Option<usize>,
}

/// Acceleration is measured in seconds, so smaller ranks higher.
pub fn lower_is_better(feature: &str) -> bool {
    feature == columns::ACCEL_SEC
}

pub fn normalized_vehicles(cache: &SourceCache) -> Result<Normalized> {
    let raw = cache.table(DatasetId::Vehicles)?;
    vehicle_normalizer()?.apply(&raw)
}

pub fn handle_catalog(cache: &SourceCache, settings: &EngineSettings, query: &CatalogQuery) -> Result<CatalogPage> {
    let feature = query.feature.as_deref().unwrap_or(columns::RANGE_KM);
    if !RANKABLE_FEATURES.contains(&feature) {
        return Err(EngineError::ConfigError(format!(
            "'{}' is not a rankable feature; choose one of {}",
            feature,
            RANKABLE_FEATURES.join(", ")
        )));
    }
    let n = settings.top_n.clamp(query.top_n.unwrap_or(settings.top_n.default));
    tracing::debug!(feature, n, "Rendering catalog page");

    let Normalized { table, report } = normalized_vehicles(cache)?;
    let notices = coverage_notices(DatasetId::Vehicles.name(), &report);
    let ascending = lower_is_better(feature);

    Ok(CatalogPage {
        rendered_at: chrono::Utc::now(),
        powertrain_distribution: stats::value_counts(&table, columns::POWER_TRAIN)?,
        body_style_prices: stats::group_mean(&table, columns::BODY_STYLE, columns::PRICE_EURO)?,
        performance_correlation: stats::correlation_matrix(&table, &CORRELATED_FEATURES)?,
        fast_charge_vs_range: vehicle_points(&table, columns::RANGE_KM, columns::FAST_CHARGE_KMH)?,
        top_models: TopModels {
            feature: feature.to_string(),
            ascending,
            entries: stats::top_n(&table, columns::BRAND, columns::MODEL, feature, n, ascending)?,
        },
        notices,
    })
}
