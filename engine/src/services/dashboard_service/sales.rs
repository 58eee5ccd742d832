// Handler for the EV sales page: market shares, sales by powertrain and the
// global sales forecast.
use super::helpers::{in_region, named, parameter_rows, per_region_year, recover, region_series, sorted_unique, yearly_series};
use crate::config::EngineSettings;
use crate::data::source_cache::SourceCache;
use crate::error::{EngineError, Result};
use crate::forecast::ForecastEngine;
use crate::models::{columns, DatasetId};
use serde::{Deserialize, Serialize};
use shared::pages::{NamedSeries, PageNotice, SalesPage};
use shared::Table;

pub const ALL_POWERTRAINS: &str = "All";
const SALES: &str = "EV sales";
const SALES_SHARE: &str = "EV sales share";
const STOCK_SHARE: &str = "EV stock share";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesQuery {
    /// `None` or "All" compares every configured powertrain worldwide.
    pub powertrain: Option<String>,
}

fn share_series(
    history: &Table,
    settings: &EngineSettings,
    parameter: &str,
    notices: &mut Vec<PageNotice>,
) -> Result<Vec<NamedSeries>> {
    let function = settings.aggregation_for(parameter)?;
    let aggregated = per_region_year(&parameter_rows(history, parameter), DatasetId::EvHistory.name(), function)?;
    region_series(&aggregated, &settings.regions_of_interest, |region| region.to_string(), notices)
}

fn sales_by_powertrain(
    history: &Table,
    settings: &EngineSettings,
    powertrain: &str,
    notices: &mut Vec<PageNotice>,
) -> Result<Vec<NamedSeries>> {
    let dataset = DatasetId::EvHistory.name();
    let function = settings.aggregation_for(SALES)?;
    let sales = parameter_rows(history, SALES);

    if powertrain == ALL_POWERTRAINS {
        let world = in_region(&sales, &settings.forecast.region);
        let mut out = Vec::with_capacity(settings.powertrains.len());
        for pt in &settings.powertrains {
            let rows = world.filter(|row| row.text(columns::POWERTRAIN) == Some(pt.as_str()));
            out.push(named(pt.as_str(), &yearly_series(&rows, dataset, function)?));
        }
        return Ok(out);
    }

    if !settings.powertrains.iter().any(|p| p == powertrain) {
        return Err(EngineError::ConfigError(format!(
            "unknown powertrain '{}'; expected {} or one of {}",
            powertrain,
            ALL_POWERTRAINS,
            settings.powertrains.join(", ")
        )));
    }
    let rows = sales.filter(|row| row.text(columns::POWERTRAIN) == Some(powertrain));
    let regions = sorted_unique(&rows, columns::REGION)?;
    let aggregated = per_region_year(&rows, dataset, function)?;
    region_series(&aggregated, &regions, |region| format!("{} - {}", region, powertrain), notices)
}

pub fn handle_sales(cache: &SourceCache, settings: &EngineSettings, query: &SalesQuery) -> Result<SalesPage> {
    let history = cache.table(DatasetId::EvHistory)?;
    let powertrain = query.powertrain.as_deref().unwrap_or(ALL_POWERTRAINS);
    let mut notices = Vec::new();

    let sales_share = share_series(&history, settings, SALES_SHARE, &mut notices)?;
    let stock_share = share_series(&history, settings, STOCK_SHARE, &mut notices)?;
    let by_powertrain = sales_by_powertrain(&history, settings, powertrain, &mut notices)?;

    let target = &settings.forecast;
    let observed = yearly_series(
        &in_region(&parameter_rows(&history, &target.parameter), &target.region),
        DatasetId::EvHistory.name(),
        settings.aggregation_for(&target.parameter)?,
    )?;
    let forecast = recover(
        ForecastEngine::new(target).forecast(&observed, target.terminal_year),
        &mut notices,
    )?;

    Ok(SalesPage {
        rendered_at: chrono::Utc::now(),
        sales_share,
        stock_share,
        powertrain: powertrain.to_string(),
        sales_by_powertrain: by_powertrain,
        forecast,
        notices,
    })
}
