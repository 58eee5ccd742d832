// Handler for the charging infrastructure page
use super::helpers::{correlation_summary, in_region, named, parameter_rows, per_region_year, since_year, sorted_unique, yearly_series};
use crate::config::EngineSettings;
use crate::data::merger::{concat, inner_join};
use crate::data::source_cache::SourceCache;
use crate::error::Result;
use crate::models::{columns, DatasetId};
use serde::{Deserialize, Serialize};
use shared::pages::{ChargingPage, PageNotice};
use shared::TimeSeries;

const CHARGING_POINTS: &str = "EV charging points";
const SALES: &str = "EV sales";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargingQuery {
    pub region: Option<String>,
}

pub fn handle_charging(cache: &SourceCache, settings: &EngineSettings, query: &ChargingQuery) -> Result<ChargingPage> {
    let first_year = settings.charging.start_year;
    let historical = cache.table(DatasetId::ChargingHistorical)?;
    let projection = cache.table(DatasetId::ChargingProjection)?;
    let history = cache.table(DatasetId::EvHistory)?;
    let mut notices = Vec::new();

    // Projection rows continue the historical ones; both are counted.
    let chargers = since_year(
        &parameter_rows(&concat(&[historical.as_ref(), projection.as_ref()])?, CHARGING_POINTS),
        first_year,
    );
    let charger_fn = settings.aggregation_for(CHARGING_POINTS)?;
    let chargers_by_region = per_region_year(&chargers, DatasetId::ChargingHistorical.name(), charger_fn)?;

    let global_region = &settings.charging.default_region;
    let global = yearly_series(&in_region(&chargers, global_region), DatasetId::ChargingHistorical.name(), charger_fn)?;

    let regions = sorted_unique(&chargers_by_region, columns::REGION)?;
    let selected = query.region.as_deref().unwrap_or(global_region);
    let region_trend = if regions.iter().any(|r| r == selected) {
        let series = TimeSeries::from_table(&in_region(&chargers_by_region, selected), columns::YEAR, columns::VALUE)?;
        Some(named(selected, &series))
    } else {
        notices.push(PageNotice::warning(format!("no charging data for region '{}'", selected)));
        None
    };

    let sales = since_year(&parameter_rows(&history, SALES), first_year);
    let sales_by_region = per_region_year(&sales, DatasetId::EvHistory.name(), settings.aggregation_for(SALES)?)?;
    let merged = inner_join(
        &sales_by_region,
        &chargers_by_region,
        &[columns::REGION, columns::YEAR],
        ("_sales", "_chargers"),
    )?;
    tracing::debug!(rows = merged.len(), "Sales and charger counts joined");
    let sales_vs_chargers = correlation_summary(
        &merged,
        "value_chargers",
        "value_sales",
        Some(columns::REGION),
        &mut notices,
    )?;

    Ok(ChargingPage {
        rendered_at: chrono::Utc::now(),
        global_trend: named(global_region.as_str(), &global),
        regions,
        region_trend,
        sales_vs_chargers,
        notices,
    })
}
