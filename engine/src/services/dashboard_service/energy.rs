// Handler for the electricity demand page
use super::helpers::{correlation_summary, parameter_rows, per_region_year, region_series, sorted_unique};
use crate::config::EngineSettings;
use crate::data::merger::inner_join;
use crate::data::source_cache::SourceCache;
use crate::error::Result;
use crate::models::{columns, DatasetId};
use shared::pages::EnergyPage;

const DEMAND: &str = "Electricity demand";
const STOCK: &str = "EV stock";
const DEMAND_COLUMN: &str = "electricity_demand";
const STOCK_COLUMN: &str = "ev_stock";

pub fn handle_energy(cache: &SourceCache, settings: &EngineSettings) -> Result<EnergyPage> {
    let projection = cache.table(DatasetId::ElectricityProjection)?;
    let historical = cache.table(DatasetId::ElectricityHistorical)?;
    let mut notices = Vec::new();

    // Each side is reduced to one row per (region, year) before the join.
    let demand = per_region_year(
        &parameter_rows(&projection, DEMAND),
        DatasetId::ElectricityProjection.name(),
        settings.aggregation_for(DEMAND)?,
    )?;
    let stock = per_region_year(
        &parameter_rows(&historical, STOCK),
        DatasetId::ElectricityHistorical.name(),
        settings.aggregation_for(STOCK)?,
    )?;
    let merged = inner_join(
        &demand.rename(columns::VALUE, DEMAND_COLUMN)?,
        &stock.rename(columns::VALUE, STOCK_COLUMN)?,
        &[columns::REGION, columns::YEAR],
        ("_demand", "_stock"),
    )?;
    tracing::debug!(demand = demand.len(), stock = stock.len(), merged = merged.len(), "Demand and stock joined");
    let demand_vs_stock = correlation_summary(&merged, STOCK_COLUMN, DEMAND_COLUMN, Some(columns::REGION), &mut notices)?;

    let regions = sorted_unique(&demand, columns::REGION)?;
    let demand_trends = region_series(&demand, &regions, |region| region.to_string(), &mut notices)?;

    Ok(EnergyPage {
        rendered_at: chrono::Utc::now(),
        demand_vs_stock,
        demand_trends,
        notices,
    })
}
