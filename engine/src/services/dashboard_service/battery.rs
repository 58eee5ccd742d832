// Handler for the battery and charging characteristics page
use super::helpers::{coverage_notices, scatter};
use crate::analysis::stats::mean;
use crate::data::normalizer::{battery_normalizer, split_name};
use crate::data::source_cache::SourceCache;
use crate::error::Result;
use crate::models::{columns, DatasetId};
use shared::pages::{BatteryAverages, BatteryPage};

pub fn handle_battery(cache: &SourceCache) -> Result<BatteryPage> {
    let raw = cache.table(DatasetId::Battery)?;
    let normalized = battery_normalizer()?.apply(&raw)?;
    let notices = coverage_notices(DatasetId::Battery.name(), &normalized.report);
    let table = split_name(&normalized.table, columns::VEHICLE_NAME, columns::BRAND, columns::MODEL)?;

    let gross = table.column_f64(columns::GROSS_CAPACITY)?;
    let net = table.column_f64(columns::NET_CAPACITY)?;
    let wltp = table.column_f64(columns::WLTP_KWH_100KM)?;
    let brand = Some(columns::BRAND);

    Ok(BatteryPage {
        rendered_at: chrono::Utc::now(),
        dc_charging_power_kw: table.column_f64(columns::MAX_DC_POWER)?,
        gross_capacity_vs_range: scatter(&table, columns::GROSS_CAPACITY, columns::ELECTRIC_RANGE, brand)?,
        net_capacity_vs_range: scatter(&table, columns::NET_CAPACITY, columns::ELECTRIC_RANGE, brand)?,
        range_vs_power: scatter(&table, columns::ELECTRIC_RANGE, columns::POWER_KW, brand)?,
        averages: BatteryAverages {
            gross_capacity_kwh: mean(&gross),
            net_capacity_kwh: mean(&net),
            wltp_kwh_per_100km: mean(&wltp),
        },
        wltp_consumption: wltp,
        notices,
    })
}
