// Prepared page payloads handed to the presentation layer. Everything here is
// plain data; charts are drawn from these values without further computation.

use crate::models::{ForecastResult, SeriesPoint, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Something the user should be told about while the rest of the page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl PageNotice {
    pub fn info(message: impl Into<String>) -> Self {
        PageNotice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        PageNotice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelValue {
    pub label: String,
    pub value: f64,
}

/// Square matrix; `None` where a pair had too little data to correlate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePoint {
    pub brand: String,
    pub model: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVehicle {
    pub brand: String,
    pub model: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

/// Scatter data plus whatever statistics could be computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
    pub pearson: Option<f64>,
    pub trend: Option<TrendLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopModels {
    pub feature: String,
    pub ascending: bool,
    pub entries: Vec<RankedVehicle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub rendered_at: DateTime<Utc>,
    pub powertrain_distribution: Vec<LabelCount>,
    pub body_style_prices: Vec<LabelValue>,
    pub performance_correlation: CorrelationMatrix,
    pub fast_charge_vs_range: Vec<VehiclePoint>,
    pub top_models: TopModels,
    pub notices: Vec<PageNotice>,
}

/// Filter results; an empty match is a valid state with its own message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BrowseOutcome {
    Found { count: usize, vehicles: Table },
    Empty { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub brand: String,
    pub model: String,
    pub range_km: f64,
    pub price_euro: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserPage {
    pub rendered_at: DateTime<Utc>,
    pub outcome: BrowseOutcome,
    pub price_vs_range: Vec<VehiclePoint>,
    pub brands: Vec<String>,
    pub models_for_brand: Vec<String>,
    pub selected_model: Option<Table>,
    pub recommendations: Vec<Recommendation>,
    pub notices: Vec<PageNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryAverages {
    pub gross_capacity_kwh: Option<f64>,
    pub net_capacity_kwh: Option<f64>,
    pub wltp_kwh_per_100km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryPage {
    pub rendered_at: DateTime<Utc>,
    pub dc_charging_power_kw: Vec<f64>,
    pub gross_capacity_vs_range: Vec<ScatterPoint>,
    pub net_capacity_vs_range: Vec<ScatterPoint>,
    pub wltp_consumption: Vec<f64>,
    pub range_vs_power: Vec<ScatterPoint>,
    pub averages: BatteryAverages,
    pub notices: Vec<PageNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPage {
    pub rendered_at: DateTime<Utc>,
    pub sales_share: Vec<NamedSeries>,
    pub stock_share: Vec<NamedSeries>,
    pub powertrain: String,
    pub sales_by_powertrain: Vec<NamedSeries>,
    pub forecast: Option<ForecastResult>,
    pub notices: Vec<PageNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingPage {
    pub rendered_at: DateTime<Utc>,
    pub global_trend: NamedSeries,
    pub regions: Vec<String>,
    pub region_trend: Option<NamedSeries>,
    pub sales_vs_chargers: CorrelationSummary,
    pub notices: Vec<PageNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPage {
    pub rendered_at: DateTime<Utc>,
    pub demand_vs_stock: CorrelationSummary,
    pub demand_trends: Vec<NamedSeries>,
    pub notices: Vec<PageNotice>,
}
