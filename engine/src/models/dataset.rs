use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names as they appear in the source files.
pub mod columns {
    pub const REGION: &str = "region";
    pub const PARAMETER: &str = "parameter";
    pub const POWERTRAIN: &str = "powertrain";
    pub const YEAR: &str = "year";
    pub const VALUE: &str = "value";

    pub const BRAND: &str = "Brand";
    pub const MODEL: &str = "Model";
    pub const ACCEL: &str = "Accel";
    pub const TOP_SPEED: &str = "TopSpeed";
    pub const RANGE: &str = "Range";
    pub const EFFICIENCY: &str = "Efficiency";
    pub const FAST_CHARGE: &str = "FastCharge";
    pub const RAPID_CHARGE: &str = "RapidCharge";
    pub const POWER_TRAIN: &str = "PowerTrain";
    pub const BODY_STYLE: &str = "BodyStyle";
    pub const SEATS: &str = "Seats";
    pub const PRICE_EURO: &str = "PriceEuro";

    pub const VEHICLE_NAME: &str = "Fahrzeug";
    pub const CHARGING_POWER: &str = "Ladeleist";
    pub const WLTP_COMBINED: &str = "WLTP_komb";
    pub const ELECTRIC_RANGE: &str = "Reichw_E_wert";
    pub const NET_CAPACITY: &str = "AntriebsbatterieKapazitaetNettoKwh";
    pub const GROSS_CAPACITY: &str = "AntriebsbatterieKapazitaetBruttoKwh";
    pub const POWER_KW: &str = "LeistungKW";

    // Derived by the normalizer.
    pub const RANGE_KM: &str = "Range_km";
    pub const TOP_SPEED_KMH: &str = "TopSpeed_kmh";
    pub const ACCEL_SEC: &str = "Accel_sec";
    pub const EFFICIENCY_WH_KM: &str = "Efficiency_Wh_km";
    pub const FAST_CHARGE_KMH: &str = "FastCharge_kmh";
    pub const MAX_DC_POWER: &str = "Max_DC_Ladeleist";
    pub const WLTP_KWH_100KM: &str = "WLTP_komb_kWh100km";
    pub const RANGE_PER_KWH: &str = "Efficiency_km_per_kWh";
}

const IEA_COLUMNS: &[&str] = &[
    columns::REGION,
    columns::PARAMETER,
    columns::POWERTRAIN,
    columns::YEAR,
    columns::VALUE,
];

const VEHICLE_COLUMNS: &[&str] = &[
    columns::BRAND,
    columns::MODEL,
    columns::ACCEL,
    columns::TOP_SPEED,
    columns::RANGE,
    columns::EFFICIENCY,
    columns::FAST_CHARGE,
    columns::RAPID_CHARGE,
    columns::POWER_TRAIN,
    columns::BODY_STYLE,
    columns::SEATS,
    columns::PRICE_EURO,
];

const BATTERY_COLUMNS: &[&str] = &[
    columns::VEHICLE_NAME,
    columns::CHARGING_POWER,
    columns::WLTP_COMBINED,
    columns::ELECTRIC_RANGE,
    columns::NET_CAPACITY,
    columns::GROSS_CAPACITY,
    columns::POWER_KW,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    Vehicles,
    Battery,
    EvHistory,
    ChargingHistorical,
    ChargingProjection,
    ElectricityProjection,
    ElectricityHistorical,
}

impl DatasetId {
    pub const ALL: [DatasetId; 7] = [
        DatasetId::Vehicles,
        DatasetId::Battery,
        DatasetId::EvHistory,
        DatasetId::ChargingHistorical,
        DatasetId::ChargingProjection,
        DatasetId::ElectricityProjection,
        DatasetId::ElectricityHistorical,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetId::Vehicles => "vehicles",
            DatasetId::Battery => "battery",
            DatasetId::EvHistory => "ev_history",
            DatasetId::ChargingHistorical => "charging_historical",
            DatasetId::ChargingProjection => "charging_projection",
            DatasetId::ElectricityProjection => "electricity_projection",
            DatasetId::ElectricityHistorical => "electricity_historical",
        }
    }

    /// Columns a file must carry to be accepted at load time.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetId::Vehicles => VEHICLE_COLUMNS,
            DatasetId::Battery => BATTERY_COLUMNS,
            DatasetId::EvHistory
            | DatasetId::ChargingHistorical
            | DatasetId::ChargingProjection
            | DatasetId::ElectricityProjection
            | DatasetId::ElectricityHistorical => IEA_COLUMNS,
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
