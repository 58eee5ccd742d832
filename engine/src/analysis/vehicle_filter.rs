// Browser filters and "similar vehicle" recommendations over the normalized catalog.
use crate::error::{EngineError, Result};
use crate::models::columns;
use serde::{Deserialize, Serialize};
use shared::pages::{BrowseOutcome, Recommendation};
use shared::{Row, Table};

pub const EMPTY_RESULT_MESSAGE: &str = "no vehicles found";

/// Closed interval; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Empty selections and unset bounds do not restrict anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleFilter {
    pub price_euro: Option<Bounds>,
    pub range_km: Option<Bounds>,
    pub seats: Option<Bounds>,
    #[serde(default)]
    pub body_styles: Vec<String>,
    #[serde(default)]
    pub powertrains: Vec<String>,
    #[serde(default)]
    pub rapid_charge_only: bool,
}

impl VehicleFilter {
    fn within(row: &Row<'_>, column: &str, bounds: Option<Bounds>) -> bool {
        match bounds {
            // a missing cell never satisfies a bound
            Some(b) => row.f64(column).is_some_and(|v| b.contains(v)),
            None => true,
        }
    }

    fn one_of(row: &Row<'_>, column: &str, allowed: &[String]) -> bool {
        allowed.is_empty() || row.text(column).is_some_and(|v| allowed.iter().any(|a| a == v))
    }

    pub fn matches(&self, row: &Row<'_>, rapid_charge_label: &str) -> bool {
        Self::within(row, columns::PRICE_EURO, self.price_euro)
            && Self::within(row, columns::RANGE_KM, self.range_km)
            && Self::within(row, columns::SEATS, self.seats)
            && Self::one_of(row, columns::BODY_STYLE, &self.body_styles)
            && Self::one_of(row, columns::POWER_TRAIN, &self.powertrains)
            && (!self.rapid_charge_only || row.text(columns::RAPID_CHARGE) == Some(rapid_charge_label))
    }

    pub fn apply(&self, catalog: &Table, rapid_charge_label: &str) -> Result<Table> {
        let required = [
            columns::PRICE_EURO,
            columns::RANGE_KM,
            columns::SEATS,
            columns::BODY_STYLE,
            columns::POWER_TRAIN,
            columns::RAPID_CHARGE,
        ];
        if let Some(column) = catalog.missing_columns(&required).into_iter().next() {
            return Err(EngineError::schema("vehicles", column));
        }
        let filtered = catalog.filter(|row| self.matches(row, rapid_charge_label));
        tracing::debug!(before = catalog.len(), after = filtered.len(), "Vehicle filter applied");
        Ok(filtered)
    }

    /// Like `apply`, but an empty match becomes the explicit empty state.
    pub fn browse(&self, catalog: &Table, rapid_charge_label: &str) -> Result<BrowseOutcome> {
        Ok(outcome(self.apply(catalog, rapid_charge_label)?))
    }
}

pub fn outcome(vehicles: Table) -> BrowseOutcome {
    if vehicles.is_empty() {
        return BrowseOutcome::Empty {
            message: EMPTY_RESULT_MESSAGE.to_string(),
        };
    }
    BrowseOutcome::Found {
        count: vehicles.len(),
        vehicles,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Recommender {
    pub range_tolerance_km: f64,
    pub price_tolerance_euro: f64,
}

impl Recommender {
    /// Vehicles whose range and price both lie within the tolerances of `anchor`,
    /// excluding every variant sharing the anchor's model name.
    pub fn similar_to(&self, catalog: &Table, anchor: &Row<'_>) -> Result<Vec<Recommendation>> {
        let model = anchor
            .text(columns::MODEL)
            .ok_or_else(|| EngineError::ProcessingError("selected vehicle has no model name".to_string()))?;
        let (Some(range), Some(price)) = (anchor.f64(columns::RANGE_KM), anchor.f64(columns::PRICE_EURO)) else {
            return Err(EngineError::InsufficientData(format!(
                "'{}' has no range or price to compare against",
                model
            )));
        };
        let range_window = Bounds::new(range - self.range_tolerance_km, range + self.range_tolerance_km);
        let price_window = Bounds::new(price - self.price_tolerance_euro, price + self.price_tolerance_euro);

        Ok(catalog
            .rows()
            .filter(|row| row.text(columns::MODEL) != Some(model))
            .filter_map(|row| {
                let range_km = row.f64(columns::RANGE_KM).filter(|v| range_window.contains(*v))?;
                let price_euro = row.f64(columns::PRICE_EURO).filter(|v| price_window.contains(*v))?;
                Some(Recommendation {
                    brand: row.text(columns::BRAND).unwrap_or_default().to_string(),
                    model: row.text(columns::MODEL).unwrap_or_default().to_string(),
                    range_km,
                    price_euro,
                })
            })
            .collect())
    }
}
