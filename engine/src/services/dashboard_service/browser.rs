// Handler for the vehicle browser page
use super::catalog::normalized_vehicles;
use super::helpers::{coverage_notices, recover, sorted_unique, vehicle_points};
use crate::analysis::vehicle_filter::{outcome, Recommender, VehicleFilter};
use crate::config::EngineSettings;
use crate::data::source_cache::SourceCache;
use crate::error::Result;
use crate::models::{columns, DatasetId};
use serde::{Deserialize, Serialize};
use shared::pages::{BrowserPage, PageNotice};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserQuery {
    #[serde(default)]
    pub filter: VehicleFilter,
    pub brand: Option<String>,
    pub model: Option<String>,
}

pub fn handle_browser(cache: &SourceCache, settings: &EngineSettings, query: &BrowserQuery) -> Result<BrowserPage> {
    let normalized = normalized_vehicles(cache)?;
    let catalog = normalized.table;
    let mut notices = coverage_notices(DatasetId::Vehicles.name(), &normalized.report);

    let filtered = query.filter.apply(&catalog, &settings.browser.rapid_charge_label)?;
    let price_vs_range = vehicle_points(&filtered, columns::PRICE_EURO, columns::RANGE_KM)?;
    let brands = sorted_unique(&filtered, columns::BRAND)?;

    let mut models_for_brand = Vec::new();
    let mut selected_model = None;
    let mut recommendations = Vec::new();

    if let Some(brand) = query.brand.as_deref() {
        let of_brand = filtered.filter(|row| row.text(columns::BRAND) == Some(brand));
        models_for_brand = sorted_unique(&of_brand, columns::MODEL)?;

        if let Some(model) = query.model.as_deref() {
            let details = of_brand.filter(|row| row.text(columns::MODEL) == Some(model));
            match details.row(0) {
                Some(anchor) => {
                    let recommender = Recommender {
                        range_tolerance_km: settings.browser.range_tolerance_km,
                        price_tolerance_euro: settings.browser.price_tolerance_euro,
                    };
                    // None means recover already explained why nothing could be compared
                    if let Some(similar) = recover(recommender.similar_to(&catalog, &anchor), &mut notices)? {
                        if similar.is_empty() {
                            notices.push(PageNotice::info("no similar models to recommend"));
                        }
                        recommendations = similar;
                    }
                }
                None => notices.push(PageNotice::warning(format!(
                    "'{} {}' is not among the filtered vehicles",
                    brand, model
                ))),
            }
            if !details.is_empty() {
                selected_model = Some(details);
            }
        }
    }

    Ok(BrowserPage {
        rendered_at: chrono::Utc::now(),
        outcome: outcome(filtered),
        price_vs_range,
        brands,
        models_for_brand,
        selected_model,
        recommendations,
        notices,
    })
}
