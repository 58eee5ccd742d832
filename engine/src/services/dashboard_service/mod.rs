// engine/src/services/dashboard_service/mod.rs
// DashboardService owns the shared source cache and dispatches each page
// request to its handler module.

use crate::config::EngineSettings;
use crate::data::source_cache::SourceCache;
use crate::error::Result;
use shared::pages::{BatteryPage, BrowserPage, CatalogPage, ChargingPage, EnergyPage, SalesPage};
use std::sync::Arc;

pub mod battery;
pub mod browser;
pub mod catalog;
pub mod charging;
pub mod energy;
pub mod helpers;
pub mod sales;

pub use browser::BrowserQuery;
pub use catalog::CatalogQuery;
pub use charging::ChargingQuery;
pub use sales::SalesQuery;

/// Every call recomputes its page from the cached sources; nothing is memoized
/// between calls.
pub struct DashboardService {
    cache: Arc<SourceCache>,
    settings: EngineSettings,
}

impl DashboardService {
    pub fn new(cache: Arc<SourceCache>, settings: EngineSettings) -> Self {
        DashboardService { cache, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn catalog(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        tracing::info!(feature = ?query.feature, top_n = ?query.top_n, "Received catalog page request");
        catalog::handle_catalog(&self.cache, &self.settings, query)
    }

    pub fn browser(&self, query: &BrowserQuery) -> Result<BrowserPage> {
        tracing::info!(brand = ?query.brand, model = ?query.model, "Received browser page request");
        browser::handle_browser(&self.cache, &self.settings, query)
    }

    pub fn battery(&self) -> Result<BatteryPage> {
        tracing::info!("Received battery page request");
        battery::handle_battery(&self.cache)
    }

    pub fn sales(&self, query: &SalesQuery) -> Result<SalesPage> {
        tracing::info!(powertrain = ?query.powertrain, "Received sales page request");
        sales::handle_sales(&self.cache, &self.settings, query)
    }

    pub fn charging(&self, query: &ChargingQuery) -> Result<ChargingPage> {
        tracing::info!(region = ?query.region, "Received charging page request");
        charging::handle_charging(&self.cache, &self.settings, query)
    }

    pub fn energy(&self) -> Result<EnergyPage> {
        tracing::info!("Received energy page request");
        energy::handle_energy(&self.cache, &self.settings)
    }
}
