// Engine main entry point: renders every dashboard page with its default
// selections and writes the payloads to stdout as one JSON document.
use anyhow::Context;
use engine::config::EngineSettings;
use engine::data::source_cache::SourceCache;
use engine::error::EngineError;
use engine::services::dashboard_service::{BrowserQuery, CatalogQuery, ChargingQuery, SalesQuery};
use engine::services::DashboardService;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info};

fn page<T: Serialize>(name: &str, result: Result<T, EngineError>) -> anyhow::Result<Value> {
    match result {
        Ok(payload) => serde_json::to_value(payload).with_context(|| format!("failed to serialize the {} page", name)),
        Err(e) => {
            error!(page = name, error = %e, "Page could not be rendered");
            Ok(json!({ "error": e.to_string() }))
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting EV dashboard engine...");
    let settings = EngineSettings::load()?;
    let cache = Arc::new(SourceCache::load(&settings));
    info!(loaded = cache.loaded_count(), "Source cache ready");

    let service = DashboardService::new(cache, settings);
    let mut pages = Map::new();
    pages.insert("catalog".into(), page("catalog", service.catalog(&CatalogQuery::default()))?);
    pages.insert("browser".into(), page("browser", service.browser(&BrowserQuery::default()))?);
    pages.insert("battery".into(), page("battery", service.battery())?);
    pages.insert("sales".into(), page("sales", service.sales(&SalesQuery::default()))?);
    pages.insert("charging".into(), page("charging", service.charging(&ChargingQuery::default()))?);
    pages.insert("energy".into(), page("energy", service.energy())?);

    let out = serde_json::to_string_pretty(&Value::Object(pages)).context("failed to serialize pages")?;
    println!("{}", out);
    Ok(())
}
