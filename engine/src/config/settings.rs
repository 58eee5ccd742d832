// Engine settings: an embedded default JSON, optionally replaced by a file
// named in EV_DASHBOARD_CONFIG.
use crate::data::merger::Aggregation;
use crate::error::EngineError;
use crate::models::DatasetId;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "EV_DASHBOARD_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../../assets/config/default.json");

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub sources: BTreeMap<DatasetId, SourceConfig>,
    pub forecast: ForecastSettings,
    pub charging: ChargingSettings,
    pub regions_of_interest: Vec<String>,
    pub powertrains: Vec<String>,
    /// Aggregation applied per `parameter` before series are formed or joined.
    pub metric_aggregation: BTreeMap<String, Aggregation>,
    pub browser: BrowserSettings,
    pub top_n: TopNSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String, // Should be char, but JSON string is easier
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> Result<u8, EngineError> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(EngineError::ConfigError(format!(
                "delimiter for '{}' must be a single ASCII character, got '{}'",
                self.path.display(),
                self.delimiter
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastSettings {
    pub region: String,
    pub parameter: String,
    pub terminal_year: i32,
    pub n_estimators: usize,
    pub seed: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChargingSettings {
    pub start_year: i32,
    pub default_region: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    pub range_tolerance_km: f64,
    pub price_tolerance_euro: f64,
    pub rapid_charge_label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TopNSettings {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl TopNSettings {
    pub fn clamp(&self, requested: usize) -> usize {
        requested.clamp(self.min, self.max)
    }
}

impl EngineSettings {
    /// The configuration bundled with the binary.
    pub fn load_default() -> anyhow::Result<Self> {
        Self::from_json(DEFAULT_CONFIG).context("parsing embedded default configuration")
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing configuration file {}", path.display()))
    }

    /// Uses the file named by `EV_DASHBOARD_CONFIG` when set, the embedded default otherwise.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::info!(path = %path.display(), "Loading engine settings from file");
                Self::load_from_path(&path)
            }
            None => {
                tracing::info!("{} not set, using embedded default settings", CONFIG_ENV_VAR);
                Self::load_default()
            }
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (id, source) in &self.sources {
            source.delimiter_byte().map_err(|e| {
                EngineError::ConfigError(format!("source '{}': {}", id, e))
            })?;
        }
        if self.forecast.n_estimators == 0 {
            return Err(EngineError::ConfigError(
                "forecast.n_estimators must be greater than 0".to_string(),
            ));
        }
        let top_n = &self.top_n;
        if top_n.min == 0 || top_n.min > top_n.max || !(top_n.min..=top_n.max).contains(&top_n.default) {
            return Err(EngineError::ConfigError(format!(
                "top_n bounds are inconsistent: min {}, max {}, default {}",
                top_n.min, top_n.max, top_n.default
            )));
        }
        if self.browser.range_tolerance_km < 0.0 || self.browser.price_tolerance_euro < 0.0 {
            return Err(EngineError::ConfigError(
                "browser tolerances must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn source(&self, id: DatasetId) -> Result<&SourceConfig, EngineError> {
        self.sources
            .get(&id)
            .ok_or_else(|| EngineError::ConfigError(format!("no source configured for '{}'", id)))
    }

    /// Aggregation for a metric; metrics must be configured explicitly.
    pub fn aggregation_for(&self, metric: &str) -> Result<Aggregation, EngineError> {
        self.metric_aggregation.get(metric).copied().ok_or_else(|| {
            EngineError::ConfigError(format!("no aggregation configured for metric '{}'", metric))
        })
    }
}
