// Read-only cache of the unmodified source tables. Populated once at startup,
// then shared through an Arc; nothing mutates it afterwards.
use crate::config::EngineSettings;
use crate::data::csv_parser::TableCsvParser;
use crate::error::{EngineError, Result};
use crate::models::DatasetId;
use shared::Table;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum SourceEntry {
    Loaded { path: PathBuf, table: Arc<Table> },
    Unavailable { path: Option<PathBuf>, reason: String },
}

#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<DatasetId, SourceEntry>,
}

impl SourceCache {
    /// Loads every dataset. A dataset that fails is remembered as unavailable so
    /// the pages that need it can report the reason while the others render.
    pub fn load(settings: &EngineSettings) -> Self {
        let mut builder = SourceCacheBuilder::default();
        for id in DatasetId::ALL {
            match settings.source(id) {
                Ok(source) => match TableCsvParser::load_dataset(id, source) {
                    Ok(table) => {
                        builder.insert(id, source.path.clone(), table);
                    }
                    Err(e) => {
                        tracing::warn!(dataset = %id, path = %source.path.display(), error = %e, "Source failed to load");
                        builder.mark_unavailable(id, Some(source.path.clone()), e.to_string());
                    }
                },
                Err(e) => {
                    tracing::warn!(dataset = %id, error = %e, "No source configured");
                    builder.mark_unavailable(id, None, e.to_string());
                }
            }
        }
        builder.build()
    }

    pub fn builder() -> SourceCacheBuilder {
        SourceCacheBuilder::default()
    }

    pub fn table(&self, id: DatasetId) -> Result<Arc<Table>> {
        match self.entries.get(&id) {
            Some(SourceEntry::Loaded { table, .. }) => Ok(Arc::clone(table)),
            Some(SourceEntry::Unavailable { reason, .. }) => Err(EngineError::SourceUnavailable {
                dataset: id.name().to_string(),
                reason: reason.clone(),
            }),
            None => Err(EngineError::SourceUnavailable {
                dataset: id.name().to_string(),
                reason: "not loaded".to_string(),
            }),
        }
    }

    /// File the dataset was read from, if one was configured.
    pub fn path(&self, id: DatasetId) -> Option<&PathBuf> {
        match self.entries.get(&id)? {
            SourceEntry::Loaded { path, .. } => Some(path),
            SourceEntry::Unavailable { path, .. } => path.as_ref(),
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, SourceEntry::Loaded { .. }))
            .count()
    }
}

/// Assembles a cache; once `build` is called the cache is frozen.
#[derive(Debug, Default)]
pub struct SourceCacheBuilder {
    entries: HashMap<DatasetId, SourceEntry>,
}

impl SourceCacheBuilder {
    pub fn insert(&mut self, id: DatasetId, path: PathBuf, table: Table) -> &mut Self {
        self.entries.insert(
            id,
            SourceEntry::Loaded {
                path,
                table: Arc::new(table),
            },
        );
        self
    }

    pub fn mark_unavailable(&mut self, id: DatasetId, path: Option<PathBuf>, reason: String) -> &mut Self {
        self.entries.insert(id, SourceEntry::Unavailable { path, reason });
        self
    }

    pub fn with_table(mut self, id: DatasetId, table: Table) -> Self {
        self.insert(id, PathBuf::from(format!("<memory:{}>", id)), table);
        self
    }

    pub fn build(self) -> SourceCache {
        SourceCache {
            entries: self.entries,
        }
    }
}
