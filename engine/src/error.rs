use shared::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Settings format error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Schema error: dataset '{dataset}' has no column '{column}'")]
    SchemaError { dataset: String, column: String },

    #[error("Duplicate key {key} in '{table}'; aggregate before joining")]
    DuplicateKey { table: String, key: String },

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("Dataset '{dataset}' is unavailable: {reason}")]
    SourceUnavailable { dataset: String, reason: String },

    #[error("Table error: {source}")]
    TableShapeError {
        #[from]
        source: TableError,
    },

    #[error("Internal processing error: {0}")]
    ProcessingError(String),
}

impl EngineError {
    pub fn schema(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        EngineError::SchemaError {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    /// Errors a page reports as a notice while still rendering everything else.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InsufficientData(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_insufficient_data_is_recoverable() {
        assert!(EngineError::InsufficientData("one year".into()).is_recoverable());
        assert!(!EngineError::schema("sales", "region").is_recoverable());
    }

    #[test]
    fn test_schema_error_message_names_column() {
        let msg = EngineError::schema("ev_history", "powertrain").to_string();
        assert!(msg.contains("'ev_history'"));
        assert!(msg.contains("'powertrain'"));
    }
}
