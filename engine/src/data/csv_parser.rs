use crate::config::settings::SourceConfig;
use crate::error::{EngineError, Result};
use crate::models::DatasetId;
use csv::ReaderBuilder;
use shared::{Table, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct TableCsvParser;

impl TableCsvParser {
    /// Loads a configured dataset and checks its schema before returning it.
    pub fn load_dataset(id: DatasetId, source: &SourceConfig) -> Result<Table> {
        let delimiter = source.delimiter_byte()?;
        let table = Self::load_table(&source.path, delimiter)?;
        Self::check_schema(id, &table)?;
        tracing::info!(
            dataset = %id,
            path = %source.path.display(),
            rows = table.len(),
            columns = table.columns().len(),
            "Loaded source table"
        );
        Ok(table)
    }

    pub fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
        let file = File::open(path)?;
        Self::read_table(BufReader::new(file), delimiter)
    }

    /// Reads a headed, delimited table; cell types are inferred per field.
    pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut table = Table::new(columns);

        for result in rdr.records() {
            let record = result?;
            let row = record.iter().map(Value::infer).collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// A missing required column is a configuration error, reported before any row work.
    pub fn check_schema(id: DatasetId, table: &Table) -> Result<()> {
        match table.missing_columns(id.required_columns()).into_iter().next() {
            Some(column) => {
                tracing::error!(dataset = %id, column = %column, "Source table is missing a required column");
                Err(EngineError::schema(id.name(), column))
            }
            None => Ok(()),
        }
    }
}
