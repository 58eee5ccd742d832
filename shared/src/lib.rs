pub mod models;
pub mod pages;
pub mod utils;

// Types shared between the engine and whatever presentation layer renders its
// page payloads. Nothing in here performs I/O.

pub use models::{KeyPart, Row, Table, TableError, TimeSeries, Value};
