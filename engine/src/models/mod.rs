// Engine-side descriptions of the source datasets. The cell and table types
// themselves live in `shared::models`.

pub mod dataset;

pub use dataset::{columns, DatasetId};
