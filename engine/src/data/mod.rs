// Source loading and the table transformations every page builds on.
pub mod csv_parser;
pub mod merger;
pub mod normalizer;
pub mod source_cache;
