// Engine library root

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod models;
pub mod services;
