pub mod stats;
pub mod vehicle_filter;

pub use vehicle_filter::{Bounds, Recommender, VehicleFilter};
