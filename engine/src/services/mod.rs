// Page assembly for the presentation layer
pub mod dashboard_service;

pub use dashboard_service::DashboardService;
