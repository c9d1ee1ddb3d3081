//! Application layer: shared services, async request functions and the
//! models the `agrocast` binary drives.

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod services;

pub use app_services::AppServices;
pub use models::{ChatModel, DashboardModel, PlanModel};
