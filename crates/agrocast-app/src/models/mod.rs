pub mod chat_model;
pub mod dashboard_model;
pub mod plan_model;
pub mod weather_view;

pub use chat_model::{ChatError, ChatModel};
pub use dashboard_model::DashboardModel;
pub use plan_model::{DayRow, PlanError, PlanModel};
pub use weather_view::{CurrentConditions, ForecastCard, HourlyRow};
