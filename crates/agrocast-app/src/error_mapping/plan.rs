use crate::models::plan_model::PlanError as UiPlanError;
use agrocast_core::{AppError, AssistantError, DatabaseError, NetworkError, PlanError};

impl From<UiPlanError> for AppError {
    fn from(e: UiPlanError) -> Self {
        match e {
            UiPlanError::NoSavedPlan => AppError::Plan(PlanError::NoSavedPlan),
            UiPlanError::InvalidDay(d) => AppError::Plan(PlanError::InvalidDay(d)),
            UiPlanError::EmptySchedule => AppError::Assistant(AssistantError::GenerationFailed(
                "schedule contained no usable tasks".to_string(),
            )),
            UiPlanError::Storage(s) => AppError::Database(DatabaseError::Query(s)),
            UiPlanError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
            UiPlanError::Assistant(s) => AppError::Assistant(AssistantError::GenerationFailed(s)),
            UiPlanError::NotInitialized(s) => AppError::Database(DatabaseError::Open(s)),
        }
    }
}
