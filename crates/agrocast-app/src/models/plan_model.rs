//! Farm plan model: the current plan, its editor draft and the 7-day schedule.
//!
//! Operations block on the shared runtime; callers are the CLI thread and
//! tests, never a runtime worker.

use std::sync::Arc;

use agrocast_services::{
    AgricultureStore, AssistantError, DailyTask, PlanFields, PlanState, PlanStoreError,
    RecordError, SCHEDULE_DAYS,
};
use agrocast_weather::plan_day_label;
use chrono::NaiveDate;
use serde::Serialize;
use tokio::runtime::Handle;

use crate::app_services::AppServices;

/// Error type for plan operations
#[derive(Debug, Clone)]
pub enum PlanError {
    NoSavedPlan,
    InvalidDay(u8),
    EmptySchedule,
    Storage(String),
    Network(String),
    Assistant(String),
    NotInitialized(String),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::NoSavedPlan => write!(f, "Please save a plan first!"),
            PlanError::InvalidDay(d) => write!(f, "Day {} is outside the 7-day schedule", d),
            PlanError::EmptySchedule => write!(f, "The generated schedule was empty"),
            PlanError::Storage(s) => write!(f, "Storage error: {}", s),
            PlanError::Network(s) => write!(f, "Network error: {}", s),
            PlanError::Assistant(s) => write!(f, "Assistant error: {}", s),
            PlanError::NotInitialized(s) => write!(f, "Plan store not initialized: {}", s),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<PlanStoreError> for PlanError {
    fn from(e: PlanStoreError) -> Self {
        match e {
            PlanStoreError::Precondition(p) => match p {
                agrocast_core::PlanError::NoSavedPlan => PlanError::NoSavedPlan,
                agrocast_core::PlanError::InvalidDay(d) => PlanError::InvalidDay(d),
            },
            PlanStoreError::Record(RecordError::Network(n)) => PlanError::Network(n.to_string()),
            PlanStoreError::Record(r) => PlanError::Storage(r.to_string()),
            PlanStoreError::Assistant(AssistantError::EmptySchedule) => PlanError::EmptySchedule,
            PlanStoreError::Assistant(a) => PlanError::Assistant(a.to_string()),
        }
    }
}

/// One line of the schedule view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub day_offset: u8,
    /// e.g. `"Thu, Oct 16"`
    pub label: String,
    pub description: Option<String>,
    pub details: Option<String>,
}

pub struct PlanModel {
    runtime: Handle,
    store: AgricultureStore,
    error_message: Option<String>,
}

impl PlanModel {
    pub fn new(services: &Arc<AppServices>) -> Result<Self, PlanError> {
        let records = services
            .record_client()
            .map_err(|e| PlanError::NotInitialized(format!("{:#}", e)))?;
        Ok(Self {
            runtime: services.runtime(),
            store: AgricultureStore::new(records, services.assistant()),
            error_message: None,
        })
    }

    pub fn store(&self) -> &AgricultureStore {
        &self.store
    }

    pub fn state(&self) -> PlanState {
        self.store.state()
    }

    pub fn tasks(&self) -> &[DailyTask] {
        self.store.tasks()
    }

    /// Message from the last failed operation, cleared by the next success.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Fields for the plan editor: the draft if one exists, else the saved plan.
    pub fn editor_fields(&self) -> PlanFields {
        self.store.editor_fields()
    }

    pub fn set_draft(&mut self, fields: PlanFields) {
        self.store.set_draft(fields);
    }

    pub fn load(&mut self) -> Result<(), PlanError> {
        let result = self
            .runtime
            .block_on(self.store.load_current_plan())
            .map(|_| ());
        self.track(result)
    }

    pub fn save(&mut self, fields: PlanFields) -> Result<(), PlanError> {
        let result = self
            .runtime
            .block_on(self.store.save_plan(fields))
            .map(|_| ());
        self.track(result)
    }

    pub fn upsert_task(
        &mut self,
        day_offset: u8,
        description: &str,
        details: Option<String>,
    ) -> Result<(), PlanError> {
        let result = self
            .runtime
            .block_on(self.store.upsert_task(day_offset, description, details))
            .map(|_| ());
        self.track(result)
    }

    /// Replace the schedule with one generated for `city`. Returns the task count.
    pub fn generate_schedule(&mut self, city: &str) -> Result<usize, PlanError> {
        let result = self.runtime.block_on(self.store.generate_schedule(city));
        self.track(result)
    }

    /// All seven days starting at `today`, with the task for each if any.
    pub fn day_rows(&self, today: NaiveDate) -> Vec<DayRow> {
        (0..SCHEDULE_DAYS as u8)
            .map(|day| {
                let task = self.store.task_for_day(day);
                DayRow {
                    day_offset: day,
                    label: plan_day_label(today, day),
                    description: task.map(|t| t.description.clone()),
                    details: task.and_then(|t| t.details.clone()),
                }
            })
            .collect()
    }

    fn track<T>(&mut self, result: Result<T, PlanStoreError>) -> Result<T, PlanError> {
        match result {
            Ok(value) => {
                self.error_message = None;
                Ok(value)
            }
            Err(e) => {
                tracing::error!("Plan operation failed: {}", e);
                self.error_message = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }
}
