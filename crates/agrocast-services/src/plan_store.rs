//! Current farm plan and its seven daily tasks.
//!
//! The store caches what the record backend holds and reloads after every
//! mutation. Several sessions editing the same plan are not coordinated: the
//! last write wins.

use agrocast_core::PlanError;
use thiserror::Error;

use crate::assistant::{AssistantClient, AssistantError, ScheduleRequest};
use crate::record_backend::RecordError;
use crate::record_client::RecordClient;
use crate::records::{AgriculturePlan, DailyTask, NewTask, PlanFields, TaskUpdate, MAX_DAY_OFFSET};

#[derive(Debug, Error)]
pub enum PlanStoreError {
    #[error(transparent)]
    Precondition(#[from] PlanError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl PlanStoreError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Precondition(e) => e.user_message(),
            Self::Record(e) => e.user_message(),
            Self::Assistant(e) => e.user_message(),
        }
    }
}

pub type PlanStoreResult<T> = Result<T, PlanStoreError>;

/// Where a plan is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// Nothing loaded and nothing being edited
    Absent,
    /// Fields entered but never saved
    Draft,
    Saved,
}

pub struct AgricultureStore {
    records: RecordClient,
    assistant: AssistantClient,
    plan: Option<AgriculturePlan>,
    draft: Option<PlanFields>,
    tasks: Vec<DailyTask>,
}

impl AgricultureStore {
    pub fn new(records: RecordClient, assistant: AssistantClient) -> Self {
        Self {
            records,
            assistant,
            plan: None,
            draft: None,
            tasks: Vec::new(),
        }
    }

    pub fn plan(&self) -> Option<&AgriculturePlan> {
        self.plan.as_ref()
    }

    pub fn tasks(&self) -> &[DailyTask] {
        &self.tasks
    }

    pub fn state(&self) -> PlanState {
        match (&self.plan, &self.draft) {
            (Some(_), _) => PlanState::Saved,
            (None, Some(_)) => PlanState::Draft,
            (None, None) => PlanState::Absent,
        }
    }

    /// Record unsaved edits; a saved plan stays saved until `save_plan`.
    pub fn set_draft(&mut self, fields: PlanFields) {
        self.draft = Some(fields);
    }

    /// Fields shown in the editor: the draft if any, else the saved plan.
    pub fn editor_fields(&self) -> PlanFields {
        self.draft
            .clone()
            .or_else(|| self.plan.as_ref().map(AgriculturePlan::fields))
            .unwrap_or_default()
    }

    /// The task for `day_offset`. If a failed swap left two rows for the same
    /// day, the newest one is returned.
    pub fn task_for_day(&self, day_offset: u8) -> Option<&DailyTask> {
        self.tasks
            .iter()
            .filter(|t| t.day_offset == day_offset)
            .max_by_key(|t| t.created_at)
    }

    /// Pick the most recently created plan and load its tasks.
    pub async fn load_current_plan(&mut self) -> PlanStoreResult<Option<&AgriculturePlan>> {
        self.plan = self.records.current_plan().await?;
        match &self.plan {
            Some(plan) => tracing::info!("Loaded plan {} ({})", plan.id, plan.crop_name),
            None => tracing::debug!("No saved plan"),
        }
        self.reload_tasks().await?;
        Ok(self.plan.as_ref())
    }

    /// Update the current plan in place, or insert a new one and adopt it.
    pub async fn save_plan(&mut self, fields: PlanFields) -> PlanStoreResult<&AgriculturePlan> {
        let saved = match &self.plan {
            Some(current) => {
                let mut updated = self.records.update_plan(&current.id, &fields).await?;
                // Keep the local view authoritative for what the user typed
                updated.apply(&fields);
                tracing::info!("Updated plan {}", updated.id);
                updated
            }
            None => {
                let inserted = self.records.insert_plan(&fields).await?;
                tracing::info!("Created plan {}", inserted.id);
                inserted
            }
        };

        self.draft = None;
        self.plan = Some(saved);
        self.reload_tasks().await?;
        self.plan
            .as_ref()
            .ok_or_else(|| PlanError::NoSavedPlan.into())
    }

    /// Find-or-create the task for `(plan, day_offset)` and reload.
    pub async fn upsert_task(
        &mut self,
        day_offset: u8,
        description: &str,
        details: Option<String>,
    ) -> PlanStoreResult<DailyTask> {
        if day_offset > MAX_DAY_OFFSET {
            return Err(PlanError::InvalidDay(day_offset).into());
        }
        let plan_id = self.require_saved_plan()?.id.clone();

        let result = match self.task_for_day(day_offset) {
            Some(existing) => {
                let id = existing.id.clone();
                self.records
                    .update_task(
                        &id,
                        &TaskUpdate {
                            description: description.to_string(),
                            details,
                        },
                    )
                    .await
            }
            None => {
                self.records
                    .insert_task(&NewTask {
                        plan_id,
                        day_offset,
                        description: description.to_string(),
                        details,
                    })
                    .await
            }
        };

        let task = result.map_err(|e| {
            tracing::error!("Saving task for day {} failed: {}", day_offset, e);
            e
        })?;
        self.reload_tasks().await?;
        Ok(task)
    }

    /// Replace the task set with a generated schedule.
    ///
    /// Requires a saved plan; without one this fails before any network call.
    /// New rows are inserted first. If an insert fails, the rows inserted so
    /// far are deleted and the old set is kept. Only after every insert has
    /// succeeded are the superseded rows deleted.
    pub async fn generate_schedule(&mut self, city: &str) -> PlanStoreResult<usize> {
        let plan = self.require_saved_plan()?.clone();

        let request = ScheduleRequest::for_plan(&plan, city);
        let scheduled = self.assistant.generate_schedule(&request).await?;

        let superseded: Vec<String> = self
            .records
            .list_tasks(&plan.id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        let mut inserted = Vec::with_capacity(scheduled.len());
        for task in scheduled {
            let new_task = NewTask {
                plan_id: plan.id.clone(),
                day_offset: task.day_offset,
                description: task.description,
                details: Some(task.details),
            };
            match self.records.insert_task(&new_task).await {
                Ok(row) => inserted.push(row.id),
                Err(e) => {
                    tracing::error!(
                        "Schedule insert failed after {} rows, rolling back: {}",
                        inserted.len(),
                        e
                    );
                    if let Err(cleanup) = self.records.delete_tasks(&inserted).await {
                        tracing::error!("Rolling back generated tasks failed: {}", cleanup);
                    }
                    self.reload_tasks().await?;
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.records.delete_tasks(&superseded).await {
            tracing::error!("Removing superseded tasks failed: {}", e);
            self.reload_tasks().await?;
            return Err(e.into());
        }

        tracing::info!(
            "Replaced {} tasks with {} generated tasks",
            superseded.len(),
            inserted.len()
        );
        self.reload_tasks().await?;
        Ok(inserted.len())
    }

    /// Snapshot of plan and tasks for the chat assistant.
    pub fn agriculture_context(&self) -> serde_json::Value {
        match &self.plan {
            Some(plan) => serde_json::json!({
                "plan": {
                    "crop_name": plan.crop_name,
                    "farm_location": plan.farm_location,
                    "season_goal": plan.season_goal,
                    "notes": plan.notes,
                },
                "tasks": (0..=MAX_DAY_OFFSET)
                    .filter_map(|day| self.task_for_day(day))
                    .map(|t| serde_json::json!({
                        "day": t.day_offset,
                        "description": t.description,
                        "details": t.details,
                    }))
                    .collect::<Vec<_>>(),
            }),
            None => serde_json::Value::Null,
        }
    }

    fn require_saved_plan(&self) -> Result<&AgriculturePlan, PlanError> {
        self.plan.as_ref().ok_or(PlanError::NoSavedPlan)
    }

    async fn reload_tasks(&mut self) -> PlanStoreResult<()> {
        self.tasks = match &self.plan {
            Some(plan) => self.records.list_tasks(&plan.id).await?,
            None => Vec::new(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::record_store::SqliteRecordStore;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fields() -> PlanFields {
        PlanFields {
            crop_name: "Rice".into(),
            farm_location: "North Field".into(),
            season_goal: "Summer 2025".into(),
            notes: Some(String::new()),
        }
    }

    fn store(assistant_url: &str) -> AgricultureStore {
        AgricultureStore::new(
            RecordClient::sqlite(SqliteRecordStore::in_memory().unwrap()),
            AssistantClient::new(assistant_url, Duration::from_secs(5)).unwrap(),
        )
    }

    fn schedule_body(days: std::ops::RangeInclusive<i64>) -> serde_json::Value {
        serde_json::json!({
            "tasks": days.map(|d| serde_json::json!({
                "day": d,
                "description": format!("Generated {}", d),
                "details": "auto"
            })).collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn test_save_then_reload_round_trip() {
        let mut s = store("http://127.0.0.1:9");
        s.save_plan(fields()).await.unwrap();

        let mut reloaded = AgricultureStore::new(s.records.clone(), s.assistant.clone());
        let plan = reloaded.load_current_plan().await.unwrap().unwrap();
        assert_eq!(plan.fields(), fields());
    }

    #[tokio::test]
    async fn test_second_save_updates_in_place() {
        let mut s = store("http://127.0.0.1:9");
        let first_id = s.save_plan(fields()).await.unwrap().id.clone();

        let mut edited = fields();
        edited.crop_name = "Sticky rice".into();
        let second = s.save_plan(edited).await.unwrap();

        assert_eq!(second.id, first_id);
        assert_eq!(second.crop_name, "Sticky rice");
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut s = store("http://127.0.0.1:9");
        assert_eq!(s.state(), PlanState::Absent);
        s.set_draft(fields());
        assert_eq!(s.state(), PlanState::Draft);
        assert_eq!(s.editor_fields().crop_name, "Rice");
        s.save_plan(fields()).await.unwrap();
        assert_eq!(s.state(), PlanState::Saved);
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row() {
        let mut s = store("http://127.0.0.1:9");
        s.save_plan(fields()).await.unwrap();

        s.upsert_task(3, "Weed", None).await.unwrap();
        s.upsert_task(3, "Weed and mulch", Some("rows 1-4".into()))
            .await
            .unwrap();

        let day3: Vec<_> = s.tasks().iter().filter(|t| t.day_offset == 3).collect();
        assert_eq!(day3.len(), 1);
        assert_eq!(day3[0].description, "Weed and mulch");
        assert_eq!(day3[0].details.as_deref(), Some("rows 1-4"));
    }

    #[tokio::test]
    async fn test_upsert_requires_plan_and_valid_day() {
        let mut s = store("http://127.0.0.1:9");
        let err = s.upsert_task(1, "x", None).await.unwrap_err();
        assert!(matches!(err, PlanStoreError::Precondition(PlanError::NoSavedPlan)));

        s.save_plan(fields()).await.unwrap();
        let err = s.upsert_task(7, "x", None).await.unwrap_err();
        assert!(matches!(err, PlanStoreError::Precondition(PlanError::InvalidDay(7))));
    }

    #[tokio::test]
    async fn test_generate_without_plan_makes_no_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut s = store(&mock_server.uri());
        let err = s.generate_schedule("Hue").await.unwrap_err();
        assert!(matches!(err, PlanStoreError::Precondition(PlanError::NoSavedPlan)));
        assert_eq!(err.user_message(), "Please save a plan first!");
    }

    #[tokio::test]
    async fn test_generate_replaces_tasks() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/groq/generate-schedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(schedule_body(0..=6)))
            .mount(&mock_server)
            .await;

        let mut s = store(&mock_server.uri());
        s.save_plan(fields()).await.unwrap();
        s.upsert_task(0, "Manual", None).await.unwrap();

        let count = s.generate_schedule("Hue").await.unwrap();

        assert_eq!(count, 7);
        assert_eq!(s.tasks().len(), 7);
        assert_eq!(s.task_for_day(0).unwrap().description, "Generated 0");
        assert!(s.tasks().iter().all(|t| t.description != "Manual"));
    }

    #[tokio::test]
    async fn test_generate_failure_keeps_existing_tasks() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/groq/generate-schedule"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({ "detail": "down" })),
            )
            .mount(&mock_server)
            .await;

        let mut s = store(&mock_server.uri());
        s.save_plan(fields()).await.unwrap();
        s.upsert_task(2, "Manual", None).await.unwrap();

        let err = s.generate_schedule("Hue").await.unwrap_err();
        assert!(matches!(err, PlanStoreError::Assistant(AssistantError::Api { .. })));
        assert_eq!(s.tasks().len(), 1);
        assert_eq!(s.task_for_day(2).unwrap().description, "Manual");
    }

    #[tokio::test]
    async fn test_agriculture_context() {
        let mut s = store("http://127.0.0.1:9");
        assert!(s.agriculture_context().is_null());

        s.save_plan(fields()).await.unwrap();
        s.upsert_task(1, "Transplant", None).await.unwrap();

        let ctx = s.agriculture_context();
        assert_eq!(ctx["plan"]["crop_name"], "Rice");
        assert_eq!(ctx["tasks"][0]["day"], 1);
    }
}
