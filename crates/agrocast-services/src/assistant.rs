//! Client for the AI assistant backend (`/api/groq/*`).
//!
//! Schedule generation and chat are not idempotent, so neither is retried.

use std::time::Duration;

use agrocast_core::Config;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::records::{AgriculturePlan, MAX_DAY_OFFSET};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Assistant returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schedule contained no usable tasks")]
    EmptySchedule,
}

impl AssistantError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) if e.is_timeout() => "The assistant took too long to answer.",
            Self::Network(_) => "The assistant is unavailable. Please try again later.",
            Self::Api { .. } => "Failed to generate schedule. Please try again.",
            Self::Parse(_) => "The assistant returned an unexpected answer. Please try again.",
            Self::EmptySchedule => "The generated schedule was empty. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRequest {
    pub crop_name: String,
    pub farm_location: String,
    pub season_goal: String,
    pub notes: String,
    pub city: String,
}

impl ScheduleRequest {
    pub fn for_plan(plan: &AgriculturePlan, city: &str) -> Self {
        Self {
            crop_name: plan.crop_name.clone(),
            farm_location: plan.farm_location.clone(),
            season_goal: plan.season_goal.clone(),
            notes: plan.notes.clone().unwrap_or_default(),
            city: city.to_string(),
        }
    }
}

/// A task as returned by the generator; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub day: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    tasks: Vec<RawTask>,
}

/// A normalized generated task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub day_offset: u8,
    pub description: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub user_message: String,
    pub weather_context: serde_json::Value,
    pub agriculture_context: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: String,
}

/// Result of the health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: String,
    pub message: String,
}

impl ConnectionStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "success" || self.status == "ok"
    }
}

/// Fill in missing fields and drop tasks outside the 7-day window.
///
/// A missing day becomes the task's position in the list; the position is
/// also used in the default description. At most one task is kept per day:
/// a later entry replaces an earlier one in place.
pub fn normalize_schedule(tasks: Vec<RawTask>) -> Vec<ScheduledTask> {
    let mut schedule: Vec<ScheduledTask> = Vec::with_capacity(tasks.len());
    for task in normalize_tasks(tasks) {
        match schedule.iter_mut().find(|t| t.day_offset == task.day_offset) {
            Some(existing) => {
                tracing::warn!(
                    "Generated schedule repeats day {}; keeping \"{}\"",
                    task.day_offset,
                    task.description
                );
                *existing = task;
            }
            None => schedule.push(task),
        }
    }
    schedule
}

fn normalize_tasks(tasks: Vec<RawTask>) -> impl Iterator<Item = ScheduledTask> {
    tasks
        .into_iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let day = task.day.unwrap_or(index as i64);
            let day_offset = match u8::try_from(day) {
                Ok(d) if d <= MAX_DAY_OFFSET => d,
                _ => {
                    tracing::warn!("Dropping generated task for day {}", day);
                    return None;
                }
            };
            let description = task
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| format!("Task for day {}", index));
            let details = task
                .details
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "No details provided".to_string());
            Some(ScheduledTask {
                day_offset,
                description,
                details,
            })
        })
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AssistantError> {
        Self::new(&config.api.base_url, Duration::from_secs(config.api.timeout_secs))
    }

    /// Ask the generator for a 7-day schedule.
    #[instrument(
        skip(self, request),
        fields(crop = %request.crop_name, city = %request.city),
        level = "info"
    )]
    pub async fn generate_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<Vec<ScheduledTask>, AssistantError> {
        let url = format!("{}/api/groq/generate-schedule", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let body: ScheduleResponse = handle_response(response).await?;

        let received = body.tasks.len();
        let tasks = normalize_schedule(body.tasks);
        tracing::info!("Generated {} tasks ({} received)", tasks.len(), received);

        if tasks.is_empty() {
            return Err(AssistantError::EmptySchedule);
        }
        Ok(tasks)
    }

    #[instrument(skip(self, request), level = "info")]
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, AssistantError> {
        let url = format!("{}/api/groq/chat", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let body: ChatResponse = handle_response(response).await?;
        Ok(body.reply)
    }

    /// Probe the backend. Transport failures are reported in the status, not
    /// as an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn test_connection(&self) -> ConnectionStatus {
        let url = format!("{}/api/groq/test", self.base_url);
        let result: Result<ConnectionStatus, AssistantError> = async {
            let response = self.client.get(&url).send().await?;
            handle_response::<ConnectionStatus>(response).await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::warn!("Assistant connection test failed: {}", e);
            ConnectionStatus {
                status: "error".to_string(),
                message: e.to_string(),
            }
        })
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AssistantError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| AssistantError::Parse(e.to_string()))
    } else {
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or(text);
        tracing::warn!("Assistant returned {}: {}", status, detail);
        Err(AssistantError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
