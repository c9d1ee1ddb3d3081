//! Rows owned by the record store.
//!
//! Field names on the wire follow the hosted table columns (`task_date`,
//! `message_text`, ...); the Rust names describe what the values mean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Day offsets run from today (0) to six days out.
pub const MAX_DAY_OFFSET: u8 = 6;

/// Number of days in a plan's schedule
pub const SCHEDULE_DAYS: usize = MAX_DAY_OFFSET as usize + 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgriculturePlan {
    pub id: String,
    pub crop_name: String,
    pub farm_location: String,
    pub season_goal: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AgriculturePlan {
    pub fn fields(&self) -> PlanFields {
        PlanFields {
            crop_name: self.crop_name.clone(),
            farm_location: self.farm_location.clone(),
            season_goal: self.season_goal.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Overwrite the user-editable fields, keeping identity and timestamp.
    pub fn apply(&mut self, fields: &PlanFields) {
        self.crop_name = fields.crop_name.clone();
        self.farm_location = fields.farm_location.clone();
        self.season_goal = fields.season_goal.clone();
        self.notes = fields.notes.clone();
    }
}

/// The user-editable part of a plan; body of inserts and updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFields {
    pub crop_name: String,
    pub farm_location: String,
    pub season_goal: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub plan_id: String,
    #[serde(rename = "task_date")]
    pub day_offset: u8,
    #[serde(rename = "task_description")]
    pub description: String,
    #[serde(rename = "task_details", default)]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub plan_id: String,
    #[serde(rename = "task_date")]
    pub day_offset: u8,
    #[serde(rename = "task_description")]
    pub description: String,
    #[serde(rename = "task_details")]
    pub details: Option<String>,
}

/// Body of a task update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(rename = "task_description")]
    pub description: String,
    #[serde(rename = "task_details")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "bot" => Some(Self::Bot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "message_text")]
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChatMessage {
    #[serde(rename = "message_text")]
    pub text: String,
    pub sender: Sender,
}
