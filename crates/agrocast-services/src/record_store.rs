//! SQLite-based record storage.
//!
//! Mirrors the hosted tables (`agriculture_plans`, `daily_tasks`,
//! `chat_messages`) so the two backends are interchangeable.

use std::path::Path;

use agrocast_core::error::RusqliteErrorExt;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::record_backend::{
    validate_day_offset, validate_plan_fields, RecordBackend, RecordError, RecordResult,
};
use crate::records::{
    AgriculturePlan, ChatMessage, DailyTask, NewChatMessage, NewTask, PlanFields, Sender,
    TaskUpdate,
};

const PLAN_COLUMNS: &str = "id, crop_name, farm_location, season_goal, notes, created_at";
const TASK_COLUMNS: &str =
    "id, plan_id, task_date, task_description, task_details, created_at";
const MESSAGE_COLUMNS: &str = "id, message_text, sender, created_at";

/// SQLite-based record storage.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Database(e.into_database_error())
    }
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> RecordResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RecordError::Database(agrocast_core::DatabaseError::Open(
                        e.to_string(),
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("Opened SQLite record store");
        Ok(store)
    }

    /// Create an in-memory store; contents vanish on drop.
    pub fn in_memory() -> RecordResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> RecordResult<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS agriculture_plans (
                id TEXT PRIMARY KEY,
                crop_name TEXT NOT NULL,
                farm_location TEXT NOT NULL,
                season_goal TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_tasks (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES agriculture_plans(id) ON DELETE CASCADE,
                task_date INTEGER NOT NULL CHECK (task_date BETWEEN 0 AND 6),
                task_description TEXT NOT NULL,
                task_details TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                message_text TEXT NOT NULL,
                sender TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plans_created ON agriculture_plans(created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_plan_day ON daily_tasks(plan_id, task_date);
            CREATE INDEX IF NOT EXISTS idx_messages_created ON chat_messages(created_at);
            "#,
        )?;
        Ok(())
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Fixed-width timestamps so text ordering matches time ordering.
    fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                tracing::warn!("Unparseable created_at {:?}: {}", raw, e);
                DateTime::<Utc>::UNIX_EPOCH
            })
    }

    fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<AgriculturePlan> {
        let created_at: String = row.get(5)?;
        Ok(AgriculturePlan {
            id: row.get(0)?,
            crop_name: row.get(1)?,
            farm_location: row.get(2)?,
            season_goal: row.get(3)?,
            notes: row.get(4)?,
            created_at: Self::parse_timestamp(&created_at),
        })
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<DailyTask> {
        let created_at: String = row.get(5)?;
        Ok(DailyTask {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            day_offset: row.get(2)?,
            description: row.get(3)?,
            details: row.get(4)?,
            created_at: Self::parse_timestamp(&created_at),
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let sender: String = row.get(2)?;
        let created_at: String = row.get(3)?;
        let sender = Sender::parse(&sender).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown sender {:?}", sender).into(),
            )
        })?;
        Ok(ChatMessage {
            id: row.get(0)?,
            text: row.get(1)?,
            sender,
            created_at: Self::parse_timestamp(&created_at),
        })
    }

    fn get_plan(&self, id: &str) -> RecordResult<Option<AgriculturePlan>> {
        let sql = format!("SELECT {} FROM agriculture_plans WHERE id = ?1", PLAN_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_plan)
            .optional()?)
    }

    fn get_task(&self, id: &str) -> RecordResult<Option<DailyTask>> {
        let sql = format!("SELECT {} FROM daily_tasks WHERE id = ?1", TASK_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_task)
            .optional()?)
    }
}

impl RecordBackend for SqliteRecordStore {
    fn current_plan(&self) -> RecordResult<Option<AgriculturePlan>> {
        let sql = format!(
            "SELECT {} FROM agriculture_plans ORDER BY created_at DESC, rowid DESC LIMIT 1",
            PLAN_COLUMNS
        );
        Ok(self.conn.query_row(&sql, [], Self::row_to_plan).optional()?)
    }

    fn insert_plan(&self, fields: &PlanFields) -> RecordResult<AgriculturePlan> {
        validate_plan_fields(fields)?;
        let plan = AgriculturePlan {
            id: Self::new_id(),
            crop_name: fields.crop_name.clone(),
            farm_location: fields.farm_location.clone(),
            season_goal: fields.season_goal.clone(),
            notes: fields.notes.clone(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO agriculture_plans (id, crop_name, farm_location, season_goal, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                plan.id,
                plan.crop_name,
                plan.farm_location,
                plan.season_goal,
                plan.notes,
                Self::timestamp(plan.created_at),
            ],
        )?;
        tracing::info!("Inserted plan {} ({})", plan.id, plan.crop_name);
        Ok(plan)
    }

    fn update_plan(&self, id: &str, fields: &PlanFields) -> RecordResult<AgriculturePlan> {
        validate_plan_fields(fields)?;
        let changed = self.conn.execute(
            "UPDATE agriculture_plans
             SET crop_name = ?2, farm_location = ?3, season_goal = ?4, notes = ?5
             WHERE id = ?1",
            params![
                id,
                fields.crop_name,
                fields.farm_location,
                fields.season_goal,
                fields.notes
            ],
        )?;
        if changed == 0 {
            return Err(RecordError::not_found(id));
        }
        self.get_plan(id)?.ok_or_else(|| RecordError::not_found(id))
    }

    fn list_tasks(&self, plan_id: &str) -> RecordResult<Vec<DailyTask>> {
        let sql = format!(
            "SELECT {} FROM daily_tasks WHERE plan_id = ?1
             ORDER BY task_date, created_at, rowid",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![plan_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn insert_task(&self, task: &NewTask) -> RecordResult<DailyTask> {
        validate_day_offset(task.day_offset)?;
        let row = DailyTask {
            id: Self::new_id(),
            plan_id: task.plan_id.clone(),
            day_offset: task.day_offset,
            description: task.description.clone(),
            details: task.details.clone(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO daily_tasks (id, plan_id, task_date, task_description, task_details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.plan_id,
                row.day_offset,
                row.description,
                row.details,
                Self::timestamp(row.created_at),
            ],
        )?;
        Ok(row)
    }

    fn update_task(&self, id: &str, update: &TaskUpdate) -> RecordResult<DailyTask> {
        let changed = self.conn.execute(
            "UPDATE daily_tasks SET task_description = ?2, task_details = ?3 WHERE id = ?1",
            params![id, update.description, update.details],
        )?;
        if changed == 0 {
            return Err(RecordError::not_found(id));
        }
        self.get_task(id)?.ok_or_else(|| RecordError::not_found(id))
    }

    fn delete_tasks(&self, ids: &[String]) -> RecordResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM daily_tasks WHERE id = ?1")?;
            for id in ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_messages(&self) -> RecordResult<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {} FROM chat_messages ORDER BY created_at, rowid",
            MESSAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let messages = stmt
            .query_map([], Self::row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn insert_message(&self, message: &NewChatMessage) -> RecordResult<ChatMessage> {
        let row = ChatMessage {
            id: Self::new_id(),
            text: message.text.clone(),
            sender: message.sender,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO chat_messages (id, message_text, sender, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                row.id,
                row.text,
                row.sender.as_str(),
                Self::timestamp(row.created_at)
            ],
        )?;
        Ok(row)
    }

    fn clear_messages(&self) -> RecordResult<()> {
        let removed = self.conn.execute("DELETE FROM chat_messages", [])?;
        tracing::info!("Cleared {} chat messages", removed);
        Ok(())
    }
}
