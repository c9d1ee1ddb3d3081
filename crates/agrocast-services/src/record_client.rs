//! Unified record client supporting multiple backends.
//!
//! `RecordClient` wraps the SQLite store and the PostgREST client behind one
//! async interface.

use std::sync::Arc;

use agrocast_core::{Config, RecordBackend as BackendKind};
use parking_lot::Mutex;

use crate::record_backend::{RecordBackend, RecordResult};
use crate::record_store::SqliteRecordStore;
use crate::records::{
    AgriculturePlan, ChatMessage, DailyTask, NewChatMessage, NewTask, PlanFields, TaskUpdate,
};
use crate::rest_store::PostgrestClient;

#[derive(Clone)]
pub enum RecordClient {
    /// Local SQLite storage (default).
    Sqlite(Arc<Mutex<SqliteRecordStore>>),

    /// Hosted PostgREST/Supabase tables.
    Rest(Arc<PostgrestClient>),
}

/// Run a blocking store call on the blocking pool.
macro_rules! blocking {
    ($store:expr, |$s:ident| $body:expr) => {{
        let store = $store.clone();
        tokio::task::spawn_blocking(move || {
            let $s = store.lock();
            $body
        })
        .await?
    }};
}

impl RecordClient {
    pub fn sqlite(store: SqliteRecordStore) -> Self {
        Self::Sqlite(Arc::new(Mutex::new(store)))
    }

    pub fn rest(client: PostgrestClient) -> Self {
        Self::Rest(Arc::new(client))
    }

    /// Build the backend selected in `config.records`.
    pub fn from_config(config: &Config) -> RecordResult<Self> {
        match config.records.backend {
            BackendKind::Sqlite => {
                let path = config.records.sqlite_path(&config.config_dir);
                tracing::info!("Using SQLite records at {}", path.display());
                Ok(Self::sqlite(SqliteRecordStore::open(path)?))
            }
            BackendKind::Postgrest => {
                tracing::info!("Using PostgREST records at {}", config.records.postgrest_url);
                Ok(Self::rest(PostgrestClient::from_config(config)?))
            }
        }
    }

    pub fn is_sqlite(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }

    pub async fn current_plan(&self) -> RecordResult<Option<AgriculturePlan>> {
        match self {
            Self::Sqlite(store) => blocking!(store, |s| s.current_plan()),
            Self::Rest(client) => client.current_plan().await,
        }
    }

    pub async fn insert_plan(&self, fields: &PlanFields) -> RecordResult<AgriculturePlan> {
        match self {
            Self::Sqlite(store) => {
                let fields = fields.clone();
                blocking!(store, |s| s.insert_plan(&fields))
            }
            Self::Rest(client) => client.insert_plan(fields).await,
        }
    }

    pub async fn update_plan(
        &self,
        id: &str,
        fields: &PlanFields,
    ) -> RecordResult<AgriculturePlan> {
        match self {
            Self::Sqlite(store) => {
                let (id, fields) = (id.to_string(), fields.clone());
                blocking!(store, |s| s.update_plan(&id, &fields))
            }
            Self::Rest(client) => client.update_plan(id, fields).await,
        }
    }

    pub async fn list_tasks(&self, plan_id: &str) -> RecordResult<Vec<DailyTask>> {
        match self {
            Self::Sqlite(store) => {
                let plan_id = plan_id.to_string();
                blocking!(store, |s| s.list_tasks(&plan_id))
            }
            Self::Rest(client) => client.list_tasks(plan_id).await,
        }
    }

    pub async fn insert_task(&self, task: &NewTask) -> RecordResult<DailyTask> {
        match self {
            Self::Sqlite(store) => {
                let task = task.clone();
                blocking!(store, |s| s.insert_task(&task))
            }
            Self::Rest(client) => client.insert_task(task).await,
        }
    }

    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> RecordResult<DailyTask> {
        match self {
            Self::Sqlite(store) => {
                let (id, update) = (id.to_string(), update.clone());
                blocking!(store, |s| s.update_task(&id, &update))
            }
            Self::Rest(client) => client.update_task(id, update).await,
        }
    }

    pub async fn delete_tasks(&self, ids: &[String]) -> RecordResult<()> {
        match self {
            Self::Sqlite(store) => {
                let ids = ids.to_vec();
                blocking!(store, |s| s.delete_tasks(&ids))
            }
            Self::Rest(client) => client.delete_tasks(ids).await,
        }
    }

    pub async fn list_messages(&self) -> RecordResult<Vec<ChatMessage>> {
        match self {
            Self::Sqlite(store) => blocking!(store, |s| s.list_messages()),
            Self::Rest(client) => client.list_messages().await,
        }
    }

    pub async fn insert_message(&self, message: &NewChatMessage) -> RecordResult<ChatMessage> {
        match self {
            Self::Sqlite(store) => {
                let message = message.clone();
                blocking!(store, |s| s.insert_message(&message))
            }
            Self::Rest(client) => client.insert_message(message).await,
        }
    }

    pub async fn clear_messages(&self) -> RecordResult<()> {
        match self {
            Self::Sqlite(store) => blocking!(store, |s| s.clear_messages()),
            Self::Rest(client) => client.clear_messages().await,
        }
    }
}
