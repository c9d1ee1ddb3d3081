pub mod assistant;
pub mod chat_store;
pub mod plan_store;
pub mod record_backend;
pub mod record_client;
pub mod record_store;
pub mod records;
pub mod rest_store;

pub use assistant::{
    normalize_schedule, AssistantClient, AssistantError, ChatRequest, ConnectionStatus, RawTask,
    ScheduleRequest, ScheduledTask,
};
pub use chat_store::{weather_context, ChatContext, ChatError, ChatStore};
pub use plan_store::{AgricultureStore, PlanState, PlanStoreError, PlanStoreResult};
pub use record_backend::{RecordBackend, RecordError, RecordResult};
pub use record_client::RecordClient;
pub use record_store::SqliteRecordStore;
pub use records::{
    AgriculturePlan, ChatMessage, DailyTask, NewChatMessage, NewTask, PlanFields, Sender,
    TaskUpdate, MAX_DAY_OFFSET, SCHEDULE_DAYS,
};
pub use rest_store::PostgrestClient;
