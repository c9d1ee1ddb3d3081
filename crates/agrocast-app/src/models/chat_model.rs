//! Chat model: the persisted conversation with the farming assistant.

use std::sync::Arc;

use agrocast_services::{ChatContext, ChatMessage, ChatStore, RecordError};
use tokio::runtime::Handle;

use crate::app_services::AppServices;

/// Error type for chat operations
#[derive(Debug, Clone)]
pub enum ChatError {
    EmptyMessage,
    Storage(String),
    Network(String),
    NotInitialized(String),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::EmptyMessage => write!(f, "Message is empty"),
            ChatError::Storage(s) => write!(f, "Storage error: {}", s),
            ChatError::Network(s) => write!(f, "Network error: {}", s),
            ChatError::NotInitialized(s) => write!(f, "Chat not initialized: {}", s),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<agrocast_services::ChatError> for ChatError {
    fn from(e: agrocast_services::ChatError) -> Self {
        match e {
            agrocast_services::ChatError::EmptyMessage => ChatError::EmptyMessage,
            agrocast_services::ChatError::Record(RecordError::Network(n)) => {
                ChatError::Network(n.to_string())
            }
            agrocast_services::ChatError::Record(r) => ChatError::Storage(r.to_string()),
        }
    }
}

pub struct ChatModel {
    runtime: Handle,
    store: ChatStore,
}

impl ChatModel {
    pub fn new(services: &Arc<AppServices>) -> Result<Self, ChatError> {
        let records = services
            .record_client()
            .map_err(|e| ChatError::NotInitialized(format!("{:#}", e)))?;
        let fallback = &services.config().chat.fallback_message;
        Ok(Self {
            runtime: services.runtime(),
            store: ChatStore::new(records, services.assistant(), fallback),
        })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn is_typing(&self) -> bool {
        self.store.is_typing()
    }

    pub fn load(&mut self) -> Result<usize, ChatError> {
        let count = self.runtime.block_on(self.store.load())?.len();
        Ok(count)
    }

    /// Send `text` with the given context. Returns the stored bot reply, which
    /// is the configured fallback when the assistant could not answer.
    pub fn send(&mut self, text: &str, context: ChatContext) -> Result<ChatMessage, ChatError> {
        Ok(self.runtime.block_on(self.store.send(text, context))?)
    }

    pub fn clear(&mut self) -> Result<(), ChatError> {
        self.runtime.block_on(self.store.clear_chat())?;
        tracing::info!("Chat history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use agrocast_core::Config;
    use agrocast_services::{RecordClient, Sender, SqliteRecordStore};

    #[test]
    fn test_unreachable_assistant_stores_fallback() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9".to_string();
        config.chat.fallback_message = "Offline".to_string();
        let services = AppServices::new(config).unwrap();
        services.set_record_client(RecordClient::sqlite(SqliteRecordStore::in_memory().unwrap()));

        let mut chat = ChatModel::new(&services).unwrap();
        assert_eq!(chat.load().unwrap(), 0);

        let reply = chat.send("Should I irrigate?", ChatContext::default()).unwrap();
        assert_eq!(reply.text, "Offline");
        assert_eq!(reply.sender, Sender::Bot);
        assert!(!chat.is_typing());
        assert_eq!(chat.messages().len(), 2);

        assert!(matches!(
            chat.send("   ", ChatContext::default()),
            Err(ChatError::EmptyMessage)
        ));

        chat.clear().unwrap();
        assert_eq!(chat.load().unwrap(), 0);
    }
}
