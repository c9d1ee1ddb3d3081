use crate::models::chat_model::ChatError as UiChatError;
use agrocast_core::{AppError, DatabaseError, NetworkError};

impl From<UiChatError> for AppError {
    fn from(e: UiChatError) -> Self {
        match e {
            UiChatError::EmptyMessage => AppError::Service("Message is empty".to_string()),
            UiChatError::Storage(s) => AppError::Database(DatabaseError::Query(s)),
            UiChatError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
            UiChatError::NotInitialized(s) => AppError::Database(DatabaseError::Open(s)),
        }
    }
}
