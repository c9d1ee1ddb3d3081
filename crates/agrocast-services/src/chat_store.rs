use agrocast_weather::WeatherSnapshot;
use thiserror::Error;

use crate::assistant::{AssistantClient, AssistantError, ChatRequest};
use crate::plan_store::AgricultureStore;
use crate::record_backend::RecordError;
use crate::record_client::RecordClient;
use crate::records::{ChatMessage, NewChatMessage, Sender};

/// Hours of the hourly forecast included in the assistant context
const CONTEXT_HOURS: usize = 6;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "Type a message first.",
            Self::Record(e) => e.user_message(),
        }
    }
}

/// Context handed to the assistant with each user message
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub weather: serde_json::Value,
    pub agriculture: serde_json::Value,
}

impl ChatContext {
    pub fn gather(weather: Option<&WeatherSnapshot>, plan: &AgricultureStore) -> Self {
        Self {
            weather: weather_context(weather),
            agriculture: plan.agriculture_context(),
        }
    }
}

/// Condensed view of the current snapshot; `null` when nothing is loaded.
pub fn weather_context(snapshot: Option<&WeatherSnapshot>) -> serde_json::Value {
    let Some(snapshot) = snapshot else {
        return serde_json::Value::Null;
    };
    let today = &snapshot.today.raw_data;

    serde_json::json!({
        "city": snapshot.city,
        "today": {
            "date": snapshot.today.time,
            "description": snapshot.today.weather_description,
            "temperature": today.temperature(),
            "apparent_temperature": today.apparent_temperature(),
            "humidity": today.humidity(),
            "precipitation": today.precipitation(),
            "wind_speed": today.wind_speed(),
        },
        "next_hours": snapshot
            .hourly
            .iter()
            .take(CONTEXT_HOURS)
            .map(|h| serde_json::json!({
                "time": h.time,
                "temperature": h.raw_data.temperature(),
                "precipitation": h.raw_data.precipitation(),
            }))
            .collect::<Vec<_>>(),
        "seven_day": snapshot
            .seven_day
            .iter()
            .map(|d| serde_json::json!({
                "date": d.date,
                "description": d.weather_description,
                "temperature_max": d.readings.temperature_max(),
                "temperature_min": d.readings.temperature_min(),
                "precipitation": d.readings.precipitation(),
            }))
            .collect::<Vec<_>>(),
    })
}

/// Persisted chat log plus the in-flight turn.
///
/// A turn is `submit_user_message` followed by `complete_turn`; `send` runs
/// both around the assistant call.
pub struct ChatStore {
    records: RecordClient,
    assistant: AssistantClient,
    fallback_message: String,
    messages: Vec<ChatMessage>,
    typing: bool,
}

impl ChatStore {
    pub fn new(records: RecordClient, assistant: AssistantClient, fallback_message: &str) -> Self {
        Self {
            records,
            assistant,
            fallback_message: fallback_message.to_string(),
            messages: Vec::new(),
            typing: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a reply is pending
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub async fn load(&mut self) -> Result<&[ChatMessage], ChatError> {
        self.messages = self.records.list_messages().await?;
        tracing::debug!("Loaded {} chat messages", self.messages.len());
        Ok(&self.messages)
    }

    /// Persist and append the user's message, then show the typing indicator.
    pub async fn submit_user_message(&mut self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let saved = self
            .records
            .insert_message(&NewChatMessage {
                text: text.to_string(),
                sender: Sender::User,
            })
            .await?;
        self.messages.push(saved.clone());
        self.typing = true;
        Ok(saved)
    }

    /// Persist the assistant's reply, or the fallback text when it failed.
    pub async fn complete_turn(
        &mut self,
        reply: Result<String, AssistantError>,
    ) -> Result<ChatMessage, ChatError> {
        let text = match reply {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!("Assistant returned an empty reply");
                self.fallback_message.clone()
            }
            Err(e) => {
                tracing::warn!("Assistant chat failed: {}", e);
                self.fallback_message.clone()
            }
        };

        let result = self
            .records
            .insert_message(&NewChatMessage {
                text,
                sender: Sender::Bot,
            })
            .await;
        self.typing = false;

        let saved = result?;
        self.messages.push(saved.clone());
        Ok(saved)
    }

    /// Run a full turn. Returns the bot message that was stored.
    pub async fn send(
        &mut self,
        text: &str,
        context: ChatContext,
    ) -> Result<ChatMessage, ChatError> {
        let user = self.submit_user_message(text).await?;

        let request = ChatRequest {
            user_message: user.text,
            weather_context: context.weather,
            agriculture_context: context.agriculture,
        };
        let reply = self.assistant.chat(&request).await;
        self.complete_turn(reply).await
    }

    pub async fn clear_chat(&mut self) -> Result<(), ChatError> {
        self.records.clear_messages().await?;
        self.messages.clear();
        Ok(())
    }
}
