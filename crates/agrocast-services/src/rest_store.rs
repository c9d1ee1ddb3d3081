//! Hosted record storage over PostgREST (the Supabase REST API).

use std::time::Duration;

use agrocast_core::error::ReqwestErrorExt;
use agrocast_core::{Config, NetworkError};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::record_backend::{
    validate_day_offset, validate_plan_fields, RecordError, RecordResult,
};
use crate::records::{
    AgriculturePlan, ChatMessage, DailyTask, NewChatMessage, NewTask, PlanFields, TaskUpdate,
};

const PLANS: &str = "agriculture_plans";
const TASKS: &str = "daily_tasks";
const MESSAGES: &str = "chat_messages";

/// PostgREST refuses unfiltered deletes; this id never exists, so
/// `id=neq.<nil>` matches every row.
const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl From<reqwest::Error> for RecordError {
    fn from(e: reqwest::Error) -> Self {
        RecordError::Network(e.into_network_error())
    }
}

impl PostgrestClient {
    pub fn new(
        project_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> RecordResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> RecordResult<Self> {
        Self::new(
            &config.records.postgrest_url,
            config.records.effective_api_key(),
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("Prefer", "return=representation");
        if let Some(key) = &self.api_key {
            builder = builder
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> RecordResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                RecordError::Network(NetworkError::Decode(format!(
                    "JSON parse error: {}",
                    e
                )))
            })
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("PostgREST returned {}: {}", status, text);
            Err(RecordError::Network(NetworkError::Status {
                status: status.as_u16(),
                message: text,
            }))
        }
    }

    /// Insert/update bodies come back as a one-element array.
    async fn send_one<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> RecordResult<T> {
        let rows: Vec<T> = self.send(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RecordError::not_found(what.to_string()))
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> RecordResult<T> {
        self.send_one(self.request(Method::POST, table).json(&[body]), table)
            .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn current_plan(&self) -> RecordResult<Option<AgriculturePlan>> {
        let rows: Vec<AgriculturePlan> = self
            .send(self.request(Method::GET, PLANS).query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn insert_plan(&self, fields: &PlanFields) -> RecordResult<AgriculturePlan> {
        validate_plan_fields(fields)?;
        self.insert(PLANS, fields).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn update_plan(
        &self,
        id: &str,
        fields: &PlanFields,
    ) -> RecordResult<AgriculturePlan> {
        validate_plan_fields(fields)?;
        let filter = format!("eq.{}", id);
        self.send_one(
            self.request(Method::PATCH, PLANS)
                .query(&[("id", filter.as_str())])
                .json(fields),
            id,
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn list_tasks(&self, plan_id: &str) -> RecordResult<Vec<DailyTask>> {
        let filter = format!("eq.{}", plan_id);
        self.send(self.request(Method::GET, TASKS).query(&[
            ("select", "*"),
            ("plan_id", filter.as_str()),
            ("order", "task_date.asc,created_at.asc"),
        ]))
        .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn insert_task(&self, task: &NewTask) -> RecordResult<DailyTask> {
        validate_day_offset(task.day_offset)?;
        self.insert(TASKS, task).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> RecordResult<DailyTask> {
        let filter = format!("eq.{}", id);
        self.send_one(
            self.request(Method::PATCH, TASKS)
                .query(&[("id", filter.as_str())])
                .json(update),
            id,
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete_tasks(&self, ids: &[String]) -> RecordResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let filter = format!("in.({})", ids.join(","));
        let _: Vec<DailyTask> = self
            .send(self.request(Method::DELETE, TASKS).query(&[("id", filter.as_str())]))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn list_messages(&self) -> RecordResult<Vec<ChatMessage>> {
        self.send(
            self.request(Method::GET, MESSAGES)
                .query(&[("select", "*"), ("order", "created_at.asc")]),
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn insert_message(&self, message: &NewChatMessage) -> RecordResult<ChatMessage> {
        self.insert(MESSAGES, message).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn clear_messages(&self) -> RecordResult<()> {
        let filter = format!("neq.{}", NIL_UUID);
        let removed: Vec<ChatMessage> = self
            .send(self.request(Method::DELETE, MESSAGES).query(&[("id", filter.as_str())]))
            .await?;
        tracing::info!("Cleared {} chat messages", removed.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> PostgrestClient {
        PostgrestClient::new(uri, Some("anon-key".into()), Duration::from_secs(5)).unwrap()
    }

    fn plan_json(id: &str, crop: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "crop_name": crop,
            "farm_location": "North Field",
            "season_goal": "Summer 2025",
            "notes": "",
            "created_at": "2025-06-01T08:00:00+00:00"
        })
    }

    #[tokio::test]
    async fn test_current_plan_orders_newest_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/agriculture_plans"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "1"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                plan_json("p2", "Corn")
            ])))
            .mount(&mock_server)
            .await;

        let plan = client(&mock_server.uri()).current_plan().await.unwrap().unwrap();
        assert_eq!(plan.id, "p2");
        assert_eq!(plan.notes.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_insert_plan_returns_representation() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/agriculture_plans"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(serde_json::json!([{
                "crop_name": "Rice",
                "farm_location": "North Field",
                "season_goal": "Summer 2025",
                "notes": ""
            }])))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!([plan_json("p1", "Rice")])),
            )
            .mount(&mock_server)
            .await;

        let plan = client(&mock_server.uri())
            .insert_plan(&PlanFields {
                crop_name: "Rice".into(),
                farm_location: "North Field".into(),
                season_goal: "Summer 2025".into(),
                notes: Some(String::new()),
            })
            .await
            .unwrap();
        assert_eq!(plan.id, "p1");
    }

    #[tokio::test]
    async fn test_update_task_filters_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/daily_tasks"))
            .and(query_param("id", "eq.t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "t1",
                "plan_id": "p1",
                "task_date": 2,
                "task_description": "Weed rows",
                "task_details": null,
                "created_at": "2025-06-01T08:00:00Z"
            }])))
            .mount(&mock_server)
            .await;

        let task = client(&mock_server.uri())
            .update_task(
                "t1",
                &TaskUpdate {
                    description: "Weed rows".into(),
                    details: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(task.day_offset, 2);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/daily_tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .update_task(
                "gone",
                &TaskUpdate {
                    description: "x".into(),
                    details: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_messages_uses_neq_filter() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/chat_messages"))
            .and(query_param("id", "neq.00000000-0000-0000-0000-000000000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server.uri()).clear_messages().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_tasks_uses_in_filter() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/daily_tasks"))
            .and(query_param("id", "in.(a,b)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let c = client(&mock_server.uri());
        c.delete_tasks(&["a".into(), "b".into()]).await.unwrap();
        c.delete_tasks(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_maps_to_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri()).list_messages().await.unwrap_err();
        assert!(matches!(
            err,
            RecordError::Network(NetworkError::Status { status: 500, .. })
        ));
    }
}
