//! Generated schedules replace the task set through the hosted backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agrocast_services::{
    AgricultureStore, AssistantClient, PlanStoreError, PostgrestClient, RecordClient, RecordError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn mount_plan_and_old_tasks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/agriculture_plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "p1",
            "crop_name": "Rice",
            "farm_location": "North Field",
            "season_goal": "Summer 2025",
            "notes": null,
            "created_at": "2025-06-01T08:00:00Z"
        }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/daily_tasks"))
        .and(query_param("plan_id", "eq.p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "old1",
            "plan_id": "p1",
            "task_date": 0,
            "task_description": "Manual",
            "task_details": null,
            "created_at": "2025-06-01T08:05:00Z"
        }])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/groq/generate-schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tasks": (0..7).map(|d| serde_json::json!({
                "day": d,
                "description": format!("Generated {}", d),
                "details": "auto"
            })).collect::<Vec<_>>()
        })))
        .mount(server)
        .await;
}

/// Echo inserted task rows back with sequential ids; fail after `succeed` rows.
fn insert_responder(succeed: usize) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    let counter = Arc::new(AtomicUsize::new(0));
    move |request: &Request| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if n > succeed {
            return ResponseTemplate::new(500).set_body_string("insert failed");
        }
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let mut row = body[0].clone();
        row["id"] = serde_json::json!(format!("new{}", n));
        row["created_at"] = serde_json::json!("2025-06-02T00:00:00Z");
        ResponseTemplate::new(201).set_body_json(serde_json::json!([row]))
    }
}

async fn store(server: &MockServer) -> AgricultureStore {
    let records = RecordClient::rest(
        PostgrestClient::new(&server.uri(), Some("key".into()), Duration::from_secs(5)).unwrap(),
    );
    let assistant = AssistantClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let mut store = AgricultureStore::new(records, assistant);
    store.load_current_plan().await.unwrap();
    store
}

#[tokio::test]
async fn failed_insert_removes_partial_rows_and_keeps_old_set() {
    let server = MockServer::start().await;
    mount_plan_and_old_tasks(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_tasks"))
        .respond_with(insert_responder(3))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/daily_tasks"))
        .and(query_param("id", "in.(new1,new2,new3)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/daily_tasks"))
        .and(query_param("id", "in.(old1)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut store = store(&server).await;
    let err = store.generate_schedule("Hue").await.unwrap_err();

    assert!(matches!(err, PlanStoreError::Record(RecordError::Network(_))));
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].id, "old1");
}

#[tokio::test]
async fn successful_swap_deletes_superseded_rows() {
    let server = MockServer::start().await;
    mount_plan_and_old_tasks(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/daily_tasks"))
        .respond_with(insert_responder(7))
        .expect(7)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/daily_tasks"))
        .and(query_param("id", "in.(old1)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = store(&server).await;
    let inserted = store.generate_schedule("Hue").await.unwrap();

    assert_eq!(inserted, 7);
}
