use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use scheduling_cell::{scheduling_routes, SchedulingEngine};

fn create_test_app() -> Router {
    scheduling_routes(Arc::new(SchedulingEngine::with_reference_minutes(30)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn add_provider(app: &Router, id: &str, availability: Value, max: u32) -> StatusCode {
    let (status, _) = send(
        app,
        "POST",
        "/providers",
        Some(json!({
            "id": id,
            "availability": availability,
            "max_daily_appointments": max
        })),
    )
    .await;
    status
}

#[tokio::test]
async fn test_add_provider() {
    let app = create_test_app();

    let status = add_provider(&app, "dr-a", json!([{"start": "09:00", "end": "12:00"}]), 5).await;
    assert_eq!(status, StatusCode::CREATED);

    let duplicate = add_provider(&app, "dr-a", json!([{"start": "13:00", "end": "14:00"}]), 5).await;
    assert_eq!(duplicate, StatusCode::CONFLICT);

    let overlapping = add_provider(
        &app,
        "dr-b",
        json!([{"start": "09:00", "end": "11:00"}, {"start": "10:00", "end": "12:00"}]),
        5,
    )
    .await;
    assert_eq!(overlapping, StatusCode::BAD_REQUEST);

    let malformed = add_provider(&app, "dr-c", json!([{"start": "9am", "end": "11:00"}]), 5).await;
    assert_eq!(malformed, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedule_and_list_appointments() {
    let app = create_test_app();
    add_provider(
        &app,
        "dr-a",
        json!([{"start": "09:00", "end": "09:30"}, {"start": "10:00", "end": "12:00"}]),
        5,
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/appointments",
        Some(json!({
            "id": "req-1",
            "preferred_range": {"start": "09:00", "end": "12:00"},
            "duration": 30
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["request_id"], "req-1");
    assert_eq!(body["provider_id"], "dr-a");
    assert_eq!(body["time_slot"]["start"], "09:00");
    assert_eq!(body["time_slot"]["end"], "09:30");

    let (status, body) = send(&app, "GET", "/appointments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scheduled"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_schedule_errors() {
    let app = create_test_app();
    add_provider(&app, "dr-a", json!([{"start": "09:00", "end": "10:00"}]), 1).await;

    let request = |id: &str, provider: Option<&str>| {
        json!({
            "id": id,
            "preferred_range": {"start": "09:00", "end": "10:00"},
            "duration": 30,
            "preferred_provider": provider
        })
    };

    let (status, _) = send(&app, "POST", "/appointments", Some(request("req-1", Some("dr-x")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/appointments", Some(request("req-1", Some("dr-a")))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/appointments", Some(request("req-1", None))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "POST", "/appointments", Some(request("req-2", Some("dr-a")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("daily limit"));

    let (status, _) = send(
        &app,
        "POST",
        "/appointments",
        Some(json!({
            "id": "req-3",
            "preferred_range": {"start": "10:00", "end": "09:00"},
            "duration": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_availability_cancels_conflicts() {
    let app = create_test_app();
    add_provider(&app, "dr-a", json!([{"start": "09:00", "end": "12:00"}]), 5).await;

    for (id, start, end) in [("A", "09:00", "09:30"), ("B", "10:00", "10:30")] {
        let (status, _) = send(
            &app,
            "POST",
            "/appointments",
            Some(json!({
                "id": id,
                "preferred_range": {"start": start, "end": end},
                "duration": 30,
                "preferred_provider": "dr-a"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "PUT",
        "/providers/dr-a/availability",
        Some(json!({
            "availability": [{"start": "09:00", "end": "10:00"}, {"start": "10:30", "end": "12:00"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cancelled = body["cancelled"].as_array().unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0]["request_id"], "B");

    let (_, body) = send(&app, "GET", "/appointments", None).await;
    let scheduled = body["scheduled"].as_array().unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0]["request_id"], "A");

    let (status, _) = send(
        &app,
        "PUT",
        "/providers/dr-x/availability",
        Some(json!({"availability": [{"start": "09:00", "end": "10:00"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_provider_and_cancel_appointment() {
    let app = create_test_app();
    add_provider(&app, "dr-a", json!([{"start": "09:00", "end": "10:00"}]), 5).await;

    let (status, _) = send(
        &app,
        "POST",
        "/appointments",
        Some(json!({
            "id": "req-1",
            "preferred_range": {"start": "09:00", "end": "10:00"},
            "duration": 20
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/providers/dr-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["free_intervals"], json!([{"start": "09:20", "end": "10:00"}]));
    assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
    assert_eq!(body["slot_count"], 1);

    let (status, body) = send(&app, "DELETE", "/appointments/req-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["time_slot"]["start"], "09:00");

    let (status, _) = send(&app, "DELETE", "/appointments/req-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/providers/dr-missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
