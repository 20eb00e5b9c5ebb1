use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tm_api::router;
use uuid::Uuid;

use crate::common::{TestClient, TestStateBuilder, db};

async fn post_view(client: &TestClient, content_id: Uuid, ip: &str) -> crate::common::TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/contents/{content_id}/view"))
        .header("x-forwarded-for", ip)
        .header("user-agent", "integration-suite")
        .body(Body::empty())
        .expect("Failed to build request");
    client.request(request).await
}

#[tokio::test]
#[ignore]
async fn test_views_deduplicate_per_ip() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    // Fresh content per test run, so the dedup window starts empty
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let ip = "10.1.0.1";

    let response = post_view(&client, content_id, ip).await;
    response.assert_status(StatusCode::OK);
    let first: serde_json::Value = response.json();
    assert_eq!(first["is_new_view"], true);
    let count = first["view_count"].as_i64().unwrap();
    assert_eq!(count, 1);

    // The event insert is spawned; give it a moment to land before the
    // dedup check reads it back.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let response = post_view(&client, content_id, ip).await;
    response.assert_status(StatusCode::OK);
    let second: serde_json::Value = response.json();
    assert_eq!(second["is_new_view"], false);
    assert_eq!(second["view_count"].as_i64().unwrap(), count);
}

#[tokio::test]
#[ignore]
async fn test_distinct_ips_both_count() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();

    let first: serde_json::Value = post_view(&client, content_id, "10.2.0.1").await.json();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let second: serde_json::Value = post_view(&client, content_id, "10.2.0.2").await.json();

    assert_eq!(second["is_new_view"], true);
    assert_eq!(
        second["view_count"].as_i64().unwrap(),
        first["view_count"].as_i64().unwrap() + 1
    );
}

#[tokio::test]
#[ignore]
async fn test_view_unknown_content_404s() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state));

    let response = post_view(&client, Uuid::new_v4(), "10.3.0.1").await;
    response.assert_status(StatusCode::NOT_FOUND);
}
