use axum::http::StatusCode;
use serde_json::json;
use tm_api::router;

use crate::common::{TestClient, TestStateBuilder, db};

#[tokio::test]
#[ignore]
async fn test_start_is_idempotent() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();

    let response = client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await;
    response.assert_status(StatusCode::CREATED);
    let first: serde_json::Value = response.json();
    assert_eq!(first["already_started"], false);
    assert_eq!(first["progress"], 0.0);

    // Second start resumes the same record instead of creating another
    let response = client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await;
    response.assert_status(StatusCode::OK);
    let second: serde_json::Value = response.json();
    assert_eq!(second["already_started"], true);
    assert_eq!(second["id"], first["id"]);
}

#[tokio::test]
#[ignore]
async fn test_start_unknown_or_unpublished_content_404s() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();

    let response = client
        .post_as(
            &format!("/progress/{}/start", uuid::Uuid::new_v4()),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let draft_id = db::create_unpublished_tutorial(&state.pool).await.unwrap();
    let response = client
        .post_as(&format!("/progress/{draft_id}/start"), user_id)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_update_before_start_404s() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();

    let response = client
        .put_json_as(
            &format!("/progress/{content_id}"),
            &json!({ "percentage": 45.0 }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_update_to_100_stamps_completion() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();

    client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = client
        .put_json_as(
            &format!("/progress/{content_id}"),
            &json!({ "percentage": 45.0, "last_position_secs": 270 }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["progress"], 45.0);
    assert!(body["completed_at"].is_null());

    let response = client
        .put_json_as(
            &format!("/progress/{content_id}"),
            &json!({ "percentage": 100.0 }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(!body["completed_at"].is_null());
    // Untouched field survives the partial update
    assert_eq!(body["last_position_secs"], 270);
}

#[tokio::test]
#[ignore]
async fn test_update_rejects_out_of_range_percentage() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = client
        .put_json_as(
            &format!("/progress/{content_id}"),
            &json!({ "percentage": 101.0 }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_complete_is_idempotent() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = client
        .post_as(&format!("/progress/{content_id}/complete"), user_id)
        .await;
    response.assert_status(StatusCode::OK);
    let first: serde_json::Value = response.json();
    assert_eq!(first["progress"], 100.0);
    let completed_at = first["completed_at"].clone();
    assert!(!completed_at.is_null());

    // Re-completing keeps the original completion timestamp
    let response = client
        .post_as(&format!("/progress/{content_id}/complete"), user_id)
        .await;
    response.assert_status(StatusCode::OK);
    let second: serde_json::Value = response.json();
    assert_eq!(second["completed_at"], completed_at);
}

#[tokio::test]
#[ignore]
async fn test_note_crud_scoped_to_record() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = client
        .post_json_as(
            &format!("/progress/{content_id}/notes"),
            &json!({ "body": "remember this part", "video_timestamp_secs": 120 }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let note: serde_json::Value = response.json();
    let note_id = note["id"].as_str().unwrap().to_string();

    let response = client
        .put_json_as(
            &format!("/progress/{content_id}/notes/{note_id}"),
            &json!({ "body": "edited note" }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["body"], "edited note");
    assert_eq!(updated["video_timestamp_secs"], 120);

    client
        .delete_as(&format!("/progress/{content_id}/notes/{note_id}"), user_id)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // Deleting again is a 404, not a silent success
    client
        .delete_as(&format!("/progress/{content_id}/notes/{note_id}"), user_id)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_cross_tutorial_notes_filter() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let first = db::create_test_tutorial(&state.pool).await.unwrap();
    let second = db::create_test_tutorial(&state.pool).await.unwrap();

    for content_id in [first, second] {
        client
            .post_as(&format!("/progress/{content_id}/start"), user_id)
            .await
            .assert_status(StatusCode::CREATED);
    }
    client
        .post_json_as(
            &format!("/progress/{first}/notes"),
            &json!({ "body": "ownership and borrowing" }),
            user_id,
        )
        .await
        .assert_status(StatusCode::CREATED);
    client
        .post_json_as(
            &format!("/progress/{second}/notes"),
            &json!({ "body": "lifetimes elision rules" }),
            user_id,
        )
        .await
        .assert_status(StatusCode::CREATED);

    let response = client.get_as("/notes?q=borrowing", user_id).await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["notes"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);

    let response = client.get_as("/notes", user_id).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["notes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_bookmarks_listed_with_record() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    client
        .post_as(&format!("/progress/{content_id}/start"), user_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = client
        .post_json_as(
            &format!("/progress/{content_id}/bookmarks"),
            &json!({ "timestamp_secs": 90, "note": "key definition" }),
            user_id,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let bookmark: serde_json::Value = response.json();
    let bookmark_id = bookmark["id"].as_str().unwrap().to_string();

    let response = client.get_as(&format!("/progress/{content_id}"), user_id).await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["bookmarks"].as_array().unwrap().len(), 1);

    client
        .delete_as(
            &format!("/progress/{content_id}/bookmarks/{bookmark_id}"),
            user_id,
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_progress_requires_auth() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state));

    let response = client.get("/progress").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
