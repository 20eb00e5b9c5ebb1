use axum::http::StatusCode;
use serde_json::json;
use tm_api::router;
use uuid::Uuid;

use crate::common::{TestClient, TestStateBuilder, db};

fn comment_body(email: &str) -> serde_json::Value {
    json!({
        "author_name": "Reader",
        "author_email": email,
        "body": "Great walkthrough, the borrow checker finally clicked."
    })
}

#[tokio::test]
#[ignore]
async fn test_submitted_comment_is_pending() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let email = format!("reader-{}@example.com", Uuid::new_v4());

    let response = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &comment_body(&email),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment: serde_json::Value = response.json();
    assert_eq!(comment["status"], "pending");
    assert_eq!(comment["author_email"], email);

    // Pending comments are invisible to the public listing
    let response = client
        .get(&format!("/contents/{content_id}/comments"))
        .await;
    response.assert_status(StatusCode::OK);
    let listed: Vec<serde_json::Value> = response.json();
    assert!(
        !listed
            .iter()
            .any(|c| c["id"] == comment["id"])
    );
}

#[tokio::test]
#[ignore]
async fn test_spam_phrase_rejected() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let response = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &json!({
                "author_name": "Spammer",
                "author_email": "spam@example.com",
                "body": "CLICK HERE for a great discount"
            }),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_invalid_email_rejected() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let response = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &comment_body("not-an-email"),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_sixth_comment_in_an_hour_rate_limited() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let email = format!("chatty-{}@example.com", Uuid::new_v4());

    for _ in 0..5 {
        client
            .post_json(
                &format!("/contents/{content_id}/comments"),
                &comment_body(&email),
            )
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &comment_body(&email),
        )
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
#[ignore]
async fn test_moderation_approves_and_logs() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let admin_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let email = format!("reader-{}@example.com", Uuid::new_v4());

    let comment: serde_json::Value = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &comment_body(&email),
        )
        .await
        .json();
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let response = client
        .put_json_as_admin(
            &format!("/admin/comments/{comment_id}/moderate"),
            &json!({ "status": "approved", "notes": "on topic" }),
            admin_id,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["comment"]["status"], "approved");
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["action"], "approved");

    // Approved comments surface publicly
    let listed: Vec<serde_json::Value> = client
        .get(&format!("/contents/{content_id}/comments"))
        .await
        .json();
    assert!(listed.iter().any(|c| c["id"].as_str() == Some(&comment_id)));
}

#[tokio::test]
#[ignore]
async fn test_moderation_rejects_bad_status() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let admin_id = db::create_test_user(&state.pool).await.unwrap();
    let response = client
        .put_json_as_admin(
            &format!("/admin/comments/{}/moderate", Uuid::new_v4()),
            &json!({ "status": "escalated" }),
            admin_id,
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_bulk_moderation() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let admin_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..3 {
        let email = format!("bulk-{i}-{}@example.com", Uuid::new_v4());
        let comment: serde_json::Value = client
            .post_json(
                &format!("/contents/{content_id}/comments"),
                &comment_body(&email),
            )
            .await
            .json();
        ids.push(comment["id"].as_str().unwrap().to_string());
    }

    let response = client
        .post_json_as_admin(
            "/admin/comments/bulk-moderate",
            &json!({ "comment_ids": ids, "status": "rejected" }),
            admin_id,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["moderated"], 3);
}

#[tokio::test]
#[ignore]
async fn test_admin_queue_requires_admin_role() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let user_id = db::create_test_user(&state.pool).await.unwrap();
    let response = client.get_as("/admin/comments", user_id).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = client.get_as_admin("/admin/comments?status=pending", user_id).await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_delete_comment() {
    let state = TestStateBuilder::new().build().await.unwrap();
    let client = TestClient::new(router::router().with_state(state.clone()));

    let admin_id = db::create_test_user(&state.pool).await.unwrap();
    let content_id = db::create_test_tutorial(&state.pool).await.unwrap();
    let email = format!("gone-{}@example.com", Uuid::new_v4());

    let comment: serde_json::Value = client
        .post_json(
            &format!("/contents/{content_id}/comments"),
            &comment_body(&email),
        )
        .await
        .json();
    let comment_id = comment["id"].as_str().unwrap().to_string();

    client
        .delete_as_admin(&format!("/admin/comments/{comment_id}"), admin_id)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    client
        .delete_as_admin(&format!("/admin/comments/{comment_id}"), admin_id)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
