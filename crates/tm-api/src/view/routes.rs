use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, Path, Request, State},
    http::header,
    routing::post,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use tm_db::repositories::view as view_repo;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Deduplication window: one counted view per (content, IP) per day.
const DEDUP_WINDOW_HOURS: i64 = 24;

pub fn routes() -> Router<ApiState> {
    Router::new().route("/contents/{content_id}/view", post(record_view))
}

#[derive(Serialize)]
struct ViewResponse {
    view_count: i64,
    is_new_view: bool,
}

/// Count a view. Repeat views from the same IP inside the window return the
/// current count without incrementing. The counter bump is a single atomic
/// update; the dedup event insert is spawned after the response-relevant
/// work and its failure only costs dedup accuracy, never the count.
async fn record_view(
    State(state): State<ApiState>,
    Path(content_id): Path<Uuid>,
    req: Request,
) -> Result<Json<ViewResponse>, ApiError> {
    let ip_address = client_ip(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let since = Utc::now() - Duration::hours(DEDUP_WINDOW_HOURS);
    if view_repo::has_recent_view(&state.pool, content_id, &ip_address, since).await? {
        let view_count = view_repo::current_view_count(&state.pool, content_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Content not found".to_string()))?;
        return Ok(Json(ViewResponse {
            view_count,
            is_new_view: false,
        }));
    }

    let view_count = view_repo::increment_view_count(&state.pool, content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Content not found".to_string()))?;

    let pool = state.pool.clone();
    tokio::spawn(async move {
        if let Err(err) =
            view_repo::insert_view_event(&pool, content_id, &ip_address, user_agent.as_deref())
                .await
        {
            tracing::warn!(content_id = %content_id, "Failed to record view event: {err}");
        }
    });

    Ok(Json(ViewResponse {
        view_count,
        is_new_view: true,
    }))
}

/// Client IP: first hop of `X-Forwarded-For`, falling back to the socket
/// address when the service is reached directly.
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
