use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use tm_api::{config::ApiConfig, metrics, state::ApiState};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    tm_api::tracing::init_tracing(&config.env);

    let metrics_handle = metrics::init_metrics()?;

    // Connect and run embedded migrations before accepting traffic
    let pool = tm_db::create_pool(&config.database_url, config.max_db_connections).await?;
    tm_db::ensure_db_and_migrate(&config.database_url, &pool).await?;

    let state = ApiState::new(&config, pool);

    let app = tm_api::router::router()
        .with_state(state)
        .merge(
            Router::new()
                .route("/metrics", get(metrics::metrics_handler))
                .with_state(metrics_handle),
        )
        .layer(middleware::from_fn(metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(tm_api::middleware::create_cors_layer(
            config.allowed_origins.clone(),
        ));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Server running on http://{}", config.bind_address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
