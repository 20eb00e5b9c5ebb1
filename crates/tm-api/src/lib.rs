pub mod achievement;
pub mod analytics;
pub mod auth;
pub mod comment;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod profile;
pub mod progress;
pub mod router;
pub mod state;
pub mod tracing;
pub mod validation;
pub mod view;

pub use config::ApiConfig;
pub use state::ApiState;
