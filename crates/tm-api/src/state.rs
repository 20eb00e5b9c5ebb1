use sqlx::PgPool;

use crate::{ApiConfig, config::Environment};

#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    pub environment: Environment,
}

impl ApiState {
    pub fn new(config: &ApiConfig, pool: PgPool) -> Self {
        Self {
            pool,
            environment: config.env.clone(),
        }
    }
}
