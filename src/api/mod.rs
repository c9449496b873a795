mod error;
mod handlers;

use crate::config::Config;
use crate::repositories::DelegationReader;
use axum::{routing::get, Router};
use std::sync::Arc;

pub struct AppState {
    pub reader: Arc<dyn DelegationReader>,
    pub default_limit: i64,
    pub max_limit: i64,
}

pub fn router(reader: Arc<dyn DelegationReader>, config: &Config) -> Router {
    let state = Arc::new(AppState {
        reader,
        default_limit: config.default_limit,
        max_limit: config.max_limit,
    });

    Router::new()
        .route("/delegations", get(handlers::get_delegations))
        .with_state(state)
}
