pub mod handlers;

pub use handlers::{health_check, reconcile, ReconcileRequest, ReconcileResponse};

use crate::config::MatchingConfig;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn router(matching: MatchingConfig) -> Router {
    let reconcile_routes = Router::new()
        .route("/api/reconcile", post(reconcile))
        .with_state(Arc::new(matching));

    Router::new()
        .route("/health", get(health_check))
        .merge(reconcile_routes)
}
