use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::cache::FetchCache;

use super::{
    health,
    middleware::trace_requests,
};

/// State for the operator listener.
#[derive(Clone)]
pub struct AdminState {
    pub cache: Arc<FetchCache>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_cache/stats", get(cache_stats))
        .route("/_cache/clear", post(cache_clear))
        .route("/_cache/sweep", post(cache_sweep))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(trace_requests))
}

async fn cache_stats(State(state): State<AdminState>) -> Response {
    Json(state.cache.stats()).into_response()
}

async fn cache_clear(State(state): State<AdminState>) -> Response {
    state.cache.clear();
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Serialize)]
struct SweepResult {
    evicted: usize,
}

async fn cache_sweep(State(state): State<AdminState>) -> Response {
    let evicted = state.cache.sweep();
    Json(SweepResult { evicted }).into_response()
}
