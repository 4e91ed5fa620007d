mod admin;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Liveness check shared by both listeners. The CMS is not contacted.
async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
