use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. Requests still pass the authentication layer; the
/// `ADMIN` role is checked inside each handler.
pub fn admin_routes() -> Router<AppState> {
    // GET /admin/editors/stats
    Router::new().route("/editors/stats", get(handlers::get_editor_stats))
}
