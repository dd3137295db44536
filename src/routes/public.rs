use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that never reject for lack of a session. The gate answers for
/// anonymous callers too; that is how the browser learns where to send them.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /gate?path=...
        // Access decision (render / redirect / navigation chrome) for the caller's session.
        .route("/gate", get(handlers::get_gate))
        // POST /logout
        // Clears the session keys and expires their cookies.
        .route("/logout", post(handlers::logout))
}
