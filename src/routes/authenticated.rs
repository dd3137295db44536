use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Authenticated Router Module
///
/// Cover-letter editor sessions. Every handler takes a `SessionUser`, and the
/// registry scopes each editor to the user that opened it.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /editors
        // Opens a blank editor, or loads `document_id` from the backend.
        .route("/editors", post(handlers::create_editor))
        .route(
            "/editors/{id}",
            get(handlers::get_editor).delete(handlers::close_editor),
        )
        // --- Question collection ---
        .route("/editors/{id}/questions", post(handlers::add_question))
        .route(
            "/editors/{id}/questions/last",
            delete(handlers::remove_last_question),
        )
        .route(
            "/editors/{id}/questions/{question_id}",
            patch(handlers::update_question),
        )
        .route("/editors/{id}/title", put(handlers::set_title))
        // PUT /editors/{id}/mode
        // Destructive transitions answer 409 unless `confirm` is set.
        .route("/editors/{id}/mode", put(handlers::set_mode))
        .route("/editors/{id}/reset", post(handlers::reset_editor))
        .route("/editors/{id}/save", post(handlers::save_editor))
}
