use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// State machines: session access, route gate, cover-letter editor, shell chrome.
pub mod access;
pub mod editor;
pub mod events;
pub mod session;
pub mod shell;

// HTTP service around them.
pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;

// Routing segregated by access class (Public, Authenticated, Admin).
pub mod routes;
use auth::SessionUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use documents::{DocumentState, HttpDocumentService, MockDocumentService};
pub use registry::EditorRegistry;

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_gate, handlers::logout, handlers::create_editor, handlers::get_editor,
        handlers::close_editor, handlers::add_question, handlers::remove_last_question,
        handlers::update_question, handlers::set_title, handlers::set_mode,
        handlers::reset_editor, handlers::save_editor, handlers::get_editor_stats
    ),
    components(
        schemas(
            access::AccessDecision, access::RouteClass, session::Role, session::SessionMarker,
            editor::EditorMode, editor::QuestionEntry, editor::QuestionField,
            editor::EditOutcome, editor::ModeChange, editor::PendingTransition,
            models::CoverLetterDocument, models::QuestionPayload, models::CreateEditorRequest,
            models::UpdateQuestionRequest, models::SetTitleRequest, models::SetModeRequest,
            models::EditorView, models::ModeChangeResponse, models::EditResponse,
            models::SaveResponse, models::EditorStats, models::LogoutResponse,
        )
    ),
    tags(
        (name = "careerdesk", description = "Career portal session gate and cover-letter editor API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply cloneable container of every service the handlers use.
#[derive(Clone)]
pub struct AppState {
    /// Remote document backend (HTTP in production, in-memory in tests).
    pub documents: DocumentState,
    /// Open editor sessions.
    pub editors: EditorRegistry,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(documents: DocumentState, config: AppConfig) -> Self {
        Self {
            documents,
            editors: EditorRegistry::with_limits(
                config.max_editors_per_owner,
                config.editor_idle_ttl,
            ),
            config,
        }
    }
}

impl FromRef<AppState> for DocumentState {
    fn from_ref(app_state: &AppState) -> DocumentState {
        app_state.documents.clone()
    }
}

impl FromRef<AppState> for EditorRegistry {
    fn from_ref(app_state: &AppState) -> EditorRegistry {
        app_state.editors.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Extracting `SessionUser` rejects with 401 before the handler runs when the
/// request carries no complete session marker.
async fn auth_middleware(_user: SessionUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the auth layer for protected routes and the
/// observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = authenticated::authenticated_routes()
        .nest("/admin", admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span per request, correlated by `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
