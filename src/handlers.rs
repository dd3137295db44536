use crate::{
    AppState,
    access::{AccessDecision, LOGIN_PATH, RouteTable, decide},
    auth::{RequestSession, SessionUser},
    editor::{CoverLetterEditor, EditorError, ModeRequest},
    error::PortalError,
    models::{
        CreateEditorRequest, EditResponse, EditorStats, EditorView, GateQuery, LogoutResponse,
        ModeChangeResponse, SaveResponse, SetModeRequest, SetTitleRequest, UpdateQuestionRequest,
    },
    session::{Role, SessionStore, keys},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

fn not_found(id: Uuid) -> PortalError {
    PortalError::NotFound(format!("Editor {id} not found"))
}

// --- Gate & Session ---

/// get_gate
///
/// [Public Route] Access decision for the caller's session on `path`.
/// A session that cannot be read is treated as anonymous.
#[utoipa::path(
    get,
    path = "/gate",
    params(GateQuery),
    responses((status = 200, description = "Access decision", body = AccessDecision))
)]
pub async fn get_gate(
    session: RequestSession,
    Query(query): Query<GateQuery>,
) -> Json<AccessDecision> {
    let decision = decide(&query.path, &session.marker, &RouteTable::standard());
    tracing::debug!(path = %query.path, ?decision, "gate evaluated");
    Json(decision)
}

/// logout
///
/// [Public Route] Clears every session key from the request-scoped store and
/// expires the matching cookies in the browser.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Session cleared", body = LogoutResponse))
)]
pub async fn logout(session: RequestSession) -> Result<impl IntoResponse, PortalError> {
    session.store.clear(&keys::SESSION_KEYS)?;

    let mut headers = HeaderMap::new();
    for key in keys::SESSION_KEYS {
        let cookie = format!("{key}=; Path=/; Max-Age=0");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }

    tracing::info!(user_id = ?session.marker.user_id, "logout");
    let body = LogoutResponse {
        cleared: keys::SESSION_KEYS.iter().map(|k| k.to_string()).collect(),
        redirect_to: LOGIN_PATH.to_string(),
    };
    Ok((StatusCode::OK, headers, Json(body)))
}

// --- Editor Sessions ---

/// create_editor
///
/// [Authenticated Route] Opens an editor. With `document_id` the document is
/// loaded from the backend first; a backend failure opens nothing.
#[utoipa::path(
    post,
    path = "/editors",
    request_body = CreateEditorRequest,
    responses(
        (status = 201, description = "Editor opened", body = EditorView),
        (status = 404, description = "Document not found"),
        (status = 502, description = "Backend unreachable")
    )
)]
pub async fn create_editor(
    user: SessionUser,
    State(state): State<AppState>,
    payload: Option<Json<CreateEditorRequest>>,
) -> Result<(StatusCode, Json<EditorView>), PortalError> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();
    let mut editor = CoverLetterEditor::new();

    if let Some(document_id) = request.document_id.as_deref() {
        let doc = state
            .documents
            .load(document_id, user.token.as_deref())
            .await?;
        editor.load_document(&doc);
    }

    let view = state.editors.open(&user.id, editor).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// get_editor
///
/// [Authenticated Route] Current state of one of the caller's editors.
#[utoipa::path(
    get,
    path = "/editors/{id}",
    params(("id" = Uuid, Path, description = "Editor ID")),
    responses((status = 200, description = "Editor", body = EditorView), (status = 404, description = "Not Found"))
)]
pub async fn get_editor(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorView>, PortalError> {
    state
        .editors
        .view(&user.id, id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// close_editor
///
/// [Authenticated Route] Discards the editor session. Unsaved changes are lost.
#[utoipa::path(
    delete,
    path = "/editors/{id}",
    responses((status = 204, description = "Closed"), (status = 404, description = "Not Found"))
)]
pub async fn close_editor(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.editors.close(&user.id, id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// add_question
///
/// [Authenticated Route] Appends a blank question. Refused in single-question mode.
#[utoipa::path(
    post,
    path = "/editors/{id}/questions",
    responses((status = 200, description = "Question added", body = EditorView), (status = 400, description = "Single mode"))
)]
pub async fn add_question(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorView>, PortalError> {
    let (added, view) = state
        .editors
        .with_editor(&user.id, id, |editor| editor.add_question().is_some())
        .await
        .ok_or_else(|| not_found(id))?;

    if !added {
        return Err(EditorError::SingleQuestionOnly.into());
    }
    Ok(Json(view))
}

/// remove_last_question
///
/// [Authenticated Route] Drops the tail question; a no-op when only one remains.
#[utoipa::path(
    delete,
    path = "/editors/{id}/questions/last",
    responses((status = 200, description = "Editor", body = EditorView))
)]
pub async fn remove_last_question(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorView>, PortalError> {
    let (_, view) = state
        .editors
        .with_editor(&user.id, id, |editor| editor.remove_last_question())
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(view))
}

/// update_question
///
/// [Authenticated Route] Replaces a question's title or content. Content over
/// the active ceiling is rejected and the question is left unchanged.
#[utoipa::path(
    patch,
    path = "/editors/{id}/questions/{question_id}",
    request_body = UpdateQuestionRequest,
    responses((status = 200, description = "Edit outcome", body = EditResponse))
)]
pub async fn update_question(
    user: SessionUser,
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, String)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<EditResponse>, PortalError> {
    let (outcome, editor) = state
        .editors
        .with_editor(&user.id, id, |editor| {
            editor.update_question(&question_id, payload.field, &payload.value)
        })
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(EditResponse { outcome, editor }))
}

/// set_title
#[utoipa::path(
    put,
    path = "/editors/{id}/title",
    request_body = SetTitleRequest,
    responses((status = 200, description = "Editor", body = EditorView))
)]
pub async fn set_title(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTitleRequest>,
) -> Result<Json<EditorView>, PortalError> {
    let (_, view) = state
        .editors
        .with_editor(&user.id, id, |editor| editor.set_title(payload.title))
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(view))
}

/// set_mode
///
/// [Authenticated Route] Mode transition. Collapsing several questions into
/// one requires `confirm: true`; without it the answer is 409 with the prompt
/// and the editor is left exactly as it was.
#[utoipa::path(
    put,
    path = "/editors/{id}/mode",
    request_body = SetModeRequest,
    responses(
        (status = 200, description = "Mode changed", body = ModeChangeResponse),
        (status = 409, description = "Confirmation required")
    )
)]
pub async fn set_mode(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetModeRequest>,
) -> Result<Json<ModeChangeResponse>, PortalError> {
    let (result, editor) = state
        .editors
        .with_editor(&user.id, id, |editor| match editor.request_mode(payload.mode) {
            ModeRequest::Applied(change) => Ok(change),
            ModeRequest::NeedsConfirmation(pending) if payload.confirm => {
                editor.confirm(pending).map_err(PortalError::from)
            }
            ModeRequest::NeedsConfirmation(pending) => {
                Err(PortalError::ConfirmationRequired(pending))
            }
        })
        .await
        .ok_or_else(|| not_found(id))?;

    let change = result?;
    Ok(Json(ModeChangeResponse {
        notice: change.notice(),
        change,
        editor,
    }))
}

/// reset_editor
///
/// [Authenticated Route] Back to one blank question in multi mode, detached
/// from any document.
#[utoipa::path(
    post,
    path = "/editors/{id}/reset",
    responses((status = 200, description = "Editor", body = EditorView))
)]
pub async fn reset_editor(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorView>, PortalError> {
    let (_, view) = state
        .editors
        .with_editor(&user.id, id, |editor| editor.reset())
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(view))
}

/// save_editor
///
/// [Authenticated Route] Validates the editor and stores it through the backend.
/// Validation failures and backend errors leave the backend untouched.
#[utoipa::path(
    post,
    path = "/editors/{id}/save",
    responses(
        (status = 200, description = "Saved", body = SaveResponse),
        (status = 400, description = "Validation failed"),
        (status = 502, description = "Backend unreachable")
    )
)]
pub async fn save_editor(
    user: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, PortalError> {
    let editor = state
        .editors
        .snapshot(&user.id, id)
        .await
        .ok_or_else(|| not_found(id))?;
    let doc = editor.to_document()?;

    let saved = state.documents.save(&doc, user.token.as_deref()).await?;
    let saved_id = saved.id.clone();
    state
        .editors
        .with_editor(&user.id, id, |editor| editor.mark_saved(saved_id))
        .await;

    tracing::info!(editor_id = %id, document_id = ?saved.id, "cover letter saved");
    Ok(Json(SaveResponse { document: saved }))
}

// --- Admin ---

/// get_editor_stats
///
/// [Admin Route] Counts of open editor sessions.
///
/// *Authorization*: Explicitly checks that the session role is `ADMIN`.
#[utoipa::path(
    get,
    path = "/admin/editors/stats",
    responses((status = 200, description = "Stats", body = EditorStats), (status = 403, description = "Not an admin"))
)]
pub async fn get_editor_stats(
    user: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<EditorStats>, PortalError> {
    if user.role != Role::Admin {
        return Err(PortalError::Forbidden);
    }
    Ok(Json(state.editors.stats().await))
}
