use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::editor::{EditorMode, ModeChange, QuestionEntry, QuestionField};

// --- Backend Document Shapes ---

/// QuestionPayload
///
/// One title/content pair as the backend stores it. Missing or null fields
/// deserialize as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

/// CoverLetterDocument
///
/// The "cover letter" document loaded from and saved to the remote backend.
/// `id` is absent for documents that were never saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CoverLetterDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub questions: Vec<QuestionPayload>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_vec<'de, D>(deserializer: D) -> Result<Vec<QuestionPayload>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<QuestionPayload>>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Request Payloads ---

/// GateQuery
///
/// Query parameters for `GET /gate`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GateQuery {
    /// Path the browser is about to render, e.g. `/dashboard`.
    pub path: String,
}

/// CreateEditorRequest
///
/// Opens a blank editor, or one loaded from the backend when `document_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEditorRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateQuestionRequest {
    pub field: QuestionField,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SetTitleRequest {
    pub title: String,
}

/// SetModeRequest
///
/// `confirm` must be true for transitions that delete questions; otherwise the
/// server answers 409 with the confirmation prompt and changes nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SetModeRequest {
    pub mode: EditorMode,
    #[serde(default)]
    pub confirm: bool,
}

// --- Responses ---

/// EditorView
///
/// Snapshot of an open editor session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EditorView {
    pub id: Uuid,
    pub mode: EditorMode,
    pub ceiling: usize,
    pub title: String,
    pub document_id: Option<String>,
    pub questions: Vec<QuestionEntry>,
    /// Entry the client should scroll into view after this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_to: Option<String>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ModeChangeResponse {
    pub change: ModeChange,
    /// Advisory notice shown to the user when content was truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub editor: EditorView,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EditResponse {
    pub outcome: crate::editor::EditOutcome,
    pub editor: EditorView,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SaveResponse {
    pub document: CoverLetterDocument,
}

/// EditorStats
///
/// Output schema for `GET /admin/editors/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditorStats {
    pub open_editors: usize,
    pub single_mode: usize,
    pub multi_mode: usize,
    pub owners: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LogoutResponse {
    pub cleared: Vec<String>,
    pub redirect_to: String,
}
