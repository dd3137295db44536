use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use super::{EditorMode, QuestionEntry, QuestionField, char_len, truncate_to};
use crate::models::{CoverLetterDocument, QuestionPayload};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("a title is required before saving")]
    EmptyTitle,

    #[error("question {id} exceeds the {ceiling} character limit")]
    ContentTooLong { id: String, ceiling: usize },

    #[error("the editor changed since confirmation was requested")]
    StaleConfirmation,

    #[error("single-question mode holds exactly one question")]
    SingleQuestionOnly,
}

/// Result of a per-field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum EditOutcome {
    Applied,
    /// The new content would exceed the active ceiling; nothing changed.
    Rejected { ceiling: usize },
    NoMatch,
}

/// A committed mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ModeChange {
    pub mode: EditorMode,
    /// At least one entry was cut to the new ceiling.
    pub truncated: bool,
    /// Entries discarded by collapsing to a single question.
    pub removed: usize,
}

impl ModeChange {
    /// User-facing notice, present only when content was cut.
    pub fn notice(&self) -> Option<String> {
        self.truncated.then(|| {
            format!(
                "Content longer than {} characters was truncated.",
                self.mode.ceiling()
            )
        })
    }
}

/// A destructive transition waiting for an explicit yes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PendingTransition {
    pub requested: EditorMode,
    pub discards: usize,
    pub prompt: String,
    #[serde(skip)]
    revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeRequest {
    Applied(ModeChange),
    NeedsConfirmation(PendingTransition),
}

/// Confirmer
///
/// Synchronous confirmation capability. Returning `false` declines and leaves
/// the editor untouched.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// CoverLetterEditor
///
/// Owns the ordered question collection and the editing mode. The collection
/// is never empty and holds exactly one entry in `Single` mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverLetterEditor {
    entries: Vec<QuestionEntry>,
    mode: EditorMode,
    document_id: Option<String>,
    title: String,
    scroll_target: Option<String>,
    revision: u64,
}

impl Default for CoverLetterEditor {
    fn default() -> Self {
        Self {
            entries: vec![QuestionEntry::blank("1")],
            mode: EditorMode::Multi,
            document_id: None,
            title: String::new(),
            scroll_target: None,
            revision: 0,
        }
    }
}

impl CoverLetterEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[QuestionEntry] {
        &self.entries
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Entry the view should scroll into view, consumed on read.
    pub fn take_scroll_target(&mut self) -> Option<String> {
        self.scroll_target.take()
    }

    /// Appends a blank entry with id `count + 1`. Not available in `Single` mode.
    pub fn add_question(&mut self) -> Option<&QuestionEntry> {
        if self.mode == EditorMode::Single {
            return None;
        }
        let id = (self.entries.len() + 1).to_string();
        self.entries.push(QuestionEntry::blank(id.clone()));
        self.scroll_target = Some(id);
        self.touch();
        self.entries.last()
    }

    pub fn remove_last_question(&mut self) -> Option<QuestionEntry> {
        if self.entries.len() <= 1 {
            return None;
        }
        let removed = self.entries.pop();
        self.touch();
        removed
    }

    /// Content edits that would cross the active ceiling are rejected whole.
    pub fn update_question(&mut self, id: &str, field: QuestionField, value: &str) -> EditOutcome {
        let ceiling = self.mode.ceiling();
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return EditOutcome::NoMatch;
        };

        match field {
            QuestionField::Title => entry.title = value.to_string(),
            QuestionField::Content => {
                if char_len(value) > ceiling {
                    return EditOutcome::Rejected { ceiling };
                }
                entry.content = value.to_string();
            }
        }
        self.touch();
        EditOutcome::Applied
    }

    /// First half of the mode-transition protocol. Non-destructive requests
    /// are applied immediately; collapsing several entries returns a
    /// [`PendingTransition`] that must be passed to [`Self::confirm`].
    pub fn request_mode(&mut self, requested: EditorMode) -> ModeRequest {
        let discards = self.discards_for(requested);
        if discards == 0 {
            return ModeRequest::Applied(self.commit(requested));
        }
        ModeRequest::NeedsConfirmation(PendingTransition {
            requested,
            discards,
            prompt: format!(
                "Switching to a single question will delete all but the first question ({discards} will be removed). Continue?"
            ),
            revision: self.revision,
        })
    }

    /// Commits a pending transition. Fails if the editor changed in between.
    pub fn confirm(&mut self, pending: PendingTransition) -> Result<ModeChange, EditorError> {
        if pending.revision != self.revision {
            return Err(EditorError::StaleConfirmation);
        }
        Ok(self.commit(pending.requested))
    }

    /// Synchronous flavor: asks `confirmer` when the transition would destroy
    /// data. `None` means the user declined and nothing changed.
    pub fn set_mode(&mut self, requested: EditorMode, confirmer: &dyn Confirmer) -> Option<ModeChange> {
        match self.request_mode(requested) {
            ModeRequest::Applied(change) => Some(change),
            ModeRequest::NeedsConfirmation(pending) => {
                if !confirmer.confirm(&pending.prompt) {
                    tracing::debug!(requested = ?pending.requested, "mode change declined");
                    return None;
                }
                self.confirm(pending).ok()
            }
        }
    }

    /// Replaces the collection from a loaded document. Ids restart at "1".
    pub fn load_document(&mut self, doc: &CoverLetterDocument) {
        let mut entries: Vec<QuestionEntry> = doc
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| QuestionEntry {
                id: (idx + 1).to_string(),
                title: q.title.clone(),
                content: q.content.clone(),
            })
            .collect();
        if entries.is_empty() {
            entries.push(QuestionEntry::blank("1"));
        }

        self.mode = if entries.len() == 1 {
            EditorMode::Single
        } else {
            EditorMode::Multi
        };
        self.entries = entries;
        self.document_id = doc.id.clone();
        self.title = doc.title.clone();
        self.scroll_target = None;
        self.touch();
    }

    pub fn reset(&mut self) {
        let revision = self.revision;
        *self = Self::default();
        self.revision = revision;
        self.touch();
    }

    /// Validates and snapshots the editor for saving. Nothing is saved partially.
    pub fn to_document(&self) -> Result<CoverLetterDocument, EditorError> {
        if self.title.trim().is_empty() {
            return Err(EditorError::EmptyTitle);
        }
        let ceiling = self.mode.ceiling();
        if let Some(entry) = self.entries.iter().find(|e| char_len(&e.content) > ceiling) {
            return Err(EditorError::ContentTooLong {
                id: entry.id.clone(),
                ceiling,
            });
        }
        Ok(CoverLetterDocument {
            id: self.document_id.clone(),
            title: self.title.clone(),
            questions: self
                .entries
                .iter()
                .map(|e| QuestionPayload {
                    title: e.title.clone(),
                    content: e.content.clone(),
                })
                .collect(),
        })
    }

    /// Marks the editor as persisted under `id`.
    pub fn mark_saved(&mut self, id: Option<String>) {
        if id.is_some() {
            self.document_id = id;
        }
    }

    fn discards_for(&self, requested: EditorMode) -> usize {
        match requested {
            EditorMode::Single => self.entries.len().saturating_sub(1),
            EditorMode::Multi => 0,
        }
    }

    /// Collapses, truncates to the target ceiling, then switches mode.
    fn commit(&mut self, requested: EditorMode) -> ModeChange {
        let removed = self.discards_for(requested);
        if removed > 0 {
            self.entries.truncate(1);
            tracing::info!(removed, "collapsed editor to a single question");
        }

        let ceiling = requested.ceiling();
        let mut truncated = false;
        for entry in &mut self.entries {
            truncated |= truncate_to(&mut entry.content, ceiling);
        }

        self.mode = requested;
        self.touch();
        ModeChange {
            mode: requested,
            truncated,
            removed,
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi_with(contents: &[&str]) -> CoverLetterEditor {
        let mut editor = CoverLetterEditor::new();
        for _ in 1..contents.len() {
            editor.add_question();
        }
        for (idx, content) in contents.iter().enumerate() {
            let id = (idx + 1).to_string();
            editor.entries[idx].content = content.to_string();
            assert_eq!(editor.entries[idx].id, id);
        }
        editor
    }

    #[test]
    fn add_then_remove_keeps_at_least_one() {
        let mut editor = CoverLetterEditor::new();
        assert!(editor.remove_last_question().is_none());
        assert_eq!(editor.entries().len(), 1);

        let added = editor.add_question().map(|e| e.id.clone());
        assert_eq!(added.as_deref(), Some("2"));
        assert_eq!(editor.take_scroll_target().as_deref(), Some("2"));
        assert_eq!(editor.take_scroll_target(), None);

        assert_eq!(editor.remove_last_question().map(|e| e.id), Some("2".to_string()));
        assert!(editor.remove_last_question().is_none());
        assert_eq!(editor.entries().len(), 1);
    }

    #[test]
    fn content_edit_over_ceiling_is_rejected() {
        let mut editor = CoverLetterEditor::new();
        let ok = "a".repeat(1000);
        let too_long = "a".repeat(1001);
        assert_eq!(editor.update_question("1", QuestionField::Content, &ok), EditOutcome::Applied);
        assert_eq!(
            editor.update_question("1", QuestionField::Content, &too_long),
            EditOutcome::Rejected { ceiling: 1000 }
        );
        assert_eq!(editor.entries()[0].content, ok);
        assert_eq!(editor.update_question("9", QuestionField::Title, "x"), EditOutcome::NoMatch);
    }

    #[test]
    fn collapse_requires_confirmation_and_decline_is_noop() {
        let mut editor = multi_with(&["one", "two", "three"]);
        let before = editor.clone();

        let declined = editor.set_mode(EditorMode::Single, &|_: &str| false);
        assert!(declined.is_none());
        assert_eq!(editor, before);
    }

    #[test]
    fn stale_confirmation_is_refused() {
        let mut editor = multi_with(&["one", "two"]);
        let ModeRequest::NeedsConfirmation(pending) = editor.request_mode(EditorMode::Single) else {
            panic!("expected confirmation");
        };
        editor.add_question();
        assert_eq!(editor.confirm(pending), Err(EditorError::StaleConfirmation));
        assert_eq!(editor.mode(), EditorMode::Multi);
        assert_eq!(editor.entries().len(), 3);
    }

    #[test]
    fn single_mode_refuses_new_questions() {
        let mut editor = CoverLetterEditor::new();
        editor.set_mode(EditorMode::Single, &|_: &str| true);
        assert!(editor.add_question().is_none());
        assert_eq!(editor.entries().len(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut editor = multi_with(&["a", "b"]);
        editor.set_title("Backend role");
        editor.reset();
        assert_eq!(editor.entries(), CoverLetterEditor::new().entries());
        assert_eq!(editor.mode(), EditorMode::Multi);
        assert_eq!(editor.document_id(), None);
        assert_eq!(editor.title(), "");
    }

    #[test]
    fn save_requires_title() {
        let editor = CoverLetterEditor::new();
        assert_eq!(editor.to_document(), Err(EditorError::EmptyTitle));
    }
}
