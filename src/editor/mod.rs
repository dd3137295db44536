//! Cover-letter editor content model.

pub mod controller;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

pub use controller::{
    Confirmer, CoverLetterEditor, EditOutcome, EditorError, ModeChange, ModeRequest,
    PendingTransition,
};

pub const SINGLE_CEILING: usize = 2000;
pub const MULTI_CEILING: usize = 1000;

/// EditorMode
///
/// `Single` holds exactly one entry with the higher ceiling, `Multi` any number
/// of entries with the lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EditorMode {
    Single,
    Multi,
}

impl EditorMode {
    /// Per-entry content ceiling in characters.
    pub fn ceiling(&self) -> usize {
        match self {
            EditorMode::Single => SINGLE_CEILING,
            EditorMode::Multi => MULTI_CEILING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuestionField {
    Title,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct QuestionEntry {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl QuestionEntry {
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: String::new(),
        }
    }
}

/// Length in characters (Unicode scalar values), the unit every ceiling is expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Hard cut to the first `ceiling` characters. Returns whether anything was removed.
pub fn truncate_to(text: &mut String, ceiling: usize) -> bool {
    match text.char_indices().nth(ceiling) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_exact_prefix() {
        let original = "abcdef".to_string();
        let mut text = original.clone();
        assert!(truncate_to(&mut text, 4));
        assert_eq!(text, "abcd");

        let mut short = "abc".to_string();
        assert!(!truncate_to(&mut short, 3));
        assert_eq!(short, "abc");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let mut text = "가나다라".to_string();
        assert!(truncate_to(&mut text, 2));
        assert_eq!(text, "가나");
        assert_eq!(char_len(&text), 2);
    }

    #[test]
    fn ceilings_follow_mode() {
        assert_eq!(EditorMode::Single.ceiling(), 2000);
        assert_eq!(EditorMode::Multi.ceiling(), 1000);
    }
}
