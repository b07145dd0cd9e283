use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::label::Label;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note whose tag ids have been replaced by the tag records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedNote {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<Label>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedNote {
    /// Keeps the note's tag order; ids missing from `tags` are dropped
    pub fn new(note: Note, tags: &HashMap<Uuid, Label>) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            folder_id: note.folder_id,
            tags: note.tags.iter().filter_map(|id| tags.get(id).cloned()).collect(),
            user_id: note.user_id,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
}

/// Partial update. `None` leaves a column alone; the inner `Option` of
/// `content`/`folder_id` distinguishes "set" from "unset".
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub folder_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub search_term: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
}

impl NoteFilter {
    /// In-process equivalent of the SQL list filter
    pub fn matches(&self, note: &Note) -> bool {
        if let Some(term) = &self.search_term {
            let term = term.to_lowercase();
            let in_title = note.title.to_lowercase().contains(&term);
            let in_content = note
                .content
                .as_deref()
                .map(|c| c.to_lowercase().contains(&term))
                .unwrap_or(false);
            if !in_title && !in_content {
                return false;
            }
        }

        if let Some(folder_id) = self.folder_id {
            if note.folder_id != Some(folder_id) {
                return false;
            }
        }

        if let Some(tag_id) = self.tag_id {
            if !note.tags.contains(&tag_id) {
                return false;
            }
        }

        true
    }

    /// ILIKE pattern with `%`, `_` and `\` in the term taken literally
    pub fn like_pattern(&self) -> Option<String> {
        self.search_term.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }
}
