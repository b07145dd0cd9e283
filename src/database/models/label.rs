use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Folders and tags share one shape: a name owned by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Folder,
    Tag,
}

impl LabelKind {
    pub fn table(&self) -> &'static str {
        match self {
            LabelKind::Folder => "folders",
            LabelKind::Tag => "tags",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            LabelKind::Folder => "Folder",
            LabelKind::Tag => "Tag",
        }
    }

    /// Path prefix used for Location headers
    pub fn route(&self) -> &'static str {
        match self {
            LabelKind::Folder => "/api/folders",
            LabelKind::Tag => "/api/tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
