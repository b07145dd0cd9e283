use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::memory::{MemoryLabelRepository, MemoryNoteRepository, MemoryUserRepository};
use crate::database::models::{Label, LabelKind, NewNote, NewUser, Note, NoteChanges, NoteFilter, User};
use crate::database::postgres::{PgLabelRepository, PgNoteRepository, PgUserRepository};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`DatabaseError::UniqueViolation`] when the username is taken
    async fn insert(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
}

/// Every method takes the owner; there is no unscoped access to notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Owner's notes matching `filter`, most recently updated first
    async fn list(&self, owner: Uuid, filter: &NoteFilter) -> Result<Vec<Note>, DatabaseError>;

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Note>, DatabaseError>;

    async fn insert(&self, owner: Uuid, new_note: NewNote) -> Result<Note, DatabaseError>;

    /// `None` when no note with `id` belongs to `owner`
    async fn update(&self, owner: Uuid, id: Uuid, changes: NoteChanges) -> Result<Option<Note>, DatabaseError>;

    /// Returns whether a note was removed
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError>;

    /// Unset `folderId` on the owner's notes in `folder_id`
    async fn clear_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<u64, DatabaseError>;

    /// Pull `tag_id` from the owner's notes
    async fn remove_tag(&self, owner: Uuid, tag_id: Uuid) -> Result<u64, DatabaseError>;
}

/// Folders and tags. One instance per [`LabelKind`].
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// Owner's labels sorted by name
    async fn list(&self, owner: Uuid) -> Result<Vec<Label>, DatabaseError>;

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Label>, DatabaseError>;

    /// The subset of `ids` that exist and belong to `owner`
    async fn find_many(&self, owner: Uuid, ids: &[Uuid]) -> Result<Vec<Label>, DatabaseError>;

    /// Fails with [`DatabaseError::UniqueViolation`] when the owner already has `name`
    async fn insert(&self, owner: Uuid, name: String) -> Result<Label, DatabaseError>;

    async fn rename(&self, owner: Uuid, id: Uuid, name: String) -> Result<Option<Label>, DatabaseError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory,
}

/// The set of repositories handlers work against
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub folders: Arc<dyn LabelRepository>,
    pub tags: Arc<dyn LabelRepository>,
    backend: Backend,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            notes: Arc::new(PgNoteRepository::new(pool.clone())),
            folders: Arc::new(PgLabelRepository::new(LabelKind::Folder, pool.clone())),
            tags: Arc::new(PgLabelRepository::new(LabelKind::Tag, pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::default()),
            notes: Arc::new(MemoryNoteRepository::default()),
            folders: Arc::new(MemoryLabelRepository::new(LabelKind::Folder)),
            tags: Arc::new(MemoryLabelRepository::new(LabelKind::Tag)),
            backend: Backend::Memory,
        }
    }

    pub fn labels(&self, kind: LabelKind) -> &Arc<dyn LabelRepository> {
        match kind {
            LabelKind::Folder => &self.folders,
            LabelKind::Tag => &self.tags,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.backend {
            Backend::Postgres(pool) => DatabaseManager::health_check(pool).await,
            Backend::Memory => Ok(()),
        }
    }
}
