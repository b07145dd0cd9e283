use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Label, LabelKind, NewNote, NewUser, Note, NoteChanges, NoteFilter, User};
use crate::database::repository::{LabelRepository, NoteRepository, UserRepository};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        // Check and insert under one write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueViolation("users_username_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            password: new_user.password_hash,
            fullname: new_user.fullname,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<HashMap<Uuid, Note>>,
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn list(&self, owner: Uuid, filter: &NoteFilter) -> Result<Vec<Note>, DatabaseError> {
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| n.user_id == owner && filter.matches(n))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        let notes = self.notes.read().await;
        Ok(notes.get(&id).filter(|n| n.user_id == owner).cloned())
    }

    async fn insert(&self, owner: Uuid, new_note: NewNote) -> Result<Note, DatabaseError> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: new_note.title,
            content: new_note.content,
            folder_id: new_note.folder_id,
            tags: new_note.tags,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };

        self.notes.write().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, owner: Uuid, id: Uuid, changes: NoteChanges) -> Result<Option<Note>, DatabaseError> {
        let mut notes = self.notes.write().await;
        let Some(note) = notes.get_mut(&id).filter(|n| n.user_id == owner) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = content;
        }
        if let Some(folder_id) = changes.folder_id {
            note.folder_id = folder_id;
        }
        if let Some(tags) = changes.tags {
            note.tags = tags;
        }
        note.updated_at = Utc::now();

        Ok(Some(note.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut notes = self.notes.write().await;
        if notes.get(&id).is_some_and(|n| n.user_id == owner) {
            notes.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn clear_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<u64, DatabaseError> {
        let mut notes = self.notes.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for note in notes
            .values_mut()
            .filter(|n| n.user_id == owner && n.folder_id == Some(folder_id))
        {
            note.folder_id = None;
            note.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn remove_tag(&self, owner: Uuid, tag_id: Uuid) -> Result<u64, DatabaseError> {
        let mut notes = self.notes.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for note in notes
            .values_mut()
            .filter(|n| n.user_id == owner && n.tags.contains(&tag_id))
        {
            note.tags.retain(|t| *t != tag_id);
            note.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }
}

pub struct MemoryLabelRepository {
    kind: LabelKind,
    labels: RwLock<HashMap<Uuid, Label>>,
}

impl MemoryLabelRepository {
    pub fn new(kind: LabelKind) -> Self {
        Self {
            kind,
            labels: RwLock::new(HashMap::new()),
        }
    }

    fn name_taken(labels: &HashMap<Uuid, Label>, owner: Uuid, name: &str, except: Option<Uuid>) -> bool {
        labels
            .values()
            .any(|l| l.user_id == owner && l.name == name && Some(l.id) != except)
    }

    fn unique_violation(&self) -> DatabaseError {
        DatabaseError::UniqueViolation(format!("{}_user_id_name_key", self.kind.table()))
    }
}

#[async_trait]
impl LabelRepository for MemoryLabelRepository {
    async fn list(&self, owner: Uuid) -> Result<Vec<Label>, DatabaseError> {
        let labels = self.labels.read().await;
        let mut found: Vec<Label> = labels.values().filter(|l| l.user_id == owner).cloned().collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Label>, DatabaseError> {
        let labels = self.labels.read().await;
        Ok(labels.get(&id).filter(|l| l.user_id == owner).cloned())
    }

    async fn find_many(&self, owner: Uuid, ids: &[Uuid]) -> Result<Vec<Label>, DatabaseError> {
        let labels = self.labels.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| labels.get(id))
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect())
    }

    async fn insert(&self, owner: Uuid, name: String) -> Result<Label, DatabaseError> {
        let mut labels = self.labels.write().await;
        if Self::name_taken(&labels, owner, &name, None) {
            return Err(self.unique_violation());
        }

        let now = Utc::now();
        let label = Label {
            id: Uuid::new_v4(),
            name,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn rename(&self, owner: Uuid, id: Uuid, name: String) -> Result<Option<Label>, DatabaseError> {
        let mut labels = self.labels.write().await;
        if !labels.get(&id).is_some_and(|l| l.user_id == owner) {
            return Ok(None);
        }
        if Self::name_taken(&labels, owner, &name, Some(id)) {
            return Err(self.unique_violation());
        }

        let Some(label) = labels.get_mut(&id) else {
            return Ok(None);
        };
        label.name = name;
        label.updated_at = Utc::now();
        Ok(Some(label.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut labels = self.labels.write().await;
        if labels.get(&id).is_some_and(|l| l.user_id == owner) {
            labels.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
