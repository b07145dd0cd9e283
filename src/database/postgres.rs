use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Label, LabelKind, NewNote, NewUser, Note, NoteChanges, NoteFilter, User};
use crate::database::repository::{LabelRepository, NoteRepository, UserRepository};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password, fullname)
             VALUES ($1, $2, $3, $4)
             RETURNING id, username, password, fullname, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.fullname)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, fullname, created_at, updated_at
             FROM users
             WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const NOTE_COLUMNS: &str = "id, title, content, folder_id, tags, user_id, created_at, updated_at";

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, owner: Uuid, filter: &NoteFilter) -> Result<Vec<Note>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM notes
             WHERE user_id = $1
             AND ($2::text IS NULL OR title ILIKE $2 OR content ILIKE $2)
             AND ($3::uuid IS NULL OR folder_id = $3)
             AND ($4::uuid IS NULL OR $4 = ANY(tags))
             ORDER BY updated_at DESC",
            NOTE_COLUMNS
        );

        let notes = sqlx::query_as::<_, Note>(&sql)
            .bind(owner)
            .bind(filter.like_pattern())
            .bind(filter.folder_id)
            .bind(filter.tag_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(notes)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1 AND user_id = $2", NOTE_COLUMNS);

        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    async fn insert(&self, owner: Uuid, new_note: NewNote) -> Result<Note, DatabaseError> {
        let sql = format!(
            "INSERT INTO notes (id, title, content, folder_id, tags, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            NOTE_COLUMNS
        );

        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_note.title)
            .bind(&new_note.content)
            .bind(new_note.folder_id)
            .bind(&new_note.tags)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(note)
    }

    async fn update(&self, owner: Uuid, id: Uuid, changes: NoteChanges) -> Result<Option<Note>, DatabaseError> {
        let sql = format!(
            "UPDATE notes SET
                title = COALESCE($3::text, title),
                content = CASE WHEN $4 THEN $5::text ELSE content END,
                folder_id = CASE WHEN $6 THEN $7::uuid ELSE folder_id END,
                tags = COALESCE($8::uuid[], tags),
                updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            NOTE_COLUMNS
        );

        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.content.is_some())
            .bind(changes.content.flatten())
            .bind(changes.folder_id.is_some())
            .bind(changes.folder_id.flatten())
            .bind(changes.tags)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notes SET folder_id = NULL, updated_at = now()
             WHERE user_id = $1 AND folder_id = $2",
        )
        .bind(owner)
        .bind(folder_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove_tag(&self, owner: Uuid, tag_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notes SET tags = array_remove(tags, $2), updated_at = now()
             WHERE user_id = $1 AND $2 = ANY(tags)",
        )
        .bind(owner)
        .bind(tag_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Same queries for folders and tags; only the table differs
pub struct PgLabelRepository {
    kind: LabelKind,
    pool: PgPool,
}

impl PgLabelRepository {
    pub fn new(kind: LabelKind, pool: PgPool) -> Self {
        Self { kind, pool }
    }

    fn table(&self) -> &'static str {
        self.kind.table()
    }
}

const LABEL_COLUMNS: &str = "id, name, user_id, created_at, updated_at";

#[async_trait]
impl LabelRepository for PgLabelRepository {
    async fn list(&self, owner: Uuid) -> Result<Vec<Label>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY name ASC",
            LABEL_COLUMNS,
            self.table()
        );

        let labels = sqlx::query_as::<_, Label>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(labels)
    }

    async fn find(&self, owner: Uuid, id: Uuid) -> Result<Option<Label>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND user_id = $2",
            LABEL_COLUMNS,
            self.table()
        );

        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        Ok(label)
    }

    async fn find_many(&self, owner: Uuid, ids: &[Uuid]) -> Result<Vec<Label>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND id = ANY($2)",
            LABEL_COLUMNS,
            self.table()
        );

        let labels = sqlx::query_as::<_, Label>(&sql)
            .bind(owner)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(labels)
    }

    async fn insert(&self, owner: Uuid, name: String) -> Result<Label, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (id, name, user_id) VALUES ($1, $2, $3) RETURNING {}",
            self.table(),
            LABEL_COLUMNS
        );

        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(label)
    }

    async fn rename(&self, owner: Uuid, id: Uuid, name: String) -> Result<Option<Label>, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET name = $3, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            self.table(),
            LABEL_COLUMNS
        );

        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(id)
            .bind(owner)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(label)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", self.table());

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
