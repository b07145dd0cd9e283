// handlers/protected/notes.rs - /api/notes CRUD

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::{NewNote, Note, NoteChanges, NoteFilter, PopulatedNote};
use crate::error::ApiError;
use crate::handlers::input::{json_object, parse_id, parse_optional_id};
use crate::handlers::protected::validate::validate_references;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Keys a PUT may touch; anything else in the body is ignored
const UPDATABLE_FIELDS: [&str; 5] = ["title", "content", "userId", "folderId", "tags"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search_term: Option<String>,
    pub folder_id: Option<String>,
    pub tag_id: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<NoteFilter, ApiError> {
        Ok(NoteFilter {
            search_term: self.search_term.filter(|term| !term.is_empty()),
            folder_id: parse_optional_id(self.folder_id.as_deref(), "folderId")?,
            tag_id: parse_optional_id(self.tag_id.as_deref(), "tagId")?,
        })
    }
}

fn missing_title() -> ApiError {
    ApiError::bad_request("Missing `title` in request body")
}

fn parse_title(value: Option<&Value>) -> Result<String, ApiError> {
    match value {
        None | Some(Value::Null) => Err(missing_title()),
        Some(Value::String(title)) if title.is_empty() => Err(missing_title()),
        Some(Value::String(title)) => Ok(title.clone()),
        Some(_) => Err(ApiError::bad_request("The `title` must be a string")),
    }
}

fn parse_content(value: &Value) -> Result<Option<String>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::String(content) => Ok(Some(content.clone())),
        _ => Err(ApiError::bad_request("The `content` must be a string")),
    }
}

/// `null` and `""` both mean "no folder"
fn parse_folder(value: &Value) -> Result<Option<Uuid>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) if raw.is_empty() => Ok(None),
        Value::String(raw) => parse_id(raw, "folderId").map(Some),
        _ => Err(ApiError::bad_request("The `folderId` is not valid")),
    }
}

fn parse_tags(value: &Value) -> Result<Vec<Uuid>, ApiError> {
    let Value::Array(items) = value else {
        return Err(ApiError::bad_request("The `tags` property must be an array"));
    };

    let mut tags: Vec<Uuid> = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| ApiError::bad_request("The `tags` array contains an invalid `id`"))?;
        // Repeats collapse, first position wins
        if !tags.contains(&id) {
            tags.push(id);
        }
    }
    Ok(tags)
}

fn new_note_from(body: &Map<String, Value>) -> Result<NewNote, ApiError> {
    Ok(NewNote {
        title: parse_title(body.get("title"))?,
        content: body.get("content").map(parse_content).transpose()?.flatten(),
        folder_id: body.get("folderId").map(parse_folder).transpose()?.flatten(),
        tags: body.get("tags").map(parse_tags).transpose()?.unwrap_or_default(),
    })
}

fn changes_from(body: &Map<String, Value>, owner: Uuid) -> Result<NoteChanges, ApiError> {
    let mut changes = NoteChanges::default();

    for field in UPDATABLE_FIELDS {
        let Some(value) = body.get(field) else {
            continue;
        };

        match field {
            "title" => changes.title = Some(parse_title(Some(value))?),
            "content" => changes.content = Some(parse_content(value)?),
            "userId" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| ApiError::bad_request("The `userId` is not valid"))?;
                if parse_id(raw, "userId")? != owner {
                    return Err(ApiError::bad_request("The `userId` cannot be changed"));
                }
            }
            "folderId" => changes.folder_id = Some(parse_folder(value)?),
            "tags" => changes.tags = Some(parse_tags(value)?),
            _ => {}
        }
    }

    Ok(changes)
}

/// Swap tag ids for the owner's tag records
async fn populate(state: &AppState, owner: Uuid, notes: Vec<Note>) -> Result<Vec<PopulatedNote>, ApiError> {
    let mut tag_ids: Vec<Uuid> = notes.iter().flat_map(|n| n.tags.iter().copied()).collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();

    let tags = if tag_ids.is_empty() {
        HashMap::new()
    } else {
        state
            .store
            .tags
            .find_many(owner, &tag_ids)
            .await?
            .into_iter()
            .map(|tag| (tag.id, tag))
            .collect()
    };

    Ok(notes.into_iter().map(|note| PopulatedNote::new(note, &tags)).collect())
}

/// GET /api/notes?searchTerm=&folderId=&tagId=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<PopulatedNote>> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let filter = query.into_filter()?;
    let notes = state.store.notes.list(auth_user.id, &filter).await?;

    Ok(ApiResponse::success(populate(&state, auth_user.id, notes).await?))
}

/// GET /api/notes/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<PopulatedNote> {
    let id = parse_id(&id, "id")?;

    let note = state
        .store
        .notes
        .find(auth_user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    let mut populated = populate(&state, auth_user.id, vec![note]).await?;
    populated
        .pop()
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::internal_server_error("Note vanished while loading tags"))
}

/// POST /api/notes
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Note> {
    let body = json_object(body)?;
    let new_note = new_note_from(&body)?;

    validate_references(&state, auth_user.id, new_note.folder_id, Some(&new_note.tags)).await?;

    let note = state.store.notes.insert(auth_user.id, new_note).await?;
    tracing::info!("User '{}' created note {}", auth_user.username, note.id);

    let location = format!("/api/notes/{}", note.id);
    Ok(ApiResponse::created(note, location))
}

/// PUT /api/notes/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Note> {
    let id = parse_id(&id, "id")?;
    let body = json_object(body)?;
    let changes = changes_from(&body, auth_user.id)?;

    validate_references(
        &state,
        auth_user.id,
        changes.folder_id.flatten(),
        changes.tags.as_deref(),
    )
    .await?;

    let note = state
        .store
        .notes
        .update(auth_user.id, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    tracing::info!("User '{}' updated note {}", auth_user.username, note.id);
    Ok(ApiResponse::success(note))
}

/// DELETE /api/notes/:id - 204 whether or not the note existed
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "id")?;

    if state.store.notes.delete(auth_user.id, id).await? {
        tracing::info!("User '{}' deleted note {}", auth_user.username, id);
    }
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::testing::TestContext;

    #[test]
    fn update_ignores_fields_outside_the_whitelist() {
        let owner = Uuid::new_v4();
        let body = json!({"title": "New", "createdAt": "yesterday", "id": "x"});

        let changes = changes_from(body.as_object().unwrap(), owner).unwrap();
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert!(changes.content.is_none() && changes.folder_id.is_none() && changes.tags.is_none());
    }

    #[test]
    fn update_rejects_a_foreign_user_id() {
        let owner = Uuid::new_v4();
        let body = json!({"userId": Uuid::new_v4().to_string()});

        let err = changes_from(body.as_object().unwrap(), owner).unwrap_err();
        assert_eq!(err.message(), "The `userId` cannot be changed");

        let same = json!({"userId": owner.to_string()});
        assert!(changes_from(same.as_object().unwrap(), owner).is_ok());
    }

    #[test]
    fn empty_folder_id_unsets_the_folder() {
        let changes = changes_from(json!({"folderId": ""}).as_object().unwrap(), Uuid::new_v4()).unwrap();
        assert_eq!(changes.folder_id, Some(None));
    }

    #[test]
    fn title_is_required_on_create() {
        for body in [json!({}), json!({"title": ""}), json!({"title": null})] {
            let err = new_note_from(body.as_object().unwrap()).unwrap_err();
            assert_eq!(err.message(), "Missing `title` in request body");
        }
    }

    #[test]
    fn tags_must_be_an_array_of_ids() {
        let err = new_note_from(json!({"title": "a", "tags": "x"}).as_object().unwrap()).unwrap_err();
        assert_eq!(err.message(), "The `tags` property must be an array");

        let err = new_note_from(json!({"title": "a", "tags": ["nope"]}).as_object().unwrap()).unwrap_err();
        assert_eq!(err.message(), "The `tags` array contains an invalid `id`");
    }

    #[tokio::test]
    async fn shopping_list_end_to_end() {
        let ctx = TestContext::new();
        let alice = ctx.signed_up("alice").await;
        let bob = ctx.signed_up("bob").await;

        let created = ctx
            .request(Method::POST, "/api/notes", Some(&alice), Some(json!({"title": "Shopping"})))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let id = created.body["id"].as_str().unwrap().to_string();
        assert_eq!(created.headers[header::LOCATION], format!("/api/notes/{}", id));

        let mine = ctx.request(Method::GET, "/api/notes", Some(&alice), None).await;
        assert_eq!(mine.status, StatusCode::OK);
        assert_eq!(mine.body.as_array().unwrap().len(), 1);
        assert_eq!(mine.body[0]["title"], "Shopping");

        let theirs = ctx.request(Method::GET, "/api/notes", Some(&bob), None).await;
        assert_eq!(theirs.body, json!([]));

        let peek = ctx
            .request(Method::GET, &format!("/api/notes/{}", id), Some(&bob), None)
            .await;
        assert_eq!(peek.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_query_string_uses_the_error_body() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        let res = ctx
            .request(Method::GET, "/api/notes?searchTerm=a&searchTerm=b", Some(&token), None)
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["error"], true);
        assert_eq!(res.body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn notes_require_a_token() {
        let ctx = TestContext::new();
        let res = ctx.request(Method::GET, "/api/notes", None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_ids_are_400() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        for (method, uri) in [
            (Method::GET, "/api/notes/123"),
            (Method::DELETE, "/api/notes/123"),
            (Method::GET, "/api/notes?folderId=123"),
            (Method::GET, "/api/notes?tagId=abc"),
        ] {
            let res = ctx.request(method, uri, Some(&token), None).await;
            assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", uri);
        }

        let res = ctx
            .request(Method::PUT, "/api/notes/123", Some(&token), Some(json!({"title": "x"})))
            .await;
        assert_eq!(res.body["message"], "The `id` is not valid");
    }

    #[tokio::test]
    async fn foreign_folder_and_tags_are_rejected() {
        let ctx = TestContext::new();
        let alice = ctx.signed_up("alice").await;
        let bob = ctx.signed_up("bob").await;

        let folder = ctx
            .request(Method::POST, "/api/folders", Some(&bob), Some(json!({"name": "Work"})))
            .await;
        let tag = ctx
            .request(Method::POST, "/api/tags", Some(&bob), Some(json!({"name": "urgent"})))
            .await;
        let folder_id = folder.body["id"].clone();
        let tag_id = tag.body["id"].clone();

        let res = ctx
            .request(
                Method::POST,
                "/api/notes",
                Some(&alice),
                Some(json!({"title": "x", "folderId": folder_id})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "The `folderId` is not valid");

        let res = ctx
            .request(Method::POST, "/api/notes", Some(&alice), Some(json!({"title": "x", "tags": [tag_id]})))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);

        let note = ctx
            .request(Method::POST, "/api/notes", Some(&alice), Some(json!({"title": "x"})))
            .await;
        let uri = format!("/api/notes/{}", note.body["id"].as_str().unwrap());
        let res = ctx
            .request(Method::PUT, &uri, Some(&alice), Some(json!({"folderId": folder_id})))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "The `folderId` is not valid");

        let res = ctx
            .request(Method::PUT, &uri, Some(&alice), Some(json!({"tags": [tag_id]})))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "The `tags` array contains an invalid `id`");

        let unchanged = ctx.request(Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(unchanged.body["tags"], json!([]));
        assert!(unchanged.body["folderId"].is_null());

        let listed = ctx.request(Method::GET, "/api/notes", Some(&alice), None).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_can_unset_folder_and_tags_are_populated() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        let folder = ctx
            .request(Method::POST, "/api/folders", Some(&token), Some(json!({"name": "Home"})))
            .await;
        let tag = ctx
            .request(Method::POST, "/api/tags", Some(&token), Some(json!({"name": "todo"})))
            .await;

        let note = ctx
            .request(
                Method::POST,
                "/api/notes",
                Some(&token),
                Some(json!({"title": "Chores", "folderId": folder.body["id"], "tags": [tag.body["id"]]})),
            )
            .await;
        assert_eq!(note.status, StatusCode::CREATED);
        assert_eq!(note.body["folderId"], folder.body["id"]);
        let uri = format!("/api/notes/{}", note.body["id"].as_str().unwrap());

        let fetched = ctx.request(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(fetched.body["tags"][0]["name"], "todo");

        let updated = ctx
            .request(Method::PUT, &uri, Some(&token), Some(json!({"folderId": ""})))
            .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert!(updated.body["folderId"].is_null());
        assert_eq!(updated.body["title"], "Chores");
    }

    #[tokio::test]
    async fn search_filters_title_and_content() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        for body in [
            json!({"title": "Groceries", "content": "milk and eggs"}),
            json!({"title": "Work", "content": "quarterly MILK report"}),
            json!({"title": "Travel"}),
        ] {
            ctx.request(Method::POST, "/api/notes", Some(&token), Some(body)).await;
        }

        let res = ctx
            .request(Method::GET, "/api/notes?searchTerm=milk", Some(&token), None)
            .await;
        assert_eq!(res.body.as_array().unwrap().len(), 2);

        let res = ctx
            .request(Method::GET, "/api/notes?searchTerm=%25", Some(&token), None)
            .await;
        assert_eq!(res.body, json!([]));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let ctx = TestContext::new();
        let token = ctx.signed_up("alice").await;

        let note = ctx
            .request(Method::POST, "/api/notes", Some(&token), Some(json!({"title": "Gone"})))
            .await;
        let uri = format!("/api/notes/{}", note.body["id"].as_str().unwrap());

        let first = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
        let second = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(first.status, StatusCode::NO_CONTENT);
        assert_eq!(second.status, StatusCode::NO_CONTENT);

        let fetched = ctx.request(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_of_someone_elses_note_is_404() {
        let ctx = TestContext::new();
        let alice = ctx.signed_up("alice").await;
        let bob = ctx.signed_up("bob").await;

        let note = ctx
            .request(Method::POST, "/api/notes", Some(&alice), Some(json!({"title": "Mine"})))
            .await;
        let uri = format!("/api/notes/{}", note.body["id"].as_str().unwrap());

        let res = ctx
            .request(Method::PUT, &uri, Some(&bob), Some(json!({"title": "Theirs"})))
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }
}
