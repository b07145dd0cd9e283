// handlers/protected/labels.rs - /api/folders and /api/tags
//
// One set of handlers serves both routers; the router attaches the
// `LabelKind` as an extension.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::database::models::{Label, LabelKind};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::input::{json_object, parse_id};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

fn parse_name(body: Result<Json<Value>, JsonRejection>) -> Result<String, ApiError> {
    let body = json_object(body)?;

    body.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Missing `name` in request body"))
}

fn not_found(kind: LabelKind) -> ApiError {
    ApiError::not_found(format!("{} not found", kind.noun()))
}

fn map_duplicate(kind: LabelKind) -> impl FnOnce(DatabaseError) -> ApiError {
    move |e| match e {
        DatabaseError::UniqueViolation(_) => ApiError::duplicate_key(format!("{} name already exists", kind.noun())),
        other => other.into(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Label>> {
    let labels = state.store.labels(kind).list(auth_user.id).await?;
    Ok(ApiResponse::success(labels))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Label> {
    let id = parse_id(&id, "id")?;

    let label = state
        .store
        .labels(kind)
        .find(auth_user.id, id)
        .await?
        .ok_or_else(|| not_found(kind))?;

    Ok(ApiResponse::success(label))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Label> {
    let name = parse_name(body)?;

    let label = state
        .store
        .labels(kind)
        .insert(auth_user.id, name)
        .await
        .map_err(map_duplicate(kind))?;

    tracing::info!("User '{}' created {} {}", auth_user.username, kind.table(), label.id);

    let location = format!("{}/{}", kind.route(), label.id);
    Ok(ApiResponse::created(label, location))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Label> {
    let id = parse_id(&id, "id")?;
    let name = parse_name(body)?;

    let label = state
        .store
        .labels(kind)
        .rename(auth_user.id, id, name)
        .await
        .map_err(map_duplicate(kind))?
        .ok_or_else(|| not_found(kind))?;

    Ok(ApiResponse::success(label))
}

/// Removes the label and every reference to it from the owner's notes
pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "id")?;
    let owner = auth_user.id;

    let clear_references = async {
        match kind {
            LabelKind::Folder => state.store.notes.clear_folder(owner, id).await,
            LabelKind::Tag => state.store.notes.remove_tag(owner, id).await,
        }
    };

    let (touched, removed) = futures::try_join!(clear_references, state.store.labels(kind).delete(owner, id))?;

    if removed {
        tracing::info!(
            "User '{}' deleted {} {} ({} notes updated)",
            auth_user.username,
            kind.table(),
            id,
            touched
        );
    }
    Ok(ApiResponse::no_content())
}
