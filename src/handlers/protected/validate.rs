// Ownership checks for the folder and tags a note refers to

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

async fn validate_folder(state: &AppState, owner: Uuid, folder_id: Option<Uuid>) -> Result<(), ApiError> {
    let Some(folder_id) = folder_id else {
        return Ok(());
    };

    match state.store.folders.find(owner, folder_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::bad_request("The `folderId` is not valid")),
    }
}

async fn validate_tags(state: &AppState, owner: Uuid, tags: Option<&[Uuid]>) -> Result<(), ApiError> {
    let Some(tags) = tags else {
        return Ok(());
    };

    let wanted: HashSet<Uuid> = tags.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = wanted.iter().copied().collect();
    let owned = state.store.tags.find_many(owner, &ids).await?;
    let found: HashSet<Uuid> = owned.iter().map(|t| t.id).collect();

    if found != wanted {
        return Err(ApiError::bad_request("The `tags` array contains an invalid `id`"));
    }
    Ok(())
}

/// Both checks run concurrently; the first rejection wins and nothing is written.
pub async fn validate_references(
    state: &AppState,
    owner: Uuid,
    folder_id: Option<Uuid>,
    tags: Option<&[Uuid]>,
) -> Result<(), ApiError> {
    futures::try_join!(
        validate_folder(state, owner, folder_id),
        validate_tags(state, owner, tags)
    )?;
    Ok(())
}
