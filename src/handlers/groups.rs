use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::config::config;
use crate::database::models::{CreateGroup, UpdateGroup};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::hierarchy::move_would_create_cycle;
use crate::repository::{Directory, GroupRepository};

async fn repository() -> Result<GroupRepository, ApiError> {
    Ok(GroupRepository::new(DatabaseManager::pool().await?))
}

/// Create payload with optional fields so presence can be validated here
/// rather than rejected by deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupPayload {
    pub name: Option<String>,
    pub parent_group_id: Option<i64>,
}

/// POST /groups - create a group
pub async fn create(
    Json(payload): Json<CreateGroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(name) = payload.name else {
        return Err(ApiError::validation_error("Missing required fields: name"));
    };
    let group = repository()
        .await?
        .create(CreateGroup {
            name,
            parent_group_id: payload.parent_group_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /groups - list all groups
pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let groups = repository().await?.list().await?;
    Ok(Json(groups))
}

/// GET /groups/:id - show a group by id
pub async fn get(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let group = repository()
        .await?
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;
    Ok(Json(group))
}

/// PUT /groups/:id - partial update; absent fields are left alone
pub async fn update(
    Path(id): Path<i64>,
    Json(changes): Json<UpdateGroup>,
) -> Result<impl IntoResponse, ApiError> {
    let group = repository()
        .await?
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;
    Ok(Json(group))
}

/// DELETE /groups/:id - delete a group
///
/// Children and member users are left in place with dangling references.
pub async fn delete(Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    let repo = repository().await?;
    if repo.get(id).await?.is_none() {
        return Err(ApiError::not_found("Group not found"));
    }
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /groups/:id/groups/:parent_id - move a group under a new parent
pub async fn move_to_parent(
    Path((group_id, parent_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = GroupRepository::new(pool.clone());

    if repo.get(group_id).await?.is_none() {
        return Err(ApiError::not_found("Group not found"));
    }
    if repo.get(parent_id).await?.is_none() {
        return Err(ApiError::not_found("Parent group not found"));
    }

    if config().hierarchy.enforce_acyclic_moves {
        let directory = Directory::new(pool);
        if move_would_create_cycle(&directory, group_id, parent_id).await? {
            return Err(ApiError::bad_request(
                "Move rejected: group would become its own ancestor",
            ));
        }
    }

    let group = repo
        .move_to_parent(group_id, parent_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;
    Ok(Json(group))
}
