use axum::{extract::Path, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::database::models::{CreateUser, UpdateUser};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::repository::{GroupRepository, UserRepository};

async fn repository() -> Result<UserRepository, ApiError> {
    Ok(UserRepository::new(DatabaseManager::pool().await?))
}

/// Create payload with optional fields so presence can be validated here
/// rather than rejected by deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub group_id: Option<i64>,
}

/// POST /users - create a user
pub async fn create(Json(payload): Json<CreateUserPayload>) -> Result<impl IntoResponse, ApiError> {
    let (Some(first_name), Some(last_name), Some(job_title)) =
        (payload.first_name, payload.last_name, payload.job_title)
    else {
        return Err(ApiError::validation_error(
            "Missing required fields: firstName, lastName, jobTitle",
        ));
    };
    let user = repository()
        .await?
        .create(CreateUser {
            first_name,
            last_name,
            job_title,
            group_id: payload.group_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users - list all users
pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let users = repository().await?.list().await?;
    Ok(Json(users))
}

/// GET /users/:id - show a user by id
pub async fn get(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let user = repository()
        .await?
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

/// PUT /users/:id - partial update; absent fields are left alone
pub async fn update(
    Path(id): Path<i64>,
    Json(changes): Json<UpdateUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = repository()
        .await?
        .update(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

/// DELETE /users/:id - delete a user
pub async fn delete(Path(id): Path<i64>) -> Result<StatusCode, ApiError> {
    let repo = repository().await?;
    if repo.get(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /users/:id/groups/:group_id - move a user into a group
pub async fn move_to_group(
    Path((user_id, group_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let users = UserRepository::new(pool.clone());
    let groups = GroupRepository::new(pool);

    if users.get(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if groups.get(group_id).await?.is_none() {
        return Err(ApiError::not_found("Group not found"));
    }

    let user = users
        .move_to_group(user_id, group_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}
