use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::database::models::UserFilter;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::hierarchy::{
    build_hierarchy, collect_users_under_group, format_group_chain, group_chain_for_user,
};
use crate::repository::{Directory, DirectoryLookup};

async fn directory() -> Result<Directory, ApiError> {
    Ok(Directory::new(DatabaseManager::pool().await?))
}

/// GET /all - the whole forest, groups nested with their member users
pub async fn all() -> Result<impl IntoResponse, ApiError> {
    let directory = directory().await?;
    let nodes = build_hierarchy(&directory, None).await?;
    Ok(Json(nodes))
}

/// GET /users/:id/groups - breadcrumb of groups above a user, root first
pub async fn user_groups(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let directory = directory().await?;
    let chain = group_chain_for_user(&directory, id).await?;
    Ok(Json(format_group_chain(&chain)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUsersQuery {
    pub job_title: Option<String>,
    pub first_name: Option<String>,
}

/// GET /groups/:id/users - every user under the group and its descendants,
/// optionally filtered by jobTitle and/or firstName (OR across the two)
pub async fn group_users(
    Path(id): Path<i64>,
    Query(query): Query<GroupUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let directory = directory().await?;
    if directory.group_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("Group not found"));
    }

    let filter = UserFilter {
        job_title: query.job_title,
        first_name: query.first_name,
    };
    let users = collect_users_under_group(&directory, id, &filter).await?;
    Ok(Json(users))
}
