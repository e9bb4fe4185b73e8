use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A node in the group tree. Root groups have no parent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub parent_group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    pub parent_group_id: Option<i64>,
}

/// Partial update: absent fields are left unchanged. A parent reference can
/// be replaced but not cleared through this path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub parent_group_id: Option<i64>,
}

impl UpdateGroup {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_group_id.is_none()
    }
}
