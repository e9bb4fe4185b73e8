use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A directory member. Group membership is optional and held as a bare
/// reference; the group row may no longer exist (see schema notes).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub group_id: Option<i64>,
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub group_id: Option<i64>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.job_title.is_none()
            && self.group_id.is_none()
    }
}

/// Criteria for descendant user queries. When both are present a user
/// matches if EITHER field matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub job_title: Option<String>,
    pub first_name: Option<String>,
}

impl UserFilter {
    pub fn is_empty(&self) -> bool {
        self.job_title.is_none() && self.first_name.is_none()
    }
}
