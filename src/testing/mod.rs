//! In-memory directory fixture for exercising the hierarchy aggregator
//! without a database. Filter behavior mirrors the repository SQL.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::database::manager::DatabaseError;
use crate::database::models::{Group, User, UserFilter};
use crate::repository::DirectoryLookup;

pub struct MemoryDirectory {
    groups: Vec<Group>,
    users: Vec<User>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            users: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users.extend(users);
        self
    }
}

#[async_trait]
impl DirectoryLookup for MemoryDirectory {
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn group_by_id(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        Ok(self.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn child_groups(&self, parent: Option<i64>) -> Result<Vec<Group>, DatabaseError> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.parent_group_id == parent)
            .cloned()
            .collect())
    }

    async fn users_in_group(
        &self,
        group_id: i64,
        filter: &UserFilter,
    ) -> Result<Vec<User>, DatabaseError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.group_id == Some(group_id))
            .filter(|u| matches_filter(u, filter))
            .cloned()
            .collect())
    }
}

/// Same predicate the repository builds in SQL: both criteria combine with
/// OR, a single criterion matches its own field, no criteria matches all.
fn matches_filter(user: &User, filter: &UserFilter) -> bool {
    match (&filter.job_title, &filter.first_name) {
        (Some(job_title), Some(first_name)) => {
            user.job_title == *job_title || user.first_name == *first_name
        }
        (Some(job_title), None) => user.job_title == *job_title,
        (None, Some(first_name)) => user.first_name == *first_name,
        (None, None) => true,
    }
}

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn group(id: i64, name: &str) -> Group {
    Group {
        id,
        name: name.to_string(),
        parent_group_id: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn group_under(id: i64, name: &str, parent: i64) -> Group {
    Group {
        parent_group_id: Some(parent),
        ..group(id, name)
    }
}

pub fn user(id: i64, first_name: &str, last_name: &str, job_title: &str) -> User {
    User {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        job_title: job_title.to_string(),
        group_id: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn user_in(id: i64, first_name: &str, last_name: &str, job_title: &str, group_id: i64) -> User {
    User {
        group_id: Some(group_id),
        ..user(id, first_name, last_name, job_title)
    }
}
