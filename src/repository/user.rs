use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use crate::config::config;
use crate::database::manager::DatabaseError;
use crate::database::models::{CreateUser, UpdateUser, User, UserFilter};

/// CRUD and membership queries for the `users` table.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user with both timestamps stamped to now.
    pub async fn create(&self, input: CreateUser) -> Result<User, DatabaseError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, job_title, group_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.job_title)
        .bind(input.group_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Absence is `None`, never an error.
    pub async fn get(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Apply the provided fields and refresh `updated_at`. Returns `None`
    /// when the id does not exist.
    pub async fn update(&self, id: i64, changes: UpdateUser) -> Result<Option<User>, DatabaseError> {
        let sql = update_sql(&changes);
        if config().database.enable_query_logging {
            debug!(user_id = id, %sql, "user update");
        }

        let mut query = sqlx::query_as::<_, User>(&sql);
        if let Some(first_name) = &changes.first_name {
            query = query.bind(first_name);
        }
        if let Some(last_name) = &changes.last_name {
            query = query.bind(last_name);
        }
        if let Some(job_title) = &changes.job_title {
            query = query.bind(job_title);
        }
        if let Some(group_id) = changes.group_id {
            query = query.bind(group_id);
        }
        let user = query
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All users, store-defined order.
    pub async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Direct members of a group only, no descendants.
    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE group_id = $1")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Direct members of a group matching the filter. With both criteria
    /// present a user matches if either field matches.
    pub async fn list_by_group_filtered(
        &self,
        group_id: i64,
        filter: &UserFilter,
    ) -> Result<Vec<User>, DatabaseError> {
        let sql = filtered_members_sql(filter);
        let mut query = sqlx::query_as::<_, User>(&sql).bind(group_id);
        if let Some(job_title) = &filter.job_title {
            query = query.bind(job_title);
        }
        if let Some(first_name) = &filter.first_name {
            query = query.bind(first_name);
        }
        let users = query.fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Reassign a user to a group, refreshing `updated_at`.
    pub async fn move_to_group(
        &self,
        user_id: i64,
        new_group_id: i64,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET group_id = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(new_group_id)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

/// Build the UPDATE statement for the fields present in `changes`.
/// `updated_at` is always assigned, so an empty update still refreshes it.
fn update_sql(changes: &UpdateUser) -> String {
    let mut sets: Vec<String> = Vec::new();
    let mut idx = 1;
    if changes.first_name.is_some() {
        sets.push(format!("first_name = ${idx}"));
        idx += 1;
    }
    if changes.last_name.is_some() {
        sets.push(format!("last_name = ${idx}"));
        idx += 1;
    }
    if changes.job_title.is_some() {
        sets.push(format!("job_title = ${idx}"));
        idx += 1;
    }
    if changes.group_id.is_some() {
        sets.push(format!("group_id = ${idx}"));
        idx += 1;
    }
    sets.push(format!("updated_at = ${idx}"));
    format!(
        "UPDATE users SET {} WHERE id = ${} RETURNING *",
        sets.join(", "),
        idx + 1
    )
}

/// Predicate for direct members subject to the optional filters. Both
/// criteria combine with OR, matching users on either field.
fn filtered_members_sql(filter: &UserFilter) -> String {
    let base = "SELECT * FROM users WHERE group_id = $1";
    match (&filter.job_title, &filter.first_name) {
        (Some(_), Some(_)) => format!("{base} AND (job_title = $2 OR first_name = $3)"),
        (Some(_), None) => format!("{base} AND job_title = $2"),
        (None, Some(_)) => format!("{base} AND first_name = $2"),
        (None, None) => base.to_string(),
    }
}
