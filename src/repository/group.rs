use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use crate::config::config;
use crate::database::manager::DatabaseError;
use crate::database::models::{CreateGroup, Group, UpdateGroup};

/// CRUD and relationship queries for the `groups` table.
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new group with both timestamps stamped to now.
    pub async fn create(&self, input: CreateGroup) -> Result<Group, DatabaseError> {
        let now = Utc::now();
        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name, parent_group_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&input.name)
        .bind(input.parent_group_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    /// Absence is `None`, never an error.
    pub async fn get(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    /// Apply the provided fields and refresh `updated_at`. Every value is
    /// bound through a placeholder; field names never come from the caller.
    /// Returns `None` when the id does not exist.
    pub async fn update(&self, id: i64, changes: UpdateGroup) -> Result<Option<Group>, DatabaseError> {
        let sql = update_sql(&changes);
        if config().database.enable_query_logging {
            debug!(group_id = id, %sql, "group update");
        }

        let mut query = sqlx::query_as::<_, Group>(&sql);
        if let Some(name) = &changes.name {
            query = query.bind(name);
        }
        if let Some(parent_group_id) = changes.parent_group_id {
            query = query.bind(parent_group_id);
        }
        let group = query
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    /// Remove the row. Child groups and member users are not touched; their
    /// references are left dangling.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All groups, store-defined order.
    pub async fn list(&self) -> Result<Vec<Group>, DatabaseError> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM groups")
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    /// Direct children of a group, or the root groups when `parent` is None.
    pub async fn list_children(&self, parent: Option<i64>) -> Result<Vec<Group>, DatabaseError> {
        let groups = match parent {
            Some(parent_id) => {
                sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE parent_group_id = $1")
                    .bind(parent_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE parent_group_id IS NULL")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(groups)
    }

    /// Re-parent a group. No cycle validation happens here; see the
    /// hierarchy module's probe for the optional boundary check.
    pub async fn move_to_parent(
        &self,
        group_id: i64,
        new_parent_id: i64,
    ) -> Result<Option<Group>, DatabaseError> {
        self.update(
            group_id,
            UpdateGroup {
                parent_group_id: Some(new_parent_id),
                ..Default::default()
            },
        )
        .await
    }
}

/// Build the UPDATE statement for the fields present in `changes`.
/// `updated_at` is always assigned, so an empty update still refreshes it.
fn update_sql(changes: &UpdateGroup) -> String {
    let mut sets: Vec<String> = Vec::new();
    let mut idx = 1;
    if changes.name.is_some() {
        sets.push(format!("name = ${idx}"));
        idx += 1;
    }
    if changes.parent_group_id.is_some() {
        sets.push(format!("parent_group_id = ${idx}"));
        idx += 1;
    }
    sets.push(format!("updated_at = ${idx}"));
    format!(
        "UPDATE groups SET {} WHERE id = ${} RETURNING *",
        sets.join(", "),
        idx + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sql_all_fields() {
        let sql = update_sql(&UpdateGroup {
            name: Some("Platform".into()),
            parent_group_id: Some(7),
        });
        assert_eq!(
            sql,
            "UPDATE groups SET name = $1, parent_group_id = $2, updated_at = $3 \
             WHERE id = $4 RETURNING *"
        );
    }

    #[test]
    fn update_sql_name_only() {
        let sql = update_sql(&UpdateGroup {
            name: Some("Platform".into()),
            parent_group_id: None,
        });
        assert_eq!(
            sql,
            "UPDATE groups SET name = $1, updated_at = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn update_sql_parent_only() {
        let sql = update_sql(&UpdateGroup {
            name: None,
            parent_group_id: Some(7),
        });
        assert_eq!(
            sql,
            "UPDATE groups SET parent_group_id = $1, updated_at = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn update_sql_empty_still_touches_updated_at() {
        let sql = update_sql(&UpdateGroup::default());
        assert_eq!(
            sql,
            "UPDATE groups SET updated_at = $1 WHERE id = $2 RETURNING *"
        );
    }
}
