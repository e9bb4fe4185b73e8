pub mod group;
pub mod user;

pub use group::GroupRepository;
pub use user::UserRepository;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Group, User, UserFilter};

/// The lookup operations the hierarchy aggregator needs. Both repositories
/// sit behind this one capability so the aggregation logic never has to
/// reach into either repository directly (the group and user sides of the
/// tree are mutually recursive otherwise).
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn group_by_id(&self, id: i64) -> Result<Option<Group>, DatabaseError>;

    /// Direct children of a group; the root groups when `parent` is None.
    async fn child_groups(&self, parent: Option<i64>) -> Result<Vec<Group>, DatabaseError>;

    /// Direct members of a group subject to the filter.
    async fn users_in_group(
        &self,
        group_id: i64,
        filter: &UserFilter,
    ) -> Result<Vec<User>, DatabaseError>;
}

/// Postgres-backed [`DirectoryLookup`] delegating to the two repositories.
pub struct Directory {
    groups: GroupRepository,
    users: UserRepository,
}

impl Directory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }
}

#[async_trait]
impl DirectoryLookup for Directory {
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.users.get(id).await
    }

    async fn group_by_id(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        self.groups.get(id).await
    }

    async fn child_groups(&self, parent: Option<i64>) -> Result<Vec<Group>, DatabaseError> {
        self.groups.list_children(parent).await
    }

    async fn users_in_group(
        &self,
        group_id: i64,
        filter: &UserFilter,
    ) -> Result<Vec<User>, DatabaseError> {
        if filter.is_empty() {
            self.users.list_by_group(group_id).await
        } else {
            self.users.list_by_group_filtered(group_id, filter).await
        }
    }
}
