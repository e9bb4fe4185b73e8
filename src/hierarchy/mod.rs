//! Tree aggregation over the group/user forest.
//!
//! All three views walk the tree one store round trip per group node, with
//! sibling subtrees fetched concurrently. Termination of the descending
//! walks relies on the tree being acyclic; the ascending breadcrumb walk and
//! the move probe keep a visited set so a corrupted tree cannot hang a
//! request.

use std::collections::{HashSet, VecDeque};

use futures::future::{self, BoxFuture};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::database::manager::DatabaseError;
use crate::database::models::{Group, User, UserFilter};
use crate::repository::DirectoryLookup;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {0} is not in a group")]
    UserNotInGroup(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// One group in the hierarchical dump: the group's own fields plus its
/// subtree and direct members.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    #[serde(flatten)]
    pub group: Group,
    pub group_data: GroupData,
}

#[derive(Debug, Serialize)]
pub struct GroupData {
    pub groups: Vec<GroupNode>,
    pub users: Vec<User>,
}

/// Every user in `group_id` or any group below it, subject to `filter`.
///
/// A missing group id yields an empty set, not an error. The result carries
/// no ordering guarantee.
pub fn collect_users_under_group<'a, L>(
    lookup: &'a L,
    group_id: i64,
    filter: &'a UserFilter,
) -> BoxFuture<'a, Result<Vec<User>, DatabaseError>>
where
    L: DirectoryLookup,
{
    Box::pin(async move {
        if lookup.group_by_id(group_id).await?.is_none() {
            warn!(group_id, "group not found, returning no users");
            return Ok(Vec::new());
        }

        let mut users = lookup.users_in_group(group_id, filter).await?;

        let children = lookup.child_groups(Some(group_id)).await?;
        let subtrees: Vec<_> = children
            .iter()
            .map(|child| collect_users_under_group(lookup, child.id, filter))
            .collect();
        for subtree in future::try_join_all(subtrees).await? {
            users.extend(subtree);
        }

        Ok(users)
    })
}

/// The full tree below `parent`, or the whole forest when `parent` is None.
/// Each node is annotated with its subtree and its direct members.
pub fn build_hierarchy<'a, L>(
    lookup: &'a L,
    parent: Option<i64>,
) -> BoxFuture<'a, Result<Vec<GroupNode>, DatabaseError>>
where
    L: DirectoryLookup,
{
    Box::pin(async move {
        let groups = lookup.child_groups(parent).await?;
        if groups.is_empty() {
            if let Some(parent_id) = parent {
                debug!(parent_id, "no child groups");
            }
            return Ok(Vec::new());
        }

        let nodes = groups.into_iter().map(|group| async move {
            let subtree = build_hierarchy(lookup, Some(group.id)).await?;
            let users = lookup.users_in_group(group.id, &UserFilter::default()).await?;
            Ok::<_, DatabaseError>(GroupNode {
                group,
                group_data: GroupData {
                    groups: subtree,
                    users,
                },
            })
        });
        future::try_join_all(nodes).await
    })
}

/// The chain of groups above a user, root first, ending with the user's own
/// group. Fails if the user does not exist or is not in a resolvable group.
///
/// A dangling parent reference ends the walk at the last group that could be
/// resolved; a revisited group id ends it rather than looping.
pub async fn group_chain_for_user<L>(
    lookup: &L,
    user_id: i64,
) -> Result<Vec<Group>, HierarchyError>
where
    L: DirectoryLookup,
{
    let user = lookup
        .user_by_id(user_id)
        .await?
        .ok_or(HierarchyError::UserNotFound(user_id))?;
    let group_id = user.group_id.ok_or(HierarchyError::UserNotInGroup(user_id))?;
    let group = lookup
        .group_by_id(group_id)
        .await?
        .ok_or(HierarchyError::UserNotInGroup(user_id))?;

    let mut seen: HashSet<i64> = HashSet::new();
    let mut chain: VecDeque<Group> = VecDeque::new();
    let mut cursor = group;
    loop {
        seen.insert(cursor.id);
        let parent_id = cursor.parent_group_id;
        chain.push_front(cursor);

        let Some(parent_id) = parent_id else { break };
        if seen.contains(&parent_id) {
            warn!(group_id = parent_id, "cycle in group chain, stopping walk");
            break;
        }
        match lookup.group_by_id(parent_id).await? {
            Some(parent) => cursor = parent,
            None => {
                warn!(group_id = parent_id, "dangling parent reference, stopping walk");
                break;
            }
        }
    }

    Ok(chain.into())
}

/// Render a chain as the breadcrumb label, root first.
pub fn format_group_chain(chain: &[Group]) -> String {
    chain
        .iter()
        .map(|group| group.name.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Would re-parenting `group_id` under `new_parent_id` make the group its
/// own ancestor? Walks the ancestor chain of the prospective parent. An
/// already-cyclic chain counts as a cycle so the move is refused rather
/// than compounding the damage.
pub async fn move_would_create_cycle<L>(
    lookup: &L,
    group_id: i64,
    new_parent_id: i64,
) -> Result<bool, DatabaseError>
where
    L: DirectoryLookup,
{
    let mut seen: HashSet<i64> = HashSet::new();
    let mut cursor = Some(new_parent_id);
    while let Some(current) = cursor {
        if current == group_id {
            return Ok(true);
        }
        if !seen.insert(current) {
            warn!(group_id = current, "existing cycle in ancestor chain");
            return Ok(true);
        }
        cursor = lookup
            .group_by_id(current)
            .await?
            .and_then(|group| group.parent_group_id);
    }
    Ok(false)
}
