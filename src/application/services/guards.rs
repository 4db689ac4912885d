//! Precondition checks shared by the services.
//!
//! Each guard either passes (returning the row it looked up, where useful) or fails with
//! exactly one domain error. Operations call them in sequence before any write.

use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{Category, CategoryNode, DomainError, NodeId, TreePolicy, ROOT_PARENT_ID};
use crate::infrastructure::traits::{CategoryStore, NodeStore};

pub(crate) fn category(store: &dyn CategoryStore, id: &str) -> ApplicationResult<Category> {
    store
        .get(id)
        .with_store_context("get category")?
        .ok_or_else(|| DomainError::CategoryNotFound(id.to_string()).into())
}

pub(crate) fn category_exists(store: &dyn CategoryStore, id: &str) -> ApplicationResult<()> {
    if !store.exists(id).with_store_context("check category")? {
        return Err(DomainError::CategoryNotFound(id.to_string()).into());
    }
    Ok(())
}

pub(crate) fn not_reserved(policy: &TreePolicy, category: &Category) -> ApplicationResult<()> {
    if policy.reserved.is_reserved(&category.id) {
        return Err(DomainError::SystemImmutable(category.name.clone()).into());
    }
    Ok(())
}

pub(crate) fn category_name_free(
    store: &dyn CategoryStore,
    name: &str,
    exclude_id: Option<&str>,
) -> ApplicationResult<()> {
    if store
        .exists_by_name(name, exclude_id)
        .with_store_context("check category name")?
    {
        return Err(DomainError::CategoryNameConflict(name.to_string()).into());
    }
    Ok(())
}

pub(crate) fn node(
    store: &dyn NodeStore,
    node_id: &str,
    category_id: &str,
) -> ApplicationResult<CategoryNode> {
    store
        .get(node_id, category_id)
        .with_store_context("get node")?
        .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()).into())
}

pub(crate) fn node_exists(
    store: &dyn NodeStore,
    node_id: &str,
    category_id: &str,
) -> ApplicationResult<()> {
    if !store
        .exists(node_id, category_id)
        .with_store_context("check node")?
    {
        return Err(DomainError::NodeNotFound(node_id.to_string()).into());
    }
    Ok(())
}

/// Parent of an existing node; `NodeNotFound` otherwise.
pub(crate) fn parent_of(
    store: &dyn NodeStore,
    node_id: &str,
    category_id: &str,
) -> ApplicationResult<NodeId> {
    store
        .parent_id(node_id, category_id)
        .with_store_context("get node parent")?
        .ok_or_else(|| DomainError::NodeNotFound(node_id.to_string()).into())
}

pub(crate) fn sibling_name_free(
    store: &dyn NodeStore,
    name: &str,
    parent_id: &str,
    category_id: &str,
    exclude_id: Option<&str>,
) -> ApplicationResult<()> {
    if store
        .exists_by_name(name, parent_id, category_id, exclude_id)
        .with_store_context("check node name")?
    {
        return Err(DomainError::NodeNameConflict {
            name: name.to_string(),
            parent_id: parent_id.to_string(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn not_root(node: &CategoryNode) -> ApplicationResult<()> {
    if node.is_root() {
        return Err(DomainError::RootNotAllowedOperate(node.id.clone()).into());
    }
    Ok(())
}

/// Empty and `"0"` parent ids address the category root.
pub(crate) fn resolve_parent(category_id: &str, parent_id: Option<&str>) -> String {
    match parent_id {
        Some(id) if !id.is_empty() && id != ROOT_PARENT_ID => id.to_string(),
        _ => category_id.to_string(),
    }
}

/// Empty optional ids count as absent.
pub(crate) fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|s| !s.is_empty())
}
