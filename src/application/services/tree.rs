//! Category tree service
//!
//! Node CRUD, moves and tree projections within one category.

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::services::{guards, ServiceDeps};
use crate::application::{in_transaction, ApplicationResult, StoreResultExt};
use crate::domain::ordering::next_weight;
use crate::domain::{
    keyword_hit, to_nested, to_nested_filtered, Audit, CategoryNode, DomainError, NodePatch,
    NodeTree, Owner, TreeArena, TreeBuilder,
};

/// Input for adding a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNode {
    /// Parent node; None, empty or `"0"` means the category root
    pub parent_id: Option<String>,
    pub name: String,
    pub owner: Owner,
    /// Defaults to false
    pub required: Option<bool>,
    /// Defaults to true
    pub selected: Option<bool>,
}

/// Input for editing a node. Flags left as None keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEdit {
    pub name: String,
    pub owner: Owner,
    pub required: Option<bool>,
    pub selected: Option<bool>,
}

/// Query for flat node listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub parent_id: Option<String>,
    pub keyword: Option<String>,
    /// Include all descendants of the parent, not only direct children
    pub recursive: bool,
}

/// A node in a flat listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeListItem {
    #[serde(flatten)]
    pub node: CategoryNode,
    /// The node has children
    pub expansion: bool,
    /// Names from the root down to the parent
    pub path: Vec<String>,
    /// Byte range of the keyword hit in the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<(usize, usize)>,
}

/// Service for managing the nodes of category trees.
pub struct CategoryTreeService {
    deps: ServiceDeps,
}

impl CategoryTreeService {
    pub fn new(deps: ServiceDeps) -> Self {
        Self { deps }
    }

    /// Add a node as the last child of its parent.
    pub fn add(&self, category_id: &str, new: NewNode) -> ApplicationResult<CategoryNode> {
        debug!("add: category={} name={}", category_id, new.name);
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let nodes = self.deps.nodes.as_ref();
        let parent_id = guards::resolve_parent(category_id, new.parent_id.as_deref());
        guards::node_exists(nodes, &parent_id, category_id)?;
        guards::sibling_name_free(nodes, &new.name, &parent_id, category_id, None)?;

        let siblings = nodes
            .list_children(&parent_id, category_id, None)
            .with_store_context("list siblings")?;
        let node = CategoryNode {
            id: Uuid::new_v4().to_string(),
            category_id: category_id.to_string(),
            parent_id,
            name: new.name,
            owner: new.owner,
            required: new.required.unwrap_or(false),
            selected: new.selected.unwrap_or(true),
            sort_weight: next_weight(siblings.iter().map(|n| n.sort_weight)),
            module_tag: None,
            audit: Audit::new(&self.deps.actor.actor()),
        };
        nodes
            .insert(&node, self.deps.policy.limits.max_depth)
            .with_store_context("insert node")?;

        info!("added node {} to {}", node.name, category_id);
        Ok(node)
    }

    /// Remove a node and its whole subtree. Returns the number of removed nodes.
    pub fn delete(&self, category_id: &str, node_id: &str) -> ApplicationResult<usize> {
        debug!("delete: category={} node={}", category_id, node_id);
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let node = guards::node(self.deps.nodes.as_ref(), node_id, category_id)?;
        guards::not_root(&node)?;

        let removed = self
            .deps
            .nodes
            .delete(node_id, category_id, &self.deps.actor.actor())
            .with_store_context("delete node")?;
        info!("deleted node {} ({} rows)", node.name, removed);
        Ok(removed)
    }

    /// Change name, owner and flags of a node.
    ///
    /// The root node has no selection state; `selected` is ignored for it.
    pub fn edit(&self, category_id: &str, node_id: &str, edit: NodeEdit) -> ApplicationResult<()> {
        debug!("edit: category={} node={}", category_id, node_id);
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let nodes = self.deps.nodes.as_ref();
        let node = guards::node(nodes, node_id, category_id)?;
        guards::sibling_name_free(nodes, &edit.name, &node.parent_id, category_id, Some(node_id))?;

        let selected = if node.is_root() {
            if edit.selected.is_some() {
                debug!("edit: ignoring selected on root {}", node_id);
            }
            None
        } else {
            edit.selected
        };
        let patch = NodePatch {
            name: Some(edit.name),
            owner: Some(edit.owner),
            required: edit.required,
            selected,
        };
        nodes
            .update_fields(node_id, category_id, &patch, &self.deps.actor.actor())
            .with_store_context("update node")
    }

    /// Move a node under `dest_parent_id`, immediately before `next_id` (or last).
    ///
    /// Moving a node before itself is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn reorder(
        &self,
        category_id: &str,
        node_id: &str,
        dest_parent_id: &str,
        next_id: Option<&str>,
    ) -> ApplicationResult<()> {
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let nodes = self.deps.nodes.as_ref();
        let node = guards::node(nodes, node_id, category_id)?;
        let dest_id = guards::resolve_parent(category_id, Some(dest_parent_id));
        guards::node_exists(nodes, &dest_id, category_id)?;
        guards::not_root(&node)?;
        if node_id == dest_id {
            return Err(DomainError::MoveToSelf(node_id.to_string()).into());
        }

        let next_id = guards::non_empty(next_id);
        if next_id == Some(node_id) {
            debug!("reorder: {} placed before itself", node_id);
            return Ok(());
        }
        if let Some(next_id) = next_id {
            if guards::parent_of(nodes, next_id, category_id)? != dest_id {
                return Err(DomainError::NextNotSibling {
                    next_id: next_id.to_string(),
                    parent_id: dest_id,
                }
                .into());
            }
        }

        let forest = self.forest(category_id)?;
        if let (Some(moved), Some(dest)) = (forest.find(node_id), forest.find(&dest_id)) {
            if forest.is_within(moved, dest) {
                return Err(DomainError::MoveToDescendant {
                    node_id: node_id.to_string(),
                    dest_parent_id: dest_id,
                }
                .into());
            }
        }
        if node.parent_id != dest_id {
            guards::sibling_name_free(nodes, &node.name, &dest_id, category_id, Some(node_id))?;
        }

        let actor = self.deps.actor.actor();
        let max_depth = self.deps.policy.limits.max_depth;
        in_transaction(self.deps.uow.as_ref(), || {
            nodes
                .reorder(node_id, &dest_id, next_id, category_id, max_depth, &actor)
                .with_store_context("move node")
        })?;
        info!("moved node {} under {}", node.name, dest_id);
        Ok(())
    }

    /// Whether a child of the parent other than `node_id` is named `name`.
    pub fn name_exists(
        &self,
        category_id: &str,
        parent_id: Option<&str>,
        node_id: Option<&str>,
        name: &str,
    ) -> ApplicationResult<bool> {
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let nodes = self.deps.nodes.as_ref();
        let parent_id = guards::resolve_parent(category_id, parent_id);
        guards::node_exists(nodes, &parent_id, category_id)?;
        let node_id = guards::non_empty(node_id);
        if let Some(node_id) = node_id {
            guards::node_exists(nodes, node_id, category_id)?;
        }
        nodes
            .exists_by_name(name, &parent_id, category_id, node_id)
            .with_store_context("check node name")
    }

    /// Flat listing of the children (or all descendants) of a node.
    pub fn list(&self, category_id: &str, query: &ListQuery) -> ApplicationResult<Vec<NodeListItem>> {
        debug!("list: category={} query={:?}", category_id, query);
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let nodes = self.deps.nodes.as_ref();
        let parent_id = guards::resolve_parent(category_id, query.parent_id.as_deref());
        guards::node_exists(nodes, &parent_id, category_id)?;
        let keyword = guards::non_empty(query.keyword.as_deref());
        let forest = self.forest(category_id)?;

        let rows = if query.recursive {
            forest
                .find(&parent_id)
                .map(|parent| {
                    forest
                        .iter_from(parent)
                        .skip(1)
                        .map(|(_, n)| n.data.clone())
                        .filter(|n| keyword.map_or(true, |k| keyword_hit(&n.name, k).is_some()))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            nodes
                .list_children(&parent_id, category_id, keyword)
                .with_store_context("list children")?
        };

        Ok(rows
            .into_iter()
            .map(|node| list_item(&forest, node, keyword))
            .collect())
    }

    /// The whole tree of a category, pruned to keyword hits when a keyword is given.
    pub fn list_tree(
        &self,
        category_id: &str,
        keyword: Option<&str>,
    ) -> ApplicationResult<Vec<NodeTree>> {
        debug!("list_tree: category={} keyword={:?}", category_id, keyword);
        guards::category_exists(self.deps.categories.as_ref(), category_id)?;
        let forest = self.forest(category_id)?;
        Ok(match guards::non_empty(keyword) {
            Some(keyword) => to_nested_filtered(&forest, keyword),
            None => to_nested(&forest),
        })
    }

    fn forest(&self, category_id: &str) -> ApplicationResult<TreeArena> {
        let rows = self
            .deps
            .nodes
            .list_tree(category_id)
            .with_store_context("list category tree")?;
        Ok(TreeBuilder::forest(rows))
    }
}

fn list_item(forest: &TreeArena, node: CategoryNode, keyword: Option<&str>) -> NodeListItem {
    let (expansion, path) = match forest.find(&node.id) {
        Some(idx) => (
            forest
                .get_node(idx)
                .map_or(false, |n| !n.children.is_empty()),
            forest
                .ancestors(idx)
                .into_iter()
                .filter_map(|a| forest.get_node(a).map(|n| n.data.name.clone()))
                .collect(),
        ),
        None => (false, Vec::new()),
    };
    let highlight = keyword.and_then(|k| keyword_hit(&node.name, k));
    NodeListItem {
        node,
        expansion,
        path,
        highlight,
    }
}
