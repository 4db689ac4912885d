//! In-memory store implementing every persistence contract.
//!
//! Each write runs against a copy of the state and is swapped in only when it succeeds,
//! so a failing write leaves the store untouched. Transactions keep a copy of the state
//! from `begin` and restore it on `rollback`. With a snapshot file attached, the state is
//! written out after every write outside a transaction and on every commit.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::domain::builder::sibling_order;
use crate::domain::ordering::reorder_weights;
use crate::domain::{
    keyword_hit, Actor, ApplyScope, Category, CategoryNode, CategoryOrder, CategoryPatch,
    CategoryType, NodeId, NodePatch, ReservedCategories, ScopeRelation, TreeArena, TreeBuilder,
};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::snapshot::SnapshotFile;
use crate::infrastructure::traits::{CategoryStore, NodeStore, ScopeRelationStore, UnitOfWork};

/// A category row plus its logical-delete marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Every persisted row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub categories: BTreeMap<String, CategoryRow>,
    pub nodes: BTreeMap<NodeId, CategoryNode>,
    pub relations: Vec<ScopeRelation>,
}

impl StoreState {
    fn visible(&self) -> impl Iterator<Item = &Category> {
        self.categories
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.category)
    }

    fn category(&self, id: &str) -> Option<&Category> {
        self.categories
            .get(id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.category)
    }

    fn category_mut(&mut self, id: &str) -> StoreResult<&mut Category> {
        self.categories
            .get_mut(id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &mut row.category)
            .ok_or_else(|| missing("category", id))
    }

    fn node(&self, node_id: &str, category_id: &str) -> Option<&CategoryNode> {
        self.nodes
            .get(node_id)
            .filter(|n| n.category_id == category_id)
    }

    fn node_mut(&mut self, node_id: &str, category_id: &str) -> StoreResult<&mut CategoryNode> {
        self.nodes
            .get_mut(node_id)
            .filter(|n| n.category_id == category_id)
            .ok_or_else(|| missing("node", node_id))
    }

    fn tree_rows(&self, category_id: &str) -> Vec<CategoryNode> {
        self.nodes
            .values()
            .filter(|n| n.category_id == category_id)
            .cloned()
            .collect()
    }

    fn forest(&self, category_id: &str) -> TreeArena {
        TreeBuilder::forest(self.tree_rows(category_id))
    }

    fn sorted(mut categories: Vec<Category>) -> Vec<Category> {
        categories.sort_by(|a, b| {
            a.sort_weight
                .cmp(&b.sort_weight)
                .then_with(|| a.audit.created_at.cmp(&b.audit.created_at))
        });
        categories
    }

    /// Add any reserved category that is missing. Returns whether anything changed.
    fn seed(&mut self, reserved: &ReservedCategories, actor: &Actor) -> bool {
        let mut changed = false;
        for (weight, entry) in (1u64..).zip(reserved.all()) {
            if self.categories.contains_key(&entry.id) {
                continue;
            }
            let using = !reserved.is_info_system(&entry.id);
            let category = entry.to_category(weight, using, actor);
            let root = CategoryNode::root(&category, actor);
            self.nodes.insert(root.id.clone(), root);
            self.categories.insert(
                category.id.clone(),
                CategoryRow {
                    category,
                    deleted_at: None,
                },
            );
            changed = true;
        }
        changed
    }
}

fn missing(table: &'static str, id: &str) -> StoreError {
    StoreError::MissingRow {
        table,
        id: id.to_string(),
    }
}

struct Inner {
    state: StoreState,
    /// State at `begin`, present while a transaction is open
    saved: Option<StoreState>,
}

/// Store holding all rows in memory, optionally mirrored to a JSON snapshot.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    snapshot: Option<SnapshotFile>,
}

impl MemoryStore {
    /// Fresh store seeded with the reserved categories.
    pub fn new(reserved: &ReservedCategories, actor: &Actor) -> Self {
        let mut state = StoreState::default();
        state.seed(reserved, actor);
        Self::from_state(state, None)
    }

    /// Open a snapshot-backed store, creating the snapshot when it does not exist.
    pub fn open(
        snapshot: SnapshotFile,
        reserved: &ReservedCategories,
        actor: &Actor,
    ) -> StoreResult<Self> {
        let (mut state, fresh) = match snapshot.load()? {
            Some(state) => (state, false),
            None => (StoreState::default(), true),
        };
        if state.seed(reserved, actor) || fresh {
            snapshot.save(&state)?;
        }
        info!(
            "opened store {}: {} categories, {} nodes",
            snapshot.path().display(),
            state.categories.len(),
            state.nodes.len()
        );
        Ok(Self::from_state(state, Some(snapshot)))
    }

    fn from_state(state: StoreState, snapshot: Option<SnapshotFile>) -> Self {
        Self {
            inner: Mutex::new(Inner { state, saved: None }),
            snapshot,
        }
    }

    /// Copy of the current rows.
    pub fn state(&self) -> StoreResult<StoreState> {
        self.read(|s| s.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> StoreResult<T> {
        let inner = self.lock()?;
        Ok(f(&inner.state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut inner = self.lock()?;
        let mut work = inner.state.clone();
        let out = f(&mut work)?;
        if inner.saved.is_none() {
            if let Some(snapshot) = &self.snapshot {
                snapshot.save(&work)?;
            }
        }
        inner.state = work;
        Ok(out)
    }
}

impl CategoryStore for MemoryStore {
    fn exists(&self, id: &str) -> StoreResult<bool> {
        self.read(|s| s.category(id).is_some())
    }

    fn exists_by_name(&self, name: &str, exclude_id: Option<&str>) -> StoreResult<bool> {
        self.read(|s| {
            s.visible()
                .any(|c| c.name == name && Some(c.id.as_str()) != exclude_id)
        })
    }

    fn get(&self, id: &str) -> StoreResult<Option<Category>> {
        self.read(|s| s.category(id).cloned())
    }

    fn list(&self, keyword: Option<&str>) -> StoreResult<Vec<Category>> {
        self.read(|s| {
            let matching = s
                .visible()
                .filter(|c| match keyword {
                    Some(k) if !k.is_empty() => keyword_hit(&c.name, k).is_some(),
                    _ => true,
                })
                .cloned()
                .collect();
            StoreState::sorted(matching)
        })
    }

    fn list_by_using(&self, using: bool) -> StoreResult<Vec<Category>> {
        self.read(|s| StoreState::sorted(s.visible().filter(|c| c.using == using).cloned().collect()))
    }

    fn count_by_kind(&self, kind: CategoryType) -> StoreResult<usize> {
        self.read(|s| s.visible().filter(|c| c.kind == kind).count())
    }

    fn create(&self, category: &Category, skeleton: &[CategoryNode]) -> StoreResult<()> {
        self.write(|s| {
            if s.categories.contains_key(&category.id) {
                return Err(StoreError::Duplicate {
                    table: "category",
                    id: category.id.clone(),
                });
            }
            s.categories.insert(
                category.id.clone(),
                CategoryRow {
                    category: category.clone(),
                    deleted_at: None,
                },
            );
            for node in skeleton {
                s.nodes.insert(node.id.clone(), node.clone());
            }
            trace!("create: category={} nodes={}", category.id, skeleton.len());
            Ok(())
        })
    }

    fn update_fields(&self, id: &str, patch: &CategoryPatch, actor: &Actor) -> StoreResult<()> {
        self.write(|s| {
            let category = s.category_mut(id)?;
            if let Some(name) = &patch.name {
                category.name = name.clone();
            }
            if let Some(description) = &patch.description {
                category.description = description.clone();
            }
            if let Some(required) = patch.required {
                category.required = required;
            }
            category.audit.touch(actor);

            // the root node mirrors the category name
            if let Some(name) = &patch.name {
                if let Ok(root) = s.node_mut(id, id) {
                    root.name = name.clone();
                    root.audit.touch(actor);
                }
            }
            Ok(())
        })
    }

    fn set_using(&self, id: &str, using: bool, actor: &Actor) -> StoreResult<()> {
        self.write(|s| {
            let category = s.category_mut(id)?;
            category.using = using;
            category.audit.touch(actor);
            Ok(())
        })
    }

    fn reorder_batch(&self, orders: &[CategoryOrder], actor: &Actor) -> StoreResult<()> {
        self.write(|s| {
            for order in orders {
                let category = s.category_mut(&order.id)?;
                category.sort_weight = order.sort_weight;
                category.audit.touch(actor);
            }
            Ok(())
        })
    }

    fn delete(&self, id: &str, actor: &Actor) -> StoreResult<()> {
        self.write(|s| {
            let row = s
                .categories
                .get_mut(id)
                .filter(|row| row.deleted_at.is_none())
                .ok_or_else(|| missing("category", id))?;
            row.deleted_at = Some(Utc::now());
            row.category.audit.touch(actor);
            s.nodes.retain(|_, n| n.category_id != id);
            s.relations.retain(|r| r.category_id != id);
            Ok(())
        })
    }
}

impl NodeStore for MemoryStore {
    fn exists(&self, node_id: &str, category_id: &str) -> StoreResult<bool> {
        self.read(|s| s.node(node_id, category_id).is_some())
    }

    fn exists_by_name(
        &self,
        name: &str,
        parent_id: &str,
        category_id: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<bool> {
        self.read(|s| {
            s.nodes.values().any(|n| {
                n.category_id == category_id
                    && n.parent_id == parent_id
                    && n.name == name
                    && Some(n.id.as_str()) != exclude_id
            })
        })
    }

    fn get(&self, node_id: &str, category_id: &str) -> StoreResult<Option<CategoryNode>> {
        self.read(|s| s.node(node_id, category_id).cloned())
    }

    fn parent_id(&self, node_id: &str, category_id: &str) -> StoreResult<Option<NodeId>> {
        self.read(|s| s.node(node_id, category_id).map(|n| n.parent_id.clone()))
    }

    fn insert(&self, node: &CategoryNode, max_depth: usize) -> StoreResult<()> {
        self.write(|s| {
            if s.nodes.contains_key(&node.id) {
                return Err(StoreError::Duplicate {
                    table: "node",
                    id: node.id.clone(),
                });
            }
            let forest = s.forest(&node.category_id);
            let parent_idx = forest
                .find(&node.parent_id)
                .ok_or_else(|| missing("node", &node.parent_id))?;
            if forest.level(parent_idx) + 1 > max_depth {
                return Err(StoreError::DepthExceeded { max_depth });
            }
            s.nodes.insert(node.id.clone(), node.clone());
            Ok(())
        })
    }

    fn delete(&self, node_id: &str, category_id: &str, actor: &Actor) -> StoreResult<usize> {
        self.write(|s| {
            let forest = s.forest(category_id);
            let idx = forest
                .find(node_id)
                .ok_or_else(|| missing("node", node_id))?;
            let doomed: Vec<NodeId> = forest
                .iter_from(idx)
                .map(|(_, n)| n.data.id.clone())
                .collect();
            for id in &doomed {
                s.nodes.remove(id);
            }
            debug!(
                "delete: node={} removed={} by={}",
                node_id,
                doomed.len(),
                actor.uid
            );
            Ok(doomed.len())
        })
    }

    fn update_fields(
        &self,
        node_id: &str,
        category_id: &str,
        patch: &NodePatch,
        actor: &Actor,
    ) -> StoreResult<()> {
        self.write(|s| {
            let node = s.node_mut(node_id, category_id)?;
            if let Some(name) = &patch.name {
                node.name = name.clone();
            }
            if let Some(owner) = &patch.owner {
                node.owner = owner.clone();
            }
            if let Some(required) = patch.required {
                node.required = required;
            }
            if let Some(selected) = patch.selected {
                node.selected = selected;
            }
            node.audit.touch(actor);
            Ok(())
        })
    }

    fn reorder(
        &self,
        node_id: &str,
        dest_parent_id: &str,
        next_id: Option<&str>,
        category_id: &str,
        max_depth: usize,
        actor: &Actor,
    ) -> StoreResult<()> {
        self.write(|s| {
            let forest = s.forest(category_id);
            let node_idx = forest
                .find(node_id)
                .ok_or_else(|| missing("node", node_id))?;
            let dest_idx = forest
                .find(dest_parent_id)
                .ok_or_else(|| missing("node", dest_parent_id))?;
            if forest.is_within(node_idx, dest_idx) {
                return Err(StoreError::Cycle {
                    node_id: node_id.to_string(),
                });
            }
            if forest.level(dest_idx) + forest.height(node_idx) > max_depth {
                return Err(StoreError::DepthExceeded { max_depth });
            }

            let siblings: Vec<NodeId> = forest
                .get_node(dest_idx)
                .map(|dest| {
                    dest.children
                        .iter()
                        .filter_map(|&c| forest.get_node(c))
                        .map(|c| c.data.id.clone())
                        .collect()
                })
                .unwrap_or_default();
            let weights = reorder_weights(&siblings, node_id, next_id);

            let node = s.node_mut(node_id, category_id)?;
            node.parent_id = dest_parent_id.to_string();
            node.audit.touch(actor);
            for (id, weight) in weights {
                s.node_mut(&id, category_id)?.sort_weight = weight;
            }
            Ok(())
        })
    }

    fn list_children(
        &self,
        parent_id: &str,
        category_id: &str,
        keyword: Option<&str>,
    ) -> StoreResult<Vec<CategoryNode>> {
        self.read(|s| {
            let mut children: Vec<CategoryNode> = s
                .nodes
                .values()
                .filter(|n| n.category_id == category_id && n.parent_id == parent_id)
                .filter(|n| n.id != parent_id)
                .filter(|n| match keyword {
                    Some(k) if !k.is_empty() => keyword_hit(&n.name, k).is_some(),
                    _ => true,
                })
                .cloned()
                .collect();
            children.sort_by(sibling_order);
            children
        })
    }

    fn list_tree(&self, category_id: &str) -> StoreResult<Vec<CategoryNode>> {
        self.read(|s| s.tree_rows(category_id))
    }
}

impl ScopeRelationStore for MemoryStore {
    fn list_by_category(&self, category_id: &str) -> StoreResult<Vec<ScopeRelation>> {
        self.read(|s| {
            let mut rows: Vec<ScopeRelation> = s
                .relations
                .iter()
                .filter(|r| r.category_id == category_id)
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.scope);
            rows
        })
    }

    fn upsert(&self, relation: &ScopeRelation) -> StoreResult<()> {
        self.write(|s| {
            match s
                .relations
                .iter_mut()
                .find(|r| r.category_id == relation.category_id && r.scope == relation.scope)
            {
                Some(existing) => {
                    existing.required = relation.required;
                    existing.audit.updated_at = relation.audit.updated_at;
                    existing.audit.updated_by = relation.audit.updated_by.clone();
                }
                None => s.relations.push(relation.clone()),
            }
            Ok(())
        })
    }

    fn batch_delete(&self, category_id: &str, scopes: &[ApplyScope]) -> StoreResult<usize> {
        self.write(|s| {
            let before = s.relations.len();
            s.relations
                .retain(|r| !(r.category_id == category_id && scopes.contains(&r.scope)));
            Ok(before - s.relations.len())
        })
    }
}

impl UnitOfWork for MemoryStore {
    fn begin(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if inner.saved.is_some() {
            return Err(StoreError::TransactionActive);
        }
        inner.saved = Some(inner.state.clone());
        trace!("begin transaction");
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let saved = inner.saved.take().ok_or(StoreError::NoTransaction)?;
        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(&inner.state) {
                inner.state = saved;
                return Err(e);
            }
        }
        trace!("commit transaction");
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        let mut inner = self.lock()?;
        let saved = inner.saved.take().ok_or(StoreError::NoTransaction)?;
        inner.state = saved;
        debug!("rollback transaction");
        Ok(())
    }
}
