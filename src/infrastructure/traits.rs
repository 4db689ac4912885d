//! Store and collaborator boundary traits
//!
//! These traits abstract persistence and the external collaborators the services consume,
//! allowing services to be tested against the in-memory store.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::domain::{
    Actor, ApplyScope, Category, CategoryNode, CategoryOrder, CategoryPatch, CategoryType,
    NodeId, NodePatch, ScopeRelation,
};
use crate::infrastructure::error::StoreResult;

/// Persistence contract for category rows. Deleted categories are invisible to every method.
pub trait CategoryStore: Send + Sync {
    fn exists(&self, id: &str) -> StoreResult<bool>;

    /// Whether another category (not `exclude_id`) already uses `name`.
    fn exists_by_name(&self, name: &str, exclude_id: Option<&str>) -> StoreResult<bool>;

    fn get(&self, id: &str) -> StoreResult<Option<Category>>;

    /// All categories ordered by sort weight, optionally filtered by a name keyword.
    fn list(&self, keyword: Option<&str>) -> StoreResult<Vec<Category>>;

    /// Categories with the given activation state, ordered by sort weight.
    fn list_by_using(&self, using: bool) -> StoreResult<Vec<Category>>;

    fn count_by_kind(&self, kind: CategoryType) -> StoreResult<usize>;

    /// Write a category row together with its node skeleton.
    fn create(&self, category: &Category, skeleton: &[CategoryNode]) -> StoreResult<()>;

    fn update_fields(&self, id: &str, patch: &CategoryPatch, actor: &Actor) -> StoreResult<()>;

    fn set_using(&self, id: &str, using: bool, actor: &Actor) -> StoreResult<()>;

    /// Apply new sort weights; nothing else changes.
    fn reorder_batch(&self, orders: &[CategoryOrder], actor: &Actor) -> StoreResult<()>;

    /// Logical delete of the category. Its nodes and scope relations go with it.
    fn delete(&self, id: &str, actor: &Actor) -> StoreResult<()>;
}

/// Persistence contract for the nodes of category trees.
pub trait NodeStore: Send + Sync {
    fn exists(&self, node_id: &str, category_id: &str) -> StoreResult<bool>;

    /// Whether a child of `parent_id` other than `exclude_id` is named `name`.
    fn exists_by_name(
        &self,
        name: &str,
        parent_id: &str,
        category_id: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<bool>;

    fn get(&self, node_id: &str, category_id: &str) -> StoreResult<Option<CategoryNode>>;

    fn parent_id(&self, node_id: &str, category_id: &str) -> StoreResult<Option<NodeId>>;

    /// Insert a node; fails with `DepthExceeded` if it would sit below `max_depth` levels.
    fn insert(&self, node: &CategoryNode, max_depth: usize) -> StoreResult<()>;

    /// Remove a node and its subtree. Returns the number of removed rows.
    fn delete(&self, node_id: &str, category_id: &str, actor: &Actor) -> StoreResult<usize>;

    fn update_fields(
        &self,
        node_id: &str,
        category_id: &str,
        patch: &NodePatch,
        actor: &Actor,
    ) -> StoreResult<()>;

    /// Move `node_id` under `dest_parent_id`, immediately before `next_id` (or last).
    /// Fails with `DepthExceeded` if the moved subtree would exceed `max_depth` levels.
    fn reorder(
        &self,
        node_id: &str,
        dest_parent_id: &str,
        next_id: Option<&str>,
        category_id: &str,
        max_depth: usize,
        actor: &Actor,
    ) -> StoreResult<()>;

    /// Direct children of `parent_id` in sibling order, optionally filtered by keyword.
    fn list_children(
        &self,
        parent_id: &str,
        category_id: &str,
        keyword: Option<&str>,
    ) -> StoreResult<Vec<CategoryNode>>;

    /// Every row of the category's tree, root included, in no particular order.
    fn list_tree(&self, category_id: &str) -> StoreResult<Vec<CategoryNode>>;
}

/// Persistence contract for category/apply-scope overlay rows.
pub trait ScopeRelationStore: Send + Sync {
    fn list_by_category(&self, category_id: &str) -> StoreResult<Vec<ScopeRelation>>;

    /// Insert or replace the row for (category, scope).
    fn upsert(&self, relation: &ScopeRelation) -> StoreResult<()>;

    /// Remove rows for the given scopes. Returns the number of removed rows.
    fn batch_delete(&self, category_id: &str, scopes: &[ApplyScope]) -> StoreResult<usize>;
}

/// Scoped transaction capability around multi-write operations.
pub trait UnitOfWork: Send + Sync {
    fn begin(&self) -> StoreResult<()>;

    fn commit(&self) -> StoreResult<()>;

    fn rollback(&self) -> StoreResult<()>;
}

/// Environment switch for the extended (info resource catalog) scope.
pub trait ScopeFlag: Send + Sync {
    fn extended_scope_enabled(&self) -> bool;
}

/// External registry of entries linked to a category (e.g. registered information systems).
pub trait LinkedEntryRegistry: Send + Sync {
    fn linked_count(&self, category_id: &str) -> StoreResult<u64>;
}

/// Supplies the acting user for audit stamps.
pub trait ActorContext: Send + Sync {
    fn actor(&self) -> Actor;
}

/// Filesystem abstraction for snapshot persistence.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file contents atomically (write to a temp file, then rename).
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        self.ensure_parent(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Scope flag fixed at construction (from settings).
#[derive(Debug, Default)]
pub struct StaticScopeFlag(AtomicBool);

impl StaticScopeFlag {
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl ScopeFlag for StaticScopeFlag {
    fn extended_scope_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Registry reporting the same count for every category.
#[derive(Debug, Default)]
pub struct StaticRegistry(AtomicU64);

impl StaticRegistry {
    pub fn new(count: u64) -> Self {
        Self(AtomicU64::new(count))
    }

    pub fn set(&self, count: u64) {
        self.0.store(count, Ordering::SeqCst);
    }
}

impl LinkedEntryRegistry for StaticRegistry {
    fn linked_count(&self, _category_id: &str) -> StoreResult<u64> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}

/// Actor fixed at construction (from settings).
#[derive(Debug, Default, Clone)]
pub struct FixedActor(pub Actor);

impl ActorContext for FixedActor {
    fn actor(&self) -> Actor {
        self.0.clone()
    }
}
