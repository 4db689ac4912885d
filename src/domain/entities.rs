//! Domain entities: core data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a category (and of its root node).
pub type CategoryId = String;

/// Identifier of a node inside a category tree.
pub type NodeId = String;

/// Parent id carried by every root node.
pub const ROOT_PARENT_ID: &str = "0";

/// Whether a category ships with the system or was created by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    System,
    Customize,
}

/// Acting user stamped onto every write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub name: String,
}

impl Actor {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

/// Creation and modification stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub created_by: Actor,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Actor,
}

impl Audit {
    pub fn new(actor: &Actor) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            created_by: actor.clone(),
            updated_at: now,
            updated_by: actor.clone(),
        }
    }

    /// Record a modification by `actor`.
    pub fn touch(&mut self, actor: &Actor) {
        self.updated_at = Utc::now();
        self.updated_by = actor.clone();
    }
}

/// A top-level taxonomy container. Its id is also the id of its root node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// Activated for use by the catalog
    pub using: bool,
    pub required: bool,
    pub kind: CategoryType,
    pub sort_weight: u64,
    pub audit: Audit,
}

/// Person responsible for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub uid: String,
}

impl Owner {
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
        }
    }
}

/// Element of a category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: NodeId,
    pub category_id: CategoryId,
    /// `ROOT_PARENT_ID` for the root node
    pub parent_id: NodeId,
    pub name: String,
    pub owner: Owner,
    pub required: bool,
    pub selected: bool,
    pub sort_weight: u64,
    /// Stable module tag stamped on skeleton nodes, hidden from display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_tag: Option<String>,
    pub audit: Audit,
}

impl CategoryNode {
    /// The root node shares its id with the owning category.
    pub fn is_root(&self) -> bool {
        self.id == self.category_id
    }

    /// Root node for a freshly created category.
    pub fn root(category: &Category, actor: &Actor) -> Self {
        Self {
            id: category.id.clone(),
            category_id: category.id.clone(),
            parent_id: ROOT_PARENT_ID.to_string(),
            name: category.name.clone(),
            owner: Owner::default(),
            required: false,
            selected: false,
            sort_weight: 0,
            module_tag: None,
            audit: Audit::new(actor),
        }
    }
}

/// Product capability area a category can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyScope {
    InterfaceService,
    DataResourceCatalog,
    InfoResourceCatalog,
}

impl ApplyScope {
    pub const ALL: [ApplyScope; 3] = [
        ApplyScope::InterfaceService,
        ApplyScope::DataResourceCatalog,
        ApplyScope::InfoResourceCatalog,
    ];

    /// Display name of the scope.
    pub fn label(&self) -> &'static str {
        match self {
            ApplyScope::InterfaceService => "Interface Service",
            ApplyScope::DataResourceCatalog => "Data Resource Catalog",
            ApplyScope::InfoResourceCatalog => "Info Resource Catalog",
        }
    }

    /// Whether the scope only participates when the extended scope flag is on.
    pub fn is_extended(&self) -> bool {
        matches!(self, ApplyScope::InfoResourceCatalog)
    }

    /// Scopes that participate given the extended scope flag.
    pub fn in_scope(extended: bool) -> Vec<ApplyScope> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| extended || !s.is_extended())
            .collect()
    }
}

impl fmt::Display for ApplyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Persisted only while `scope` is selected for `category_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRelation {
    pub category_id: CategoryId,
    pub scope: ApplyScope,
    pub required: bool,
    pub audit: Audit,
}

/// Selection state of one scope for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeState {
    pub scope: ApplyScope,
    pub selected: bool,
    pub required: bool,
}

/// New sort weight for one category in a batch reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOrder {
    pub id: CategoryId,
    pub sort_weight: u64,
}

/// Field changes for a category row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
}

/// Field changes for a node row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub owner: Option<Owner>,
    pub required: Option<bool>,
    pub selected: Option<bool>,
}

impl NodePatch {
    /// Patch touching only the selection flags.
    pub fn flags(selected: bool, required: bool) -> Self {
        Self {
            selected: Some(selected),
            required: Some(required),
            ..Self::default()
        }
    }
}

/// Case-insensitive substring match; returns the byte range of the first hit in `name`.
///
/// Matching runs on the lowercased name. Each lowercased byte remembers the original char
/// it came from, so the range always covers whole chars of `name`.
pub fn keyword_hit(name: &str, keyword: &str) -> Option<(usize, usize)> {
    if keyword.is_empty() {
        return None;
    }
    let mut haystack = String::with_capacity(name.len());
    // (start, end) in `name` of the char behind each byte of `haystack`
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(name.len());
    for (start, ch) in name.char_indices() {
        let end = start + ch.len_utf8();
        for lower in ch.to_lowercase() {
            haystack.push(lower);
            for _ in 0..lower.len_utf8() {
                origin.push((start, end));
            }
        }
    }
    let needle = keyword.to_lowercase();
    let at = haystack.find(&needle)?;
    let (start, _) = origin[at];
    let (_, end) = origin[at + needle.len() - 1];
    Some((start, end))
}
