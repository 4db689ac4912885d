//! Static module catalog: which nodes make up each apply scope's configurable sub-tree.
//!
//! Every category is seeded with one group node per scope plus the group's fixed children.
//! Seeded nodes carry the definition's tag so they can be found again after a rename;
//! untagged rows fall back to matching by name and parent name.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;
use uuid::Uuid;

use crate::domain::entities::{Actor, ApplyScope, Audit, Category, CategoryNode, Owner};

/// One node of a module definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleNodeDef {
    /// Stable tag stamped on seeded nodes
    pub tag: &'static str,
    pub name: &'static str,
    /// Tag of the parent definition, None when the node hangs off the category root
    pub parent: Option<&'static str>,
}

/// Configurable sub-tree of one apply scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTreeDef {
    pub scope: ApplyScope,
    /// Parents listed before their children
    pub nodes: &'static [ModuleNodeDef],
}

impl ModuleTreeDef {
    fn node(&self, tag: &str) -> Option<&ModuleNodeDef> {
        self.nodes.iter().find(|n| n.tag == tag)
    }
}

const INTERFACE_SERVICE: &[ModuleNodeDef] = &[
    ModuleNodeDef {
        tag: "interface_service",
        name: "Interface Service Management",
        parent: None,
    },
    ModuleNodeDef {
        tag: "interface_service.interface_list",
        name: "Interface List",
        parent: Some("interface_service"),
    },
    ModuleNodeDef {
        tag: "interface_service.market_left_tree",
        name: "Market Left Tree",
        parent: Some("interface_service"),
    },
];

const DATA_RESOURCE_CATALOG: &[ModuleNodeDef] = &[
    ModuleNodeDef {
        tag: "data_resource_catalog",
        name: "Data Resource Catalog Management",
        parent: None,
    },
    ModuleNodeDef {
        tag: "data_resource_catalog.catalog_list",
        name: "Catalog List",
        parent: Some("data_resource_catalog"),
    },
    ModuleNodeDef {
        tag: "data_resource_catalog.market_left_tree",
        name: "Market Left Tree",
        parent: Some("data_resource_catalog"),
    },
];

const INFO_RESOURCE_CATALOG: &[ModuleNodeDef] = &[
    ModuleNodeDef {
        tag: "info_resource_catalog",
        name: "Info Resource Catalog Management",
        parent: None,
    },
    ModuleNodeDef {
        tag: "info_resource_catalog.catalog_list",
        name: "Catalog List",
        parent: Some("info_resource_catalog"),
    },
    ModuleNodeDef {
        tag: "info_resource_catalog.market_left_tree",
        name: "Market Left Tree",
        parent: Some("info_resource_catalog"),
    },
];

/// The set of module definitions a deployment works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCatalog {
    defs: Vec<ModuleTreeDef>,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where a flattened node hangs: directly off the category root, or under a named parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ParentRef<'a> {
    Root,
    Name(&'a str),
}

impl ModuleCatalog {
    pub fn standard() -> Self {
        Self::new(vec![
            ModuleTreeDef {
                scope: ApplyScope::InterfaceService,
                nodes: INTERFACE_SERVICE,
            },
            ModuleTreeDef {
                scope: ApplyScope::DataResourceCatalog,
                nodes: DATA_RESOURCE_CATALOG,
            },
            ModuleTreeDef {
                scope: ApplyScope::InfoResourceCatalog,
                nodes: INFO_RESOURCE_CATALOG,
            },
        ])
    }

    pub fn new(defs: Vec<ModuleTreeDef>) -> Self {
        Self { defs }
    }

    /// Whether `tag` belongs to any module definition.
    pub fn is_module_tag(&self, tag: &str) -> bool {
        self.defs.iter().any(|d| d.node(tag).is_some())
    }

    /// Levels of a freshly seeded tree, counting the root.
    pub fn skeleton_depth(&self) -> usize {
        let mut deepest = 0;
        for def in &self.defs {
            let mut levels: HashMap<&str, usize> = HashMap::new();
            for entry in def.nodes {
                let level = entry
                    .parent
                    .and_then(|tag| levels.get(tag))
                    .map_or(1, |parent| parent + 1);
                levels.insert(entry.tag, level);
                deepest = deepest.max(level);
            }
        }
        deepest + 1
    }

    /// Root plus every module node for a new category, all flags off.
    pub fn skeleton(&self, category: &Category, actor: &Actor) -> Vec<CategoryNode> {
        let root = CategoryNode::root(category, actor);
        let mut nodes = vec![root];
        let mut group_weight = 0;

        for def in &self.defs {
            let mut ids: HashMap<&str, String> = HashMap::new();
            let mut child_weight: HashMap<&str, u64> = HashMap::new();
            for entry in def.nodes {
                let id = Uuid::new_v4().to_string();
                let (parent_id, sort_weight) = match entry.parent {
                    None => {
                        group_weight += 1;
                        (category.id.clone(), group_weight)
                    }
                    Some(parent_tag) => {
                        let weight = child_weight.entry(parent_tag).or_insert(0);
                        *weight += 1;
                        let parent_id = ids
                            .get(parent_tag)
                            .cloned()
                            .unwrap_or_else(|| category.id.clone());
                        (parent_id, *weight)
                    }
                };
                nodes.push(CategoryNode {
                    id: id.clone(),
                    category_id: category.id.clone(),
                    parent_id,
                    name: entry.name.to_string(),
                    owner: Owner::default(),
                    required: false,
                    selected: false,
                    sort_weight,
                    module_tag: Some(entry.tag.to_string()),
                    audit: Audit::new(actor),
                });
                ids.insert(entry.tag, id);
            }
        }
        nodes
    }

    /// Group the nodes of one category by the module they represent.
    ///
    /// Single pass over the flattened rows: each node is paired with its resolved parent
    /// (root or parent name) and looked up by tag, or by (parent, name) for scopes that
    /// have no tagged rows in this category.
    pub fn match_nodes(
        &self,
        category_id: &str,
        nodes: &[CategoryNode],
    ) -> BTreeMap<ApplyScope, Vec<CategoryNode>> {
        let by_id: HashMap<&str, &CategoryNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut by_tag: HashMap<&str, ApplyScope> = HashMap::new();
        let mut by_name: HashMap<(ParentRef<'_>, &str), ApplyScope> = HashMap::new();
        for def in &self.defs {
            for entry in def.nodes {
                by_tag.insert(entry.tag, def.scope);
                let parent = match entry.parent.and_then(|tag| def.node(tag)) {
                    Some(parent) => ParentRef::Name(parent.name),
                    None => ParentRef::Root,
                };
                by_name.insert((parent, entry.name), def.scope);
            }
        }

        let flat: Vec<(&CategoryNode, Option<ParentRef<'_>>)> = nodes
            .iter()
            .filter(|n| !n.is_root())
            .map(|n| {
                let parent = if n.parent_id == category_id {
                    Some(ParentRef::Root)
                } else {
                    by_id
                        .get(n.parent_id.as_str())
                        .map(|p| ParentRef::Name(p.name.as_str()))
                };
                (n, parent)
            })
            .collect();

        let tagged: HashSet<ApplyScope> = flat
            .iter()
            .filter_map(|(n, _)| n.module_tag.as_deref())
            .filter_map(|tag| by_tag.get(tag).copied())
            .collect();

        let mut matched: BTreeMap<ApplyScope, Vec<CategoryNode>> = BTreeMap::new();
        for (node, parent) in flat {
            let scope = match node.module_tag.as_deref() {
                Some(tag) => by_tag.get(tag).copied(),
                None => parent
                    .and_then(|p| by_name.get(&(p, node.name.as_str())).copied())
                    .filter(|scope| !tagged.contains(scope)),
            };
            if let Some(scope) = scope {
                matched.entry(scope).or_default().push(node.clone());
            }
        }
        trace!(
            "match_nodes: category={} scopes={}",
            category_id,
            matched.len()
        );
        matched
    }
}
