//! Module configuration overlay service
//!
//! Projects a category's tree onto the static module catalog and keeps the per-scope and
//! per-node selected/required flags in step with what administrators configure.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::services::{guards, ServiceDeps};
use crate::application::{in_transaction, ApplicationResult, StoreResultExt};
use crate::domain::{
    to_nested, ApplyScope, Audit, Category, CategoryNode, DomainError, NodePatch, NodeTree,
    ScopeRelation, ScopeState, TreeBuilder,
};

/// One scope of one category, with its module sub-tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleView {
    pub scope: ApplyScope,
    pub label: &'static str,
    pub selected: bool,
    pub required: bool,
    pub tree: Vec<NodeTree>,
}

/// Module configuration of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryModules {
    pub category_id: String,
    pub name: String,
    pub modules: Vec<ModuleView>,
}

/// Requested state of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleUpdate {
    pub scope: ApplyScope,
    pub selected: bool,
    #[serde(default)]
    pub required: bool,
    /// Per-node flags, nested like the module tree
    #[serde(default)]
    pub nodes: Vec<NodeSelection>,
}

/// Requested flags of one module node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelection {
    pub id: String,
    pub selected: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub children: Vec<NodeSelection>,
}

/// Module configuration service.
pub struct ModuleConfigService {
    deps: ServiceDeps,
}

impl ModuleConfigService {
    pub fn new(deps: ServiceDeps) -> Self {
        Self { deps }
    }

    /// Scopes that participate in this environment.
    pub fn scopes(&self) -> Vec<ApplyScope> {
        ApplyScope::in_scope(self.deps.flag.extended_scope_enabled())
    }

    /// Selected/required state of every in-scope module of `category`.
    pub fn resolve(&self, category: &Category) -> ApplicationResult<Vec<ScopeState>> {
        let scopes = self.scopes();
        if self.deps.policy.reserved.is_department(&category.id) {
            return Ok(scopes
                .into_iter()
                .map(|scope| ScopeState {
                    scope,
                    selected: true,
                    required: true,
                })
                .collect());
        }

        let rows: HashMap<ApplyScope, ScopeRelation> = self
            .deps
            .relations
            .list_by_category(&category.id)
            .with_store_context("list scope relations")?
            .into_iter()
            .map(|r| (r.scope, r))
            .collect();

        Ok(scopes
            .into_iter()
            .map(|scope| {
                let row = rows.get(&scope);
                ScopeState {
                    scope,
                    selected: row.is_some(),
                    required: row.map(|r| r.required).unwrap_or(false),
                }
            })
            .collect())
    }

    /// Module configuration of every active category whose name matches `keyword`.
    pub fn get(&self, keyword: Option<&str>) -> ApplicationResult<Vec<CategoryModules>> {
        debug!("get: keyword={:?}", keyword);
        let categories = self
            .deps
            .categories
            .list(keyword)
            .with_store_context("list categories")?;

        categories
            .into_iter()
            .filter(|c| c.using)
            .map(|category| self.category_modules(&category))
            .collect()
    }

    fn category_modules(&self, category: &Category) -> ApplicationResult<CategoryModules> {
        let states = self.resolve(category)?;
        let mut matched = self.module_nodes(&category.id)?;

        let modules = states
            .into_iter()
            .map(|state| {
                let rows = matched.remove(&state.scope).unwrap_or_default();
                ModuleView {
                    scope: state.scope,
                    label: state.scope.label(),
                    selected: state.selected,
                    required: state.required,
                    tree: to_nested(&TreeBuilder::forest(rows)),
                }
            })
            .collect();

        Ok(CategoryModules {
            category_id: category.id.clone(),
            name: category.name.clone(),
            modules,
        })
    }

    fn module_nodes(
        &self,
        category_id: &str,
    ) -> ApplicationResult<BTreeMap<ApplyScope, Vec<CategoryNode>>> {
        let rows = self
            .deps
            .nodes
            .list_tree(category_id)
            .with_store_context("list category tree")?;
        Ok(self.deps.policy.catalog.match_nodes(category_id, &rows))
    }

    /// Replace the module configuration of a category.
    ///
    /// `items` must name every in-scope module exactly once. Module nodes are cleared
    /// before the requested flags are applied, so nodes left out of the request end up
    /// unselected.
    pub fn update(&self, category_id: &str, items: &[ModuleUpdate]) -> ApplicationResult<()> {
        debug!("update: category={} items={}", category_id, items.len());
        let category = guards::category(self.deps.categories.as_ref(), category_id)?;
        if self.deps.policy.reserved.is_department(&category.id) {
            return Err(DomainError::ImmutableConfig(category.name).into());
        }
        self.check_items(items)?;

        let matched = self.module_nodes(category_id)?;
        let actor = self.deps.actor.actor();

        in_transaction(self.deps.uow.as_ref(), || {
            for item in items {
                if item.selected {
                    let relation = ScopeRelation {
                        category_id: category_id.to_string(),
                        scope: item.scope,
                        required: item.required,
                        audit: Audit::new(&actor),
                    };
                    self.deps
                        .relations
                        .upsert(&relation)
                        .with_store_context("upsert scope relation")?;
                } else {
                    self.deps
                        .relations
                        .batch_delete(category_id, &[item.scope])
                        .with_store_context("delete scope relation")?;
                }

                let module_ids: HashSet<&str> = matched
                    .get(&item.scope)
                    .map(|rows| rows.iter().map(|n| n.id.as_str()).collect())
                    .unwrap_or_default();
                for id in &module_ids {
                    self.deps
                        .nodes
                        .update_fields(id, category_id, &NodePatch::flags(false, false), &actor)
                        .with_store_context("clear module node")?;
                }
                if item.selected {
                    self.apply_selections(category_id, &item.nodes, &module_ids, &actor)?;
                }
            }
            Ok(())
        })?;

        info!("updated module configuration of {}", category.name);
        Ok(())
    }

    fn check_items(&self, items: &[ModuleUpdate]) -> ApplicationResult<()> {
        let scopes = self.scopes();
        let mut seen = HashSet::new();
        for item in items {
            if !scopes.contains(&item.scope) {
                return Err(DomainError::ModuleOutOfScope(item.scope).into());
            }
            if !seen.insert(item.scope) {
                return Err(DomainError::DuplicateModule(item.scope).into());
            }
        }
        if let Some(missing) = scopes.into_iter().find(|s| !seen.contains(s)) {
            return Err(DomainError::MissingModule(missing).into());
        }
        Ok(())
    }

    fn apply_selections(
        &self,
        category_id: &str,
        selections: &[NodeSelection],
        module_ids: &HashSet<&str>,
        actor: &crate::domain::Actor,
    ) -> ApplicationResult<()> {
        let mut stack: Vec<&NodeSelection> = selections.iter().collect();
        while let Some(selection) = stack.pop() {
            if module_ids.contains(selection.id.as_str()) {
                self.deps
                    .nodes
                    .update_fields(
                        &selection.id,
                        category_id,
                        &NodePatch::flags(selection.selected, selection.required),
                        actor,
                    )
                    .with_store_context("apply module node flags")?;
            } else {
                warn!(
                    "ignoring node {} outside the module tree of {}",
                    selection.id, category_id
                );
            }
            stack.extend(selection.children.iter());
        }
        Ok(())
    }
}
