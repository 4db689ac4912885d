//! Category lifecycle service
//!
//! Creation, editing, activation, ordering and deletion of categories.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::services::{guards, ModuleConfigService, ServiceDeps};
use crate::application::{in_transaction, ApplicationResult, StoreResultExt};
use crate::domain::ordering::next_weight;
use crate::domain::{
    Audit, Category, CategoryOrder, CategoryPatch, CategoryType, DomainError, ScopeState,
};

/// A category decorated with the state of its modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub modules: Vec<ScopeState>,
}

/// Service for managing categories.
pub struct CategoryService {
    deps: ServiceDeps,
    modules: Arc<ModuleConfigService>,
}

impl CategoryService {
    pub fn new(deps: ServiceDeps, modules: Arc<ModuleConfigService>) -> Self {
        Self { deps, modules }
    }

    /// Create a customize category together with its module skeleton.
    pub fn add(&self, name: &str, description: &str) -> ApplicationResult<Category> {
        debug!("add: name={}", name);
        let store = self.deps.categories.as_ref();
        guards::category_name_free(store, name, None)?;

        let max = self.deps.policy.limits.max_customize_categories;
        let count = store
            .count_by_kind(CategoryType::Customize)
            .with_store_context("count categories")?;
        if count >= max {
            return Err(DomainError::CategoryLimitExceeded { max }.into());
        }

        let max_depth = self.deps.policy.limits.max_depth;
        if self.deps.policy.catalog.skeleton_depth() > max_depth {
            return Err(DomainError::DepthExceeded { max_depth }.into());
        }

        let existing = store.list(None).with_store_context("list categories")?;
        let actor = self.deps.actor.actor();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            using: false,
            required: false,
            kind: CategoryType::Customize,
            sort_weight: next_weight(existing.iter().map(|c| c.sort_weight)),
            audit: Audit::new(&actor),
        };
        let skeleton = self.deps.policy.catalog.skeleton(&category, &actor);

        in_transaction(self.deps.uow.as_ref(), || {
            store
                .create(&category, &skeleton)
                .with_store_context("create category")
        })?;

        info!("created category {} ({})", category.name, category.id);
        Ok(category)
    }

    /// Logically delete a customize category with its tree and module configuration.
    pub fn delete(&self, id: &str) -> ApplicationResult<()> {
        debug!("delete: id={}", id);
        let store = self.deps.categories.as_ref();
        let category = guards::category(store, id)?;
        guards::not_reserved(&self.deps.policy, &category)?;

        store
            .delete(id, &self.deps.actor.actor())
            .with_store_context("delete category")?;
        info!("deleted category {}", category.name);
        Ok(())
    }

    /// Change name and description. The root node follows the new name.
    pub fn edit(&self, id: &str, name: &str, description: &str) -> ApplicationResult<()> {
        debug!("edit: id={} name={}", id, name);
        let store = self.deps.categories.as_ref();
        let category = guards::category(store, id)?;
        guards::not_reserved(&self.deps.policy, &category)?;
        guards::category_name_free(store, name, Some(id))?;

        let patch = CategoryPatch {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            ..CategoryPatch::default()
        };
        store
            .update_fields(id, &patch, &self.deps.actor.actor())
            .with_store_context("update category")
    }

    pub fn edit_required(&self, id: &str, required: bool) -> ApplicationResult<()> {
        debug!("edit_required: id={} required={}", id, required);
        let store = self.deps.categories.as_ref();
        let category = guards::category(store, id)?;
        guards::not_reserved(&self.deps.policy, &category)?;

        let patch = CategoryPatch {
            required: Some(required),
            ..CategoryPatch::default()
        };
        store
            .update_fields(id, &patch, &self.deps.actor.actor())
            .with_store_context("update category")
    }

    /// Activate or deactivate a category.
    ///
    /// Activation needs a tree with at least one node of its own beyond the module
    /// skeleton, and is capped at `max_using_categories` active customize categories.
    /// The information system category is exempt from both; it needs at least one
    /// linked registry entry instead.
    pub fn edit_using(&self, id: &str, using: bool) -> ApplicationResult<()> {
        debug!("edit_using: id={} using={}", id, using);
        let store = self.deps.categories.as_ref();
        let category = guards::category(store, id)?;
        let reserved = &self.deps.policy.reserved;
        let info_system = reserved.is_info_system(id);
        if reserved.is_reserved(id) && !info_system {
            return Err(DomainError::SystemImmutable(category.name).into());
        }
        if category.using == using {
            debug!("edit_using: {} already using={}", category.name, using);
            return Ok(());
        }

        if using {
            if info_system {
                self.check_linked_entries(&category)?;
            } else {
                self.check_tree_content(&category)?;
                self.check_using_cap()?;
            }
        }

        store
            .set_using(id, using, &self.deps.actor.actor())
            .with_store_context("set category using")?;
        info!(
            "{} category {}",
            if using { "activated" } else { "deactivated" },
            category.name
        );
        Ok(())
    }

    fn check_linked_entries(&self, category: &Category) -> ApplicationResult<()> {
        let linked = self
            .deps
            .registry
            .linked_count(&category.id)
            .with_store_context("count linked entries")?;
        if linked == 0 {
            return Err(DomainError::CategoryTreeNotExist(category.name.clone()).into());
        }
        Ok(())
    }

    fn check_tree_content(&self, category: &Category) -> ApplicationResult<()> {
        let rows = self
            .deps
            .nodes
            .list_tree(&category.id)
            .with_store_context("list category tree")?;
        let catalog = &self.deps.policy.catalog;
        let has_content = rows.iter().any(|n| {
            !n.is_root()
                && n.module_tag
                    .as_deref()
                    .map_or(true, |tag| !catalog.is_module_tag(tag))
        });
        if !has_content {
            return Err(DomainError::CategoryTreeNotExist(category.name.clone()).into());
        }
        Ok(())
    }

    fn check_using_cap(&self) -> ApplicationResult<()> {
        let max = self.deps.policy.limits.max_using_categories;
        let active = self
            .deps
            .categories
            .list_by_using(true)
            .with_store_context("list active categories")?
            .iter()
            .filter(|c| c.kind == CategoryType::Customize)
            .count();
        if active >= max {
            return Err(DomainError::CategoryUsingOverMax { max }.into());
        }
        Ok(())
    }

    /// Apply new sort weights to several categories at once.
    pub fn batch_edit(&self, orders: &[CategoryOrder]) -> ApplicationResult<()> {
        debug!("batch_edit: {} categories", orders.len());
        let store = self.deps.categories.as_ref();
        for order in orders {
            guards::category_exists(store, &order.id)?;
        }
        let actor = self.deps.actor.actor();
        in_transaction(self.deps.uow.as_ref(), || {
            store
                .reorder_batch(orders, &actor)
                .with_store_context("reorder categories")
        })
    }

    /// Whether a category other than `exclude_id` is named `name`.
    pub fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> ApplicationResult<bool> {
        self.deps
            .categories
            .exists_by_name(name, guards::non_empty(exclude_id))
            .with_store_context("check category name")
    }

    /// All categories in display order, optionally filtered by a name keyword.
    pub fn get_all(&self, keyword: Option<&str>) -> ApplicationResult<Vec<CategoryView>> {
        let categories = self
            .deps
            .categories
            .list(keyword)
            .with_store_context("list categories")?;
        categories.into_iter().map(|c| self.view(c)).collect()
    }

    pub fn get(&self, id: &str) -> ApplicationResult<CategoryView> {
        let category = guards::category(self.deps.categories.as_ref(), id)?;
        self.view(category)
    }

    fn view(&self, category: Category) -> ApplicationResult<CategoryView> {
        let modules = self.modules.resolve(&category)?;
        Ok(CategoryView { category, modules })
    }
}
