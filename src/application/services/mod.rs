//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on store boundary traits (CategoryStore, NodeStore, etc.)
//! but are themselves concrete structs, not traits.

mod guards;
mod lifecycle;
mod overlay;
mod tree;

use std::sync::Arc;

use crate::domain::TreePolicy;
use crate::infrastructure::traits::{
    ActorContext, CategoryStore, LinkedEntryRegistry, NodeStore, ScopeFlag, ScopeRelationStore,
    UnitOfWork,
};

pub use lifecycle::{CategoryService, CategoryView};
pub use overlay::{CategoryModules, ModuleConfigService, ModuleUpdate, ModuleView, NodeSelection};
pub use tree::{CategoryTreeService, ListQuery, NewNode, NodeEdit, NodeListItem};

/// Stores and collaborators shared by all services.
#[derive(Clone)]
pub struct ServiceDeps {
    pub categories: Arc<dyn CategoryStore>,
    pub nodes: Arc<dyn NodeStore>,
    pub relations: Arc<dyn ScopeRelationStore>,
    pub uow: Arc<dyn UnitOfWork>,
    pub flag: Arc<dyn ScopeFlag>,
    pub registry: Arc<dyn LinkedEntryRegistry>,
    pub actor: Arc<dyn ActorContext>,
    pub policy: Arc<TreePolicy>,
}

impl ServiceDeps {
    /// Wire every store contract to one backing store.
    pub fn from_store<S>(
        store: Arc<S>,
        flag: Arc<dyn ScopeFlag>,
        registry: Arc<dyn LinkedEntryRegistry>,
        actor: Arc<dyn ActorContext>,
        policy: Arc<TreePolicy>,
    ) -> Self
    where
        S: CategoryStore + NodeStore + ScopeRelationStore + UnitOfWork + 'static,
    {
        Self {
            categories: store.clone(),
            nodes: store.clone(),
            relations: store.clone(),
            uow: store,
            flag,
            registry,
            actor,
            policy,
        }
    }
}
