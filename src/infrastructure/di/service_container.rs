//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{
    CategoryService, CategoryTreeService, ModuleConfigService, ServiceDeps,
};
use crate::config::Settings;
use crate::domain::{ReservedCategories, TreePolicy};
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::snapshot::SnapshotFile;
use crate::infrastructure::traits::{
    ActorContext, CategoryStore, FileSystem, FixedActor, LinkedEntryRegistry, NodeStore,
    RealFileSystem, ScopeFlag, ScopeRelationStore, StaticRegistry, StaticScopeFlag, UnitOfWork,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub categories: CategoryService,
    pub tree: CategoryTreeService,
    pub modules: Arc<ModuleConfigService>,
}

impl ServiceContainer {
    /// Create a service container backed by the snapshot at `settings.store_path`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Self::with_fs(settings, ReservedCategories::default(), Arc::new(RealFileSystem))
    }

    /// Create a snapshot-backed service container on a custom filesystem.
    pub fn with_fs(
        settings: Settings,
        reserved: ReservedCategories,
        fs: Arc<dyn FileSystem>,
    ) -> InfraResult<Self> {
        let snapshot = SnapshotFile::new(settings.store_path.clone(), fs);
        let store = MemoryStore::open(snapshot, &reserved, &settings.actor)?;
        debug!("with_fs: store at {}", settings.store_path.display());

        let flag = Arc::new(StaticScopeFlag::new(settings.extended_scope));
        let registry = Arc::new(StaticRegistry::new(settings.linked_entries));
        let actor = Arc::new(FixedActor(settings.actor.clone()));
        Ok(Self::with_store(
            settings,
            reserved,
            Arc::new(store),
            flag,
            registry,
            actor,
        ))
    }

    /// Create a service container over any store (for testing).
    ///
    /// `reserved` must be the set the store was seeded with.
    pub fn with_store<S>(
        settings: Settings,
        reserved: ReservedCategories,
        store: Arc<S>,
        flag: Arc<dyn ScopeFlag>,
        registry: Arc<dyn LinkedEntryRegistry>,
        actor: Arc<dyn ActorContext>,
    ) -> Self
    where
        S: CategoryStore + NodeStore + ScopeRelationStore + UnitOfWork + 'static,
    {
        let policy = Arc::new(TreePolicy::new(settings.limits.clone(), reserved));
        let deps = ServiceDeps::from_store(store, flag, registry, actor, policy);

        let modules = Arc::new(ModuleConfigService::new(deps.clone()));
        let categories = CategoryService::new(deps.clone(), modules.clone());
        let tree = CategoryTreeService::new(deps);

        Self {
            settings: Arc::new(settings),
            categories,
            tree,
            modules,
        }
    }
}
