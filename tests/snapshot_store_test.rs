//! Integration tests for the snapshot-backed store and container wiring.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use catree::application::services::NewNode;
use catree::config::Settings;
use catree::domain::{DomainError, ReservedCategories, ReservedCategory};
use catree::infrastructure::di::ServiceContainer;
use catree::infrastructure::traits::RealFileSystem;
use catree::infrastructure::{MemoryStore, SnapshotFile, StoreState};
use catree::util::testing::init_test_setup;

fn settings(path: &Path) -> Settings {
    Settings {
        store_path: path.to_path_buf(),
        ..Settings::default()
    }
}

#[test]
fn given_missing_snapshot_when_opening_then_creates_seeded_file() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.json");

    ServiceContainer::new(settings(&path)).unwrap();

    let state: StoreState = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(state.categories.len(), 3);
    assert_eq!(state.nodes.len(), 3);
}

#[test]
fn given_writes_when_reopening_then_rows_are_persisted() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    let category_id = {
        let services = ServiceContainer::new(settings(&path)).unwrap();
        let category = services.categories.add("Finance", "").unwrap();
        services
            .tree
            .add(
                &category.id,
                NewNode {
                    name: "Ledger".into(),
                    ..NewNode::default()
                },
            )
            .unwrap();
        category.id
    };

    let services = ServiceContainer::new(settings(&path)).unwrap();
    let view = services.categories.get(&category_id).unwrap();
    assert_eq!(view.category.name, "Finance");
    let forest = services.tree.list_tree(&category_id, Some("Ledger")).unwrap();
    assert_eq!(forest[0].children[0].node.name, "Ledger");
}

#[test]
fn given_failed_move_when_reopening_then_snapshot_unchanged() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let mut config = settings(&path);
    config.limits.max_depth = 3;

    let services = ServiceContainer::new(config).unwrap();
    let category = services.categories.add("Finance", "").unwrap();
    let add = |parent: Option<&str>, name: &str| {
        services
            .tree
            .add(
                &category.id,
                NewNode {
                    parent_id: parent.map(str::to_string),
                    name: name.into(),
                    ..NewNode::default()
                },
            )
            .unwrap()
    };
    let a = add(None, "A");
    let b = add(None, "B");
    add(Some(&b.id), "B1");
    let before = fs::read_to_string(&path).unwrap();

    let err = services
        .tree
        .reorder(&category.id, &b.id, &a.id, None)
        .unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::DepthExceeded { max_depth: 3 })));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn given_corrupt_snapshot_when_opening_then_errors() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ not json").unwrap();

    let snapshot = SnapshotFile::new(&path, Arc::new(RealFileSystem));
    let result = MemoryStore::open(
        snapshot,
        &ReservedCategories::default(),
        &Settings::default().actor,
    );

    assert!(result.is_err());
}

#[test]
fn given_custom_reserved_set_when_opening_then_seeds_and_guards_those_ids() {
    init_test_setup();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let reserved = ReservedCategories {
        department: ReservedCategory::new("org-units", "Org Units", ""),
        info_system: ReservedCategory::new("systems", "Systems", ""),
        subject: ReservedCategory::new("topics", "Topics", ""),
    };

    let services =
        ServiceContainer::with_fs(settings(&path), reserved, Arc::new(RealFileSystem)).unwrap();

    let state: StoreState = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(state.categories.contains_key("topics"));
    let err = services.categories.delete("topics").unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::SystemImmutable(_))));
}
