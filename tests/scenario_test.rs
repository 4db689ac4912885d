//! End-to-end walk through a category's life: create, grow, reorder, activate.

use std::sync::Arc;

use catree::application::services::{ListQuery, NewNode};
use catree::config::Settings;
use catree::domain::{DomainError, ReservedCategories};
use catree::infrastructure::di::ServiceContainer;
use catree::infrastructure::traits::{FixedActor, StaticRegistry, StaticScopeFlag};
use catree::infrastructure::MemoryStore;
use catree::util::testing::init_test_setup;

#[test]
fn given_finance_category_when_growing_and_activating_then_follows_lifecycle() {
    init_test_setup();
    let settings = Settings::default();
    let reserved = ReservedCategories::default();
    let store = Arc::new(MemoryStore::new(&reserved, &settings.actor));
    let actor = Arc::new(FixedActor(settings.actor.clone()));
    let s = ServiceContainer::with_store(
        settings,
        reserved,
        store,
        Arc::new(StaticScopeFlag::new(false)),
        Arc::new(StaticRegistry::new(0)),
        actor,
    );

    // create: inactive, visible in the listing
    let finance = s.categories.add("Finance", "Finance taxonomy").unwrap();
    let listed = s.categories.get_all(None).unwrap();
    let view = listed
        .iter()
        .find(|v| v.category.id == finance.id)
        .unwrap();
    assert!(!view.category.using);

    // skeleton only: activation is refused
    let err = s.categories.edit_using(&finance.id, true).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::CategoryTreeNotExist(_))));

    // grow the data resource group
    let group = s
        .tree
        .list(
            &finance.id,
            &ListQuery {
                keyword: Some("Data Resource".into()),
                ..ListQuery::default()
            },
        )
        .unwrap()
        .remove(0);
    let ledger = s
        .tree
        .add(
            &finance.id,
            NewNode {
                parent_id: Some(group.node.id.clone()),
                name: "Ledger".into(),
                ..NewNode::default()
            },
        )
        .unwrap();
    assert!(s
        .tree
        .name_exists(&finance.id, Some(&group.node.id), None, "Ledger")
        .unwrap());

    // move it to the front of its siblings
    let first = s
        .tree
        .list(
            &finance.id,
            &ListQuery {
                parent_id: Some(group.node.id.clone()),
                ..ListQuery::default()
            },
        )
        .unwrap()
        .remove(0);
    s.tree
        .reorder(&finance.id, &ledger.id, &group.node.id, Some(&first.node.id))
        .unwrap();

    let forest = s.tree.list_tree(&finance.id, None).unwrap();
    let data_group = forest[0]
        .children
        .iter()
        .find(|c| c.node.id == group.node.id)
        .unwrap();
    let names: Vec<&str> = data_group
        .children
        .iter()
        .map(|c| c.node.name.as_str())
        .collect();
    assert_eq!(names, vec!["Ledger", "Catalog List", "Market Left Tree"]);

    // a node of its own makes the tree qualify
    s.categories.edit_using(&finance.id, true).unwrap();
    assert!(s.categories.get(&finance.id).unwrap().category.using);
    assert!(s
        .modules
        .get(Some("Finance"))
        .unwrap()
        .iter()
        .any(|c| c.category_id == finance.id));
}
