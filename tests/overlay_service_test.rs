//! Integration tests for ModuleConfigService: projection, validation and idempotent updates.

use std::sync::Arc;

use catree::application::services::{CategoryModules, ModuleUpdate, NewNode, NodeSelection};
use catree::config::Settings;
use catree::domain::policy::DEPARTMENT_ID;
use catree::domain::{ApplyScope, Category, DomainError, NodeTree, ReservedCategories};
use catree::infrastructure::di::ServiceContainer;
use catree::infrastructure::traits::{FixedActor, StaticRegistry, StaticScopeFlag};
use catree::infrastructure::MemoryStore;
use catree::util::testing::init_test_setup;

struct Fixture {
    services: ServiceContainer,
    flag: Arc<StaticScopeFlag>,
}

fn fixture() -> Fixture {
    init_test_setup();
    let settings = Settings::default();
    let reserved = ReservedCategories::default();
    let store = Arc::new(MemoryStore::new(&reserved, &settings.actor));
    let flag = Arc::new(StaticScopeFlag::new(false));
    let actor = Arc::new(FixedActor(settings.actor.clone()));
    let services = ServiceContainer::with_store(
        settings,
        reserved,
        store,
        flag.clone(),
        Arc::new(StaticRegistry::new(0)),
        actor,
    );
    Fixture { services, flag }
}

/// An active customize category.
fn active_category(services: &ServiceContainer, name: &str) -> Category {
    let category = services.categories.add(name, "").unwrap();
    services
        .tree
        .add(
            &category.id,
            NewNode {
                name: "Content".into(),
                ..NewNode::default()
            },
        )
        .unwrap();
    services.categories.edit_using(&category.id, true).unwrap();
    category
}

fn modules_of(services: &ServiceContainer, category_id: &str) -> CategoryModules {
    services
        .modules
        .get(None)
        .unwrap()
        .into_iter()
        .find(|c| c.category_id == category_id)
        .unwrap()
}

/// (name, selected, required) for every node of a module tree, pre-order.
fn flags(trees: &[NodeTree]) -> Vec<(String, bool, bool)> {
    let mut out = Vec::new();
    for tree in trees {
        out.push((tree.node.name.clone(), tree.node.selected, tree.node.required));
        out.extend(flags(&tree.children));
    }
    out
}

fn selection(tree: &NodeTree, selected: bool, required: bool) -> NodeSelection {
    NodeSelection {
        id: tree.node.id.clone(),
        selected,
        required,
        children: tree
            .children
            .iter()
            .map(|c| selection(c, selected, required))
            .collect(),
    }
}

fn item(scope: ApplyScope, selected: bool, required: bool) -> ModuleUpdate {
    ModuleUpdate {
        scope,
        selected,
        required,
        nodes: Vec::new(),
    }
}

#[test]
fn given_categories_when_getting_then_lists_only_active_ones() {
    let f = fixture();
    let active = active_category(&f.services, "Finance");
    f.services.categories.add("Draft", "").unwrap();

    let all = f.services.modules.get(None).unwrap();

    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Finance"));
    assert!(names.contains(&"Department"));
    assert!(!names.contains(&"Draft"));
    assert!(!names.contains(&"Information System"));

    let finance = modules_of(&f.services, &active.id);
    assert_eq!(finance.modules.len(), 2);
    assert_eq!(finance.modules[0].scope, ApplyScope::InterfaceService);
    assert_eq!(
        flags(&finance.modules[0].tree),
        vec![
            ("Interface Service Management".to_string(), false, false),
            ("Interface List".to_string(), false, false),
            ("Market Left Tree".to_string(), false, false),
        ]
    );
}

#[test]
fn given_department_when_getting_then_every_module_selected_and_required() {
    let f = fixture();
    f.flag.set(true);

    let department = modules_of(&f.services, DEPARTMENT_ID);

    assert_eq!(department.modules.len(), 3);
    assert!(department.modules.iter().all(|m| m.selected && m.required));
}

#[test]
fn given_department_when_updating_then_immutable_config() {
    let f = fixture();

    let err = f
        .services
        .modules
        .update(
            DEPARTMENT_ID,
            &[
                item(ApplyScope::InterfaceService, false, false),
                item(ApplyScope::DataResourceCatalog, false, false),
            ],
        )
        .unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::ImmutableConfig(_))));
    let department = modules_of(&f.services, DEPARTMENT_ID);
    assert!(department.modules.iter().all(|m| m.selected && m.required));
}

#[test]
fn given_incomplete_or_invalid_items_when_updating_then_rejected() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    let modules = &f.services.modules;

    let err = modules
        .update(&category.id, &[item(ApplyScope::InterfaceService, true, false)])
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::MissingModule(ApplyScope::DataResourceCatalog))
    ));

    let err = modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, true, false),
                item(ApplyScope::InterfaceService, false, false),
            ],
        )
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::DuplicateModule(_))));

    let err = modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, true, false),
                item(ApplyScope::DataResourceCatalog, true, false),
                item(ApplyScope::InfoResourceCatalog, true, false),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::ModuleOutOfScope(ApplyScope::InfoResourceCatalog))
    ));

    let err = modules.update("missing", &[]).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::CategoryNotFound(_))));
}

#[test]
fn given_selection_when_updating_twice_then_state_is_identical() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    let before = modules_of(&f.services, &category.id);
    let interface = &before.modules[0].tree[0];

    let items = vec![
        ModuleUpdate {
            scope: ApplyScope::InterfaceService,
            selected: true,
            required: true,
            nodes: vec![NodeSelection {
                id: interface.node.id.clone(),
                selected: true,
                required: false,
                children: vec![selection(&interface.children[0], true, true)],
            }],
        },
        item(ApplyScope::DataResourceCatalog, false, false),
    ];

    f.services.modules.update(&category.id, &items).unwrap();
    let first = modules_of(&f.services, &category.id);
    f.services.modules.update(&category.id, &items).unwrap();
    let second = modules_of(&f.services, &category.id);

    let state = |c: &CategoryModules| {
        c.modules
            .iter()
            .map(|m| (m.scope, m.selected, m.required, flags(&m.tree)))
            .collect::<Vec<_>>()
    };
    assert_eq!(state(&first), state(&second));
    assert_eq!(
        state(&first)[0],
        (
            ApplyScope::InterfaceService,
            true,
            true,
            vec![
                ("Interface Service Management".to_string(), true, false),
                ("Interface List".to_string(), true, true),
                ("Market Left Tree".to_string(), false, false),
            ]
        )
    );
    assert!(!first.modules[1].selected);
}

#[test]
fn given_selected_module_when_deselecting_then_clears_relation_and_nodes() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    let tree = modules_of(&f.services, &category.id).modules[1].tree[0].clone();

    f.services
        .modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, false, false),
                ModuleUpdate {
                    scope: ApplyScope::DataResourceCatalog,
                    selected: true,
                    required: false,
                    nodes: vec![selection(&tree, true, true)],
                },
            ],
        )
        .unwrap();
    let view = f.services.categories.get(&category.id).unwrap();
    assert!(view.modules[1].selected);

    // node flags sent for a deselected module are not applied
    f.services
        .modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, false, false),
                ModuleUpdate {
                    scope: ApplyScope::DataResourceCatalog,
                    selected: false,
                    required: false,
                    nodes: vec![selection(&tree, true, true)],
                },
            ],
        )
        .unwrap();

    let modules = modules_of(&f.services, &category.id);
    assert!(!modules.modules[1].selected);
    assert!(flags(&modules.modules[1].tree)
        .iter()
        .all(|(_, selected, required)| !selected && !required));
}

#[test]
fn given_node_outside_module_when_updating_then_ignored() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    let content = f
        .services
        .tree
        .list_tree(&category.id, Some("Content"))
        .unwrap()[0]
        .children[0]
        .clone();

    f.services
        .modules
        .update(
            &category.id,
            &[
                ModuleUpdate {
                    scope: ApplyScope::InterfaceService,
                    selected: true,
                    required: false,
                    nodes: vec![NodeSelection {
                        id: content.node.id.clone(),
                        selected: false,
                        required: true,
                        children: Vec::new(),
                    }],
                },
                item(ApplyScope::DataResourceCatalog, false, false),
            ],
        )
        .unwrap();

    let after = f
        .services
        .tree
        .list_tree(&category.id, Some("Content"))
        .unwrap()[0]
        .children[0]
        .clone();
    assert_eq!(after.node.name, "Content");
    assert!(after.node.selected);
    assert!(!after.node.required);
}

#[test]
fn given_extended_scope_when_updating_then_all_three_modules_required() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    f.flag.set(true);

    let err = f
        .services
        .modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, true, false),
                item(ApplyScope::DataResourceCatalog, true, false),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::MissingModule(ApplyScope::InfoResourceCatalog))
    ));

    f.services
        .modules
        .update(
            &category.id,
            &[
                item(ApplyScope::InterfaceService, true, false),
                item(ApplyScope::DataResourceCatalog, true, false),
                item(ApplyScope::InfoResourceCatalog, true, true),
            ],
        )
        .unwrap();
    let modules = modules_of(&f.services, &category.id);
    assert_eq!(modules.modules.len(), 3);
    assert!(modules.modules[2].selected && modules.modules[2].required);
}

#[test]
fn given_renamed_module_node_when_getting_then_still_matched_by_tag() {
    let f = fixture();
    let category = active_category(&f.services, "Finance");
    let list = modules_of(&f.services, &category.id).modules[0].tree[0].children[0].clone();

    f.services
        .tree
        .edit(
            &category.id,
            &list.node.id,
            catree::application::services::NodeEdit {
                name: "APIs".into(),
                ..Default::default()
            },
        )
        .unwrap();

    let tree = &modules_of(&f.services, &category.id).modules[0].tree[0];
    assert!(tree.children.iter().any(|c| c.node.name == "APIs"));
}
