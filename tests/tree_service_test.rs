//! Integration tests for CategoryTreeService: sibling names, depth, moves and projections.

use std::sync::Arc;

use rstest::rstest;

use catree::application::services::{ListQuery, NewNode, NodeEdit};
use catree::config::Settings;
use catree::domain::policy::SUBJECT_ID;
use catree::domain::{CategoryNode, DomainError, NodeTree, Owner, ReservedCategories};
use catree::infrastructure::di::ServiceContainer;
use catree::infrastructure::traits::{FixedActor, StaticRegistry, StaticScopeFlag};
use catree::infrastructure::MemoryStore;
use catree::util::testing::init_test_setup;

// The subject category starts with a bare root, which keeps tree shapes easy to reason about.
const CAT: &str = SUBJECT_ID;

fn services() -> ServiceContainer {
    init_test_setup();
    let settings = Settings::default();
    let reserved = ReservedCategories::default();
    let store = Arc::new(MemoryStore::new(&reserved, &settings.actor));
    let actor = Arc::new(FixedActor(settings.actor.clone()));
    ServiceContainer::with_store(
        settings,
        reserved,
        store,
        Arc::new(StaticScopeFlag::new(false)),
        Arc::new(StaticRegistry::new(0)),
        actor,
    )
}

fn add(s: &ServiceContainer, parent: Option<&str>, name: &str) -> CategoryNode {
    s.tree
        .add(
            CAT,
            NewNode {
                parent_id: parent.map(str::to_string),
                name: name.into(),
                ..NewNode::default()
            },
        )
        .unwrap()
}

fn child_names(s: &ServiceContainer, parent: Option<&str>) -> Vec<String> {
    s.tree
        .list(
            CAT,
            &ListQuery {
                parent_id: parent.map(str::to_string),
                ..ListQuery::default()
            },
        )
        .unwrap()
        .into_iter()
        .map(|i| i.node.name)
        .collect()
}

fn find<'a>(forest: &'a [NodeTree], name: &str) -> Option<&'a NodeTree> {
    forest.iter().find_map(|t| {
        if t.node.name == name {
            Some(t)
        } else {
            find(&t.children, name)
        }
    })
}

#[rstest]
#[case(None)]
#[case(Some(""))]
#[case(Some("0"))]
fn given_missing_parent_when_adding_then_attaches_to_root(#[case] parent: Option<&str>) {
    let s = services();

    let node = add(&s, parent, "Economy");

    assert_eq!(node.parent_id, CAT);
    assert!(node.selected);
    assert!(!node.required);
    assert_eq!(node.sort_weight, 1);
}

#[test]
fn given_sibling_with_same_name_when_adding_then_name_conflict() {
    let s = services();
    let economy = add(&s, None, "Economy");
    add(&s, None, "Health");

    let err = s
        .tree
        .add(
            CAT,
            NewNode {
                name: "Economy".into(),
                ..NewNode::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::NodeNameConflict { name, .. }) if name == "Economy"
    ));

    // same name under a different parent is fine
    add(&s, Some(&economy.id), "Health");
    assert!(s
        .tree
        .name_exists(CAT, Some(&economy.id), None, "Health")
        .unwrap());
}

#[test]
fn given_unknown_parent_when_adding_then_node_not_found() {
    let s = services();

    let err = s
        .tree
        .add(
            CAT,
            NewNode {
                parent_id: Some("nope".into()),
                name: "X".into(),
                ..NewNode::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::NodeNotFound(id)) if id == "nope"));
}

#[test]
fn given_chain_at_max_depth_when_adding_then_depth_exceeded() {
    let s = services();
    // root is level 1, so four more levels fit
    let mut parent = CAT.to_string();
    for name in ["L2", "L3", "L4", "L5"] {
        parent = add(&s, Some(&parent), name).id;
    }

    let err = s
        .tree
        .add(
            CAT,
            NewNode {
                parent_id: Some(parent),
                name: "L6".into(),
                ..NewNode::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        err.domain(),
        Some(DomainError::DepthExceeded { max_depth: 5 })
    ));
}

#[test]
fn given_deep_subtree_when_moving_under_deep_parent_then_depth_exceeded() {
    let s = services();
    let a = add(&s, None, "A");
    let b = add(&s, Some(&a.id), "B");
    let c = add(&s, Some(&b.id), "C");
    let x = add(&s, None, "X");
    add(&s, Some(&x.id), "Y");

    // C sits on level 4, so Y would end up on level 6
    let err = s.tree.reorder(CAT, &x.id, &c.id, None).unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::DepthExceeded { .. })));
    assert_eq!(child_names(&s, None), vec!["A", "X"]);
}

#[test]
fn given_node_when_moving_under_itself_then_move_to_self() {
    let s = services();
    let a = add(&s, None, "A");

    let err = s.tree.reorder(CAT, &a.id, &a.id, None).unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::MoveToSelf(_))));
}

#[test]
fn given_node_when_moving_under_descendant_then_move_to_descendant() {
    let s = services();
    let a = add(&s, None, "A");
    let b = add(&s, Some(&a.id), "B");
    let c = add(&s, Some(&b.id), "C");

    let err = s.tree.reorder(CAT, &a.id, &c.id, None).unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::MoveToDescendant { .. })));
}

#[test]
fn given_next_equal_to_node_when_reordering_then_no_op() {
    let s = services();
    let a = add(&s, None, "A");
    add(&s, None, "B");
    let before = s.tree.list(CAT, &ListQuery::default()).unwrap();

    s.tree.reorder(CAT, &a.id, CAT, Some(&a.id)).unwrap();

    let after = s.tree.list(CAT, &ListQuery::default()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn given_root_when_moving_or_deleting_then_root_not_allowed() {
    let s = services();
    let a = add(&s, None, "A");

    let err = s.tree.reorder(CAT, CAT, &a.id, None).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::RootNotAllowedOperate(_))));

    let err = s.tree.delete(CAT, CAT).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::RootNotAllowedOperate(_))));
}

#[test]
fn given_next_under_other_parent_when_reordering_then_next_not_sibling() {
    let s = services();
    let a = add(&s, None, "A");
    let b = add(&s, None, "B");
    let inner = add(&s, Some(&a.id), "Inner");

    let err = s.tree.reorder(CAT, &b.id, CAT, Some(&inner.id)).unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::NextNotSibling { .. })));
}

#[test]
fn given_unknown_destination_or_next_when_reordering_then_node_not_found() {
    let s = services();
    let a = add(&s, None, "A");

    let err = s.tree.reorder(CAT, &a.id, "missing-parent", None).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::NodeNotFound(id)) if id == "missing-parent"));

    let err = s.tree.reorder(CAT, &a.id, CAT, Some("missing-next")).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::NodeNotFound(id)) if id == "missing-next"));

    let err = s.tree.reorder("missing-category", &a.id, CAT, None).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::CategoryNotFound(_))));
}

#[test]
fn given_siblings_when_moving_before_first_then_weights_renumbered() {
    let s = services();
    let a = add(&s, None, "A");
    add(&s, None, "B");
    let c = add(&s, None, "C");

    s.tree.reorder(CAT, &c.id, "0", Some(&a.id)).unwrap();

    let items = s.tree.list(CAT, &ListQuery::default()).unwrap();
    let order: Vec<(&str, u64)> = items
        .iter()
        .map(|i| (i.node.name.as_str(), i.node.sort_weight))
        .collect();
    assert_eq!(order, vec![("C", 1), ("A", 2), ("B", 3)]);
}

#[test]
fn given_name_taken_under_destination_when_moving_then_name_conflict() {
    let s = services();
    let a = add(&s, None, "A");
    add(&s, Some(&a.id), "Shared");
    let shared = add(&s, None, "Shared");

    let err = s.tree.reorder(CAT, &shared.id, &a.id, None).unwrap_err();

    assert!(matches!(err.domain(), Some(DomainError::NodeNameConflict { .. })));
}

#[test]
fn given_node_when_moving_to_other_parent_then_subtree_follows() {
    let s = services();
    let a = add(&s, None, "A");
    let b = add(&s, None, "B");
    add(&s, Some(&b.id), "B1");

    s.tree.reorder(CAT, &b.id, &a.id, None).unwrap();

    let forest = s.tree.list_tree(CAT, None).unwrap();
    let moved = find(&forest, "B").unwrap();
    assert_eq!(moved.node.parent_id, a.id);
    assert_eq!(moved.children[0].node.name, "B1");
    assert!(find(&forest, "A").unwrap().expansion);
}

#[test]
fn given_root_when_editing_selected_then_ignored_but_required_applies() {
    let s = services();

    s.tree
        .edit(
            CAT,
            CAT,
            NodeEdit {
                name: "Subject Domain".into(),
                owner: Owner::new("Ann", "u1"),
                required: Some(true),
                selected: Some(true),
            },
        )
        .unwrap();

    let forest = s.tree.list_tree(CAT, None).unwrap();
    let root = &forest[0].node;
    assert!(root.required);
    assert!(!root.selected);
    assert_eq!(root.owner, Owner::new("Ann", "u1"));
}

#[test]
fn given_sibling_name_when_editing_then_conflict_but_own_name_is_fine() {
    let s = services();
    let a = add(&s, None, "A");
    add(&s, None, "B");
    let edit = |name: &str| NodeEdit {
        name: name.into(),
        ..NodeEdit::default()
    };

    let err = s.tree.edit(CAT, &a.id, edit("B")).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::NodeNameConflict { .. })));
    s.tree.edit(CAT, &a.id, edit("A")).unwrap();
}

#[test]
fn given_subtree_when_deleting_then_removes_all_descendants() {
    let s = services();
    let a = add(&s, None, "A");
    let b = add(&s, Some(&a.id), "B");
    add(&s, Some(&b.id), "C");

    let removed = s.tree.delete(CAT, &a.id).unwrap();

    assert_eq!(removed, 3);
    assert!(child_names(&s, None).is_empty());
    let err = s.tree.delete(CAT, &b.id).unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::NodeNotFound(_))));
}

#[test]
fn given_keyword_when_listing_recursively_then_returns_hits_with_paths() {
    let s = services();
    let economy = add(&s, None, "Economy");
    let trade = add(&s, Some(&economy.id), "Trade");
    add(&s, Some(&trade.id), "Foreign Trade");
    add(&s, None, "Health");

    let items = s
        .tree
        .list(
            CAT,
            &ListQuery {
                keyword: Some("trade".into()),
                recursive: true,
                ..ListQuery::default()
            },
        )
        .unwrap();

    let names: Vec<&str> = items.iter().map(|i| i.node.name.as_str()).collect();
    assert_eq!(names, vec!["Trade", "Foreign Trade"]);
    assert_eq!(items[0].path, vec!["Subject Domain", "Economy"]);
    assert!(items[0].expansion);
    assert_eq!(items[0].highlight, Some((0, 5)));
    assert_eq!(items[1].highlight, Some((8, 13)));
}

#[test]
fn given_keyword_when_listing_tree_then_prunes_and_expands_ancestors() {
    let s = services();
    let economy = add(&s, None, "Economy");
    add(&s, Some(&economy.id), "Trade");
    add(&s, Some(&economy.id), "Tax");
    add(&s, None, "Health");

    let forest = s.tree.list_tree(CAT, Some("trade")).unwrap();

    assert_eq!(forest.len(), 1);
    let root = &forest[0];
    assert!(root.expanded);
    assert_eq!(root.children.len(), 1);
    let economy = &root.children[0];
    assert_eq!(economy.node.name, "Economy");
    assert!(economy.expanded && !economy.hit);
    assert_eq!(economy.children.len(), 1);
    assert!(economy.children[0].hit);
}

#[test]
fn given_keyword_without_hits_when_listing_tree_then_keeps_bare_root() {
    let s = services();
    add(&s, None, "Economy");

    let forest = s.tree.list_tree(CAT, Some("zzz")).unwrap();

    assert_eq!(forest.len(), 1);
    assert!(forest[0].children.is_empty());
    assert!(forest[0].expansion);
    assert!(!forest[0].expanded);
}

#[test]
fn given_unknown_node_when_checking_name_then_node_not_found() {
    let s = services();
    add(&s, None, "A");

    let err = s
        .tree
        .name_exists(CAT, None, Some("missing"), "A")
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::NodeNotFound(_))));
    assert!(s.tree.name_exists(CAT, None, None, "A").unwrap());
}
