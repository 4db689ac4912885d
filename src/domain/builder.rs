//! Tree builder: turns flat node rows into an ordered forest.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use serde::Serialize;
use tracing::{trace, warn};

use crate::domain::arena::TreeArena;
use crate::domain::entities::{keyword_hit, CategoryNode};

/// Nested view of a node and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: CategoryNode,
    /// The node has children in the stored tree
    pub expansion: bool,
    /// The node must be shown expanded to reveal a keyword hit below it
    pub expanded: bool,
    /// The node's own name matches the keyword
    pub hit: bool,
    pub children: Vec<NodeTree>,
}

/// Sibling order: sort weight, then creation time, then id.
pub fn sibling_order(a: &CategoryNode, b: &CategoryNode) -> Ordering {
    a.sort_weight
        .cmp(&b.sort_weight)
        .then_with(|| a.audit.created_at.cmp(&b.audit.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Constructs an arena forest from a flat list of nodes.
///
/// A node becomes a root when its parent is not part of the input, so any subset of a
/// category's rows (for example the nodes of one module) yields a well-formed forest.
/// The parent→children index is built once; rows that are only reachable through a
/// parent cycle are dropped.
pub struct TreeBuilder {
    nodes: Vec<Option<CategoryNode>>,
    children: HashMap<String, Vec<usize>>,
    roots: Vec<usize>,
}

impl TreeBuilder {
    pub fn new(nodes: Vec<CategoryNode>) -> Self {
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (pos, node) in nodes.iter().enumerate() {
            if node.parent_id != node.id && ids.contains(node.parent_id.as_str()) {
                children.entry(node.parent_id.clone()).or_default().push(pos);
            } else {
                roots.push(pos);
            }
        }

        let by_order = |a: &usize, b: &usize| sibling_order(&nodes[*a], &nodes[*b]);
        roots.sort_by(by_order);
        for positions in children.values_mut() {
            positions.sort_by(by_order);
        }

        Self {
            nodes: nodes.into_iter().map(Some).collect(),
            children,
            roots,
        }
    }

    /// Build the forest. Children are attached in sibling order.
    pub fn build(mut self) -> TreeArena {
        let total = self.nodes.len();
        let mut tree = TreeArena::new();
        let mut stack: Vec<(usize, Option<Index>)> =
            self.roots.iter().rev().map(|&pos| (pos, None)).collect();

        while let Some((pos, parent_idx)) = stack.pop() {
            let Some(node) = self.nodes[pos].take() else {
                continue;
            };
            let child_positions = self.children.remove(&node.id).unwrap_or_default();
            let current_idx = tree.insert_node(node, parent_idx);
            for &child in child_positions.iter().rev() {
                stack.push((child, Some(current_idx)));
            }
        }

        if tree.len() < total {
            warn!(
                "dropped {} node(s) not reachable from any root",
                total - tree.len()
            );
        }
        trace!("built forest: {} nodes, {} roots", tree.len(), tree.roots().len());
        tree
    }

    /// Shorthand for `TreeBuilder::new(nodes).build()`.
    pub fn forest(nodes: Vec<CategoryNode>) -> TreeArena {
        Self::new(nodes).build()
    }
}

/// Nested view of the whole forest.
pub fn to_nested(tree: &TreeArena) -> Vec<NodeTree> {
    tree.roots()
        .iter()
        .filter_map(|&root| nest(tree, root, None))
        .collect()
}

/// Nested view pruned to branches containing a keyword hit.
///
/// Roots are always kept; ancestors of hits are flagged `expanded`.
pub fn to_nested_filtered(tree: &TreeArena, keyword: &str) -> Vec<NodeTree> {
    tree.roots()
        .iter()
        .filter_map(|&root| {
            nest(tree, root, Some(keyword)).or_else(|| {
                tree.get_node(root).map(|n| NodeTree {
                    node: n.data.clone(),
                    expansion: !n.children.is_empty(),
                    expanded: false,
                    hit: false,
                    children: Vec::new(),
                })
            })
        })
        .collect()
}

fn nest(tree: &TreeArena, idx: Index, keyword: Option<&str>) -> Option<NodeTree> {
    let node = tree.get_node(idx)?;
    let children: Vec<NodeTree> = node
        .children
        .iter()
        .filter_map(|&child| nest(tree, child, keyword))
        .collect();

    match keyword {
        None => Some(NodeTree {
            node: node.data.clone(),
            expansion: !node.children.is_empty(),
            expanded: false,
            hit: false,
            children,
        }),
        Some(keyword) => {
            let hit = keyword_hit(&node.data.name, keyword).is_some();
            if !hit && children.is_empty() {
                return None;
            }
            Some(NodeTree {
                node: node.data.clone(),
                expansion: !node.children.is_empty(),
                expanded: !children.is_empty(),
                hit,
                children,
            })
        }
    }
}
