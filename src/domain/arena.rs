use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::CategoryNode;

impl fmt::Display for CategoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct TreeNode {
    /// Node row this entry was built from
    pub data: CategoryNode,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Indices of child nodes, ordered by sort weight
    pub children: Vec<Index>,
}

/// Arena-based forest of category nodes.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are also indexed by id so callers can move from persisted ids to arena slots.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
    by_id: HashMap<String, Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: CategoryNode, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }
        self.by_id.insert(id, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Arena slot of the node with the given id.
    pub fn find(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal over every tree of the forest.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self, self.roots.iter().rev().copied().collect())
    }

    /// Pre-order traversal of the subtree rooted at `idx`, including `idx`.
    pub fn iter_from(&self, idx: Index) -> TreeIterator {
        TreeIterator::new(self, vec![idx])
    }

    /// Number of levels of the deepest tree in the forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.height(root))
            .max()
            .unwrap_or(0)
    }

    /// Levels in the subtree rooted at `idx`, counting `idx` itself.
    #[instrument(level = "trace", skip(self))]
    pub fn height(&self, idx: Index) -> usize {
        // explicit stack: trees can be arbitrarily deep when built from unchecked rows
        let mut max = 0;
        let mut stack = vec![(idx, 1usize)];
        while let Some((current, level)) = stack.pop() {
            if let Some(node) = self.get_node(current) {
                max = max.max(level);
                for &child in &node.children {
                    stack.push((child, level + 1));
                }
            }
        }
        max
    }

    /// Level of `idx` within its tree; roots are level 1.
    #[instrument(level = "trace", skip(self))]
    pub fn level(&self, idx: Index) -> usize {
        self.ancestors(idx).len() + 1
    }

    /// Ancestors of `idx`, ordered from the root down to the direct parent.
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut chain = Vec::new();
        let mut current = self.get_node(idx).and_then(|n| n.parent);
        while let Some(parent_idx) = current {
            chain.push(parent_idx);
            current = self.get_node(parent_idx).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }

    /// Whether `idx` lies inside the subtree rooted at `ancestor` (or is `ancestor`).
    #[instrument(level = "trace", skip(self))]
    pub fn is_within(&self, ancestor: Index, idx: Index) -> bool {
        idx == ancestor || self.ancestors(idx).contains(&ancestor)
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, stack: Vec<Index>) -> Self {
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
