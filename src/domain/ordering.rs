//! Weight-based sibling ordering.

use crate::domain::entities::NodeId;

/// New sort weights after moving `node_id` among `siblings`.
///
/// `siblings` are the destination parent's children in their current order and may or may
/// not contain `node_id`. The node is placed immediately before `next_id`, or appended when
/// `next_id` is None or not among the siblings. Weights are renumbered from 1.
pub fn reorder_weights(
    siblings: &[NodeId],
    node_id: &str,
    next_id: Option<&str>,
) -> Vec<(NodeId, u64)> {
    let mut order: Vec<&str> = siblings
        .iter()
        .map(String::as_str)
        .filter(|id| *id != node_id)
        .collect();

    let position = next_id
        .and_then(|next| order.iter().position(|id| *id == next))
        .unwrap_or(order.len());
    order.insert(position, node_id);

    order
        .into_iter()
        .zip(1u64..)
        .map(|(id, weight)| (id.to_string(), weight))
        .collect()
}

/// Weight for a row appended after `existing` weights.
pub fn next_weight(existing: impl IntoIterator<Item = u64>) -> u64 {
    existing.into_iter().max().map_or(1, |w| w + 1)
}
