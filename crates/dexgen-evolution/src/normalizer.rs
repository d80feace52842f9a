use crate::classify;
use dexgen_core::{ChainResult, ChainTreeNode, EntityId, EvolutionCondition, TransitionRecord};
use std::collections::HashSet;
use tracing::warn;

/// Flattens a chain tree into its member set and its pre-order transition list.
///
/// The walk uses an explicit stack, so depth is bounded by heap rather than
/// call depth. A species id seen a second time is skipped together with its
/// subtree; well-formed chains never repeat an id. Nodes whose species URL
/// carries no id are not emitted, but their children are still walked.
pub fn normalize(root: &ChainTreeNode) -> ChainResult {
    let mut result = ChainResult::empty();
    let mut visited: HashSet<EntityId> = HashSet::new();
    let mut stack: Vec<(&ChainTreeNode, bool)> = vec![(root, true)];

    while let Some((node, is_root)) = stack.pop() {
        if let Some(id) = node.entity_id() {
            if !visited.insert(id) {
                warn!("species {} repeats within its evolution chain; skipping", id);
                continue;
            }
            result.member_ids.insert(id);
            if !is_root {
                result.transitions.push(transition_into(id, node));
            }
        }

        // Reversed so the first child is popped first.
        for child in node.children.iter().rev() {
            stack.push((child, false));
        }
    }

    result
}

/// Only the first listed condition is represented.
fn transition_into(id: EntityId, node: &ChainTreeNode) -> TransitionRecord {
    match node.conditions.first() {
        Some(condition) => TransitionRecord {
            target_id: id,
            level: condition.min_level,
            method: classify(condition),
        },
        None => TransitionRecord {
            target_id: id,
            level: None,
            method: classify(&EvolutionCondition::default()),
        },
    }
}
