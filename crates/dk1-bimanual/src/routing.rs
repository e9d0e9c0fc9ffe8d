//! Translation between the unified namespace and each arm's native one.
//!
//! Outbound values get their side prefix added; inbound actions are split
//! into one native sub-action per side by stripping the prefix. Prefixing is
//! the only collision-avoidance mechanism, both arms may report identical
//! native key sets.

use std::collections::BTreeMap;

use dk1_types::{Dk1Error, MotorMap, RoutingPolicy, Side};
use tracing::trace;

/// Prefix every key of a native map with `side`.
pub fn prefix_keys<V>(side: Side, native: BTreeMap<String, V>) -> impl Iterator<Item = (String, V)> {
    native.into_iter().map(move |(key, value)| (side.namespace(&key), value))
}

/// Merge two native maps into one namespaced map, left first.
pub fn merge_prefixed(left: MotorMap, right: MotorMap) -> MotorMap {
    prefix_keys(Side::Left, left)
        .chain(prefix_keys(Side::Right, right))
        .collect()
}

/// A unified action split into native per-side sub-actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitAction {
    pub left: MotorMap,
    pub right: MotorMap,
    /// Keys that carried neither prefix, in key order.
    pub unrouted: Vec<String>,
}

impl SplitAction {
    /// Take the sub-action for `side`, leaving an empty map behind.
    pub fn take(&mut self, side: Side) -> MotorMap {
        match side {
            Side::Left => std::mem::take(&mut self.left),
            Side::Right => std::mem::take(&mut self.right),
        }
    }
}

/// Split `action` by side prefix.
///
/// # Errors
///
/// With [`RoutingPolicy::Reject`], returns [`Dk1Error::UnroutedActionKey`]
/// naming the first key that carries neither prefix. With
/// [`RoutingPolicy::Ignore`] such keys are only reported in
/// [`SplitAction::unrouted`].
pub fn partition_action(action: &MotorMap, policy: RoutingPolicy) -> Result<SplitAction, Dk1Error> {
    let mut split = SplitAction::default();
    for (key, &value) in action {
        if let Some(native) = Side::Left.strip(key) {
            split.left.insert(native.to_string(), value);
        } else if let Some(native) = Side::Right.strip(key) {
            split.right.insert(native.to_string(), value);
        } else {
            split.unrouted.push(key.clone());
        }
    }

    if let Some(first) = split.unrouted.first() {
        match policy {
            RoutingPolicy::Reject => return Err(Dk1Error::UnroutedActionKey(first.clone())),
            RoutingPolicy::Ignore => trace!(keys = ?split.unrouted, "dropping unrouted action keys"),
        }
    }
    Ok(split)
}
