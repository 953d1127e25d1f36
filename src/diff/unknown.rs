//! Rules for not-yet-known and provider-computed values.

use crate::schema::SchemaNode;
use crate::value::{SetValue, Value, ValueKind};

use super::DiffKind;

/// Classify a change that is decided without looking inside either value.
///
/// - Appearing from null is an add, even when the new value is unknown.
/// - Disappearing to null is a delete.
/// - Becoming unknown, or becoming known, is an update of the whole node.
///
/// Returns `None` when both sides are known and must be compared
/// structurally.
pub(super) fn short_circuit(old: &Value, new: &Value) -> Option<DiffKind> {
    match (old.kind(), new.kind()) {
        (ValueKind::Null, ValueKind::Null) => None,
        (ValueKind::Null, _) => Some(DiffKind::Add),
        (_, ValueKind::Null) => Some(DiffKind::Delete),
        (ValueKind::Unknown, _) | (_, ValueKind::Unknown) => Some(DiffKind::Update),
        (ValueKind::Known(_), ValueKind::Known(_)) => None,
    }
}

/// Whether a computed field missing from the new configuration keeps its
/// prior value, to be filled in by the provider.
///
/// This holds for `force_new` fields too: the provider is expected to
/// refill the value, so its absence is not a change.
pub(super) fn left_to_provider(node: &SchemaNode, old: &Value, new: &Value) -> bool {
    node.is_left_to_provider() && new.is_null() && !old.is_null()
}

/// Whether any element of a set is, or contains, an unknown.
///
/// Unknown elements have no stable identity, so such a set is diffed as a
/// whole.
pub(super) fn set_has_unknown(set: &SetValue) -> bool {
    set.values().any(Value::contains_unknown)
}
