//! Deciding which changes force the resource to be replaced.
//!
//! A change replaces the resource when any schema node on its route is
//! `force_new`, however deep the change sits beneath it. An add or delete of
//! a whole subtree also replaces when the subtree holds a value for a
//! `force_new` descendant, since that descendant goes from or to null.

use crate::schema::{Route, Schema, SchemaKind, SchemaNode};
use crate::value::{Payload, Value};

use super::{Change, DiffEntry};

/// Turn raw changes into entries with their replace bit decided.
pub(super) fn resolve(schema: &Schema, changes: Vec<Change>) -> Vec<DiffEntry> {
    changes
        .into_iter()
        .map(|change| {
            let governed = schema
                .route(&change.path)
                .as_ref()
                .is_some_and(Route::force_new);
            DiffEntry {
                replace: governed || change.forces_replace,
                path: change.path,
                kind: change.kind,
                secret: false,
                old: change.old,
                new: change.new,
            }
        })
        .collect()
}

/// Whether a present value sets anything under a `force_new` node.
pub(super) fn value_reaches_force_new(node: &SchemaNode, value: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    if node.force_new {
        return true;
    }
    let payload = match value.payload() {
        Some(payload) => payload,
        // An unknown subtree may hold anything the schema allows.
        None => return has_force_new_descendant(node),
    };

    match (&node.kind, payload) {
        (SchemaKind::Block(fields), Payload::Object(entries) | Payload::Map(entries)) => {
            entries.iter().any(|(key, child)| {
                fields
                    .get(key)
                    .is_some_and(|field| value_reaches_force_new(field, child))
            })
        },
        (SchemaKind::List(elem) | SchemaKind::Set(elem), Payload::List(_) | Payload::Set(_)) => {
            payload.children().any(|child| value_reaches_force_new(elem, child))
        },
        // A collapsed singleton holds its element directly.
        (SchemaKind::List(elem) | SchemaKind::Set(elem), _) if node.is_singleton() => {
            value_reaches_force_new(elem, value)
        },
        (SchemaKind::Map(elem), Payload::Map(entries) | Payload::Object(entries)) => {
            entries.values().any(|child| value_reaches_force_new(elem, child))
        },
        _ => false,
    }
}

fn has_force_new_descendant(node: &SchemaNode) -> bool {
    node.force_new
        || match &node.kind {
            SchemaKind::Scalar(_) => false,
            SchemaKind::List(elem) | SchemaKind::Set(elem) | SchemaKind::Map(elem) => {
                has_force_new_descendant(elem)
            },
            SchemaKind::Block(fields) => fields.values().any(has_force_new_descendant),
        }
}
