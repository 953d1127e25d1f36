//! Secret propagation.
//!
//! A property is secret when its schema marks it sensitive, or when any
//! value that contributed to it was marked secret by the caller. Secrecy
//! only ever spreads: an output inherits the secret bit of the inputs and
//! prior state it was derived from, so a property that was secret once stays
//! wrapped in the secret sentinel on every later write.

use crate::diff::DiffEntry;
use crate::schema::{Schema, SchemaKind, SchemaNode};
use crate::value::{Payload, Value};

/// Mark diff entries that touch sensitive or secret data.
pub fn propagate(schema: &Schema, entries: &mut [DiffEntry]) {
    for entry in entries.iter_mut() {
        let sensitive = schema
            .route(&entry.path)
            .is_some_and(|route| route.sensitive());
        entry.secret = sensitive || entry.old.contains_secret() || entry.new.contains_secret();
    }
}

/// Mark the nodes of a provider output that must be persisted as secret.
///
/// `sources` are the values the output was derived from, typically the
/// configured inputs and the prior state. A node is marked when its schema
/// node is sensitive, or when the node at the same position in any source is
/// secret. Objects and maps are matched by key, lists by index. A set is
/// marked as a whole when any source set holds a secret.
pub fn annotate_secrets(schema: &Schema, mut output: Value, sources: &[&Value]) -> Value {
    if let Some(fields) = output.as_entries_mut() {
        for (key, item) in fields.iter_mut() {
            let inner: Vec<&Value> = sources.iter().filter_map(|s| s.get(key)).collect();
            mark(schema.field(key), item, &inner);
        }
    }
    output
}

fn mark(node: Option<&SchemaNode>, output: &mut Value, sources: &[&Value]) {
    if node.is_some_and(|n| n.flags.sensitive) || sources.iter().any(|s| s.is_secret()) {
        output.set_secret(true);
    }

    if let Some(single) = node.filter(|n| n.is_singleton()) {
        let elem = single.element();
        let inner: Vec<&Value> = sources.iter().filter_map(|s| singleton_element(s)).collect();
        let wrapped = matches!(output.payload(), Some(Payload::List(_)) | Some(Payload::Set(_)));
        if !wrapped {
            mark(elem, output, &inner);
            return;
        }
        match output.payload_mut() {
            Some(Payload::List(items)) => {
                for item in items.iter_mut() {
                    mark(elem, item, &inner);
                }
            },
            Some(Payload::Set(set)) => {
                for item in set.values_mut() {
                    mark(elem, item, &inner);
                }
            },
            _ => {},
        }
        return;
    }

    mark_children(node, output, sources);
}

fn mark_children(node: Option<&SchemaNode>, output: &mut Value, sources: &[&Value]) {
    let is_set = matches!(output.payload(), Some(Payload::Set(_)));
    if is_set && sources.iter().any(|s| s.contains_secret()) {
        output.set_secret(true);
    }

    let kind = node.map(|n| &n.kind);
    let elem = node.and_then(SchemaNode::element);
    match output.payload_mut() {
        None | Some(Payload::Scalar(_)) => {},
        Some(Payload::List(items)) => {
            for (i, item) in items.iter_mut().enumerate() {
                let inner: Vec<&Value> = sources
                    .iter()
                    .filter_map(|s| s.as_list().and_then(|l| l.get(i)))
                    .collect();
                mark(elem, item, &inner);
            }
        },
        Some(Payload::Set(set)) => {
            for item in set.values_mut() {
                mark(elem, item, &[]);
            }
        },
        Some(Payload::Map(entries)) | Some(Payload::Object(entries)) => {
            for (key, item) in entries.iter_mut() {
                let child = match kind {
                    Some(SchemaKind::Block(fields)) => fields.get(key),
                    Some(SchemaKind::Map(_)) => elem,
                    _ => None,
                };
                let inner: Vec<&Value> = sources.iter().filter_map(|s| s.get(key)).collect();
                mark(child, item, &inner);
            }
        },
    }
}

/// The element a singleton source value stands for.
fn singleton_element(value: &Value) -> Option<&Value> {
    match value.payload() {
        Some(Payload::List(items)) => items.first(),
        Some(Payload::Set(set)) => set.values().next(),
        _ => Some(value),
    }
}
