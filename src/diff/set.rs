//! Diffing of hash-identified, unordered collections.
//!
//! Elements present on both sides (by [`SetHash`](crate::hash::SetHash)) are
//! never reported. Leftovers that differ only in fields the walk ignores are
//! matched and dropped as well. The rest are enumerated in hash order and
//! paired up by rank: a pair is diffed recursively, a surplus new element is
//! an add, and a surplus old element a delete.
//!
//! The index in a reported path is synthetic. It starts after the elements
//! both sides share and means nothing beyond keeping paths unique within one
//! diff.

use crate::error::BridgeError;
use crate::path::PropertyPath;
use crate::schema::SchemaNode;
use crate::value::{SetValue, Value};

use super::Differ;

pub(super) fn diff_set(
    differ: &mut Differ<'_>,
    elem: &SchemaNode,
    old: &SetValue,
    new: &SetValue,
    path: &PropertyPath,
) -> Result<(), BridgeError> {
    let removed: Vec<&Value> = old
        .iter()
        .filter(|(hash, _)| !new.contains(hash))
        .map(|(_, v)| v)
        .collect();
    let added: Vec<&Value> = new
        .iter()
        .filter(|(hash, _)| !old.contains(hash))
        .map(|(_, v)| v)
        .collect();
    let (removed, added) = drop_equivalent(differ, elem, removed, added, path);

    let common = old.len() - removed.len();
    for rank in 0..removed.len().max(added.len()) {
        let index = path.index(common + rank);
        let o = removed.get(rank).copied().unwrap_or(Value::null_ref());
        let n = added.get(rank).copied().unwrap_or(Value::null_ref());
        differ.diff_node(elem, o, n, &index)?;
    }
    Ok(())
}

/// Match leftover elements that differ only where the walk reports nothing,
/// such as a computed field the new element leaves to the provider. Matched
/// pairs are the same element and drop out of both sides.
fn drop_equivalent<'v>(
    differ: &Differ<'_>,
    elem: &SchemaNode,
    removed: Vec<&'v Value>,
    mut added: Vec<&'v Value>,
    path: &PropertyPath,
) -> (Vec<&'v Value>, Vec<&'v Value>) {
    let mut unmatched = Vec::with_capacity(removed.len());
    for o in removed {
        match added.iter().position(|n| differ.equivalent(elem, o, n, path)) {
            Some(i) => {
                added.remove(i);
            },
            None => unmatched.push(o),
        }
    }
    (unmatched, added)
}
