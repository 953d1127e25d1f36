//! Key-wise diffing of string-keyed maps.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::BridgeError;
use crate::path::PropertyPath;
use crate::schema::SchemaNode;
use crate::value::Value;

use super::Differ;

/// Keys only in `new` become adds, keys only in `old` deletes, and keys on
/// both sides are diffed recursively. Equal values produce nothing.
pub(super) fn diff_map(
    differ: &mut Differ<'_>,
    elem: &SchemaNode,
    old: &BTreeMap<String, Value>,
    new: &BTreeMap<String, Value>,
    path: &PropertyPath,
) -> Result<(), BridgeError> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        let o = old.get(key).unwrap_or(Value::null_ref());
        let n = new.get(key).unwrap_or(Value::null_ref());
        differ.diff_node(elem, o, n, &path.key(key.as_str()))?;
    }
    Ok(())
}
