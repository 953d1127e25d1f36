//! Positional diffing of ordered collections.
//!
//! This is not a minimum edit distance. The equal leading run is skipped and
//! every remaining index is compared with the element at the same index on
//! the other side, so inserting at the front of a list shows up as a cascade
//! of updates followed by an add at the end.

use crate::error::BridgeError;
use crate::path::PropertyPath;
use crate::schema::SchemaNode;
use crate::value::Value;

use super::Differ;

pub(super) fn diff_list(
    differ: &mut Differ<'_>,
    elem: &SchemaNode,
    old: &[Value],
    new: &[Value],
    path: &PropertyPath,
) -> Result<(), BridgeError> {
    let (start, old_end, new_end) = window(old, new);

    for i in start..old_end.max(new_end) {
        let o = if i < old_end { &old[i] } else { Value::null_ref() };
        let n = if i < new_end { &new[i] } else { Value::null_ref() };
        differ.diff_node(elem, o, n, &path.index(i))?;
    }
    Ok(())
}

/// The index window that still needs comparing, as `(start, old_end,
/// new_end)`.
///
/// The trailing run is only trimmed when both sides have the same length;
/// otherwise it would shift indices and break positional addressing.
fn window(old: &[Value], new: &[Value]) -> (usize, usize, usize) {
    let start = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a.deep_equals(b))
        .count();

    let (mut old_end, mut new_end) = (old.len(), new.len());
    if old.len() == new.len() {
        while old_end > start && old[old_end - 1].deep_equals(&new[new_end - 1]) {
            old_end -= 1;
            new_end -= 1;
        }
    }
    (start, old_end, new_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::string(*s)).collect()
    }

    #[test]
    fn test_window_trims_common_prefix() {
        let old = strings(&["a", "b", "c"]);
        let new = strings(&["a", "b", "x", "y"]);
        assert_eq!(window(&old, &new), (2, 3, 4));
    }

    #[test]
    fn test_window_trims_suffix_only_for_equal_lengths() {
        let old = strings(&["a", "b", "c"]);
        let new = strings(&["x", "b", "c"]);
        assert_eq!(window(&old, &new), (0, 1, 1));

        let old = strings(&["b", "c"]);
        let new = strings(&["a", "b", "c"]);
        assert_eq!(window(&old, &new), (0, 2, 3));
    }

    #[test]
    fn test_window_of_equal_lists_is_empty() {
        let old = strings(&["a", "b"]);
        let (start, old_end, new_end) = window(&old, &old.clone());
        assert_eq!(start, 2);
        assert_eq!(old_end, 2);
        assert_eq!(new_end, 2);
    }
}
