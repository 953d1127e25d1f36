//! The detailed-diff engine.
//!
//! [`diff`] walks a [`Schema`] and two [`Value`] trees in lock-step and
//! returns every changed path, classified as an add, delete or update. The
//! computation is a pure function of its inputs and holds no state between
//! calls, so independent resources can be diffed concurrently against a
//! shared schema.
//!
//! The walk runs in three passes:
//!
//! 1. the tree differ collects raw changes, delegating to the list, set and
//!    map differs and applying the unknown/computed rules at each node,
//! 2. the replace resolver marks changes governed by a `force_new` node,
//! 3. the secret propagator marks changes touching sensitive or secret data.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_bridge::diff::{diff, DiffKind};
//! use hemmer_provider_bridge::schema::{Schema, SchemaNode};
//! use hemmer_provider_bridge::Value;
//!
//! let schema = Schema::v0().with_field("name", SchemaNode::required_string().with_force_new());
//! let old = Value::object([("name", Value::string("a"))]);
//! let new = Value::object([("name", Value::string("b"))]);
//!
//! let result = diff(&schema, &old, &new).unwrap();
//! assert!(result.replace);
//! assert_eq!(result.get("name").unwrap().kind, DiffKind::Update);
//! ```

mod list;
mod map;
mod replace;
mod set;
mod unknown;

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::BridgeError;
use crate::generated::property_diff::Kind as WireKind;
use crate::path::PropertyPath;
use crate::schema::{Schema, SchemaKind, SchemaNode};
use crate::secret;
use crate::types::is_reserved_key;
use crate::value::{Payload, SetValue, Value};

/// How a path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// The path has a value only in the new tree.
    Add,
    /// The path has a value only in the old tree.
    Delete,
    /// The path has different values in the two trees.
    Update,
}

/// A single changed path.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// Where the change is.
    pub path: PropertyPath,
    /// How the path changed.
    pub kind: DiffKind,
    /// The change forces the resource to be replaced.
    pub replace: bool,
    /// The change touches sensitive or secret data.
    pub secret: bool,
    /// The old value at the path.
    pub old: Value,
    /// The new value at the path.
    pub new: Value,
}

impl DiffEntry {
    /// The wire classification of this entry.
    pub fn wire_kind(&self) -> WireKind {
        match (self.kind, self.replace) {
            (DiffKind::Add, false) => WireKind::Add,
            (DiffKind::Add, true) => WireKind::AddReplace,
            (DiffKind::Delete, false) => WireKind::Delete,
            (DiffKind::Delete, true) => WireKind::DeleteReplace,
            (DiffKind::Update, false) => WireKind::Update,
            (DiffKind::Update, true) => WireKind::UpdateReplace,
        }
    }
}

/// Every changed path between two value trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Changed paths, in path order.
    pub entries: BTreeMap<PropertyPath, DiffEntry>,
    /// Whether any entry forces replacement.
    pub replace: bool,
}

impl DiffResult {
    fn from_entries(entries: Vec<DiffEntry>) -> Self {
        let replace = entries.iter().any(|e| e.replace);
        Self {
            entries: entries.into_iter().map(|e| (e.path.clone(), e)).collect(),
            replace,
        }
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changed paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up the entry for a rendered path such as `tests[2].nested`.
    pub fn get(&self, path: &str) -> Option<&DiffEntry> {
        let path = PropertyPath::parse(path).ok()?;
        self.entries.get(&path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.values()
    }

    /// Top-level properties with at least one change.
    pub fn changed_keys(&self) -> BTreeSet<&str> {
        self.entries
            .keys()
            .filter_map(PropertyPath::top_level_key)
            .collect()
    }

    /// Top-level properties with at least one replacing change.
    pub fn replaced_keys(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .filter(|e| e.replace)
            .filter_map(|e| e.path.top_level_key())
            .collect()
    }
}

/// Compute the detailed diff between two resource trees.
///
/// A null tree stands for a resource that does not exist: diffing from null
/// reports every configured field as an add, and diffing to null reports
/// every prior field as a delete.
pub fn diff(schema: &Schema, old: &Value, new: &Value) -> Result<DiffResult, BridgeError> {
    let mut differ = Differ::new(schema);
    differ.diff_root(old, new)?;
    let changes = differ.finish();
    trace!(changes = changes.len(), "collected raw changes");

    let mut entries = replace::resolve(schema, changes);
    secret::propagate(schema, &mut entries);

    let result = DiffResult::from_entries(entries);
    debug!(
        entries = result.len(),
        replace = result.replace,
        "computed detailed diff"
    );
    Ok(result)
}

/// A change found by the tree walk, before replacement and secrecy are
/// decided.
#[derive(Debug, Clone)]
pub(crate) struct Change {
    pub path: PropertyPath,
    pub kind: DiffKind,
    pub old: Value,
    pub new: Value,
    /// The present side of an add or delete sets a value under a
    /// `force_new` descendant.
    pub forces_replace: bool,
}

/// Recursive walker over a schema and two value trees.
pub(crate) struct Differ<'s> {
    schema: &'s Schema,
    changes: Vec<Change>,
}

impl<'s> Differ<'s> {
    pub(crate) fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            changes: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<Change> {
        self.changes
    }

    /// Whether `old` and `new` differ only in ways the walk does not report.
    fn equivalent(&self, node: &SchemaNode, old: &Value, new: &Value, path: &PropertyPath) -> bool {
        let mut scratch = Differ::new(self.schema);
        scratch.diff_node(node, old, new, path).is_ok() && scratch.changes.is_empty()
    }

    fn push(
        &mut self,
        node: Option<&SchemaNode>,
        kind: DiffKind,
        path: &PropertyPath,
        old: &Value,
        new: &Value,
    ) {
        let forces_replace = match (node, kind) {
            (Some(node), DiffKind::Add) => replace::value_reaches_force_new(node, new),
            (Some(node), DiffKind::Delete) => replace::value_reaches_force_new(node, old),
            _ => false,
        };
        trace!(path = %path, kind = ?kind, "change");
        self.changes.push(Change {
            path: path.clone(),
            kind,
            old: old.clone(),
            new: new.clone(),
            forces_replace,
        });
    }

    fn diff_root(&mut self, old: &Value, new: &Value) -> Result<(), BridgeError> {
        let empty = BTreeMap::new();
        let old_fields = root_fields(old, &empty)?;
        let new_fields = root_fields(new, &empty)?;
        let schema = self.schema;
        self.diff_fields(&schema.fields, old_fields, new_fields, &PropertyPath::root())
    }

    /// Diff the named fields of an object, treating a missing field as null.
    fn diff_fields(
        &mut self,
        fields: &BTreeMap<String, SchemaNode>,
        old: &BTreeMap<String, Value>,
        new: &BTreeMap<String, Value>,
        path: &PropertyPath,
    ) -> Result<(), BridgeError> {
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for key in keys {
            if is_reserved_key(key) {
                continue;
            }
            let o = old.get(key).unwrap_or(Value::null_ref());
            let n = new.get(key).unwrap_or(Value::null_ref());
            let child = path.key(key.as_str());
            match fields.get(key) {
                Some(node) => {
                    if unknown::left_to_provider(node, o, n) {
                        trace!(path = %child, "computed value left to provider");
                        continue;
                    }
                    self.diff_node(node, o, n, &child)?;
                },
                None => self.diff_opaque(o, n, &child),
            }
        }
        Ok(())
    }

    /// Diff a value that no schema describes as a single unit.
    fn diff_opaque(&mut self, old: &Value, new: &Value, path: &PropertyPath) {
        if old.deep_equals(new) {
            return;
        }
        let kind = unknown::short_circuit(old, new).unwrap_or(DiffKind::Update);
        self.push(None, kind, path, old, new);
    }

    /// Diff two values described by `node`.
    pub(crate) fn diff_node(
        &mut self,
        node: &SchemaNode,
        old: &Value,
        new: &Value,
        path: &PropertyPath,
    ) -> Result<(), BridgeError> {
        if node.is_singleton() {
            let elem = node.element().ok_or_else(|| {
                BridgeError::InvalidValue(format!("singleton at {} has no element schema", path))
            })?;
            let old = unwrap_singleton(old, path)?;
            let new = unwrap_singleton(new, path)?;
            return self.diff_node(elem, &old, &new, path);
        }

        if old.deep_equals(new) {
            return Ok(());
        }

        if let Some(kind) = unknown::short_circuit(old, new) {
            self.push(Some(node), kind, path, old, new);
            return Ok(());
        }

        match &node.kind {
            SchemaKind::Scalar(_) => {
                expect_scalar(node, old, path)?;
                expect_scalar(node, new, path)?;
                self.push(Some(node), DiffKind::Update, path, old, new);
            },
            SchemaKind::List(elem) => {
                let a = expect_list(node, old, path)?;
                let b = expect_list(node, new, path)?;
                list::diff_list(self, elem, a, b, path)?;
            },
            SchemaKind::Set(elem) => {
                let a = expect_set(node, old, path)?;
                let b = expect_set(node, new, path)?;
                if unknown::set_has_unknown(&a) || unknown::set_has_unknown(&b) {
                    self.push(Some(node), DiffKind::Update, path, old, new);
                } else {
                    set::diff_set(self, elem, &a, &b, path)?;
                }
            },
            SchemaKind::Map(elem) => {
                let a = expect_entries(node, old, path)?;
                let b = expect_entries(node, new, path)?;
                map::diff_map(self, elem, a, b, path)?;
            },
            SchemaKind::Block(fields) => {
                let a = expect_entries(node, old, path)?;
                let b = expect_entries(node, new, path)?;
                self.diff_fields(fields, a, b, path)?;
            },
        }
        Ok(())
    }
}

fn root_fields<'v>(
    value: &'v Value,
    empty: &'v BTreeMap<String, Value>,
) -> Result<&'v BTreeMap<String, Value>, BridgeError> {
    if value.is_null() {
        return Ok(empty);
    }
    if value.is_unknown() {
        return Err(BridgeError::InvalidValue(
            "resource inputs cannot be entirely unknown".to_string(),
        ));
    }
    match value.payload() {
        Some(Payload::Object(fields)) | Some(Payload::Map(fields)) => Ok(fields),
        _ => Err(BridgeError::unexpected_type("<root>", "object", value.shape_name())),
    }
}

/// The single element of a singleton collection, or null when empty.
///
/// Values that are not a list or set are already collapsed and are returned
/// as they are.
fn unwrap_singleton<'v>(
    value: &'v Value,
    path: &PropertyPath,
) -> Result<Cow<'v, Value>, BridgeError> {
    let mut elements: Box<dyn Iterator<Item = &Value>> = match value.payload() {
        Some(Payload::List(items)) => Box::new(items.iter()),
        Some(Payload::Set(set)) => Box::new(set.values()),
        _ => return Ok(Cow::Borrowed(value)),
    };
    let first = elements.next();
    if elements.next().is_some() {
        return Err(BridgeError::InvalidValue(format!(
            "{} allows at most 1 element",
            path
        )));
    }
    let inner = first.unwrap_or(Value::null_ref());
    if value.is_secret() && !inner.is_secret() {
        Ok(Cow::Owned(inner.clone().into_secret()))
    } else {
        Ok(Cow::Borrowed(inner))
    }
}

fn expect_scalar(node: &SchemaNode, value: &Value, path: &PropertyPath) -> Result<(), BridgeError> {
    match value.payload() {
        Some(Payload::Scalar(_)) => Ok(()),
        _ => Err(BridgeError::unexpected_type(path, node.kind_name(), value.shape_name())),
    }
}

fn expect_list<'v>(
    node: &SchemaNode,
    value: &'v Value,
    path: &PropertyPath,
) -> Result<&'v [Value], BridgeError> {
    value
        .as_list()
        .ok_or_else(|| BridgeError::unexpected_type(path, node.kind_name(), value.shape_name()))
}

/// The set payload of a value, accepting a list that has not been hashed yet.
fn expect_set<'v>(
    node: &SchemaNode,
    value: &'v Value,
    path: &PropertyPath,
) -> Result<Cow<'v, SetValue>, BridgeError> {
    match value.payload() {
        Some(Payload::Set(set)) => Ok(Cow::Borrowed(set)),
        Some(Payload::List(items)) => SetValue::from_elements(items.iter().cloned())
            .map(Cow::Owned)
            .map_err(|source| BridgeError::SetHash {
                path: path.to_string(),
                source,
            }),
        _ => Err(BridgeError::unexpected_type(path, node.kind_name(), value.shape_name())),
    }
}

fn expect_entries<'v>(
    node: &SchemaNode,
    value: &'v Value,
    path: &PropertyPath,
) -> Result<&'v BTreeMap<String, Value>, BridgeError> {
    value
        .as_entries()
        .ok_or_else(|| BridgeError::unexpected_type(path, node.kind_name(), value.shape_name()))
}

#[cfg(test)]
mod tests;
