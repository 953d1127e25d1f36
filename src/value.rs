//! The runtime value model.
//!
//! A [`Value`] is `Null`, `Unknown` (not yet known during planning) or
//! `Known` with a scalar, list, set, map or object payload. Every node carries
//! a secret bit. Sets are identified by content: elements are keyed by their
//! [`SetHash`] and duplicates collapse on construction.

use std::collections::BTreeMap;

use crate::hash::{structural_hash, HashError, SetHash};

/// A concrete value tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    kind: ValueKind,
    secret: bool,
}

/// Whether a value is absent, not yet known, or known.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// No value.
    Null,
    /// A value that will only be known after the provider runs.
    Unknown,
    /// A known value.
    Known(Payload),
}

/// The content of a known value.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A primitive.
    Scalar(Scalar),
    /// An ordered sequence.
    List(Vec<Value>),
    /// An unordered, content-identified collection.
    Set(SetValue),
    /// A string-keyed map with homogeneous values.
    Map(BTreeMap<String, Value>),
    /// A schema-typed object with named fields.
    Object(BTreeMap<String, Value>),
}

/// A primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
}

impl Scalar {
    /// The integer a float is equal to, if it has no fractional part.
    pub(crate) fn integral(f: f64) -> Option<i64> {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Some(f as i64)
        } else {
            None
        }
    }

    /// Value equality, comparing integers and floats numerically.
    pub fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Int(i), Scalar::Float(f)) | (Scalar::Float(f), Scalar::Int(i)) => {
                Scalar::integral(*f) == Some(*i)
            },
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }

    /// A short name for the scalar's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) | Scalar::Float(_) => "number",
            Scalar::String(_) => "string",
        }
    }
}

/// A set of values identified by their structural hash.
///
/// Iteration order is hash order, which is deterministic but carries no
/// meaning of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetValue {
    elements: BTreeMap<SetHash, Value>,
}

impl SetValue {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, collapsing elements with equal content.
    pub fn from_elements(elements: impl IntoIterator<Item = Value>) -> Result<Self, HashError> {
        let mut set = Self::new();
        for element in elements {
            set.insert(element)?;
        }
        Ok(set)
    }

    /// Insert an element, returning `false` if an equal element was present.
    ///
    /// When an equal element is already present the two are merged: the
    /// stored element becomes secret if either was.
    pub fn insert(&mut self, element: Value) -> Result<bool, HashError> {
        let hash = structural_hash(&element)?;
        match self.elements.get_mut(&hash) {
            Some(existing) => {
                if element.is_secret() {
                    existing.secret = true;
                }
                Ok(false)
            },
            None => {
                self.elements.insert(hash, element);
                Ok(true)
            },
        }
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether an element with the given hash is present.
    pub fn contains(&self, hash: &SetHash) -> bool {
        self.elements.contains_key(hash)
    }

    /// Element hashes in ascending order.
    pub fn hashes(&self) -> impl Iterator<Item = SetHash> + '_ {
        self.elements.keys().copied()
    }

    /// Elements in hash order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.elements.values()
    }

    /// Mutable elements in hash order. Only secret bits may be changed
    /// through this, since they do not participate in identity.
    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.elements.values_mut()
    }

    /// `(hash, element)` pairs in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&SetHash, &Value)> {
        self.elements.iter()
    }

    /// Content equality: the same element identities on both sides.
    pub fn same_elements(&self, other: &SetValue) -> bool {
        self.elements.len() == other.elements.len()
            && self.elements.keys().all(|hash| other.elements.contains_key(hash))
    }
}

static NULL: Value = Value::null();

impl Value {
    /// A null value.
    pub const fn null() -> Self {
        Self {
            kind: ValueKind::Null,
            secret: false,
        }
    }

    /// A value that is not yet known.
    pub const fn unknown() -> Self {
        Self {
            kind: ValueKind::Unknown,
            secret: false,
        }
    }

    /// A shared null value, for borrowing in place of a missing one.
    pub fn null_ref() -> &'static Value {
        &NULL
    }

    /// A known value with the given payload.
    pub fn known(payload: Payload) -> Self {
        Self {
            kind: ValueKind::Known(payload),
            secret: false,
        }
    }

    /// A boolean value.
    pub fn bool(b: bool) -> Self {
        Self::known(Payload::Scalar(Scalar::Bool(b)))
    }

    /// An integer value.
    pub fn int(i: i64) -> Self {
        Self::known(Payload::Scalar(Scalar::Int(i)))
    }

    /// A floating point value.
    pub fn float(f: f64) -> Self {
        Self::known(Payload::Scalar(Scalar::Float(f)))
    }

    /// A string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::known(Payload::Scalar(Scalar::String(s.into())))
    }

    /// An ordered list.
    pub fn list(items: Vec<Value>) -> Self {
        Self::known(Payload::List(items))
    }

    /// A set; equal elements collapse.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Result<Self, HashError> {
        Ok(Self::known(Payload::Set(SetValue::from_elements(items)?)))
    }

    /// A string-keyed map.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::known(Payload::Map(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// An object with named fields.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::known(Payload::Object(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// The node's kind.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Consume the value, returning its kind.
    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    /// The payload of a known value.
    pub fn payload(&self) -> Option<&Payload> {
        match &self.kind {
            ValueKind::Known(payload) => Some(payload),
            _ => None,
        }
    }

    /// Mutable access to the payload of a known value.
    pub fn payload_mut(&mut self) -> Option<&mut Payload> {
        match &mut self.kind {
            ValueKind::Known(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether this node is marked secret.
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Mark this node secret.
    pub fn into_secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Set or clear this node's secret bit.
    pub fn with_secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    /// Set or clear this node's secret bit in place.
    pub fn set_secret(&mut self, secret: bool) {
        self.secret = secret;
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    /// Whether the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, ValueKind::Unknown)
    }

    /// Whether the value is known.
    pub fn is_known(&self) -> bool {
        matches!(self.kind, ValueKind::Known(_))
    }

    /// The scalar payload, if any.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self.payload() {
            Some(Payload::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    /// The string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self.as_scalar() {
            Some(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The list payload, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self.payload() {
            Some(Payload::List(items)) => Some(items),
            _ => None,
        }
    }

    /// The set payload, if any.
    pub fn as_set(&self) -> Option<&SetValue> {
        match self.payload() {
            Some(Payload::Set(set)) => Some(set),
            _ => None,
        }
    }

    /// The entries of a map or object payload.
    pub fn as_entries(&self) -> Option<&BTreeMap<String, Value>> {
        match self.payload() {
            Some(Payload::Map(entries)) | Some(Payload::Object(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Mutable entries of a map or object payload.
    pub fn as_entries_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self.payload_mut() {
            Some(Payload::Map(entries)) | Some(Payload::Object(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Look up a field or map key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_entries().and_then(|entries| entries.get(key))
    }

    /// A short name for the value's shape, used in error messages.
    pub fn shape_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Null => "null",
            ValueKind::Unknown => "unknown",
            ValueKind::Known(Payload::Scalar(s)) => s.type_name(),
            ValueKind::Known(Payload::List(_)) => "list",
            ValueKind::Known(Payload::Set(_)) => "set",
            ValueKind::Known(Payload::Map(_)) => "map",
            ValueKind::Known(Payload::Object(_)) => "object",
        }
    }

    /// Structural equality under each node's equality rule.
    ///
    /// Scalars compare by value, sets by element identity, everything else
    /// recursively. An object field set to null equals one that is absent.
    /// Secret bits are ignored. A list never equals a set.
    pub fn deep_equals(&self, other: &Value) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Unknown, ValueKind::Unknown) => true,
            (ValueKind::Known(a), ValueKind::Known(b)) => match (a, b) {
                (Payload::Scalar(a), Payload::Scalar(b)) => a.equals(b),
                (Payload::List(a), Payload::List(b)) => {
                    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_equals(y))
                },
                (Payload::Set(a), Payload::Set(b)) => a.same_elements(b),
                (Payload::Map(a), Payload::Map(b)) => {
                    a.len() == b.len()
                        && a.iter()
                            .all(|(k, v)| b.get(k).is_some_and(|w| v.deep_equals(w)))
                },
                (Payload::Object(a), Payload::Object(b))
                | (Payload::Map(a), Payload::Object(b))
                | (Payload::Object(a), Payload::Map(b)) => a
                    .keys()
                    .chain(b.keys())
                    .all(|k| field_or_null(a, k).deep_equals(field_or_null(b, k))),
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether this node or any descendant is unknown.
    pub fn contains_unknown(&self) -> bool {
        match &self.kind {
            ValueKind::Null => false,
            ValueKind::Unknown => true,
            ValueKind::Known(payload) => payload.children().any(Value::contains_unknown),
        }
    }

    /// Whether this node or any descendant is marked secret.
    pub fn contains_secret(&self) -> bool {
        self.secret
            || self
                .payload()
                .is_some_and(|payload| payload.children().any(Value::contains_secret))
    }

    /// A copy of this value with every secret bit cleared.
    pub fn without_secrets(&self) -> Value {
        let kind = match &self.kind {
            ValueKind::Known(payload) => ValueKind::Known(payload.map_children(Value::without_secrets)),
            other => other.clone(),
        };
        Value {
            kind,
            secret: false,
        }
    }
}

fn field_or_null<'v>(fields: &'v BTreeMap<String, Value>, key: &str) -> &'v Value {
    fields.get(key).unwrap_or(Value::null_ref())
}

impl Payload {
    /// Direct children of a structured payload.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Payload::Scalar(_) => Box::new(std::iter::empty()),
            Payload::List(items) => Box::new(items.iter()),
            Payload::Set(set) => Box::new(set.values()),
            Payload::Map(entries) | Payload::Object(entries) => Box::new(entries.values()),
        }
    }

    fn map_children(&self, f: impl Fn(&Value) -> Value) -> Payload {
        match self {
            Payload::Scalar(s) => Payload::Scalar(s.clone()),
            Payload::List(items) => Payload::List(items.iter().map(&f).collect()),
            // Rehashing is unnecessary: the transformation only touches secret
            // bits, which do not participate in element identity.
            Payload::Set(set) => Payload::Set(SetValue {
                elements: set.elements.iter().map(|(h, v)| (*h, f(v))).collect(),
            }),
            Payload::Map(entries) => {
                Payload::Map(entries.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            },
            Payload::Object(fields) => {
                Payload::Object(fields.iter().map(|(k, v)| (k.clone(), f(v))).collect())
            },
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}
