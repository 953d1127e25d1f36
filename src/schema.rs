//! Schema types describing the shape of a resource.
//!
//! A schema is built once from the wrapped provider's definition and shared
//! read-only across every diff for that resource type. Each [`SchemaNode`]
//! describes one attribute or block: its kind, usage flags, and whether a
//! change beneath it forces replacement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::path::{PathSegment, PropertyPath};

/// The type of a scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int,
    /// A 64-bit floating point number.
    Float,
    /// A boolean value.
    Bool,
    /// Any scalar.
    Dynamic,
}

/// The structural kind of a schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// A primitive.
    Scalar(ScalarType),
    /// An ordered collection.
    List(Box<SchemaNode>),
    /// An unordered collection identified by element content.
    Set(Box<SchemaNode>),
    /// A string-keyed map.
    Map(Box<SchemaNode>),
    /// A nested block with named fields.
    Block(BTreeMap<String, SchemaNode>),
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchemaFlags {
    /// The attribute is required in configuration.
    #[serde(default)]
    pub required: bool,
    /// The attribute is optional in configuration.
    #[serde(default)]
    pub optional: bool,
    /// The attribute is computed by the provider.
    #[serde(default)]
    pub computed: bool,
    /// The attribute is sensitive and its values are always secret.
    #[serde(default)]
    pub sensitive: bool,
}

impl SchemaFlags {
    /// Create flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Create flags for a computed attribute (read-only, set by provider).
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional+computed attribute.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }
}

/// Static description of one node of a resource's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// The node's structural kind.
    pub kind: SchemaKind,
    /// Usage flags.
    #[serde(flatten)]
    pub flags: SchemaFlags,
    /// Any change reachable through this node replaces the resource.
    #[serde(default)]
    pub force_new: bool,
    /// A list or set of at most one element, represented as that element.
    #[serde(default)]
    pub singleton: bool,
    /// Minimum number of collection elements.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of collection elements (0 = unlimited).
    #[serde(default)]
    pub max_items: u32,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaNode {
    /// Create a node with the given kind and flags.
    pub fn new(kind: SchemaKind, flags: SchemaFlags) -> Self {
        Self {
            kind,
            flags,
            force_new: false,
            singleton: false,
            min_items: 0,
            max_items: 0,
            description: None,
        }
    }

    /// A scalar node without flags, e.g. a collection element.
    pub fn scalar(scalar: ScalarType) -> Self {
        Self::new(SchemaKind::Scalar(scalar), SchemaFlags::default())
    }

    /// A string element.
    pub fn string() -> Self {
        Self::scalar(ScalarType::String)
    }

    /// An integer element.
    pub fn int() -> Self {
        Self::scalar(ScalarType::Int)
    }

    /// A boolean element.
    pub fn bool() -> Self {
        Self::scalar(ScalarType::Bool)
    }

    /// Create a required string attribute.
    pub fn required_string() -> Self {
        Self::string().required()
    }

    /// Create an optional string attribute.
    pub fn optional_string() -> Self {
        Self::string().optional()
    }

    /// Create a computed string attribute.
    pub fn computed_string() -> Self {
        Self::string().computed()
    }

    /// Create an optional int attribute.
    pub fn optional_int() -> Self {
        Self::int().optional()
    }

    /// Create a required int attribute.
    pub fn required_int() -> Self {
        Self::int().required()
    }

    /// Create an optional bool attribute.
    pub fn optional_bool() -> Self {
        Self::bool().optional()
    }

    /// A list of `element`.
    pub fn list(element: SchemaNode) -> Self {
        Self::new(SchemaKind::List(Box::new(element)), SchemaFlags::default())
    }

    /// A set of `element`.
    pub fn set(element: SchemaNode) -> Self {
        Self::new(SchemaKind::Set(Box::new(element)), SchemaFlags::default())
    }

    /// A map of `element`.
    pub fn map(element: SchemaNode) -> Self {
        Self::new(SchemaKind::Map(Box::new(element)), SchemaFlags::default())
    }

    /// A block with the given fields.
    pub fn block<K: Into<String>>(fields: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        Self::new(
            SchemaKind::Block(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            SchemaFlags::default(),
        )
    }

    /// Mark the node required.
    pub fn required(mut self) -> Self {
        self.flags.required = true;
        self.flags.optional = false;
        self
    }

    /// Mark the node optional.
    pub fn optional(mut self) -> Self {
        self.flags.optional = true;
        self.flags.required = false;
        self
    }

    /// Mark the node computed.
    pub fn computed(mut self) -> Self {
        self.flags.computed = true;
        self
    }

    /// Mark the node optional and computed.
    pub fn optional_computed(self) -> Self {
        self.optional().computed()
    }

    /// Mark the node sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Mark this node as forcing resource replacement when changed.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Collapse a list or set of at most one element into that element.
    pub fn with_singleton(mut self) -> Self {
        self.singleton = true;
        self.max_items = 1;
        self
    }

    /// Set the minimum number of elements.
    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Set the maximum number of elements.
    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The element schema of a list, set or map.
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::List(elem) | SchemaKind::Set(elem) | SchemaKind::Map(elem) => Some(elem),
            _ => None,
        }
    }

    /// Whether this is a list or set collapsed into its single element.
    pub fn is_singleton(&self) -> bool {
        self.singleton && matches!(self.kind, SchemaKind::List(_) | SchemaKind::Set(_))
    }

    /// Whether an absent configured value is left for the provider to fill.
    pub fn is_left_to_provider(&self) -> bool {
        self.flags.computed && !self.flags.required
    }

    /// Whether the attribute can only be set by the provider.
    pub fn is_computed_only(&self) -> bool {
        self.flags.computed && !self.flags.optional && !self.flags.required
    }

    /// The node with singleton wrapping removed.
    pub fn effective(&self) -> &SchemaNode {
        let mut node = self;
        while node.is_singleton() {
            match node.element() {
                Some(elem) => node = elem,
                None => break,
            }
        }
        node
    }

    /// A short name for the node's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::Scalar(ScalarType::String) => "string",
            SchemaKind::Scalar(ScalarType::Int) | SchemaKind::Scalar(ScalarType::Float) => {
                "number"
            },
            SchemaKind::Scalar(ScalarType::Bool) => "bool",
            SchemaKind::Scalar(ScalarType::Dynamic) => "scalar",
            SchemaKind::List(_) => "list",
            SchemaKind::Set(_) => "set",
            SchemaKind::Map(_) => "map",
            SchemaKind::Block(_) => "object",
        }
    }
}

/// Schema for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// The version of this schema (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// Top-level fields of the resource.
    #[serde(default)]
    pub fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// Create a new schema with the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            fields: BTreeMap::new(),
        }
    }

    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add a field to the schema.
    pub fn with_field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Look up a top-level field.
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    /// Resolve the schema nodes a path passes through.
    ///
    /// Singleton collections contribute both the collection node and its
    /// element node without consuming a path segment. Returns `None` when the
    /// path leaves the schema.
    pub fn route(&self, path: &PropertyPath) -> Option<Route<'_>> {
        let mut nodes: Vec<&SchemaNode> = Vec::with_capacity(path.len() + 1);
        for segment in path.segments() {
            let next = match (nodes.last().map(|n| &n.kind), segment) {
                (None, PathSegment::Key(key)) => self.fields.get(key)?,
                (Some(SchemaKind::Block(fields)), PathSegment::Key(key)) => fields.get(key)?,
                (Some(SchemaKind::Map(elem)), PathSegment::Key(_)) => elem,
                (Some(SchemaKind::List(elem)), PathSegment::Index(_))
                | (Some(SchemaKind::Set(elem)), PathSegment::Index(_)) => elem,
                _ => return None,
            };
            nodes.push(next);
            let mut current = next;
            while current.is_singleton() {
                current = current.element()?;
                nodes.push(current);
            }
        }
        Some(Route { nodes })
    }
}

/// The schema nodes along a property path, outermost first.
#[derive(Debug, Clone)]
pub struct Route<'a> {
    nodes: Vec<&'a SchemaNode>,
}

impl<'a> Route<'a> {
    /// The nodes along the route.
    pub fn nodes(&self) -> &[&'a SchemaNode] {
        &self.nodes
    }

    /// The node the path addresses, after singleton unwrapping.
    pub fn target(&self) -> Option<&'a SchemaNode> {
        self.nodes.last().copied()
    }

    /// Whether any node on the route forces replacement.
    pub fn force_new(&self) -> bool {
        self.nodes.iter().any(|n| n.force_new)
    }

    /// Whether any node on the route is sensitive.
    pub fn sensitive(&self) -> bool {
        self.nodes.iter().any(|n| n.flags.sensitive)
    }
}

/// Schemas for every resource type a provider exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Look up a resource schema.
    pub fn resource(&self, name: &str) -> Option<&Schema> {
        self.resources.get(name)
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message about a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
