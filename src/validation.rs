//! Schema validation helpers.
//!
//! [`validate`] checks a JSON payload against a [`Schema`] and reports every
//! problem as a [`Diagnostic`]. Sentinels are understood: a secret-wrapped
//! value is validated as the value it wraps, and the unknown sentinel is
//! accepted anywhere since its value is only known after apply.
//!
//! [`drop_invalid_computed`] applies the recovery rule for inputs the
//! provider fills itself: an invalid Computed-and-not-Required input is
//! removed rather than reported, while every other failure stays visible.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_bridge::schema::{Schema, SchemaNode};
//! use hemmer_provider_bridge::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_field("name", SchemaNode::required_string())
//!     .with_field("count", SchemaNode::optional_int());
//!
//! let diagnostics = validate(&schema, &json!({"name": "test", "count": 42}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "test", "count": "many"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("count".to_string()));
//! ```

use serde_json::Value as Json;

use crate::convert::json_shape;
use crate::path::{PathSegment, PropertyPath};
use crate::schema::{Diagnostic, ScalarType, Schema, SchemaKind, SchemaNode};
use crate::types::{SECRET_SIG_KEY, SECRET_SIG_VALUE, SECRET_VALUE_KEY, UNKNOWN_VALUE};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required fields must be present and non-null
/// - Computed-only fields are skipped (provider sets these)
/// - Scalar types and collection shapes must match the schema
/// - Collections respect their min/max item counts (singletons allow one)
pub fn validate(schema: &Schema, value: &Json) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    match unwrap_secret(value) {
        Json::Null => {},
        Json::Object(obj) => {
            for (name, node) in &schema.fields {
                let path = PropertyPath::new(name.as_str());
                validate_field(node, obj.get(name), &path, &mut diagnostics);
            }
        },
        other => diagnostics.push(
            Diagnostic::error("Expected object").with_detail(format!("Got {}", json_shape(other))),
        ),
    }
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Json) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Json) -> bool {
    validate(schema, value).is_empty()
}

/// Remove inputs that failed validation but are left to the provider.
///
/// Each error diagnostic that points at a Computed-and-not-Required field is
/// consumed and the offending input removed. Every other diagnostic is
/// returned for the user to see.
pub fn drop_invalid_computed(
    schema: &Schema,
    mut inputs: Json,
    diagnostics: Vec<Diagnostic>,
) -> (Json, Vec<Diagnostic>) {
    let mut remaining = Vec::new();
    for diagnostic in diagnostics {
        let droppable = diagnostic
            .attribute
            .as_deref()
            .and_then(|attr| PropertyPath::parse(attr).ok())
            .filter(|path| diagnostic.is_error() && is_left_to_provider(schema, path));

        match droppable {
            Some(path) => {
                tracing::debug!(
                    attribute = %path,
                    summary = %diagnostic.summary,
                    "dropping invalid computed input"
                );
                remove_path(&mut inputs, path.segments());
            },
            None => remaining.push(diagnostic),
        }
    }
    (inputs, remaining)
}

fn is_left_to_provider(schema: &Schema, path: &PropertyPath) -> bool {
    schema
        .route(path)
        .and_then(|route| route.target())
        .is_some_and(SchemaNode::is_left_to_provider)
}

/// Remove the value at a path. Key steps pass through one-element arrays so
/// that wrapped singletons are addressed like collapsed ones.
fn remove_path(json: &mut Json, segments: &[PathSegment]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let json = unwrap_secret_mut(json);
    match (first, json) {
        (PathSegment::Key(_), Json::Array(items)) if items.len() == 1 => {
            remove_path(&mut items[0], segments);
        },
        (PathSegment::Key(key), Json::Object(obj)) => {
            if rest.is_empty() {
                obj.remove(key);
            } else if let Some(child) = obj.get_mut(key) {
                remove_path(child, rest);
            }
        },
        (PathSegment::Index(i), Json::Array(items)) => {
            if rest.is_empty() {
                if *i < items.len() {
                    items.remove(*i);
                }
            } else if let Some(child) = items.get_mut(*i) {
                remove_path(child, rest);
            }
        },
        _ => {},
    }
}

fn validate_field(
    node: &SchemaNode,
    value: Option<&Json>,
    path: &PropertyPath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Skip computed-only attributes (provider sets these)
    if node.is_computed_only() {
        return;
    }

    match value.map(unwrap_secret) {
        None | Some(Json::Null) => {
            if node.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path.to_string()),
                );
            } else if node.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "'{}' requires at least {} item(s)",
                        path, node.min_items
                    ))
                    .with_attribute(path.to_string()),
                );
            }
        },
        Some(v) => validate_value(node, v, path, diagnostics),
    }
}

fn validate_value(
    node: &SchemaNode,
    value: &Json,
    path: &PropertyPath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let value = unwrap_secret(value);
    if is_unknown(value) {
        return;
    }

    if node.is_singleton() && !value.is_array() {
        if let Some(elem) = node.element() {
            validate_value(elem, value, path, diagnostics);
        }
        return;
    }

    match (&node.kind, value) {
        (SchemaKind::Scalar(scalar), v) => {
            if !scalar_matches(*scalar, v) {
                diagnostics.push(type_error(path, node.kind_name(), v));
            }
        },
        (SchemaKind::List(elem), Json::Array(items))
        | (SchemaKind::Set(elem), Json::Array(items)) => {
            check_count(node, items.len(), path, diagnostics);
            for (i, item) in items.iter().enumerate() {
                // A wrapped singleton is addressed like a collapsed one.
                let item_path = if node.is_singleton() {
                    path.clone()
                } else {
                    path.index(i)
                };
                validate_value(elem, item, &item_path, diagnostics);
            }
        },
        (SchemaKind::Map(elem), Json::Object(obj)) => {
            check_count(node, obj.len(), path, diagnostics);
            for (key, item) in obj {
                validate_value(elem, item, &path.key(key.as_str()), diagnostics);
            }
        },
        (SchemaKind::Block(fields), Json::Object(obj)) => {
            for (name, field) in fields {
                validate_field(field, obj.get(name), &path.key(name.as_str()), diagnostics);
            }
        },
        (_, v) => diagnostics.push(type_error(path, node.kind_name(), v)),
    }
}

fn check_count(
    node: &SchemaNode,
    len: usize,
    path: &PropertyPath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let len = len as u32;

    if len < node.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "'{}' requires at least {} item(s), got {}",
                path, node.min_items, len
            ))
            .with_attribute(path.to_string()),
        );
    }

    // max_items of 0 means unlimited
    if node.max_items > 0 && len > node.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "'{}' allows at most {} item(s), got {}",
                path, node.max_items, len
            ))
            .with_attribute(path.to_string()),
        );
    }
}

fn scalar_matches(scalar: ScalarType, value: &Json) -> bool {
    match scalar {
        ScalarType::String => value.is_string(),
        ScalarType::Int => is_integer(value),
        ScalarType::Float => value.is_number(),
        ScalarType::Bool => value.is_boolean(),
        ScalarType::Dynamic => !value.is_array() && !value.is_object() && !value.is_null(),
    }
}

fn is_integer(value: &Json) -> bool {
    match value {
        Json::Number(n) => {
            n.is_i64()
                || n.is_u64()
                || n.as_f64().is_some_and(|f| {
                    f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
                })
        },
        _ => false,
    }
}

fn type_error(path: &PropertyPath, expected: &str, got: &Json) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, json_shape(got)))
        .with_attribute(path.to_string())
}

fn is_unknown(value: &Json) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}

fn is_secret_sentinel(value: &Json) -> bool {
    value.get(SECRET_SIG_KEY).and_then(Json::as_str) == Some(SECRET_SIG_VALUE)
}

fn unwrap_secret(value: &Json) -> &Json {
    if is_secret_sentinel(value) {
        if let Some(inner) = value.get(SECRET_VALUE_KEY) {
            return unwrap_secret(inner);
        }
    }
    value
}

fn unwrap_secret_mut(value: &mut Json) -> &mut Json {
    if is_secret_sentinel(value) && value.get(SECRET_VALUE_KEY).is_some() {
        return unwrap_secret_mut(&mut value[SECRET_VALUE_KEY]);
    }
    value
}
