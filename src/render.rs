//! Rendering a [`DiffResult`] for the wire and for people.
//!
//! Two outputs are produced from the same result:
//!
//! - [`to_wire`] builds the `DiffResponse` message: changed and replacing
//!   top-level keys plus the path-addressed detailed diff.
//! - [`preview`] renders a line-oriented preview:
//!
//! ```text
//! ~ example_resource.web (update)
//!     ~ tags: {
//!         ~ env: "dev" => "prod"
//!         + tier: "1"
//!       }
//! ```
//!
//! The preview is a pure function of the schema and the two trees, so its
//! text is stable enough to snapshot.

use colored::Colorize;

use crate::diff::{diff, DiffEntry, DiffKind, DiffResult};
use crate::error::BridgeError;
use crate::generated::diff_response::DiffChanges;
use crate::generated::{DiffResponse, PropertyDiff};
use crate::path::{PathSegment, PropertyPath};
use crate::schema::{Schema, SchemaKind};
use crate::types::ResourceAction;
use crate::value::{Payload, Scalar, Value, ValueKind};

/// Options for rendering previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Colour lines by their action marker.
    pub colorize: bool,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            colorize: false,
            indent: 4,
        }
    }
}

impl PreviewOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable colour.
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Set the number of spaces per nesting level.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Build the wire response for a diff.
pub fn to_wire(result: &DiffResult) -> DiffResponse {
    let changes = if result.is_empty() {
        DiffChanges::DiffNone
    } else {
        DiffChanges::DiffSome
    };

    DiffResponse {
        replaces: result.replaced_keys().into_iter().map(String::from).collect(),
        stables: Vec::new(),
        delete_before_replace: false,
        changes: changes as i32,
        diffs: result.changed_keys().into_iter().map(String::from).collect(),
        detailed_diff: result
            .iter()
            .map(|entry| {
                (
                    entry.path.to_string(),
                    PropertyDiff {
                        kind: entry.wire_kind() as i32,
                        input_diff: false,
                    },
                )
            })
            .collect(),
        has_detailed_diff: true,
    }
}

/// The detailed diff as JSON, e.g. `{"tests[2].nested": {"kind": "UPDATE"}}`.
pub fn to_json(result: &DiffResult) -> serde_json::Value {
    let map = result
        .iter()
        .map(|entry| {
            (
                entry.path.to_string(),
                serde_json::json!({ "kind": entry.wire_kind().as_str_name() }),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

/// The overall action a diff implies.
pub fn resource_action(old: &Value, new: &Value, result: &DiffResult) -> ResourceAction {
    match (old.is_null(), new.is_null()) {
        (true, true) => ResourceAction::NoChange,
        (true, false) => ResourceAction::Create,
        (false, true) => ResourceAction::Delete,
        _ if result.is_empty() => ResourceAction::NoChange,
        _ if result.replace => ResourceAction::Replace,
        _ => ResourceAction::Update,
    }
}

/// Render the preview for one resource.
///
/// Returns an empty string when the resource does not change.
pub fn preview(
    schema: &Schema,
    resource_type: &str,
    name: &str,
    old: &Value,
    new: &Value,
    options: &PreviewOptions,
) -> Result<String, BridgeError> {
    let result = diff(schema, old, new)?;
    let action = resource_action(old, new, &result);
    if action == ResourceAction::NoChange {
        return Ok(String::new());
    }

    let mut renderer = Renderer {
        schema,
        old,
        new,
        options,
        lines: Vec::new(),
    };
    renderer.line(
        0,
        action.marker(),
        &format!("{}.{} ({})", resource_type, name, action.label()),
    );
    renderer.entries(&result);

    let mut text = renderer.lines.join("\n");
    text.push('\n');
    Ok(text)
}

struct Renderer<'a> {
    schema: &'a Schema,
    old: &'a Value,
    new: &'a Value,
    options: &'a PreviewOptions,
    lines: Vec<String>,
}

impl Renderer<'_> {
    fn entries(&mut self, result: &DiffResult) {
        // Open containers, outermost first, with their closing bracket.
        let mut open: Vec<(PropertyPath, &'static str)> = Vec::new();

        for entry in result.iter() {
            while let Some((container, _)) = open.last() {
                if entry.path.starts_with(container) && entry.path != *container {
                    break;
                }
                if let Some((container, close)) = open.pop() {
                    self.close(container.len(), close);
                }
            }

            for depth in open.len() + 1..entry.path.len() {
                let container = entry.path.prefix(depth);
                let (open_bracket, close) = self.brackets(&container);
                let marker = container_marker(result, &container);
                self.line(depth, marker, &format!("{}: {}", label(&container), open_bracket));
                open.push((container, close));
            }

            self.entry(entry);
        }

        while let Some((container, close)) = open.pop() {
            self.close(container.len(), close);
        }
    }

    fn entry(&mut self, entry: &DiffEntry) {
        let level = entry.path.len();
        let marker = entry_marker(entry);
        let label = label(&entry.path);

        if entry.secret {
            let text = match entry.kind {
                DiffKind::Update => format!("{}: [secret] => [secret]", label),
                DiffKind::Add | DiffKind::Delete => format!("{}: [secret]", label),
            };
            self.line(level, marker, &text);
            return;
        }

        match entry.kind {
            DiffKind::Update => {
                let text = format!("{}: {} => {}", label, inline(&entry.old), inline(&entry.new));
                self.line(level, marker, &text);
            },
            DiffKind::Add => self.expand(level, marker, &label, &entry.new),
            DiffKind::Delete => self.expand(level, marker, &label, &entry.old),
        }
    }

    /// Render a whole added or deleted value, one line per leaf.
    fn expand(&mut self, level: usize, marker: &str, label: &str, value: &Value) {
        let payload = match value.payload() {
            Some(payload) if !value.is_secret() && payload.children().next().is_some() => payload,
            _ => {
                self.line(level, marker, &format!("{}: {}", label, inline(value)));
                return;
            },
        };

        match payload {
            Payload::List(_) | Payload::Set(_) => {
                self.line(level, marker, &format!("{}: [", label));
                for (i, child) in payload.children().enumerate() {
                    self.expand(level + 1, marker, &format!("[{}]", i), child);
                }
                self.close(level, "]");
            },
            Payload::Map(entries) | Payload::Object(entries) => {
                self.line(level, marker, &format!("{}: {{", label));
                for (key, child) in entries {
                    self.expand(level + 1, marker, key, child);
                }
                self.close(level, "}");
            },
            Payload::Scalar(_) => {
                self.line(level, marker, &format!("{}: {}", label, inline(value)));
            },
        }
    }

    /// Brackets for a container path: by schema kind, else by value shape.
    fn brackets(&self, path: &PropertyPath) -> (&'static str, &'static str) {
        let by_schema = self
            .schema
            .route(path)
            .and_then(|route| route.target())
            .and_then(|node| match node.kind {
                SchemaKind::List(_) | SchemaKind::Set(_) => Some(true),
                SchemaKind::Map(_) | SchemaKind::Block(_) => Some(false),
                SchemaKind::Scalar(_) => None,
            });
        let sequence = by_schema.unwrap_or_else(|| {
            lookup(self.new, path.segments())
                .or_else(|| lookup(self.old, path.segments()))
                .and_then(Value::payload)
                .is_some_and(|p| matches!(p, Payload::List(_) | Payload::Set(_)))
        });
        if sequence {
            ("[", "]")
        } else {
            ("{", "}")
        }
    }

    fn close(&mut self, level: usize, bracket: &str) {
        let pad = " ".repeat(level * self.options.indent + 2);
        self.lines.push(format!("{}{}", pad, bracket));
    }

    fn line(&mut self, level: usize, marker: &str, text: &str) {
        let pad = " ".repeat(level * self.options.indent);
        let line = format!("{}{} {}", pad, marker, text);
        self.lines.push(if self.options.colorize {
            paint(marker, &line)
        } else {
            line
        });
    }
}

fn paint(marker: &str, line: &str) -> String {
    match marker {
        "+" => line.green().to_string(),
        "-" => line.red().to_string(),
        "~" => line.yellow().to_string(),
        "+-" => line.magenta().to_string(),
        _ => line.to_string(),
    }
}

fn entry_marker(entry: &DiffEntry) -> &'static str {
    match (entry.kind, entry.replace) {
        (_, true) => "+-",
        (DiffKind::Add, false) => "+",
        (DiffKind::Delete, false) => "-",
        (DiffKind::Update, false) => "~",
    }
}

/// `+`/`-`/`+-` when every change beneath agrees, `~` otherwise.
fn container_marker(result: &DiffResult, container: &PropertyPath) -> &'static str {
    let mut markers = result
        .iter()
        .filter(|entry| entry.path.starts_with(container))
        .map(entry_marker);
    let first = markers.next().unwrap_or("~");
    if markers.all(|m| m == first) {
        first
    } else {
        "~"
    }
}

fn label(path: &PropertyPath) -> String {
    path.last().map(PathSegment::to_string).unwrap_or_default()
}

/// Find the value at a path. A key step through a one-element list or set
/// steps into the element, matching singleton addressing.
fn lookup<'v>(value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(value);
    };
    let next = match (first, value.payload()?) {
        (PathSegment::Key(key), Payload::Map(entries) | Payload::Object(entries)) => {
            entries.get(key)?
        },
        (PathSegment::Key(_), Payload::List(items)) if items.len() == 1 => {
            return lookup(&items[0], segments);
        },
        (PathSegment::Index(i), Payload::List(items)) => items.get(*i)?,
        _ => return None,
    };
    lookup(next, rest)
}

/// A single-line rendering of a value.
fn inline(value: &Value) -> String {
    if value.is_secret() {
        return "[secret]".to_string();
    }
    match value.kind() {
        ValueKind::Null => "<null>".to_string(),
        ValueKind::Unknown => "[unknown]".to_string(),
        ValueKind::Known(Payload::Scalar(scalar)) => match scalar {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::String(s) => serde_json::Value::String(s.clone()).to_string(),
        },
        ValueKind::Known(Payload::List(_)) | ValueKind::Known(Payload::Set(_)) => {
            let items: Vec<String> = value
                .payload()
                .into_iter()
                .flat_map(Payload::children)
                .map(inline)
                .collect();
            format!("[{}]", items.join(", "))
        },
        ValueKind::Known(Payload::Map(entries)) | ValueKind::Known(Payload::Object(entries)) => {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k, inline(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        },
    }
}
