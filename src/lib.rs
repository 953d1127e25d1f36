//! Hemmer Provider Bridge
//!
//! This crate exposes providers written against a plugin protocol through the
//! Hemmer resource protocol. Its core is a detailed-diff engine: given a
//! resource schema, the prior state and the new inputs, it reports every
//! changed property path, classifies it as an add, delete or update, and
//! decides whether the change can be applied in place or forces the
//! resource to be replaced.
//!
//! # Overview
//!
//! - **Value model** ([`value`]): known/unknown/null trees with a secret bit on every node
//! - **Schema model** ([`schema`]): attribute kinds, flags, `force_new` and singleton collections
//! - **Diff engine** ([`diff`]): positional lists, hash-identified sets, keyed maps and blocks
//! - **Secrets** ([`secret`]): sensitivity and secret propagation through diffs and outputs
//! - **Rendering** ([`render`]): the wire `DiffResponse`, a JSON view and a text preview
//! - **Bridge** ([`bridge`]): `check`/`diff`/`create`/`read`/`update`/`delete` over an [`UpstreamProvider`]
//! - **Testing** ([`testing`]): a harness and assertion helpers for bridged providers
//!
//! # Quick Start
//!
//! ```
//! use hemmer_provider_bridge::schema::{Schema, SchemaNode};
//! use hemmer_provider_bridge::{convert, diff, render};
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_field("name", SchemaNode::required_string().with_force_new())
//!     .with_field("tags", SchemaNode::map(SchemaNode::string()).optional());
//!
//! let old = convert::decode(&schema, &json!({"name": "web", "tags": {"env": "dev"}})).unwrap();
//! let new = convert::decode(&schema, &json!({"name": "web", "tags": {"env": "prod"}})).unwrap();
//!
//! let result = diff(&schema, &old, &new).unwrap();
//! assert!(!result.replace);
//! assert_eq!(render::to_json(&result), json!({"tags.env": {"kind": "UPDATE"}}));
//! ```
//!
//! # Sentinels
//!
//! Secret values travel as `{"4dabf18193072939515e22adb298388d":
//! "1b47061264138c4ac30d75fd1eb44270", "value": <v>}` and unknown values as
//! the string `04da6b54-80e4-46f7-96ec-b56ff0331ba9`. [`convert`] maps both
//! to and from the value model.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod convert;
pub mod diff;
pub mod error;
pub mod hash;
pub mod logging;
pub mod path;
pub mod render;
pub mod schema;
pub mod secret;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use bridge::{Bridge, BridgeOptions, UpstreamProvider};
pub use diff::{diff, DiffEntry, DiffKind, DiffResult};
pub use error::BridgeError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use path::{PathSegment, PropertyPath};
pub use render::{preview, PreviewOptions};
pub use schema::{ProviderSchema, Schema, SchemaNode};
pub use types::{CheckResult, ReadResult, ResourceAction};
pub use validation::{is_valid, validate, validate_result};
pub use value::Value;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
