//! The bridge between an upstream provider and the resource protocol.
//!
//! A [`Bridge`] wraps an [`UpstreamProvider`] and exposes the operations the
//! engine calls: `check`, `diff`, `create`, `read`, `update` and `delete`.
//! Payloads are JSON on both sides. Values going to the upstream provider
//! have their secret sentinels stripped; values coming back have secrecy
//! re-applied from the schema and from whatever the engine sent.
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_bridge::{async_trait, Bridge, BridgeError, UpstreamProvider};
//! use hemmer_provider_bridge::schema::{ProviderSchema, Schema, SchemaNode};
//!
//! struct Buckets;
//!
//! #[async_trait]
//! impl UpstreamProvider for Buckets {
//!     fn schema(&self) -> ProviderSchema {
//!         ProviderSchema::new().with_resource(
//!             "bucket",
//!             Schema::v0().with_field("name", SchemaNode::required_string().with_force_new()),
//!         )
//!     }
//!
//!     async fn create(&self, _: &str, inputs: serde_json::Value) -> Result<serde_json::Value, BridgeError> {
//!         Ok(inputs)
//!     }
//!     // read, update, delete ...
//! }
//!
//! let bridge = Bridge::new(Buckets);
//! let response = bridge.diff("bucket", &olds, &news).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use tracing::{debug, info, instrument, warn};

use crate::convert::{decode, encode};
use crate::diff::{diff, DiffResult};
use crate::error::BridgeError;
use crate::generated::DiffResponse;
use crate::render::{self, PreviewOptions};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::secret::annotate_secrets;
use crate::types::{is_reserved_key, CheckResult, ReadResult};
use crate::validation::{drop_invalid_computed, validate};

type Json = serde_json::Value;

/// The provider being bridged.
///
/// Implementations see plain JSON: secret sentinels are removed before a
/// value is handed over, and never need to be produced.
#[async_trait]
pub trait UpstreamProvider: Send + Sync + 'static {
    /// The schemas of every resource type the provider manages.
    fn schema(&self) -> ProviderSchema;

    /// Provider-specific validation of a resource's inputs.
    async fn validate_resource(
        &self,
        resource_type: &str,
        inputs: &Json,
    ) -> Result<Vec<Diagnostic>, BridgeError> {
        let _ = (resource_type, inputs);
        Ok(vec![])
    }

    /// Create a resource, returning its state.
    async fn create(&self, resource_type: &str, inputs: Json) -> Result<Json, BridgeError>;

    /// Refresh a resource's state. `null` means the resource is gone.
    async fn read(&self, resource_type: &str, state: Json) -> Result<Json, BridgeError>;

    /// Update a resource in place, returning its new state.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Json,
        inputs: Json,
    ) -> Result<Json, BridgeError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, state: Json) -> Result<(), BridgeError>;
}

/// Options for a [`Bridge`].
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// How previews are rendered.
    pub preview: PreviewOptions,
    /// Silently drop invalid inputs for fields the provider computes,
    /// instead of reporting them.
    /// Default: true.
    pub drop_invalid_computed: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            preview: PreviewOptions::default(),
            drop_invalid_computed: true,
        }
    }
}

impl BridgeOptions {
    /// Create bridge options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preview options.
    pub fn with_preview(mut self, preview: PreviewOptions) -> Self {
        self.preview = preview;
        self
    }

    /// Set whether invalid computed inputs are dropped.
    pub fn with_drop_invalid_computed(mut self, drop: bool) -> Self {
        self.drop_invalid_computed = drop;
        self
    }
}

/// A bridged provider.
///
/// The schema is read from the upstream provider once, at construction, and
/// shared read-only by every operation. A `Bridge` is cheap to clone and can
/// serve many resources concurrently.
pub struct Bridge<P> {
    provider: Arc<P>,
    schema: Arc<ProviderSchema>,
    options: BridgeOptions,
}

impl<P> Clone for Bridge<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            schema: Arc::clone(&self.schema),
            options: self.options.clone(),
        }
    }
}

impl<P: UpstreamProvider> Bridge<P> {
    /// Bridge a provider with default options.
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, BridgeOptions::default())
    }

    /// Bridge a provider with custom options.
    pub fn with_options(provider: P, options: BridgeOptions) -> Self {
        let schema = provider.schema();
        debug!(resources = schema.resources.len(), "loaded provider schema");
        Self {
            provider: Arc::new(provider),
            schema: Arc::new(schema),
            options,
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider's schema.
    pub fn schema(&self) -> &ProviderSchema {
        &self.schema
    }

    /// The options in effect.
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    fn resource_schema(&self, resource_type: &str) -> Result<&Schema, BridgeError> {
        self.schema
            .resource(resource_type)
            .ok_or_else(|| BridgeError::UnknownResource(resource_type.to_string()))
    }

    /// Validate new inputs.
    ///
    /// Schema validation runs first; the upstream provider only sees inputs
    /// that passed it. Invalid values for fields the provider computes are
    /// dropped from the returned inputs when enabled, and every other error
    /// is a failure. Bridge metadata keys present in `olds` but missing from
    /// `news` are carried over.
    #[instrument(skip(self, olds, news), name = "bridge.check")]
    pub async fn check(
        &self,
        resource_type: &str,
        olds: &Json,
        news: &Json,
    ) -> Result<CheckResult, BridgeError> {
        let schema = self.resource_schema(resource_type)?;

        let mut checked = news.clone();
        carry_metadata(olds, &mut checked);

        let diagnostics = validate(schema, &checked);
        let (checked, mut remaining) = self.settle(schema, checked, diagnostics);

        let (checked, remaining) = if remaining.iter().any(Diagnostic::is_error) {
            (checked, remaining)
        } else {
            let inputs = decode(schema, &checked)?;
            let upstream = self
                .provider
                .validate_resource(resource_type, &encode(&inputs.without_secrets()))
                .await?;
            let (checked, upstream) = self.settle(schema, checked, upstream);
            remaining.extend(upstream);
            (checked, remaining)
        };

        let (failures, warnings): (Vec<_>, Vec<_>) =
            remaining.into_iter().partition(Diagnostic::is_error);
        for warning in &warnings {
            warn!(summary = %warning.summary, attribute = ?warning.attribute, "check warning");
        }

        info!(
            resource_type = %resource_type,
            failures = failures.len(),
            "Check completed"
        );
        Ok(CheckResult {
            inputs: checked,
            failures,
        })
    }

    /// Compute the detailed diff between prior state and new inputs.
    #[instrument(skip(self, olds, news), name = "bridge.diff")]
    pub async fn diff(
        &self,
        resource_type: &str,
        olds: &Json,
        news: &Json,
    ) -> Result<DiffResponse, BridgeError> {
        let result = self.detailed_diff(resource_type, olds, news)?;
        info!(
            resource_type = %resource_type,
            entries = result.len(),
            replace = result.replace,
            "Diff completed"
        );
        Ok(render::to_wire(&result))
    }

    /// Compute the detailed diff without converting it to the wire form.
    pub fn detailed_diff(
        &self,
        resource_type: &str,
        olds: &Json,
        news: &Json,
    ) -> Result<DiffResult, BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let old = decode(schema, olds)?;
        let new = decode(schema, news)?;
        diff(schema, &old, &new)
    }

    /// Render the human-readable preview of a change.
    #[instrument(skip(self, olds, news), name = "bridge.preview")]
    pub fn preview(
        &self,
        resource_type: &str,
        name: &str,
        olds: &Json,
        news: &Json,
    ) -> Result<String, BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let old = decode(schema, olds)?;
        let new = decode(schema, news)?;
        render::preview(
            schema,
            resource_type,
            name,
            &old,
            &new,
            &self.options.preview,
        )
    }

    /// Create a resource and return its state, with secrets wrapped.
    #[instrument(skip(self, news), name = "bridge.create")]
    pub async fn create(&self, resource_type: &str, news: &Json) -> Result<Json, BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let inputs = decode(schema, news)?;

        let output = self
            .provider
            .create(resource_type, encode(&inputs.without_secrets()))
            .await?;
        let state = annotate_secrets(schema, decode(schema, &output)?, &[&inputs]);

        info!(resource_type = %resource_type, "Create completed successfully");
        Ok(encode(&state))
    }

    /// Refresh a resource.
    ///
    /// Secrecy of the prior state carries over to the refreshed state. The
    /// returned inputs are rebuilt from every field the user can set.
    #[instrument(skip(self, state), name = "bridge.read")]
    pub async fn read(&self, resource_type: &str, state: &Json) -> Result<ReadResult, BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let prior = decode(schema, state)?;

        let output = self
            .provider
            .read(resource_type, encode(&prior.without_secrets()))
            .await?;
        if output.is_null() {
            debug!(resource_type = %resource_type, "resource no longer exists");
            return Ok(ReadResult {
                state: Json::Null,
                inputs: Json::Null,
            });
        }

        let refreshed = annotate_secrets(schema, decode(schema, &output)?, &[&prior]);
        let state = encode(&refreshed);
        let inputs = self.extract_inputs(schema, &state)?;

        debug!(resource_type = %resource_type, "Read completed successfully");
        Ok(ReadResult { state, inputs })
    }

    /// Update a resource in place and return its new state.
    #[instrument(skip(self, state, news), name = "bridge.update")]
    pub async fn update(
        &self,
        resource_type: &str,
        state: &Json,
        news: &Json,
    ) -> Result<Json, BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let prior = decode(schema, state)?;
        let inputs = decode(schema, news)?;

        let output = self
            .provider
            .update(
                resource_type,
                encode(&prior.without_secrets()),
                encode(&inputs.without_secrets()),
            )
            .await?;
        let state = annotate_secrets(schema, decode(schema, &output)?, &[&inputs, &prior]);

        info!(resource_type = %resource_type, "Update completed successfully");
        Ok(encode(&state))
    }

    /// Delete a resource.
    #[instrument(skip(self, state), name = "bridge.delete")]
    pub async fn delete(&self, resource_type: &str, state: &Json) -> Result<(), BridgeError> {
        let schema = self.resource_schema(resource_type)?;
        let prior = decode(schema, state)?;

        self.provider
            .delete(resource_type, encode(&prior.without_secrets()))
            .await?;

        info!(resource_type = %resource_type, "Delete completed successfully");
        Ok(())
    }

    fn settle(
        &self,
        schema: &Schema,
        inputs: Json,
        diagnostics: Vec<Diagnostic>,
    ) -> (Json, Vec<Diagnostic>) {
        if self.options.drop_invalid_computed {
            drop_invalid_computed(schema, inputs, diagnostics)
        } else {
            (inputs, diagnostics)
        }
    }

    /// Inputs implied by a state: every field that is not computed-only.
    fn extract_inputs(&self, schema: &Schema, state: &Json) -> Result<Json, BridgeError> {
        let Some(fields) = state.as_object() else {
            return Ok(Json::Null);
        };
        let inputs: Map<String, Json> = fields
            .iter()
            .filter(|(key, _)| {
                schema
                    .field(key)
                    .is_some_and(|node| !node.is_computed_only())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let inputs = Json::Object(inputs);

        let diagnostics = validate(schema, &inputs);
        let (inputs, remaining) = self.settle(schema, inputs, diagnostics);

        let errors: Vec<String> = remaining
            .iter()
            .filter(|d| d.is_error())
            .map(|d| match &d.attribute {
                Some(attribute) => format!("{}: {}", attribute, d.summary),
                None => d.summary.clone(),
            })
            .collect();
        if !errors.is_empty() {
            return Err(BridgeError::Validation(errors.join("; ")));
        }
        Ok(inputs)
    }
}

/// Copy reserved metadata keys from prior inputs that the new inputs lack.
fn carry_metadata(olds: &Json, news: &mut Json) {
    let (Some(olds), Some(news)) = (olds.as_object(), news.as_object_mut()) else {
        return;
    };
    for (key, value) in olds {
        if is_reserved_key(key) && !news.contains_key(key) {
            news.insert(key.clone(), value.clone());
        }
    }
}
