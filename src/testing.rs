//! Testing utilities for bridged providers.
//!
//! [`BridgeTester`] drives a [`Bridge`] the way the engine would, and the
//! `assert_*` helpers check detailed diffs and diagnostics with readable
//! failure messages.
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_bridge::testing::{assert_entry, assert_replaces, BridgeTester};
//! use hemmer_provider_bridge::generated::property_diff::Kind;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_rename_replaces() {
//!     let tester = BridgeTester::new(MyProvider::new());
//!
//!     let state = tester.lifecycle_create("my_resource", json!({"name": "a"})).await.unwrap();
//!     let result = tester.diff("my_resource", &state, &json!({"name": "b"})).unwrap();
//!
//!     assert_replaces(&result);
//!     assert_entry(&result, "name", Kind::UpdateReplace);
//! }
//! ```

use serde_json::Value;

use crate::bridge::{Bridge, BridgeOptions, UpstreamProvider};
use crate::diff::DiffResult;
use crate::error::BridgeError;
use crate::generated::property_diff::Kind;
use crate::generated::DiffResponse;
use crate::schema::Diagnostic;
use crate::types::ReadResult;

/// A test harness for bridged providers.
pub struct BridgeTester<P: UpstreamProvider> {
    bridge: Bridge<P>,
}

impl<P: UpstreamProvider> BridgeTester<P> {
    /// Create a tester with default bridge options.
    pub fn new(provider: P) -> Self {
        Self {
            bridge: Bridge::new(provider),
        }
    }

    /// Create a tester with custom bridge options.
    pub fn with_options(provider: P, options: BridgeOptions) -> Self {
        Self {
            bridge: Bridge::with_options(provider, options),
        }
    }

    /// The bridge under test.
    pub fn bridge(&self) -> &Bridge<P> {
        &self.bridge
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        self.bridge.provider()
    }

    /// Resource type names, in sorted order.
    pub fn resource_types(&self) -> Vec<String> {
        self.bridge.schema().resources.keys().cloned().collect()
    }

    /// Check new inputs, failing on any error diagnostic.
    ///
    /// Returns the checked inputs.
    pub async fn check(&self, resource_type: &str, news: Value) -> Result<Value, TestError> {
        let result = self
            .bridge
            .check(resource_type, &Value::Null, &news)
            .await?;
        if result.failures.is_empty() {
            Ok(result.inputs)
        } else {
            Err(TestError::Diagnostics(result.failures))
        }
    }

    /// Compute the detailed diff between prior state and new inputs.
    pub fn diff(
        &self,
        resource_type: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<DiffResult, BridgeError> {
        self.bridge.detailed_diff(resource_type, olds, news)
    }

    /// Compute the wire diff response.
    pub async fn diff_response(
        &self,
        resource_type: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<DiffResponse, BridgeError> {
        self.bridge.diff(resource_type, olds, news).await
    }

    /// Render the preview of a change.
    pub fn preview(
        &self,
        resource_type: &str,
        name: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<String, BridgeError> {
        self.bridge.preview(resource_type, name, olds, news)
    }

    /// Create a resource.
    pub async fn create(&self, resource_type: &str, news: Value) -> Result<Value, BridgeError> {
        self.bridge.create(resource_type, &news).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, state: Value) -> Result<ReadResult, BridgeError> {
        self.bridge.read(resource_type, &state).await
    }

    /// Update a resource in place.
    pub async fn update(
        &self,
        resource_type: &str,
        state: Value,
        news: Value,
    ) -> Result<Value, BridgeError> {
        self.bridge.update(resource_type, &state, &news).await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), BridgeError> {
        self.bridge.delete(resource_type, &state).await
    }

    /// Check, create, then read back.
    ///
    /// Returns the state after the read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        news: Value,
    ) -> Result<Value, TestError> {
        let inputs = self.check(resource_type, news).await?;
        let created = self.create(resource_type, inputs).await?;
        Ok(self.read(resource_type, created).await?.state)
    }

    /// Check, diff, apply, then read back.
    ///
    /// A diff that requires replacement creates the new resource before
    /// deleting the old one. An empty diff leaves the state untouched.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        state: Value,
        news: Value,
    ) -> Result<Value, TestError> {
        let inputs = self.check(resource_type, news).await?;
        let result = self.diff(resource_type, &state, &inputs)?;

        let applied = if result.is_empty() {
            state
        } else if result.replace {
            let created = self.create(resource_type, inputs).await?;
            self.delete(resource_type, state).await?;
            created
        } else {
            self.update(resource_type, state, inputs).await?
        };
        Ok(self.read(resource_type, applied).await?.state)
    }

    /// Create, update, then delete.
    ///
    /// Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial: Value,
        updated: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial).await?;
        let updated = self.lifecycle_update(resource_type, created, updated).await?;
        self.delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a bridge error.
    Bridge(BridgeError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Check failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  {}", diag.summary)?;
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Bridge(e) => write!(f, "Bridge error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<BridgeError> for TestError {
    fn from(e: BridgeError) -> Self {
        TestError::Bridge(e)
    }
}

fn changed_paths(result: &DiffResult) -> Vec<String> {
    result.iter().map(|e| e.path.to_string()).collect()
}

/// Assert that a diff is empty.
///
/// # Panics
///
/// Panics if the diff has any entry.
pub fn assert_no_changes(result: &DiffResult) {
    assert!(
        result.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        result.len(),
        changed_paths(result)
    );
}

/// Assert that a diff has at least one entry.
///
/// # Panics
///
/// Panics if the diff is empty.
pub fn assert_has_changes(result: &DiffResult) {
    assert!(!result.is_empty(), "Expected changes, but got none");
}

/// Assert that a diff requires replacing the resource.
///
/// # Panics
///
/// Panics if no entry forces replacement.
pub fn assert_replaces(result: &DiffResult) {
    assert!(
        result.replace,
        "Expected replacement, but no change forces it. Changes: {:?}",
        changed_paths(result)
    );
}

/// Assert that a diff can be applied in place.
///
/// # Panics
///
/// Panics if any entry forces replacement.
pub fn assert_no_replace(result: &DiffResult) {
    assert!(
        !result.replace,
        "Expected an in-place update, but {:?} force replacement",
        result.replaced_keys()
    );
}

/// Assert that a path has an entry of the given wire kind.
///
/// # Panics
///
/// Panics if the path is unchanged or changed differently.
pub fn assert_entry(result: &DiffResult, path: &str, kind: Kind) {
    match result.get(path) {
        Some(entry) => assert_eq!(
            entry.wire_kind(),
            kind,
            "Unexpected change kind at '{}'",
            path
        ),
        None => panic!(
            "Expected a change at '{}', but it was not changed. Changes: {:?}",
            path,
            changed_paths(result)
        ),
    }
}

/// Assert that a path has no entry.
///
/// # Panics
///
/// Panics if the path changed.
pub fn assert_no_entry(result: &DiffResult, path: &str) {
    assert!(
        result.get(path).is_none(),
        "Expected no change at '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}', got: {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ProviderSchema, Schema, SchemaNode};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stores nothing; state is inputs plus an id that counts creations.
    #[derive(Default)]
    struct CountingProvider {
        creates: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl UpstreamProvider for CountingProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_resource(
                    "test_disk",
                    Schema::v0()
                        .with_field("id", SchemaNode::computed_string())
                        .with_field("name", SchemaNode::required_string().with_force_new())
                        .with_field("size", SchemaNode::optional_int()),
                )
                .with_resource(
                    "test_bucket",
                    Schema::v0().with_field("name", SchemaNode::required_string()),
                )
        }

        async fn create(&self, _resource_type: &str, inputs: Value) -> Result<Value, BridgeError> {
            let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
            let mut state = inputs;
            state["id"] = json!(format!("disk-{}", n));
            Ok(state)
        }

        async fn read(&self, _resource_type: &str, state: Value) -> Result<Value, BridgeError> {
            Ok(state)
        }

        async fn update(
            &self,
            _resource_type: &str,
            prior_state: Value,
            inputs: Value,
        ) -> Result<Value, BridgeError> {
            let mut state = inputs;
            state["id"] = prior_state["id"].clone();
            Ok(state)
        }

        async fn delete(&self, _resource_type: &str, _state: Value) -> Result<(), BridgeError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn tester() -> BridgeTester<CountingProvider> {
        BridgeTester::new(CountingProvider::default())
    }

    #[test]
    fn test_resource_types() {
        assert_eq!(tester().resource_types(), vec!["test_bucket", "test_disk"]);
    }

    #[tokio::test]
    async fn test_check_missing_required() {
        let err = tester().check("test_disk", json!({"size": 1})).await.unwrap_err();
        match err {
            TestError::Diagnostics(diags) => {
                assert_error_contains(&diags, "Missing required attribute");
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_update_in_place() {
        let tester = tester();
        let state = tester
            .lifecycle_create("test_disk", json!({"name": "d", "size": 1}))
            .await
            .unwrap();
        assert_eq!(state["id"], json!("disk-1"));

        let state = tester
            .lifecycle_update("test_disk", state, json!({"name": "d", "size": 2}))
            .await
            .unwrap();
        assert_eq!(state["id"], json!("disk-1"));
        assert_eq!(state["size"], json!(2));
        assert_eq!(tester.provider().creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_update_replaces() {
        let tester = tester();
        let state = tester
            .lifecycle_crud("test_disk", json!({"name": "a"}), json!({"name": "b"}))
            .await
            .unwrap();
        assert_eq!(state["id"], json!("disk-2"));
        assert_eq!(tester.provider().creates.load(Ordering::SeqCst), 2);
        assert_eq!(tester.provider().deletes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_diff_assertions() {
        let tester = tester();
        let state = json!({"id": "disk-1", "name": "a", "size": 1});

        let unchanged = tester
            .diff("test_disk", &state, &json!({"name": "a", "size": 1}))
            .unwrap();
        assert_no_changes(&unchanged);

        let resized = tester
            .diff("test_disk", &state, &json!({"name": "a", "size": 2}))
            .unwrap();
        assert_has_changes(&resized);
        assert_no_replace(&resized);
        assert_entry(&resized, "size", Kind::Update);
        assert_no_entry(&resized, "name");

        let renamed = tester
            .diff("test_disk", &state, &json!({"name": "b", "size": 1}))
            .unwrap();
        assert_replaces(&renamed);
        assert_entry(&renamed, "name", Kind::UpdateReplace);
    }

    #[test]
    #[should_panic(expected = "Expected a change at 'size'")]
    fn test_assert_entry_missing() {
        let result = tester()
            .diff("test_disk", &json!({"name": "a"}), &json!({"name": "a"}))
            .unwrap();
        assert_entry(&result, "size", Kind::Update);
    }

    #[test]
    fn test_diagnostic_assertions() {
        assert_no_errors(&[Diagnostic::warning("heads up")]);
        assert_error_contains(&[Diagnostic::error("size is invalid")], "invalid");
    }

    #[test]
    fn test_error_display() {
        let err = TestError::Diagnostics(vec![Diagnostic::error("bad").with_attribute("name")]);
        assert!(err.to_string().contains("bad (at name)"));

        let err: TestError = BridgeError::UnknownResource("x".into()).into();
        assert!(err.to_string().contains("Unknown resource type: x"));
    }
}
