//! Property-based tests for the detailed-diff engine.
//!
//! ```bash
//! cargo test --test properties
//! ```

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{json, Value as Json};

use hemmer_provider_bridge::convert::decode;
use hemmer_provider_bridge::generated::property_diff::Kind;
use hemmer_provider_bridge::schema::{ProviderSchema, Schema, SchemaNode};
use hemmer_provider_bridge::types::UNKNOWN_VALUE;
use hemmer_provider_bridge::{async_trait, diff, Bridge, BridgeError, DiffKind, UpstreamProvider};

fn schema() -> Schema {
    Schema::v0()
        .with_field("name", SchemaNode::required_string().with_force_new())
        .with_field("ports", SchemaNode::list(SchemaNode::int()).optional())
        .with_field("keys", SchemaNode::set(SchemaNode::string()).optional())
        .with_field("tags", SchemaNode::map(SchemaNode::string()).optional())
        .with_field(
            "rules",
            SchemaNode::set(SchemaNode::block([
                ("port", SchemaNode::required_int()),
                ("desc", SchemaNode::optional_string()),
                ("id", SchemaNode::string().optional_computed()),
            ]))
            .optional()
            .with_force_new(),
        )
}

/// Rule descriptions keyed by port. Ports are unique so every rule is a
/// distinct set element.
fn arbitrary_rules() -> impl Strategy<Value = BTreeMap<i64, Option<String>>> {
    prop::collection::btree_map(0i64..65536, prop::option::of("[a-z]{1,6}"), 0..5)
}

/// Rules as a configuration writes them: unset fields are left out.
fn configured_rules(rules: &BTreeMap<i64, Option<String>>) -> Vec<Json> {
    rules
        .iter()
        .map(|(port, desc)| match desc {
            Some(desc) => json!({"port": port, "desc": desc}),
            None => json!({"port": port}),
        })
        .collect()
}

/// Rules as a provider reports them: unset fields are null and ids are filled.
fn stored_rules(rules: &BTreeMap<i64, Option<String>>) -> Vec<Json> {
    rules
        .iter()
        .map(|(port, desc)| json!({"port": port, "desc": desc, "id": format!("r-{}", port)}))
        .collect()
}

fn arbitrary_resource() -> impl Strategy<Value = Json> {
    (
        "[a-z][a-z0-9-]{0,15}",
        prop::collection::vec(0i64..65536, 0..6),
        prop::collection::vec("[a-z]{1,6}", 0..6),
        prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..4),
        arbitrary_rules(),
    )
        .prop_map(
            |(name, ports, keys, tags, rules): (
                String,
                Vec<i64>,
                Vec<String>,
                BTreeMap<String, String>,
                BTreeMap<i64, Option<String>>,
            )| {
                json!({
                    "name": name,
                    "ports": ports,
                    "keys": keys,
                    "tags": tags,
                    "rules": stored_rules(&rules),
                })
            },
        )
}

proptest! {
    /// A tree never differs from itself.
    #[test]
    fn diff_is_idempotent(resource in arbitrary_resource()) {
        let schema = schema();
        let value = decode(&schema, &resource).unwrap();
        let result = diff(&schema, &value, &value).unwrap();
        prop_assert!(result.is_empty(), "unexpected entries: {:?}", result.entries.keys().collect::<Vec<_>>());
    }

    /// Stored rules with null and provider-filled fields match the
    /// configuration that leaves those fields out.
    #[test]
    fn null_and_computed_set_fields_are_not_changes(rules in arbitrary_rules()) {
        let schema = schema();
        let state = decode(&schema, &json!({"name": "x", "rules": stored_rules(&rules)})).unwrap();
        let config = decode(&schema, &json!({"name": "x", "rules": configured_rules(&rules)})).unwrap();

        let result = diff(&schema, &state, &config).unwrap();
        prop_assert!(result.is_empty(), "unexpected entries: {:?}", result.entries.keys().collect::<Vec<_>>());
        prop_assert!(!result.replace);
    }

    /// Reordering a set's elements is not a change.
    #[test]
    fn set_order_is_irrelevant(
        keys in prop::collection::vec("[a-z]{1,6}", 0..8)
            .prop_flat_map(|keys| (Just(keys.clone()), Just(keys).prop_shuffle()))
    ) {
        let schema = schema();
        let (original, shuffled) = keys;
        let old = decode(&schema, &json!({"name": "x", "keys": original})).unwrap();
        let new = decode(&schema, &json!({"name": "x", "keys": shuffled})).unwrap();
        prop_assert!(diff(&schema, &old, &new).unwrap().is_empty());
    }

    /// Repeating a set element is not a change.
    #[test]
    fn set_duplicates_collapse(keys in prop::collection::vec("[a-z]{1,6}", 1..8)) {
        let schema = schema();
        let mut doubled = keys.clone();
        doubled.extend(keys.iter().cloned());
        let old = decode(&schema, &json!({"name": "x", "keys": keys})).unwrap();
        let new = decode(&schema, &json!({"name": "x", "keys": doubled})).unwrap();
        prop_assert!(diff(&schema, &old, &new).unwrap().is_empty());
    }

    /// Adding one new element to a set yields exactly one add.
    #[test]
    fn set_insert_is_one_add(
        keys in prop::collection::btree_set("[a-z]{1,6}", 0..8),
        extra in "[0-9]{1,4}",
    ) {
        let schema = schema();
        let mut grown: Vec<String> = keys.iter().cloned().collect();
        grown.push(extra);
        let old = decode(&schema, &json!({"name": "x", "keys": keys})).unwrap();
        let new = decode(&schema, &json!({"name": "x", "keys": grown})).unwrap();

        let result = diff(&schema, &old, &new).unwrap();
        prop_assert_eq!(result.len(), 1);
        prop_assert_eq!(result.iter().next().unwrap().kind, DiffKind::Add);
    }

    /// A known value becoming unknown is always an update of that node.
    #[test]
    fn unknown_is_an_update(resource in arbitrary_resource()) {
        let schema = schema();
        let mut unknown = resource.clone();
        unknown["name"] = json!(UNKNOWN_VALUE);

        let old = decode(&schema, &resource).unwrap();
        let new = decode(&schema, &unknown).unwrap();
        let result = diff(&schema, &old, &new).unwrap();

        prop_assert_eq!(result.len(), 1);
        let entry = result.get("name").unwrap();
        prop_assert_eq!(entry.kind, DiffKind::Update);
        prop_assert_eq!(entry.wire_kind(), Kind::UpdateReplace);
    }
}

struct StaticProvider;

#[async_trait]
impl UpstreamProvider for StaticProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new().with_resource("test_resource", schema())
    }

    async fn create(&self, _resource_type: &str, inputs: Json) -> Result<Json, BridgeError> {
        Ok(inputs)
    }

    async fn read(&self, _resource_type: &str, state: Json) -> Result<Json, BridgeError> {
        Ok(state)
    }

    async fn update(
        &self,
        _resource_type: &str,
        _prior_state: Json,
        inputs: Json,
    ) -> Result<Json, BridgeError> {
        Ok(inputs)
    }

    async fn delete(&self, _resource_type: &str, _state: Json) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// Resources diffed concurrently against one shared schema get the same
/// answers as when diffed one at a time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_diffs_are_independent() {
    let bridge = Bridge::new(StaticProvider);

    let mut handles = Vec::new();
    for i in 0..32i64 {
        let bridge = bridge.clone();
        handles.push(tokio::spawn(async move {
            let olds = json!({"name": "web", "ports": [80], "tags": {"n": i.to_string()}});
            let news = json!({"name": "web", "ports": [80, i], "tags": {"n": i.to_string()}});
            let response = bridge.diff("test_resource", &olds, &news).await?;
            Ok::<_, BridgeError>((i, response))
        }));
    }

    for handle in handles {
        let (i, response) = handle.await.unwrap().unwrap();
        assert_eq!(response.detailed_diff.len(), 1, "resource {}", i);
        assert_eq!(response.detailed_diff["ports[1]"].kind, Kind::Add as i32);
        assert!(response.replaces.is_empty());
    }

    let err = bridge
        .diff("test_resource", &json!({"name": "web"}), &json!({"name": ["web"]}))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedType { .. }));
}
