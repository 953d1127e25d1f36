use pretty_assertions::assert_eq;

use super::*;
use crate::generated::property_diff::Kind;

fn schema() -> Schema {
    Schema::v0()
        .with_field("name", SchemaNode::required_string())
        .with_field("zone", SchemaNode::optional_string().with_force_new())
        .with_field("arn", SchemaNode::string().optional_computed())
        .with_field("ports", SchemaNode::list(SchemaNode::int()).optional())
        .with_field("keys", SchemaNode::set(SchemaNode::string()).optional())
        .with_field("tags", SchemaNode::map(SchemaNode::string()).optional())
        .with_field(
            "rules",
            SchemaNode::set(SchemaNode::block([
                ("port", SchemaNode::required_int()),
                ("label", SchemaNode::optional_string()),
                ("id", SchemaNode::string().optional_computed()),
            ]))
            .optional()
            .with_force_new(),
        )
        .with_field(
            "network",
            SchemaNode::list(SchemaNode::block([
                ("id", SchemaNode::optional_string().with_force_new()),
                ("label", SchemaNode::optional_string()),
                ("address", SchemaNode::string().optional_computed()),
            ]))
            .optional(),
        )
        .with_field(
            "config",
            SchemaNode::list(SchemaNode::block([
                ("size", SchemaNode::optional_int()),
                ("endpoint", SchemaNode::string().optional_computed()),
            ]))
                .optional()
                .with_singleton(),
        )
}

fn strings(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::string(*s)).collect()
}

fn kinds(result: &DiffResult) -> Vec<(String, DiffKind)> {
    result
        .iter()
        .map(|e| (e.path.to_string(), e.kind))
        .collect()
}

#[test]
fn test_identical_trees_have_no_changes() {
    let value = Value::object([
        ("name", Value::string("web")),
        ("ports", Value::list(vec![Value::int(80), Value::int(443)])),
        ("tags", Value::map([("env", Value::string("prod"))])),
    ]);
    let result = diff(&schema(), &value, &value).unwrap();
    assert!(result.is_empty());
    assert!(!result.replace);
}

#[test]
fn test_scalar_update() {
    let old = Value::object([("name", Value::string("a"))]);
    let new = Value::object([("name", Value::string("b"))]);
    let result = diff(&schema(), &old, &new).unwrap();

    let entry = result.get("name").unwrap();
    assert_eq!(entry.kind, DiffKind::Update);
    assert_eq!(entry.old, Value::string("a"));
    assert_eq!(entry.new, Value::string("b"));
    assert_eq!(entry.wire_kind(), Kind::Update);
    assert!(!result.replace);
}

#[test]
fn test_create_and_destroy() {
    let value = Value::object([
        ("name", Value::string("web")),
        ("tags", Value::map([("env", Value::string("prod"))])),
    ]);

    let created = diff(&schema(), &Value::null(), &value).unwrap();
    assert_eq!(
        kinds(&created),
        vec![
            ("name".to_string(), DiffKind::Add),
            ("tags".to_string(), DiffKind::Add),
        ]
    );

    let destroyed = diff(&schema(), &value, &Value::null()).unwrap();
    assert_eq!(
        kinds(&destroyed),
        vec![
            ("name".to_string(), DiffKind::Delete),
            ("tags".to_string(), DiffKind::Delete),
        ]
    );
}

#[test]
fn test_list_insert_at_front_cascades() {
    let old = Value::object([("ports", Value::list(vec![Value::int(2), Value::int(3)]))]);
    let new = Value::object([(
        "ports",
        Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]),
    )]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(
        kinds(&result),
        vec![
            ("ports[0]".to_string(), DiffKind::Update),
            ("ports[1]".to_string(), DiffKind::Update),
            ("ports[2]".to_string(), DiffKind::Add),
        ]
    );
}

#[test]
fn test_list_truncation_deletes_tail() {
    let old = Value::object([(
        "ports",
        Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]),
    )]);
    let new = Value::object([("ports", Value::list(vec![Value::int(1)]))]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(
        kinds(&result),
        vec![
            ("ports[1]".to_string(), DiffKind::Delete),
            ("ports[2]".to_string(), DiffKind::Delete),
        ]
    );
}

#[test]
fn test_set_insertion_is_single_add() {
    let old = Value::object([("keys", Value::set(strings(&["a", "b"])).unwrap())]);
    let new = Value::object([("keys", Value::set(strings(&["a", "b", "c"])).unwrap())]);
    let result = diff(&schema(), &old, &new).unwrap();

    assert_eq!(result.len(), 1);
    let entry = result.iter().next().unwrap();
    assert_eq!(entry.kind, DiffKind::Add);
    assert_eq!(entry.new, Value::string("c"));
    assert_eq!(entry.path.to_string(), "keys[2]");
}

#[test]
fn test_set_removal_is_single_delete() {
    let old = Value::object([("keys", Value::set(strings(&["a", "b", "c"])).unwrap())]);
    let new = Value::object([("keys", Value::set(strings(&["a", "c"])).unwrap())]);
    let result = diff(&schema(), &old, &new).unwrap();

    assert_eq!(result.len(), 1);
    let entry = result.iter().next().unwrap();
    assert_eq!(entry.kind, DiffKind::Delete);
    assert_eq!(entry.old, Value::string("b"));
}

#[test]
fn test_set_order_and_duplicates_are_ignored() {
    let old = Value::object([("keys", Value::list(strings(&["a", "b", "c"])))]);
    let new = Value::object([("keys", Value::list(strings(&["c", "a", "b", "a"])))]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_set_element_change_under_force_new() {
    let rule = |label: &str| {
        Value::object([("port", Value::int(80)), ("label", Value::string(label))])
    };
    let old = Value::object([("rules", Value::set(vec![rule("a")]).unwrap())]);
    let new = Value::object([("rules", Value::set(vec![rule("b")]).unwrap())]);
    let result = diff(&schema(), &old, &new).unwrap();

    assert!(result.replace);
    let entry = result.get("rules[0].label").unwrap();
    assert_eq!(entry.kind, DiffKind::Update);
    assert_eq!(entry.wire_kind(), Kind::UpdateReplace);
    assert_eq!(result.replaced_keys().into_iter().collect::<Vec<_>>(), vec!["rules"]);
}

#[test]
fn test_map_changes_are_per_key() {
    let old = Value::object([(
        "tags",
        Value::map([("env", Value::string("dev")), ("team", Value::string("a"))]),
    )]);
    let new = Value::object([(
        "tags",
        Value::map([("env", Value::string("prod")), ("owner", Value::string("b"))]),
    )]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(
        kinds(&result),
        vec![
            ("tags.env".to_string(), DiffKind::Update),
            ("tags.owner".to_string(), DiffKind::Add),
            ("tags.team".to_string(), DiffKind::Delete),
        ]
    );
}

#[test]
fn test_computed_field_absent_from_config_is_not_a_change() {
    let old = Value::object([
        ("name", Value::string("web")),
        ("arn", Value::string("arn:1")),
    ]);
    let new = Value::object([("name", Value::string("web"))]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert!(result.is_empty());

    // Setting it explicitly is still a change.
    let new = Value::object([
        ("name", Value::string("web")),
        ("arn", Value::string("arn:2")),
    ]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(result.get("arn").unwrap().kind, DiffKind::Update);
}

#[test]
fn test_computed_field_in_force_new_set_element_is_not_a_change() {
    let state = Value::object([(
        "rules",
        Value::set(vec![Value::object([
            ("port", Value::int(80)),
            ("id", Value::string("r-1")),
        ])])
        .unwrap(),
    )]);
    let config = Value::object([(
        "rules",
        Value::set(vec![Value::object([("port", Value::int(80))])]).unwrap(),
    )]);
    let result = diff(&schema(), &state, &config).unwrap();
    assert!(result.is_empty(), "unexpected entries: {:?}", kinds(&result));
    assert!(!result.replace);

    // A real addition next to it is still reported, after the matched element.
    let grown = Value::object([(
        "rules",
        Value::set(vec![
            Value::object([("port", Value::int(80))]),
            Value::object([("port", Value::int(443))]),
        ])
        .unwrap(),
    )]);
    let result = diff(&schema(), &state, &grown).unwrap();
    assert_eq!(kinds(&result), vec![("rules[1]".to_string(), DiffKind::Add)]);
    assert_eq!(result.get("rules[1]").unwrap().wire_kind(), Kind::AddReplace);
}

#[test]
fn test_set_element_change_ignores_computed_sibling() {
    let state = Value::object([(
        "rules",
        Value::set(vec![Value::object([
            ("port", Value::int(80)),
            ("label", Value::string("a")),
            ("id", Value::string("r-1")),
        ])])
        .unwrap(),
    )]);
    let config = Value::object([(
        "rules",
        Value::set(vec![Value::object([
            ("port", Value::int(80)),
            ("label", Value::string("b")),
        ])])
        .unwrap(),
    )]);
    let result = diff(&schema(), &state, &config).unwrap();
    assert_eq!(kinds(&result), vec![("rules[0].label".to_string(), DiffKind::Update)]);
    assert!(result.replace);
}

#[test]
fn test_null_field_in_set_element_matches_absent_field() {
    let state = Value::object([(
        "rules",
        Value::set(vec![Value::object([
            ("port", Value::int(80)),
            ("label", Value::null()),
        ])])
        .unwrap(),
    )]);
    let config = Value::object([(
        "rules",
        Value::set(vec![Value::object([("port", Value::int(80))])]).unwrap(),
    )]);
    let result = diff(&schema(), &state, &config).unwrap();
    assert!(result.is_empty(), "unexpected entries: {:?}", kinds(&result));
    assert!(!result.replace);

    // Same for elements that have not been hashed yet.
    let state = Value::object([(
        "rules",
        Value::list(vec![Value::object([
            ("port", Value::int(80)),
            ("label", Value::null()),
        ])]),
    )]);
    let config = Value::object([(
        "rules",
        Value::list(vec![Value::object([("port", Value::int(80))])]),
    )]);
    assert!(diff(&schema(), &state, &config).unwrap().is_empty());
}

#[test]
fn test_computed_field_in_list_element_is_not_a_change() {
    let state = Value::object([(
        "network",
        Value::list(vec![Value::object([
            ("id", Value::string("n-1")),
            ("address", Value::string("10.0.0.1")),
        ])]),
    )]);
    let config = Value::object([(
        "network",
        Value::list(vec![Value::object([("id", Value::string("n-1"))])]),
    )]);
    let result = diff(&schema(), &state, &config).unwrap();
    assert!(result.is_empty(), "unexpected entries: {:?}", kinds(&result));
}

#[test]
fn test_computed_field_in_singleton_is_not_a_change() {
    let state = Value::object([(
        "config",
        Value::list(vec![Value::object([
            ("size", Value::int(10)),
            ("endpoint", Value::string("https://a")),
        ])]),
    )]);
    let same = Value::object([(
        "config",
        Value::list(vec![Value::object([("size", Value::int(10))])]),
    )]);
    assert!(diff(&schema(), &state, &same).unwrap().is_empty());

    let resized = Value::object([("config", Value::object([("size", Value::int(20))]))]);
    let result = diff(&schema(), &state, &resized).unwrap();
    assert_eq!(kinds(&result), vec![("config.size".to_string(), DiffKind::Update)]);
}

#[test]
fn test_force_new_field_replaces() {
    let old = Value::object([("zone", Value::string("a"))]);
    let new = Value::object([("zone", Value::string("b"))]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert!(result.replace);
    assert_eq!(result.get("zone").unwrap().wire_kind(), Kind::UpdateReplace);

    let removed = diff(&schema(), &old, &Value::object([("name", Value::string("x"))])).unwrap();
    assert_eq!(removed.get("zone").unwrap().wire_kind(), Kind::DeleteReplace);
}

#[test]
fn test_added_block_reaching_force_new_field_replaces() {
    let old = Value::object([("network", Value::list(vec![]))]);
    let with_id = Value::object([(
        "network",
        Value::list(vec![Value::object([("id", Value::string("n-1"))])]),
    )]);
    let result = diff(&schema(), &old, &with_id).unwrap();
    let entry = result.get("network[0]").unwrap();
    assert_eq!(entry.kind, DiffKind::Add);
    assert!(entry.replace);

    let label_only = Value::object([(
        "network",
        Value::list(vec![Value::object([("label", Value::string("x"))])]),
    )]);
    let result = diff(&schema(), &old, &label_only).unwrap();
    assert!(!result.replace);
    assert_eq!(result.get("network[0]").unwrap().wire_kind(), Kind::Add);
}

#[test]
fn test_unknown_values_become_updates() {
    let old = Value::object([
        ("name", Value::string("web")),
        ("ports", Value::list(vec![Value::int(80), Value::int(443)])),
    ]);
    let new = Value::object([
        ("name", Value::unknown()),
        ("ports", Value::list(vec![Value::int(80), Value::unknown()])),
    ]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(
        kinds(&result),
        vec![
            ("name".to_string(), DiffKind::Update),
            ("ports[1]".to_string(), DiffKind::Update),
        ]
    );
}

#[test]
fn test_unknown_from_null_is_add() {
    let new = Value::object([("name", Value::unknown())]);
    let result = diff(&schema(), &Value::null(), &new).unwrap();
    assert_eq!(result.get("name").unwrap().kind, DiffKind::Add);
}

#[test]
fn test_unknown_set_element_diffs_whole_set() {
    let old = Value::object([("keys", Value::set(strings(&["a", "b"])).unwrap())]);
    let new = Value::object([(
        "keys",
        Value::set(vec![Value::string("a"), Value::unknown()]).unwrap(),
    )]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(kinds(&result), vec![("keys".to_string(), DiffKind::Update)]);
}

#[test]
fn test_singleton_empty_and_populated() {
    let empty = Value::object([("config", Value::list(vec![]))]);
    let populated = Value::object([(
        "config",
        Value::list(vec![Value::object([("size", Value::int(10))])]),
    )]);

    let added = diff(&schema(), &empty, &populated).unwrap();
    assert_eq!(kinds(&added), vec![("config".to_string(), DiffKind::Add)]);

    let deleted = diff(&schema(), &populated, &empty).unwrap();
    assert_eq!(kinds(&deleted), vec![("config".to_string(), DiffKind::Delete)]);
}

#[test]
fn test_singleton_nested_change_has_no_index() {
    let old = Value::object([(
        "config",
        Value::list(vec![Value::object([("size", Value::int(10))])]),
    )]);
    // Collapsed form on one side compares equal to the wrapped form.
    let new = Value::object([("config", Value::object([("size", Value::int(20))]))]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(kinds(&result), vec![("config.size".to_string(), DiffKind::Update)]);
}

#[test]
fn test_singleton_with_two_elements_is_invalid() {
    let bad = Value::object([(
        "config",
        Value::list(vec![
            Value::object([("size", Value::int(1))]),
            Value::object([("size", Value::int(2))]),
        ]),
    )]);
    let err = diff(&schema(), &Value::null(), &bad).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue(_)));
}

#[test]
fn test_shape_mismatch_is_an_error() {
    let old = Value::object([("name", Value::string("web"))]);
    let new = Value::object([("name", Value::list(strings(&["web"])))]);
    let err = diff(&schema(), &old, &new).unwrap_err();
    match err {
        BridgeError::UnexpectedType { path, expected, got } => {
            assert_eq!(path, "name");
            assert_eq!(expected, "string");
            assert_eq!(got, "list");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_root_must_be_an_object() {
    let err = diff(&schema(), &Value::null(), &Value::string("x")).unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedType { .. }));

    let err = diff(&schema(), &Value::null(), &Value::unknown()).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue(_)));
}

#[test]
fn test_reserved_keys_are_skipped() {
    let old = Value::object([("__meta", Value::string("a"))]);
    let new = Value::object([("__meta", Value::string("b"))]);
    assert!(diff(&schema(), &old, &new).unwrap().is_empty());
}

#[test]
fn test_schemaless_field_is_diffed_whole() {
    let old = Value::object([(
        "extra",
        Value::map([("a", Value::int(1)), ("b", Value::int(2))]),
    )]);
    let new = Value::object([(
        "extra",
        Value::map([("a", Value::int(9)), ("b", Value::int(2))]),
    )]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(kinds(&result), vec![("extra".to_string(), DiffKind::Update)]);

    let gone = diff(&schema(), &old, &Value::object(Vec::<(String, Value)>::new())).unwrap();
    assert_eq!(kinds(&gone), vec![("extra".to_string(), DiffKind::Delete)]);
}

#[test]
fn test_changed_keys() {
    let old = Value::object([
        ("name", Value::string("a")),
        ("tags", Value::map([("env", Value::string("dev"))])),
    ]);
    let new = Value::object([
        ("name", Value::string("b")),
        ("tags", Value::map([("env", Value::string("prod"))])),
    ]);
    let result = diff(&schema(), &old, &new).unwrap();
    assert_eq!(
        result.changed_keys().into_iter().collect::<Vec<_>>(),
        vec!["name", "tags"]
    );
    assert!(result.replaced_keys().is_empty());
}
