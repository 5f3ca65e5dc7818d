use behave_api_core::{value_from_json, PointerTemplate, Value, ValueKind};
use serde_json::json;

#[test]
fn expected_value_documents_cover_every_kind() {
    let cases = [
        (json!(true), ValueKind::Bool),
        (json!({ "int": -4 }), ValueKind::Int),
        (json!(0.25), ValueKind::Float),
        (json!([1, 2]), ValueKind::Vec2),
        (json!([1, 2, 3]), ValueKind::Vec3),
        (json!([1, 2, 3, 4]), ValueKind::Vec4),
        (json!({ "quat": [0, 0, 0, 1] }), ValueKind::Quat),
        (json!({ "type": "mat4", "data": Value::IDENTITY_MAT4 }), ValueKind::Mat4),
    ];
    for (doc, kind) in cases {
        let value = value_from_json(&doc).unwrap_or_else(|e| panic!("{doc}: {e}"));
        assert_eq!(value.kind(), kind, "{doc}");
    }
}

#[test]
fn canonical_values_round_trip_through_serde() {
    let value = Value::quat(0.0, 0.0, 0.5, 0.5);
    let doc = serde_json::to_value(&value).expect("serialize");
    assert_eq!(doc["type"], "quat");
    assert_eq!(value_from_json(&doc).expect("parse"), value);
}

#[test]
fn marker_pointer_resolves_per_node() {
    let template =
        PointerTemplate::parse("/nodes/{nodeIndex}/extensions/KHR_node_visibility/visible")
            .expect("template");
    assert_eq!(template.params().collect::<Vec<_>>(), ["nodeIndex"]);
    assert_eq!(
        template.resolve(&[("nodeIndex", 12)]).expect("resolve"),
        "/nodes/12/extensions/KHR_node_visibility/visible"
    );
    assert_eq!(
        template.to_string(),
        "/nodes/{nodeIndex}/extensions/KHR_node_visibility/visible"
    );
}
