//! Dictionaries delivered as JSON by the database layer.

use std::sync::Arc;

use detgeo_core::{DenseIndex, EdgeBehavior, SchemaError};
use detgeo_ident::{DictionarySchema, IdentifierConfig, IdentifierHelper, RangeDictionary};
use detgeo_test_utils::barrel_endcap_schema;

const STRIP_SCHEMA: &str = r#"{
    "fields": [
        { "name": "part" },
        { "name": "ring", "bits": 4 },
        { "name": "sector", "edge": "wrap" }
    ],
    "regions": [
        { "ranges": [ { "bounded": { "min": 0, "max": 0 } },
                      { "enumerated": [3, 1, 3] },
                      { "bounded": { "min": 0, "max": 5 } } ] }
    ]
}"#;

#[test]
fn json_schema_builds_a_helper() {
    let schema: DictionarySchema = serde_json::from_str(STRIP_SCHEMA).unwrap();
    assert_eq!(schema.fields[1].bits, Some(4));
    assert_eq!(schema.fields[2].edge, EdgeBehavior::Wrap);
    assert_eq!(schema.fields[0].edge, EdgeBehavior::Absorb);

    let dict = Arc::new(RangeDictionary::from_schema(schema).unwrap());
    let helper =
        IdentifierHelper::new(dict, IdentifierConfig::new("sector").eta("ring").phi("sector"))
            .unwrap();
    assert_eq!(helper.len(), 2 * 6);
    assert_eq!(helper.codec(1).unwrap().width(), 4);

    let first = helper.hash_of(helper.compose(&[0, 1, 0]).unwrap()).unwrap();
    let outer = helper.hash_of(helper.compose(&[0, 3, 0]).unwrap()).unwrap();
    assert_eq!(first, DenseIndex(0));
    assert_eq!(helper.next_eta(first), Some(outer));
    let wrapped = helper.hash_of(helper.compose(&[0, 1, 5]).unwrap()).unwrap();
    assert_eq!(helper.prev_phi(first), Some(wrapped));
}

#[test]
fn fixture_schema_survives_json() {
    let schema = barrel_endcap_schema();
    let text = serde_json::to_string_pretty(&schema).unwrap();
    let back: DictionarySchema = serde_json::from_str(&text).unwrap();
    assert_eq!(back, schema);
    assert!(text.contains("\"wrap\""));
}

#[test]
fn invalid_json_schemas_are_rejected() {
    let no_fields: DictionarySchema =
        serde_json::from_str(r#"{"fields": [], "regions": []}"#).unwrap();
    assert_eq!(
        RangeDictionary::from_schema(no_fields).unwrap_err(),
        SchemaError::NoFields
    );

    let empty = r#"{
        "fields": [ { "name": "a" } ],
        "regions": [ { "ranges": [ { "bounded": { "min": 3, "max": 1 } } ] } ]
    }"#;
    let schema: DictionarySchema = serde_json::from_str(empty).unwrap();
    assert!(matches!(
        RangeDictionary::from_schema(schema),
        Err(SchemaError::EmptyRange { region: 0, .. })
    ));
}
