use pretty_assertions::assert_eq;
use proptest::prelude::*;
use protomap_core::{define_mapper, from_plain_map, EntryXform, FieldValue, MapError, Mapper, MapperOptions, PlainValue};
use protomap_test_utils::inspector;
use serde_json::json;

fn contacts() -> Mapper {
    define_mapper(
        "contacts",
        inspector(),
        &["Contact"],
        MapperOptions::new()
            .with_enum_value("lower-kebab-case")
            .with_encoder("StringValue", "unwrap-value"),
    )
    .unwrap()
}

fn sample() -> PlainValue {
    PlainValue::from(json!({
        "id": 12,
        "person": {"name": "Ann", "address": {"city": "Oslo"}},
        "phones": [{"number": "555", "primary": true}],
        "labels": {"home": 1, "work": 2},
        "kind": "kind-work",
        "handle": "@ann",
        "notes": ["a", "b"],
        "avatar": "cafe",
        "score": 4.5,
        "created": "2024-01-01",
        "lookup": {"3": {"city": "Bergen"}}
    }))
}

#[test]
fn test_plain_map_round_trip() {
    let mapper = contacts();
    let value = mapper.from_plain_map("Contact", &sample()).unwrap();
    assert_eq!(value.get("kind").unwrap().as_enum().unwrap().number(), 2);
    assert_eq!(value.get("avatar").unwrap().as_bytes().map(|b| b.to_vec()), Some(vec![0xca, 0xfe]));

    let plain = value.to_plain_map(&EntryXform::elide_defaults()).unwrap();
    assert_eq!(plain.to_json(), sample().to_json());
}

#[test]
fn test_plain_map_without_elision_lists_every_key() {
    let mapper = contacts();
    let value = mapper.from_plain_map("Contact", &PlainValue::from(json!({"id": 1}))).unwrap();
    let plain = value.to_plain_map(&EntryXform::identity()).unwrap();
    let keys: Vec<_> = plain.as_map().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        vec!["id", "person", "phones", "labels", "kind", "handle", "account", "notes", "avatar", "score", "created", "lookup"]
    );
    assert_eq!(plain.get("person"), Some(&PlainValue::Null));
    assert_eq!(plain.get("kind"), Some(&PlainValue::String("kind-unspecified".to_string())));
    assert_eq!(plain.get("notes"), Some(&PlainValue::List(vec![])));
}

#[test]
fn test_elision_applies_at_every_level() {
    let mapper = contacts();
    let value = mapper
        .from_plain_map("Contact", &PlainValue::from(json!({"person": {"name": "Ann"}})))
        .unwrap();
    let plain = value.to_plain_map(&EntryXform::elide_defaults()).unwrap();
    assert_eq!(plain.to_json(), json!({"person": {"name": "Ann"}}));
}

#[test]
fn test_custom_xform_filters_keys() {
    let value = contacts().from_plain_map("Contact", &sample()).unwrap();
    let only_ids = EntryXform::filter(|key, _| key == "id");
    assert_eq!(value.to_plain_map(&only_ids).unwrap().to_json(), json!({"id": 12}));
}

#[test]
fn test_nulls_are_skipped() {
    let mapper = contacts();
    let value = mapper.from_plain_map("Contact", &PlainValue::from(json!({"person": null, "id": 3}))).unwrap();
    assert!(!value.has_field("person").unwrap());
    assert_eq!(value.get("id").unwrap(), FieldValue::U64(3));
}

#[test]
fn test_undeclared_keys_are_rejected() {
    let err = from_plain_map(&contacts(), "Contact", &PlainValue::from(json!({"nickname": "x"}))).unwrap_err();
    assert!(matches!(err, MapError::SchemaViolation { ref key, .. } if key == "nickname"));

    let err = contacts()
        .from_plain_map("Contact", &PlainValue::from(json!({"person": {"age": 3}})))
        .unwrap_err();
    assert!(matches!(err, MapError::SchemaViolation { ref schema, .. } if schema == "Person"));
}

#[test]
fn test_shape_mismatches_are_rejected() {
    let mapper = contacts();
    for bad in [json!({"notes": "a"}), json!({"labels": [1]}), json!({"person": "Ann"}), json!({"avatar": "zz"})] {
        let err = mapper.from_plain_map("Contact", &PlainValue::from(bad.clone())).unwrap_err();
        assert!(matches!(err, MapError::SchemaViolation { .. }), "{bad}");
    }
    assert!(matches!(
        mapper.from_plain_map("Contact", &PlainValue::from(json!([1]))),
        Err(MapError::SchemaViolation { .. })
    ));
}

#[test]
fn test_large_unsigned_values() {
    let mapper = contacts();
    let value = mapper.from_plain_map("Contact", &PlainValue::from(json!({"id": u64::MAX}))).unwrap();
    let plain = value.to_plain_map(&EntryXform::elide_defaults()).unwrap();
    assert_eq!(plain.get("id"), Some(&PlainValue::UInt(u64::MAX)));
}

proptest! {
    #[test]
    fn prop_people_round_trip(
        name in "[a-zA-Z ]{0,12}",
        email in "[a-z]{0,8}(@[a-z]{1,6})?",
        city in proptest::option::of("[A-Za-z]{1,10}"),
    ) {
        let mapper = contacts();
        let mut json = serde_json::Map::new();
        if !name.is_empty() {
            json.insert("name".to_string(), json!(name));
        }
        if !email.is_empty() {
            json.insert("email".to_string(), json!(email));
        }
        if let Some(city) = &city {
            json.insert("address".to_string(), json!({"city": city}));
        }
        let plain = PlainValue::from(serde_json::Value::Object(json));

        let value = mapper.from_plain_map("Person", &plain).unwrap();
        prop_assert_eq!(value.to_plain_map(&EntryXform::elide_defaults()).unwrap(), plain);
        let decoded = mapper.from_bytes("Person", &value.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_labels_round_trip(labels in proptest::collection::btree_map("[a-z]{1,6}", 1_i32..1000, 0..6)) {
        let mapper = contacts();
        let json = json!({"labels": labels});
        let value = mapper.from_plain_map("Contact", &PlainValue::from(json.clone())).unwrap();
        let plain = value.to_plain_map(&EntryXform::elide_defaults()).unwrap();
        if labels.is_empty() {
            prop_assert_eq!(plain.to_json(), json!({}));
        } else {
            prop_assert_eq!(plain.to_json(), json);
        }
    }
}
