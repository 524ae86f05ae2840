use pretty_assertions::assert_eq;
use protomap_core::{
    define_mapper, DefinitionError, Encoder, EntryXform, FieldValue, MapError, Mapper, MapperConfig, MapperOptions,
    TransformCatalog,
};
use protomap_test_utils::inspector;
use std::io::Write;

const CONTACTS_TOML: &str = r#"
name = "contacts"
roots = ["Contact"]
key_name = "kebab-case"
enum_value = "lower-kebab-case"
iter_xf = "elide-defaults"

[encoders]
StringValue = "unwrap-value"
"#;

#[test]
fn test_mapper_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(CONTACTS_TOML.as_bytes()).unwrap();

    let mapper = Mapper::from_config_path(inspector(), file.path()).unwrap();
    assert_eq!(mapper.name(), "contacts");

    let contact = mapper.construct("Contact", [("kind", "kind-work"), ("created", "today")]).unwrap();
    let keys: Vec<_> = contact.iter().unwrap().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["kind", "created"]);
}

#[test]
fn test_mapper_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapper.yaml");
    std::fs::write(&path, "name: people\nroots: [Person]\nkey_name: camel-case\n").unwrap();

    let mapper = Mapper::from_config_path(inspector(), &path).unwrap();
    assert_eq!(mapper.roots().iter().map(|r| &**r).collect::<Vec<_>>(), vec!["Person"]);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Mapper::from_config_path(inspector(), dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, MapError::Config(_)));
}

#[test]
fn test_unknown_transform_name() {
    let mut config = MapperConfig::new("contacts", vec!["Contact".to_string()]);
    config.key_name = "shouty-case".to_string();
    let err = Mapper::from_config(inspector(), &config).unwrap_err();
    assert!(matches!(err, DefinitionError::UnresolvedFunction { ref name, .. } if name == "shouty-case"));
}

#[test]
fn test_custom_catalog() {
    let mut catalog = TransformCatalog::builtin();
    catalog.register_name_fn("upper", |name: &str| name.to_uppercase());
    let mut config = MapperConfig::new("people", vec!["Person".to_string()]);
    config.key_name = "upper".to_string();

    let mapper = Mapper::from_config_with_catalog(inspector(), &config, catalog).unwrap();
    let person = mapper.construct("Person", [("NAME", "Ann")]).unwrap();
    assert_eq!(person.get("NAME").unwrap().as_str(), Some("Ann"));
}

#[test]
fn test_config_serializes_back() {
    let config = MapperConfig::from_toml_str(CONTACTS_TOML).unwrap();
    let text = toml::to_string(&config).unwrap();
    assert_eq!(MapperConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_inline_options() {
    let upper = Encoder::new(
        |value| Ok(value.get("value")?.as_str().map(str::to_uppercase).into()),
        |input, transient| transient.assoc("value", input),
    );
    let mapper = define_mapper(
        "contacts",
        inspector(),
        &["Contact"],
        MapperOptions::new()
            .with_encoder_fn("StringValue", upper)
            .with_iter_xf_fn(EntryXform::filter(|key, _| key.starts_with('c'))),
    )
    .unwrap();
    let contact = mapper.construct("Contact", [("created", "today")]).unwrap();
    let entries: Vec<_> = contact.iter().unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1, FieldValue::from("TODAY"));
}

#[test]
fn test_definition_errors() {
    let err = define_mapper("m", inspector(), &["Kind"], MapperOptions::new()).unwrap_err();
    assert!(matches!(err, DefinitionError::NotAMessage(ref name) if name == "Kind"));

    let err = define_mapper("m", inspector(), &["Person"], MapperOptions::new().with_key_name_fn(|_| String::new()))
        .unwrap_err();
    assert!(matches!(err, DefinitionError::EmptyKey { .. }));

    let err = define_mapper("m", inspector(), &["Person"], MapperOptions::new().with_key_name_fn(|_| "x".to_string()))
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DuplicateKey { ref key, .. } if key == "x"));

    let err = define_mapper(
        "m",
        inspector(),
        &["Contact"],
        MapperOptions::new().with_enum_value_fn(|_| "same".to_string()),
    )
    .unwrap_err();
    assert!(matches!(err, DefinitionError::DuplicateEnumName { .. }));

    let err = define_mapper("m", inspector(), &["Contact"], MapperOptions::new().with_iter_xf("sorted")).unwrap_err();
    assert!(matches!(err, DefinitionError::UnresolvedFunction { .. }));
}
