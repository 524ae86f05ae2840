use pretty_assertions::assert_eq;
use protomap_core::{define_mapper, pipe, pipe_cond, when, FieldValue, KeyPath, MapError, Mapper, MapperOptions, Pred, UpdateOp};
use protomap_test_utils::person_inspector;

fn people() -> Mapper {
    define_mapper("people", person_inspector(), &["Person"], MapperOptions::new()).unwrap()
}

#[test]
fn test_pipe_applies_in_order() {
    let mapper = people();
    let person = mapper.construct("Person", [("name", "ann"), ("email", "old@example.com")]).unwrap();
    let ops = [
        UpdateOp::assoc("name", "Ann"),
        UpdateOp::assoc_in("address.city".parse::<KeyPath>().unwrap(), "Oslo"),
        UpdateOp::clear("email"),
        UpdateOp::update("name", |v| FieldValue::from(format!("{}!", v.as_str().unwrap_or_default()))),
    ];
    let updated = pipe(&person, &ops).unwrap();

    assert_eq!(updated.get("name").unwrap().as_str(), Some("Ann!"));
    assert_eq!(updated.get("email").unwrap().as_str(), Some(""));
    assert_eq!(updated.get_in(&"address.city".parse().unwrap()).unwrap().as_str(), Some("Oslo"));
    assert_eq!(person.get("name").unwrap().as_str(), Some("ann"));
}

#[test]
fn test_pipe_with_no_ops_is_identity() {
    let person = people().construct("Person", [("name", "Ann")]).unwrap();
    let ops: [UpdateOp; 0] = [];
    assert_eq!(pipe(&person, &ops).unwrap(), person);
}

#[test]
fn test_pipe_stops_at_first_error() {
    let person = people().empty("Person").unwrap();
    let ops = [UpdateOp::assoc("name", "Ann"), UpdateOp::assoc("age", 3_i32), UpdateOp::clear("name")];
    assert!(matches!(pipe(&person, &ops), Err(MapError::NotFound { ref key, .. }) if key == "age"));
}

#[test]
fn test_assoc_if_sees_earlier_steps() {
    let person = people().empty("Person").unwrap();
    let ops = [
        UpdateOp::assoc("name", "Ann"),
        UpdateOp::assoc_if(|t| t.get("name").map(|v| v.as_str() == Some("Ann")).unwrap_or(false), "email", "ann@x"),
        UpdateOp::assoc_if(|t| t.has_field("address").unwrap_or(false), "email", "never"),
    ];
    let updated = pipe(&person, &ops).unwrap();
    assert_eq!(updated.get("email").unwrap().as_str(), Some("ann@x"));
}

#[test]
fn test_pipe_cond_skips_false_steps() {
    let person = people().construct("Person", [("name", "Ann")]).unwrap();
    let has_email: Pred = when(|t| !t.get("email").map(|v| v.is_default()).unwrap_or(true));
    let always: Pred = when(|_| true);
    let steps = [
        (has_email.clone(), UpdateOp::assoc("name", "Emailed")),
        (always, UpdateOp::assoc("email", "ann@x")),
        (has_email, UpdateOp::assoc_in("address.city".parse::<KeyPath>().unwrap(), "Oslo")),
    ];
    let updated = pipe_cond(&person, &steps).unwrap();
    assert_eq!(updated.get("name").unwrap().as_str(), Some("Ann"));
    assert!(updated.has_field("address").unwrap());
}

#[test]
fn test_transient_snapshots_are_stable() {
    let mapper = people();
    let mut transient = mapper.transient("Person").unwrap().assoc("name", "Ann").unwrap();
    assert!(transient.is_owned());

    let first = transient.snapshot();
    assert!(!transient.is_owned());

    let transient = transient.assoc("name", "Bea").unwrap();
    assert!(transient.is_owned());
    let second = transient.persist();

    assert_eq!(first.get("name").unwrap().as_str(), Some("Ann"));
    assert_eq!(second.get("name").unwrap().as_str(), Some("Bea"));
}

#[test]
fn test_transient_from_value_borrows_until_written() {
    let person = people().construct("Person", [("name", "Ann")]).unwrap();
    let transient = person.transient();
    assert!(!transient.is_owned());
    assert_eq!(transient.get("name").unwrap().as_str(), Some("Ann"));

    let transient = transient.apply(&UpdateOp::clear("name")).unwrap();
    assert!(transient.is_owned());
    assert_eq!(transient.persist(), people().empty("Person").unwrap());
    assert_eq!(person.get("name").unwrap().as_str(), Some("Ann"));
}

#[test]
fn test_update_op_debug_names_keys() {
    let op = UpdateOp::update("name", |v| v);
    assert!(format!("{op:?}").contains("name"));
}
