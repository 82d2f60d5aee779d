//! Integration test for the process-wide registry and the free functions
//!
//! Kept to a single test so nothing else in this binary touches the
//! global registry concurrently.

use serde_json::json;
use shapeshift_core::{
    built_in, class_to_class, class_to_plain, deserialize, deserialize_array, plain_to_class,
    plain_to_class_from_exist, serialize, to_class, ClassTransformer, Error, ExposeRule,
    MetadataRegistry, TransformationOptions, TypeRef, Value,
};

#[test]
fn test_global_registry_end_to_end() {
    let registry = MetadataRegistry::global();
    let user = registry
        .define_class("User")
        .property("id", TypeRef::Number)
        .property("name", TypeRef::String)
        .expose("name", ExposeRule::new().name("user_name"))
        .transform("name", built_in::trim().to_class_only())
        .build();
    let options = TransformationOptions::default();

    let plain = Value::from(json!({"id": 7, "user_name": "  Sonya "}));
    let instance = plain_to_class(user, &plain, &options).unwrap();
    assert_eq!(instance.get("name"), Some(Value::from("Sonya")));

    let back = class_to_plain(&instance, &options).unwrap();
    assert_eq!(back.to_json().unwrap(), json!({"id": 7, "user_name": "Sonya"}));

    let copy = class_to_class(&instance, &options).unwrap();
    assert_eq!(copy, instance);
    assert!(!copy.ptr_eq(&instance));

    // to_class picks the direction from the input
    let from_plain = to_class(user, &plain, &options).unwrap();
    assert_eq!(from_plain.get("name"), Some(Value::from("Sonya")));
    let from_instance = to_class(user, &instance, &options).unwrap();
    assert!(!from_instance.ptr_eq(&instance));

    let existing = Value::instance_with(user, [("id", Value::from(1))]);
    let updated = plain_to_class_from_exist(&existing, &Value::from(json!({"user_name": "Kano"})), &options)
        .unwrap();
    assert!(updated.ptr_eq(&existing));
    assert_eq!(existing.get("id"), Some(Value::from(1)));
    assert_eq!(existing.get("name"), Some(Value::from("Kano")));

    let text = serialize(&instance, &options).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, json!({"id": 7, "user_name": "Sonya"}));

    let restored = deserialize(user, &text, &options).unwrap();
    assert_eq!(restored, instance);

    let list = deserialize_array(user, r#"[{"id": 1}, {"id": 2}]"#, &options).unwrap();
    let items = list.items().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.class_id() == Some(user)));
    assert!(matches!(
        deserialize_array(user, r#"{"id": 1}"#, &options),
        Err(Error::Unsupported { .. })
    ));

    // The global transformer and the free functions share one registry
    assert!(std::ptr::eq(ClassTransformer::global().registry(), registry));
    assert_eq!(registry.class_by_name("User"), Some(user));

    registry.clear();
    assert_eq!(registry.class_count(), 0);
    assert_eq!(registry.class_by_name("User"), None);
}
