//! Shapeshift Core - Type-directed transformation between plain data and class graphs
//!
//! This crate converts loosely-typed nested data (the shape a JSON parser
//! produces) into object graphs whose classes are described by per-property
//! rules, and back again.
//!
//! # Main Components
//!
//! - **Value Model**: A dynamic value graph with shared, identity-bearing containers
//! - **Metadata Registry**: Class definitions and per-property rules (exposure,
//!   exclusion, transform steps, type hints)
//! - **Transformation Engine**: The exposure filter, type resolver, reference
//!   guard and operation executor behind [`ClassTransformer`]
//! - **Declarative Schemas**: Class definitions loaded from JSON or YAML
//!
//! # Example
//!
//! ```
//! use shapeshift_core::{
//!     built_in, ClassTransformer, ExposeRule, MetadataRegistry, Result,
//!     TransformationOptions, TypeRef, Value,
//! };
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let registry = MetadataRegistry::new();
//!     let user = registry
//!         .define_class("User")
//!         .property("name", TypeRef::String)
//!         .expose("name", ExposeRule::new().name("user_name"))
//!         .transform("name", built_in::to_upper_case().to_class_only())
//!         .build();
//!
//!     let transformer = ClassTransformer::new(&registry);
//!     let options = TransformationOptions::default();
//!     let plain = Value::from(json!({"user_name": "Johny Cage"}));
//!
//!     let instance = transformer.plain_to_class(user, &plain, &options)?;
//!     assert_eq!(instance.get("name"), Some(Value::from("JOHNY CAGE")));
//!
//!     let back = transformer.class_to_plain(&instance, &options)?;
//!     assert_eq!(back.to_json()?, json!({"user_name": "JOHNY CAGE"}));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod error;
pub mod metadata;
pub mod schema;
pub mod transform;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use metadata::{
    ClassBuilder, ClassDef, Discriminator, ExcludeRule, ExposeRule, MetadataRegistry, PropertyRule,
    Scope, SubType, TransformArgs, TransformFn, TransformStage, TransformStep, TypeHint,
};
pub use schema::{load_schema_file, load_schema_into, load_schema_str, SchemaDocument, SchemaFormat};
pub use transform::{
    built_in, ClassTransformer, ExposureFilter, ReferenceGuard, Strategy, TransformOperationExecutor,
    TransformationOptions, TypeResolver,
};
pub use types::{ClassId, Direction, RuleDirection, TypeRef};
pub use value::{Object, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// [`ClassTransformer::plain_to_class`] on the global registry
pub fn plain_to_class(class: ClassId, plain: &Value, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().plain_to_class(class, plain, options)
}

/// [`ClassTransformer::plain_to_class_from_exist`] on the global registry
pub fn plain_to_class_from_exist(instance: &Value, plain: &Value, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().plain_to_class_from_exist(instance, plain, options)
}

/// [`ClassTransformer::class_to_plain`] on the global registry
pub fn class_to_plain(value: &Value, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().class_to_plain(value, options)
}

/// [`ClassTransformer::class_to_class`] on the global registry
pub fn class_to_class(value: &Value, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().class_to_class(value, options)
}

/// [`ClassTransformer::to_class`] on the global registry
pub fn to_class(class: ClassId, value: &Value, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().to_class(class, value, options)
}

/// [`ClassTransformer::serialize`] on the global registry
pub fn serialize(value: &Value, options: &TransformationOptions) -> Result<String> {
    ClassTransformer::global().serialize(value, options)
}

/// [`ClassTransformer::deserialize`] on the global registry
pub fn deserialize(class: ClassId, json: &str, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().deserialize(class, json, options)
}

/// [`ClassTransformer::deserialize_array`] on the global registry
pub fn deserialize_array(class: ClassId, json: &str, options: &TransformationOptions) -> Result<Value> {
    ClassTransformer::global().deserialize_array(class, json, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
