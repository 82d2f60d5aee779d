//! Type-directed transformation engine
//!
//! [`ClassTransformer`] is the caller-facing entry point. Each call builds a
//! fresh [`TransformOperationExecutor`] (and with it a fresh reference guard)
//! over a shared [`MetadataRegistry`], so independent conversions never
//! interfere.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub mod executor;
pub mod exposure;
pub mod guard;
pub mod options;
pub mod resolver;


pub use executor::TransformOperationExecutor;
pub use exposure::ExposureFilter;
pub use guard::ReferenceGuard;
pub use options::{Strategy, TransformationOptions};
pub use resolver::{coerce_primitive, ObjectPlan, TargetSpec, TypeResolver};

use crate::error::{Error, Result};
use crate::metadata::MetadataRegistry;
use crate::types::{ClassId, Direction, TypeRef};
use crate::value::Value;

/// Converts values against the rules of one registry
#[derive(Clone, Copy)]
pub struct ClassTransformer<'r> {
    registry: &'r MetadataRegistry,
}

impl ClassTransformer<'static> {
    /// Transformer over the process-wide registry
    pub fn global() -> Self {
        Self::new(MetadataRegistry::global())
    }
}

impl<'r> ClassTransformer<'r> {
    pub fn new(registry: &'r MetadataRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r MetadataRegistry {
        self.registry
    }

    /// Plain data into instances of `class`; a root array converts
    /// element-wise
    #[tracing::instrument(level = "debug", skip_all, fields(class = %class))]
    pub fn plain_to_class(&self, class: ClassId, plain: &Value, options: &TransformationOptions) -> Result<Value> {
        self.run(Direction::PlainToClass, plain, Some(&TypeRef::Class(class)), options)
    }

    /// Assign plain data onto an existing instance, returning that instance
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn plain_to_class_from_exist(
        &self,
        instance: &Value,
        plain: &Value,
        options: &TransformationOptions,
    ) -> Result<Value> {
        TransformOperationExecutor::new(self.registry, Direction::PlainToClass, options)
            .execute_into(instance, plain)
    }

    /// Instances into plain data, using each instance's own class rules
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn class_to_plain(&self, value: &Value, options: &TransformationOptions) -> Result<Value> {
        self.run(Direction::ClassToPlain, value, None, options)
    }

    /// Deep copy of instances, keeping their classes
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn class_to_class(&self, value: &Value, options: &TransformationOptions) -> Result<Value> {
        self.run(Direction::ClassToClass, value, None, options)
    }

    /// Convert into `class`, picking the direction from the source: a class
    /// instance (or an array whose first member is one) is retyped, anything
    /// else is treated as plain data
    #[tracing::instrument(level = "debug", skip_all, fields(class = %class))]
    pub fn to_class(&self, class: ClassId, value: &Value, options: &TransformationOptions) -> Result<Value> {
        let direction = if holds_instances(value) {
            Direction::ClassToClass
        } else {
            Direction::PlainToClass
        };
        self.run(direction, value, Some(&TypeRef::Class(class)), options)
    }

    /// Convert to plain data and render it as a JSON string
    pub fn serialize(&self, value: &Value, options: &TransformationOptions) -> Result<String> {
        let plain = self.class_to_plain(value, options)?;
        Ok(serde_json::to_string(&plain.to_json()?)?)
    }

    /// Parse a JSON string and convert it into `class`
    pub fn deserialize(&self, class: ClassId, json: &str, options: &TransformationOptions) -> Result<Value> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        self.plain_to_class(class, &Value::from(parsed), options)
    }

    /// Parse a JSON array and convert every member into `class`
    pub fn deserialize_array(&self, class: ClassId, json: &str, options: &TransformationOptions) -> Result<Value> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        if !parsed.is_array() {
            return Err(Error::Unsupported {
                message: "expected a JSON array at the document root".to_string(),
                feature: Some("deserialize_array".to_string()),
            });
        }
        self.plain_to_class(class, &Value::from(parsed), options)
    }

    fn run(
        &self,
        direction: Direction,
        value: &Value,
        target: Option<&TypeRef>,
        options: &TransformationOptions,
    ) -> Result<Value> {
        log::trace!("Starting {} conversion of a {}", direction, value.kind());
        TransformOperationExecutor::new(self.registry, direction, options).execute(value, target)
    }
}

fn holds_instances(value: &Value) -> bool {
    match value {
        Value::Array(_) | Value::Set(_) => value
            .items()
            .and_then(|items| items.first().map(Value::is_instance))
            .unwrap_or(false),
        other => other.is_instance(),
    }
}
