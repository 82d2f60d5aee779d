//! Declarative class schema documents
//!
//! A schema document lists classes with their parents, declared property
//! types and property rules. Registering a document performs the same
//! registry calls a hand-written [`ClassBuilder`](crate::ClassBuilder)
//! chain would.
//!
//! ```yaml
//! classes:
//!   - name: User
//!     properties:
//!       name:
//!         type: string
//!         expose: { name: user_name }
//!         transforms:
//!           - use: to_upper_case
//!             direction: to_class_only
//!       password:
//!         exclude: { direction: to_plain_only }
//! ```

use super::type_expr::parse_type;
use crate::error::{Error, Result};
use crate::metadata::{
    Discriminator, ExcludeRule, ExposeRule, MetadataRegistry, PropertyRule, Scope, TransformStage,
    TypeHint,
};
use crate::transform::{built_in, Strategy};
use crate::types::{ClassId, RuleDirection, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root of a schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDocument {
    pub classes: Vec<ClassSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySchema {
    /// Declared type expression
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<ExposeRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ExcludeRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeHintSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<TransformSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeHintSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorSchema>,
    pub keep_discriminator_property: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorSchema {
    pub property: String,
    /// Tag value to class name
    pub sub_types: IndexMap<String, String>,
}

/// Reference to a built-in transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSchema {
    #[serde(rename = "use")]
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub args: serde_json::Value,
    #[serde(default)]
    pub direction: RuleDirection,
    #[serde(default)]
    pub stage: TransformStage,
    #[serde(flatten)]
    pub scope: Scope,
}

impl SchemaDocument {
    /// Names of the classes this document defines, in order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|class| class.name.as_str()).collect()
    }

    /// Define every class of the document in `registry`.
    ///
    /// Class names resolve against the document first, then against
    /// classes already in the registry. Returns the identities of the
    /// classes defined here, by name.
    pub fn register_into(&self, registry: &MetadataRegistry) -> Result<HashMap<String, ClassId>> {
        let mut ids: HashMap<String, ClassId> = HashMap::new();
        for class in &self.classes {
            if ids.contains_key(&class.name) {
                return Err(Error::schema(
                    format!("Class '{}' is defined twice", class.name),
                    Some(&class.name),
                ));
            }
            ids.insert(class.name.clone(), registry.define_class(&class.name).build());
        }

        let resolve = |name: &str| ids.get(name).copied().or_else(|| registry.class_by_name(name));

        for class in &self.classes {
            let id = ids[&class.name];
            if let Some(parent) = &class.extends {
                let parent_id = resolve(parent).ok_or_else(|| {
                    Error::schema(format!("Unknown parent class '{}'", parent), Some(&class.name))
                })?;
                registry.set_parent(id, Some(parent_id));
            }
            registry.set_strategy(id, class.strategy);

            for (property, schema) in &class.properties {
                if let Some(expr) = &schema.type_expr {
                    let ty = parse_type(expr, &resolve).map_err(|e| scoped(e, &class.name, property))?;
                    registry.declare_property(id, property.clone(), ty);
                }
                let rule = schema
                    .to_rule(&resolve)
                    .map_err(|e| scoped(e, &class.name, property))?;
                if !rule.is_empty() {
                    registry.register(id, property.clone(), rule);
                }
            }
        }

        log::debug!("Registered {} classes from schema", ids.len());
        Ok(ids)
    }
}

impl PropertySchema {
    fn to_rule(&self, resolve: &dyn Fn(&str) -> Option<ClassId>) -> Result<PropertyRule> {
        let mut rule = PropertyRule::new();
        rule.exposure = self.expose.clone();
        rule.exclusion = self.exclude;

        if let Some(hint) = &self.type_hint {
            rule.type_hint = Some(hint.to_hint(resolve)?);
        }
        for transform in &self.transforms {
            let step = built_in::by_name(&transform.name, &transform.args)?
                .direction(transform.direction)
                .scope(transform.scope.clone())
                .stage(transform.stage);
            rule.transforms.push(step);
        }
        Ok(rule)
    }
}

impl TypeHintSchema {
    fn to_hint(&self, resolve: &dyn Fn(&str) -> Option<ClassId>) -> Result<TypeHint> {
        let ty = match &self.type_expr {
            Some(expr) => parse_type(expr, resolve)?,
            None => TypeRef::Any,
        };
        let mut hint = TypeHint::of(ty).keep_discriminator_property(self.keep_discriminator_property);

        if let Some(schema) = &self.discriminator {
            let mut discriminator = Discriminator::new(&schema.property);
            for (tag, class_name) in &schema.sub_types {
                let class = resolve(class_name).ok_or_else(|| Error::UnknownClass {
                    name: class_name.clone(),
                })?;
                discriminator = discriminator.sub_type(tag, class);
            }
            hint = hint.discriminator(discriminator);
        }
        Ok(hint)
    }
}

// Attach the class and property to errors raised while reading a property
fn scoped(error: Error, class: &str, property: &str) -> Error {
    match error {
        Error::Schema { message, .. } => Error::schema(format!("{}.{}: {}", class, property, message), Some(class)),
        Error::UnknownClass { name } => Error::schema(
            format!("{}.{}: unknown class '{}'", class, property, name),
            Some(class),
        ),
        other => other,
    }
}
