//! Type resolution for nested values and primitive coercion
//!
//! The resolver answers two questions for the executor: which type a
//! property's value should be converted toward, and, for an object-shaped
//! value, which class drives the conversion. Explicit type hints win over
//! declared property types; discriminators pick a subtype from the source
//! value itself.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::metadata::{Discriminator, MetadataRegistry, PropertyRule};
use crate::types::{ClassId, Direction, TypeRef};
use crate::value::{format_number, Object, Value};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Discriminator configuration carried down to object resolution
#[derive(Debug, Clone)]
pub struct DiscriminatorPlan {
    pub discriminator: Discriminator,
    pub keep_property: bool,
}

/// Resolved target of one value
#[derive(Debug, Clone, Default)]
pub struct TargetSpec {
    pub ty: TypeRef,
    /// Whether the type comes from an explicit hint (or the caller) rather
    /// than a declared property type
    pub explicit: bool,
    pub discriminator: Option<DiscriminatorPlan>,
}

impl TargetSpec {
    /// No type information
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of(ty: TypeRef, explicit: bool) -> Self {
        Self {
            ty,
            explicit,
            discriminator: None,
        }
    }

    /// Target of the members of a container with this target
    pub fn element(&self) -> Self {
        Self {
            ty: self.ty.element().clone(),
            explicit: self.explicit,
            discriminator: self.discriminator.clone(),
        }
    }
}

/// How an object-shaped value is converted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPlan {
    /// Class whose rules drive the conversion; `None` copies the object as is
    pub class: Option<ClassId>,
    /// Source key that is not carried over
    pub skip_key: Option<String>,
    /// Field written to the output when the conversion did not produce it
    pub tag: Option<(String, Value)>,
}

impl ObjectPlan {
    pub fn for_class(class: Option<ClassId>) -> Self {
        Self {
            class,
            ..Self::default()
        }
    }
}

/// Resolves target types for one conversion direction
pub struct TypeResolver<'a> {
    registry: &'a MetadataRegistry,
    direction: Direction,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a MetadataRegistry, direction: Direction) -> Self {
        Self { registry, direction }
    }

    /// Target of a property value.
    ///
    /// An explicit hint always applies. Without one, the declared type is
    /// used when producing instances; plain output has no use for it.
    pub fn resolve_property(&self, class: Option<ClassId>, property: &str, rule: &PropertyRule) -> TargetSpec {
        if let Some(hint) = &rule.type_hint {
            return TargetSpec {
                ty: hint.resolve(),
                explicit: true,
                discriminator: hint.get_discriminator().map(|discriminator| DiscriminatorPlan {
                    discriminator: discriminator.clone(),
                    keep_property: hint.keeps_discriminator_property(),
                }),
            };
        }
        if !self.direction.produces_instances() {
            return TargetSpec::any();
        }
        class
            .and_then(|class| self.registry.declared_type(class, property))
            .map(|ty| TargetSpec::of(ty, false))
            .unwrap_or_default()
    }

    /// Plan for an object-shaped source value.
    ///
    /// Returns `None` when a discriminated property matches no subtype and
    /// has no default class; the raw value is then passed through.
    pub fn resolve_object(&self, source: &Object, spec: &TargetSpec) -> Option<ObjectPlan> {
        let target = spec.ty.class();
        let own = source.class();

        let Some(plan) = &spec.discriminator else {
            let class = match self.direction {
                Direction::ClassToClass if !spec.explicit => own.or(target),
                _ => target.or(own),
            };
            return Some(ObjectPlan::for_class(class));
        };

        let discriminator = &plan.discriminator;
        match self.direction {
            Direction::PlainToClass => {
                let raw = source.get(&discriminator.property).cloned();
                let chosen = raw
                    .as_ref()
                    .and_then(Value::as_str)
                    .and_then(|name| discriminator.class_for(name));
                let class = match chosen.or(target).or(own) {
                    Some(class) => class,
                    None => {
                        log::warn!(
                            "No subtype of discriminator '{}' matches {:?} and no default class is set; passing value through",
                            discriminator.property,
                            raw
                        );
                        return None;
                    }
                };
                if chosen.is_none() {
                    log::warn!(
                        "No subtype of discriminator '{}' matches {:?}; using default class {}",
                        discriminator.property,
                        raw,
                        class
                    );
                }
                Some(ObjectPlan {
                    class: Some(class),
                    skip_key: (!plan.keep_property).then(|| discriminator.property.clone()),
                    tag: if plan.keep_property {
                        raw.map(|value| (discriminator.property.clone(), value))
                    } else {
                        None
                    },
                })
            }
            Direction::ClassToPlain => Some(ObjectPlan {
                class: own.or(target),
                skip_key: None,
                tag: own
                    .and_then(|class| discriminator.name_for(class))
                    .map(|name| (discriminator.property.clone(), Value::from(name))),
            }),
            Direction::ClassToClass => Some(ObjectPlan::for_class(own.or(target))),
        }
    }
}

/// Coerce a primitive toward a primitive target type.
///
/// Returns `None` when the value cannot be represented in the target type.
pub fn coerce_primitive(value: &Value, target: &TypeRef) -> Option<Value> {
    match (target, value) {
        (_, value) if value.is_nullish() => None,

        (TypeRef::String, Value::String(_)) => Some(value.clone()),
        (TypeRef::String, Value::Number(n)) => Some(Value::String(format_number(*n))),
        (TypeRef::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (TypeRef::String, Value::Date(date)) => {
            Some(Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)))
        }
        (TypeRef::String, Value::Bytes(bytes)) => String::from_utf8(bytes.clone()).ok().map(Value::String),

        (TypeRef::Number, Value::Number(_)) => Some(value.clone()),
        (TypeRef::Number, Value::String(s)) => parse_number(s).map(Value::Number),
        (TypeRef::Number, Value::Bool(b)) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
        (TypeRef::Number, Value::Date(date)) => Some(Value::Number(date.timestamp_millis() as f64)),

        (TypeRef::Boolean, Value::Bool(_)) => Some(value.clone()),
        (TypeRef::Boolean, Value::String(s)) => parse_bool(s).map(Value::Bool),
        (TypeRef::Boolean, Value::Number(n)) => Some(Value::Bool(*n != 0.0 && !n.is_nan())),

        (TypeRef::Date, Value::Date(_)) => Some(value.clone()),
        (TypeRef::Date, Value::Number(ms)) => millis_to_date(*ms).map(Value::Date),
        (TypeRef::Date, Value::String(s)) => parse_date(s).map(Value::Date),

        (TypeRef::Bytes, Value::Bytes(_)) => Some(value.clone()),
        (TypeRef::Bytes, Value::String(s)) => Some(Value::Bytes(s.as_bytes().to_vec())),

        _ => None,
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

pub(crate) fn millis_to_date(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

/// RFC 3339 first, then a bare `YYYY-MM-DD` at midnight UTC
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
