//! Core type descriptors for the Shapeshift engine
//!
//! This module defines class identity, the type references used by
//! declarations and type hints, and the conversion direction tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a registered class
///
/// Identities are process-unique and never reused, even after a registry
/// is cleared, so classes defined by independent registries never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    pub(crate) fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric identity
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Declared or target type of a property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeRef {
    /// Unknown or unconstrained
    #[default]
    Any,
    String,
    Number,
    Boolean,
    Date,
    Bytes,
    /// Instance of a registered class
    Class(ClassId),
    Array(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>),
}

impl TypeRef {
    /// Shorthand for `TypeRef::Array(Box::new(inner))`
    pub fn array_of(inner: TypeRef) -> Self {
        TypeRef::Array(Box::new(inner))
    }

    /// Shorthand for `TypeRef::Set(Box::new(inner))`
    pub fn set_of(inner: TypeRef) -> Self {
        TypeRef::Set(Box::new(inner))
    }

    /// Shorthand for `TypeRef::Map(Box::new(inner))`
    pub fn map_of(inner: TypeRef) -> Self {
        TypeRef::Map(Box::new(inner))
    }

    /// Whether this names a scalar type that coercion can target
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::String | TypeRef::Number | TypeRef::Boolean | TypeRef::Date | TypeRef::Bytes
        )
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeRef::Any)
    }

    /// The class this type names, if any
    pub fn class(&self) -> Option<ClassId> {
        match self {
            TypeRef::Class(id) => Some(*id),
            _ => None,
        }
    }

    /// Element type used for sequence and map members.
    ///
    /// Container types yield their member type; any other type is taken to
    /// describe the members themselves.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Array(inner) | TypeRef::Set(inner) | TypeRef::Map(inner) => inner,
            other => other,
        }
    }
}

/// Which conversion is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Plain data into class instances
    PlainToClass,
    /// Class instances into plain data
    ClassToPlain,
    /// Class instances into new class instances
    ClassToClass,
}

impl Direction {
    /// Whether output objects are class instances
    pub fn produces_instances(&self) -> bool {
        !matches!(self, Direction::ClassToPlain)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::PlainToClass => write!(f, "plain_to_class"),
            Direction::ClassToPlain => write!(f, "class_to_plain"),
            Direction::ClassToClass => write!(f, "class_to_class"),
        }
    }
}

/// Direction scope of a declaration (exposure, exclusion, transform step)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDirection {
    #[default]
    Both,
    /// Only when producing plain output
    ToPlainOnly,
    /// Only when producing class instances (plain-to-class and class-to-class)
    ToClassOnly,
}

impl RuleDirection {
    /// Whether a declaration with this scope applies to `direction`
    pub fn applies_to(&self, direction: Direction) -> bool {
        match self {
            RuleDirection::Both => true,
            RuleDirection::ToPlainOnly => direction == Direction::ClassToPlain,
            RuleDirection::ToClassOnly => direction != Direction::ClassToPlain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_ids_are_unique() {
        let a = ClassId::next();
        let b = ClassId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_rule_direction_scope() {
        assert!(RuleDirection::Both.applies_to(Direction::ClassToPlain));
        assert!(RuleDirection::ToPlainOnly.applies_to(Direction::ClassToPlain));
        assert!(!RuleDirection::ToPlainOnly.applies_to(Direction::PlainToClass));
        assert!(RuleDirection::ToClassOnly.applies_to(Direction::PlainToClass));
        assert!(RuleDirection::ToClassOnly.applies_to(Direction::ClassToClass));
        assert!(!RuleDirection::ToClassOnly.applies_to(Direction::ClassToPlain));
    }

    #[test]
    fn test_element_type() {
        let hobbies = TypeRef::array_of(TypeRef::String);
        assert_eq!(hobbies.element(), &TypeRef::String);
        assert_eq!(TypeRef::Number.element(), &TypeRef::Number);
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&Direction::PlainToClass).unwrap();
        assert_eq!(json, "\"plain_to_class\"");
        assert_eq!(Direction::ClassToClass.to_string(), "class_to_class");
    }
}
