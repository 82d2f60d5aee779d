//! Fluent declaration of a class and its property rules
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::registry::{ClassDef, MetadataRegistry};
use super::rules::{ExcludeRule, ExposeRule, PropertyRule, TransformStep, TypeHint};
use crate::transform::Strategy;
use crate::types::{ClassId, TypeRef};

/// Builder returned by [`MetadataRegistry::define_class`]
///
/// The class identity is allocated up front so self-referencing properties
/// can name it before [`build`](Self::build):
///
/// ```
/// use shapeshift_core::{MetadataRegistry, TypeRef};
///
/// let registry = MetadataRegistry::new();
/// let builder = registry.define_class("Node");
/// let node = builder.id();
/// builder.property("next", TypeRef::Class(node)).build();
/// assert_eq!(registry.declared_type(node, "next"), Some(TypeRef::Class(node)));
/// ```
pub struct ClassBuilder<'r> {
    registry: &'r MetadataRegistry,
    id: ClassId,
    def: ClassDef,
    rules: Vec<(String, PropertyRule)>,
}

impl<'r> ClassBuilder<'r> {
    pub(crate) fn new(registry: &'r MetadataRegistry, id: ClassId, def: ClassDef) -> Self {
        Self {
            registry,
            id,
            def,
            rules: Vec::new(),
        }
    }

    /// Identity the class will be registered under
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn extends(mut self, parent: ClassId) -> Self {
        self.def.parent = Some(parent);
        self
    }

    /// Declare a property and its type
    pub fn property(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.def.properties.insert(name.into(), ty);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.def.strategy = Some(strategy);
        self
    }

    pub fn expose(self, property: impl Into<String>, rule: ExposeRule) -> Self {
        self.rule(property, PropertyRule::new().expose(rule))
    }

    pub fn exclude(self, property: impl Into<String>, rule: ExcludeRule) -> Self {
        self.rule(property, PropertyRule::new().exclude(rule))
    }

    pub fn transform(self, property: impl Into<String>, step: TransformStep) -> Self {
        self.rule(property, PropertyRule::new().transform(step))
    }

    pub fn type_hint(self, property: impl Into<String>, hint: TypeHint) -> Self {
        self.rule(property, PropertyRule::new().type_hint(hint))
    }

    /// Queue a partial rule; merged in declaration order on build
    pub fn rule(mut self, property: impl Into<String>, rule: PropertyRule) -> Self {
        self.rules.push((property.into(), rule));
        self
    }

    /// Register the class and its rules
    pub fn build(self) -> ClassId {
        let Self {
            registry,
            id,
            def,
            rules,
        } = self;
        registry.insert_class(id, def);
        for (property, rule) in rules {
            registry.register(id, property, rule);
        }
        id
    }
}
