//! Metadata registry: class definitions and per-property conversion rules
//!
//! Classes are declared once, usually at start-up, through
//! [`MetadataRegistry::define_class`] or a declarative schema. Conversions
//! then only read from the registry.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod registry;
pub mod rules;

#[cfg(test)]
mod tests;

pub use builder::ClassBuilder;
pub use registry::{ClassDef, MetadataRegistry};
pub use rules::{
    Discriminator, ExcludeRule, ExposeRule, PropertyRule, Scope, SubType, TransformArgs,
    TransformFn, TransformStage, TransformStep, TypeFactory, TypeHint,
};
