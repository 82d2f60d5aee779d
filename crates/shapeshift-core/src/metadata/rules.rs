//! Per-property conversion rules
//!
//! A [`PropertyRule`] describes everything the engine knows about one
//! property of one class: its exposure marking, exclusion, transform steps
//! and nested type hint. The same type doubles as the partial rule passed to
//! [`MetadataRegistry::register`](super::MetadataRegistry::register), where
//! [`PropertyRule::merge`] accumulates independent declarations.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::transform::TransformationOptions;
use crate::types::{ClassId, Direction, RuleDirection, TypeRef};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Group and version predicate shared by exposure markings and transform steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scope {
    pub groups: Vec<String>,
    /// Inclusive lower version bound
    pub since: Option<f64>,
    /// Exclusive upper version bound
    pub until: Option<f64>,
}

impl Scope {
    /// Whether both the version and group predicates pass for `options`
    pub fn admits(&self, options: &TransformationOptions) -> bool {
        self.admits_version(options.version) && self.admits_groups(&options.groups)
    }

    /// Version bounds only apply when a version was requested
    pub fn admits_version(&self, version: Option<f64>) -> bool {
        let Some(version) = version else {
            return true;
        };
        self.since.map_or(true, |since| since <= version)
            && self.until.map_or(true, |until| version < until)
    }

    /// Untagged scopes admit any request
    pub fn admits_groups(&self, requested: &BTreeSet<String>) -> bool {
        self.groups.is_empty() || self.groups.iter().any(|group| requested.contains(group))
    }

    fn overlay(&mut self, other: Scope) {
        for group in other.groups {
            if !self.groups.contains(&group) {
                self.groups.push(group);
            }
        }
        if other.since.is_some() {
            self.since = other.since;
        }
        if other.until.is_some() {
            self.until = other.until;
        }
    }
}

/// Explicit exposure marking, optionally aliased and scoped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposeRule {
    /// Key used on the plain side instead of the property name
    pub name: Option<String>,
    pub direction: RuleDirection,
    #[serde(flatten)]
    pub scope: Scope,
}

impl ExposeRule {
    /// An empty marking: exposed under its own name in both directions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn since(mut self, version: f64) -> Self {
        self.scope.since = Some(version);
        self
    }

    pub fn until(mut self, version: f64) -> Self {
        self.scope.until = Some(version);
        self
    }

    pub fn to_plain_only(mut self) -> Self {
        self.direction = RuleDirection::ToPlainOnly;
        self
    }

    pub fn to_class_only(mut self) -> Self {
        self.direction = RuleDirection::ToClassOnly;
        self
    }

    fn overlay(&mut self, other: ExposeRule) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.direction != RuleDirection::Both {
            self.direction = other.direction;
        }
        self.scope.overlay(other.scope);
    }
}

/// Exclusion marking; always wins over the exposure strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRule {
    pub direction: RuleDirection,
}

impl ExcludeRule {
    /// Excluded in every direction
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_plain_only(mut self) -> Self {
        self.direction = RuleDirection::ToPlainOnly;
        self
    }

    pub fn to_class_only(mut self) -> Self {
        self.direction = RuleDirection::ToClassOnly;
        self
    }
}

/// Arguments handed to a transform function
#[derive(Clone, Copy)]
pub struct TransformArgs<'a> {
    /// Current value: the previous step's output, or the property value
    pub value: &'a Value,
    /// Property name being converted
    pub key: &'a str,
    /// The whole source container the property was read from
    pub obj: &'a Value,
    pub direction: Direction,
    pub options: &'a TransformationOptions,
}

/// A user-supplied conversion function
pub type TransformFn = Arc<dyn Fn(TransformArgs<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// When a transform step runs relative to the nested type conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    /// Sees the raw source value; its output is then converted
    #[default]
    BeforeConversion,
    /// Sees the already converted value; its output is final
    AfterConversion,
}

/// One custom conversion step attached to a property
#[derive(Clone)]
pub struct TransformStep {
    name: String,
    func: TransformFn,
    pub direction: RuleDirection,
    pub scope: Scope,
    pub stage: TransformStage,
}

impl TransformStep {
    /// Anonymous step from a closure
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(TransformArgs<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::named("custom", func)
    }

    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(TransformArgs<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::from_fn(name, Arc::new(func))
    }

    pub fn from_fn(name: impl Into<String>, func: TransformFn) -> Self {
        Self {
            name: name.into(),
            func,
            direction: RuleDirection::Both,
            scope: Scope::default(),
            stage: TransformStage::default(),
        }
    }

    /// Step that only looks at the current value
    pub fn on_value<F>(func: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(move |args| func(args.value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_plain_only(mut self) -> Self {
        self.direction = RuleDirection::ToPlainOnly;
        self
    }

    pub fn to_class_only(mut self) -> Self {
        self.direction = RuleDirection::ToClassOnly;
        self
    }

    pub fn direction(mut self, direction: RuleDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn since(mut self, version: f64) -> Self {
        self.scope.since = Some(version);
        self
    }

    pub fn until(mut self, version: f64) -> Self {
        self.scope.until = Some(version);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn stage(mut self, stage: TransformStage) -> Self {
        self.stage = stage;
        self
    }

    /// Run after the nested type conversion instead of before it
    pub fn after_conversion(self) -> Self {
        self.stage(TransformStage::AfterConversion)
    }

    /// Whether this step runs for `direction` under `options`
    pub fn applies(&self, direction: Direction, options: &TransformationOptions) -> bool {
        self.direction.applies_to(direction) && self.scope.admits(options)
    }

    pub fn apply(&self, args: TransformArgs<'_>) -> anyhow::Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStep")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("scope", &self.scope)
            .field("stage", &self.stage)
            .finish()
    }
}

/// Produces the default target type of a nested property
pub type TypeFactory = Arc<dyn Fn() -> TypeRef + Send + Sync>;

/// One candidate of a discriminated property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubType {
    /// Tag value stored in the discriminator field
    pub name: String,
    pub class: ClassId,
}

/// Value-dependent subtype selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    /// Field of the source object holding the tag
    pub property: String,
    pub sub_types: Vec<SubType>,
}

impl Discriminator {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            sub_types: Vec::new(),
        }
    }

    pub fn sub_type(mut self, name: impl Into<String>, class: ClassId) -> Self {
        self.sub_types.push(SubType {
            name: name.into(),
            class,
        });
        self
    }

    /// Class registered for a tag value
    pub fn class_for(&self, name: &str) -> Option<ClassId> {
        self.sub_types
            .iter()
            .find(|sub| sub.name == name)
            .map(|sub| sub.class)
    }

    /// Tag value registered for a class
    pub fn name_for(&self, class: ClassId) -> Option<&str> {
        self.sub_types
            .iter()
            .find(|sub| sub.class == class)
            .map(|sub| sub.name.as_str())
    }
}

/// Explicit nested type declaration, overriding the declared type
#[derive(Clone)]
pub struct TypeHint {
    factory: TypeFactory,
    discriminator: Option<Discriminator>,
    keep_discriminator_property: bool,
}

impl TypeHint {
    /// Hint whose type is computed lazily, e.g. to reference a class
    /// defined later
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> TypeRef + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            discriminator: None,
            keep_discriminator_property: false,
        }
    }

    pub fn of(ty: TypeRef) -> Self {
        Self::new(move || ty.clone())
    }

    pub fn class(class: ClassId) -> Self {
        Self::of(TypeRef::Class(class))
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn keep_discriminator_property(mut self, keep: bool) -> Self {
        self.keep_discriminator_property = keep;
        self
    }

    /// Invoke the factory
    pub fn resolve(&self) -> TypeRef {
        (self.factory)()
    }

    pub fn get_discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn keeps_discriminator_property(&self) -> bool {
        self.keep_discriminator_property
    }
}

impl fmt::Debug for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHint")
            .field("type", &self.resolve())
            .field("discriminator", &self.discriminator)
            .field("keep_discriminator_property", &self.keep_discriminator_property)
            .finish()
    }
}

/// All conversion rules of one property
#[derive(Debug, Clone, Default)]
pub struct PropertyRule {
    pub exposure: Option<ExposeRule>,
    pub exclusion: Option<ExcludeRule>,
    /// Declaration order
    pub transforms: Vec<TransformStep>,
    pub type_hint: Option<TypeHint>,
}

impl PropertyRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose(mut self, rule: ExposeRule) -> Self {
        self.exposure = Some(rule);
        self
    }

    pub fn exclude(mut self, rule: ExcludeRule) -> Self {
        self.exclusion = Some(rule);
        self
    }

    pub fn transform(mut self, step: TransformStep) -> Self {
        self.transforms.push(step);
        self
    }

    pub fn type_hint(mut self, hint: TypeHint) -> Self {
        self.type_hint = Some(hint);
        self
    }

    /// Fold a partial rule into this one.
    ///
    /// Transform steps append, exposure fields overlay, exclusion and type
    /// hint replace when the partial rule carries them.
    pub fn merge(&mut self, partial: PropertyRule) {
        if let Some(incoming) = partial.exposure {
            match self.exposure.as_mut() {
                Some(current) => current.overlay(incoming),
                None => self.exposure = Some(incoming),
            }
        }
        if partial.exclusion.is_some() {
            self.exclusion = partial.exclusion;
        }
        if partial.type_hint.is_some() {
            self.type_hint = partial.type_hint;
        }
        self.transforms.extend(partial.transforms);
    }

    /// Alias used on the plain side, if any
    pub fn exposed_name(&self) -> Option<&str> {
        self.exposure.as_ref().and_then(|e| e.name.as_deref())
    }

    /// Exposure marking in effect for `direction`
    pub fn exposure_for(&self, direction: Direction) -> Option<&ExposeRule> {
        self.exposure
            .as_ref()
            .filter(|rule| rule.direction.applies_to(direction))
    }

    pub fn is_excluded_for(&self, direction: Direction) -> bool {
        self.exclusion
            .map(|rule| rule.direction.applies_to(direction))
            .unwrap_or(false)
    }

    /// A rule with no marking at all
    pub fn is_empty(&self) -> bool {
        self.exposure.is_none()
            && self.exclusion.is_none()
            && self.transforms.is_empty()
            && self.type_hint.is_none()
    }
}
