//! Transformation options
//!
//! The option bag is plain serde data so it can be loaded from JSON, YAML or
//! TOML configuration; every field has a default.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default visibility of properties without an explicit marking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Everything is visible unless excluded
    #[default]
    ExposeAll,
    /// Only explicitly exposed properties are visible
    ExcludeAll,
}

/// Options controlling one conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationOptions {
    pub strategy: Strategy,
    /// Requested groups; group-tagged properties need an intersection
    pub groups: BTreeSet<String>,
    /// Requested version, compared against `since`/`until` bounds
    pub version: Option<f64>,
    /// Drop plain keys that map to no known property (plain-to-class)
    pub exclude_extraneous_values: bool,
    /// Coerce primitives toward declared primitive types
    pub enable_implicit_conversion: bool,
    /// Ignore every marking; type hints still direct nesting
    pub ignore_decorators: bool,
    /// Skip keys starting with any of these prefixes
    pub exclude_prefixes: Vec<String>,
}

impl TransformationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_version(mut self, version: f64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_exclude_extraneous_values(mut self, enabled: bool) -> Self {
        self.exclude_extraneous_values = enabled;
        self
    }

    pub fn with_implicit_conversion(mut self, enabled: bool) -> Self {
        self.enable_implicit_conversion = enabled;
        self
    }

    pub fn with_ignore_decorators(mut self, enabled: bool) -> Self {
        self.ignore_decorators = enabled;
        self
    }

    pub fn with_exclude_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Whether `key` is filtered out by a prefix
    pub fn is_excluded_key(&self, key: &str) -> bool {
        self.exclude_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && key.starts_with(prefix.as_str()))
    }
}
