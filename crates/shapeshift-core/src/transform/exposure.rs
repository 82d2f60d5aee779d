//! Exposure filter: per-property visibility and plain-side naming
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::options::{Strategy, TransformationOptions};
use crate::metadata::{PropertyRule, TransformStep};
use crate::types::Direction;

/// Visibility decisions for one direction under one option bag
#[derive(Debug, Clone, Copy)]
pub struct ExposureFilter<'a> {
    options: &'a TransformationOptions,
    direction: Direction,
}

impl<'a> ExposureFilter<'a> {
    pub fn new(options: &'a TransformationOptions, direction: Direction) -> Self {
        Self { options, direction }
    }

    /// Whether a property with `rule` is converted.
    ///
    /// `strategy` is the effective strategy for the owning class: the
    /// class-level strategy if one is set, else the option bag's.
    pub fn is_visible(&self, rule: &PropertyRule, strategy: Strategy) -> bool {
        if self.options.ignore_decorators {
            return true;
        }
        if rule.is_excluded_for(self.direction) {
            return false;
        }

        let exposure = rule.exposure_for(self.direction);
        if strategy == Strategy::ExcludeAll && exposure.is_none() {
            return false;
        }

        // Version and group predicates live on the exposure marking
        exposure.map_or(true, |marking| marking.scope.admits(self.options))
    }

    /// Key a property is read from or written to on the plain side
    pub fn effective_name<'r>(&self, rule: &'r PropertyRule, property: &'r str) -> &'r str {
        if self.options.ignore_decorators || self.direction == Direction::ClassToClass {
            return property;
        }
        rule.exposed_name().unwrap_or(property)
    }

    /// Whether a transform step runs in this conversion
    pub fn step_applies(&self, step: &TransformStep) -> bool {
        !self.options.ignore_decorators && step.applies(self.direction, self.options)
    }

    /// Prefix filter on raw keys
    pub fn admits_key(&self, key: &str) -> bool {
        !self.options.is_excluded_key(key)
    }
}
