//! Transformation operation executor
//!
//! One executor performs one top-level conversion: a depth-first walk of the
//! source graph that consults the registry, exposure filter and type
//! resolver at every property, guarded by a per-call [`ReferenceGuard`].
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::exposure::ExposureFilter;
use super::guard::ReferenceGuard;
use super::options::{Strategy, TransformationOptions};
use super::resolver::{coerce_primitive, ObjectPlan, TargetSpec, TypeResolver};
use crate::error::{Error, Result};
use crate::metadata::{MetadataRegistry, PropertyRule, TransformArgs, TransformStage, TransformStep};
use crate::types::{ClassId, Direction, TypeRef};
use crate::value::{Fields, MapRef, Object, ObjectRef, Value};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::rc::Rc;

/// Executes one conversion in one direction
pub struct TransformOperationExecutor<'a> {
    registry: &'a MetadataRegistry,
    direction: Direction,
    options: &'a TransformationOptions,
    guard: ReferenceGuard,
}

impl<'a> TransformOperationExecutor<'a> {
    pub fn new(
        registry: &'a MetadataRegistry,
        direction: Direction,
        options: &'a TransformationOptions,
    ) -> Self {
        Self {
            registry,
            direction,
            options,
            guard: ReferenceGuard::new(),
        }
    }

    /// Convert `value` and everything reachable from it.
    ///
    /// `target` is the root type; for a root array it describes the
    /// elements.
    pub fn execute(&mut self, value: &Value, target: Option<&TypeRef>) -> Result<Value> {
        let spec = target
            .map(|ty| TargetSpec::of(ty.clone(), true))
            .unwrap_or_default();
        self.convert_value(value, &spec)
    }

    /// Populate the existing object `target` from `source` using the rules
    /// of the target's class
    pub fn execute_into(&mut self, target: &Value, source: &Value) -> Result<Value> {
        let (Some(shell), Some(fields)) = (target.as_object(), source.as_object()) else {
            return Err(Error::Unsupported {
                message: format!("cannot populate a {} from a {}", target.kind(), source.kind()),
                feature: Some("populate_existing".to_string()),
            });
        };

        let class = shell.borrow().class();
        self.guard.remember(source, target);
        self.populate(shell, fields, source, &ObjectPlan::for_class(class))?;
        Ok(target.clone())
    }

    fn convert_value(&mut self, value: &Value, spec: &TargetSpec) -> Result<Value> {
        match value {
            Value::Array(_) | Value::Set(_) => self.convert_list(value, spec),
            Value::Map(entries) => self.convert_map(value, entries, spec),
            Value::Object(obj) => self.convert_object(value, obj, spec),
            primitive => Ok(self.convert_primitive(primitive, spec)),
        }
    }

    fn convert_primitive(&self, value: &Value, spec: &TargetSpec) -> Value {
        if value.is_nullish() || !spec.ty.is_primitive() || !self.direction.produces_instances() {
            return value.clone();
        }
        if !(spec.explicit || self.options.enable_implicit_conversion) {
            return value.clone();
        }
        coerce_primitive(value, &spec.ty).unwrap_or_else(|| {
            log::debug!("Cannot coerce {} to {:?}; passing value through", value.kind(), spec.ty);
            value.clone()
        })
    }

    fn convert_list(&mut self, value: &Value, spec: &TargetSpec) -> Result<Value> {
        if let Some(existing) = self.guard.lookup(value) {
            return Ok(existing);
        }

        let element = match spec.ty {
            TypeRef::Map(_) => {
                log::debug!("Sequence found where a map was expected; converting untyped");
                TargetSpec::any()
            }
            _ => spec.element(),
        };
        let as_set = match (&spec.ty, self.direction) {
            (_, Direction::ClassToPlain) => false,
            (TypeRef::Set(_), _) => true,
            (TypeRef::Array(_), _) => false,
            _ => matches!(value, Value::Set(_)),
        };

        let items = value.items().unwrap_or_default();
        let list = Rc::new(RefCell::new(Vec::with_capacity(items.len())));
        let output = if as_set {
            Value::Set(Rc::clone(&list))
        } else {
            Value::Array(Rc::clone(&list))
        };
        if items.is_empty() {
            return Ok(output);
        }

        self.guard.remember(value, &output);
        for item in &items {
            let converted = self.convert_value(item, &element)?;
            list.borrow_mut().push(converted);
        }
        Ok(output)
    }

    fn convert_map(&mut self, value: &Value, entries: &MapRef, spec: &TargetSpec) -> Result<Value> {
        if let Some(existing) = self.guard.lookup(value) {
            return Ok(existing);
        }

        let element = match spec.ty {
            TypeRef::Array(_) | TypeRef::Set(_) => {
                log::debug!("Map found where a sequence was expected; converting untyped");
                TargetSpec::any()
            }
            _ => spec.element(),
        };
        let output = if self.direction.produces_instances() {
            Value::empty_map()
        } else {
            Value::plain_object()
        };
        self.guard.remember(value, &output);

        let snapshot: Fields = entries.borrow().clone();
        for (key, item) in snapshot {
            let converted = self.convert_value(&item, &element)?;
            output.set_field(key, converted);
        }
        Ok(output)
    }

    fn convert_object(&mut self, value: &Value, obj: &ObjectRef, spec: &TargetSpec) -> Result<Value> {
        if let Some(existing) = self.guard.lookup(value) {
            return Ok(existing);
        }

        let spec = match spec.ty {
            TypeRef::Any | TypeRef::Class(_) => spec.clone(),
            TypeRef::Map(_) if self.direction.produces_instances() => {
                return self.object_to_map(value, obj, spec);
            }
            _ => {
                log::debug!("Object found where {:?} was expected; converting untyped", spec.ty);
                TargetSpec::any()
            }
        };

        let resolver = TypeResolver::new(self.registry, self.direction);
        let Some(plan) = resolver.resolve_object(&obj.borrow(), &spec) else {
            return Ok(value.clone());
        };

        let shell_object = match (self.direction.produces_instances(), plan.class) {
            (true, Some(class)) => Object::instance(class),
            _ => Object::plain(),
        };
        let shell = Rc::new(RefCell::new(shell_object));
        let output = Value::Object(Rc::clone(&shell));
        self.guard.remember(value, &output);

        self.populate(&shell, obj, value, &plan)?;
        Ok(output)
    }

    /// A keyed object read as a dictionary of uniformly typed values
    fn object_to_map(&mut self, value: &Value, obj: &ObjectRef, spec: &TargetSpec) -> Result<Value> {
        let element = spec.element();
        let output = Value::empty_map();
        self.guard.remember(value, &output);

        let filter = ExposureFilter::new(self.options, self.direction);
        let snapshot: Fields = obj.borrow().fields().clone();
        for (key, item) in snapshot {
            if !filter.admits_key(&key) {
                continue;
            }
            let converted = self.convert_value(&item, &element)?;
            output.set_field(key, converted);
        }
        Ok(output)
    }

    fn populate(&mut self, shell: &ObjectRef, source: &ObjectRef, container: &Value, plan: &ObjectPlan) -> Result<()> {
        let filter = ExposureFilter::new(self.options, self.direction);
        let class = plan.class;
        let strategy = class
            .and_then(|class| self.registry.strategy_for(class))
            .unwrap_or(self.options.strategy);

        // Snapshot so transforms and nested conversions may touch the source
        let entries: Fields = source.borrow().fields().clone();

        for key in self.candidate_keys(class, &entries, strategy) {
            if plan.skip_key.as_deref() == Some(key.as_str()) {
                continue;
            }
            let Some(property) = self.property_for_key(class, &key) else {
                continue;
            };
            let rule = match class {
                Some(class) => self.registry.lookup(class, &property),
                None => self.registry.default_rule(),
            };
            if !filter.is_visible(&rule, strategy) {
                continue;
            }

            let source_key = match self.direction {
                Direction::PlainToClass => key.as_str(),
                _ => property.as_str(),
            };
            let Some(raw) = entries.get(source_key).cloned() else {
                continue;
            };

            let converted = self.convert_property(class, &property, &rule, raw, container)?;
            let output_key = match self.direction {
                Direction::ClassToPlain => filter.effective_name(&rule, &property).to_string(),
                _ => property.clone(),
            };
            shell.borrow_mut().insert(output_key, converted);
        }

        if let Some((property, tag)) = &plan.tag {
            let mut shell = shell.borrow_mut();
            if !shell.contains_key(property) {
                shell.insert(property.clone(), tag.clone());
            }
        }
        Ok(())
    }

    /// Keys to visit on the source object, deduplicated, in visiting order
    fn candidate_keys(&self, class: Option<ClassId>, entries: &Fields, strategy: Strategy) -> Vec<String> {
        let filter = ExposureFilter::new(self.options, self.direction);
        let mut keys: IndexSet<String> = IndexSet::new();

        match class {
            Some(class) if !self.options.ignore_decorators => {
                if self.direction == Direction::PlainToClass && self.options.exclude_extraneous_values {
                    keys.extend(
                        entries
                            .keys()
                            .filter(|key| {
                                self.property_for_key(Some(class), key)
                                    .map_or(false, |property| self.registry.declares(class, &property))
                            })
                            .cloned(),
                    );
                } else if strategy == Strategy::ExposeAll {
                    keys.extend(entries.keys().cloned());
                }

                for property in self.registry.exposed_properties(class, self.direction) {
                    if self.direction == Direction::PlainToClass {
                        let rule = self.registry.lookup(class, &property);
                        keys.insert(rule.exposed_name().map(str::to_string).unwrap_or(property));
                    } else {
                        keys.insert(property);
                    }
                }
            }
            _ => keys.extend(entries.keys().cloned()),
        }

        keys.into_iter()
            .filter(|key| filter.admits_key(key))
            .collect()
    }

    /// Property a source key feeds.
    ///
    /// Plain keys go through the alias table; a raw key naming a property
    /// that is aliased to something else feeds nothing.
    fn property_for_key(&self, class: Option<ClassId>, key: &str) -> Option<String> {
        let class = match class {
            Some(class) if self.direction == Direction::PlainToClass && !self.options.ignore_decorators => class,
            _ => return Some(key.to_string()),
        };

        if let Some(property) = self.registry.property_for_alias(class, key) {
            return Some(property);
        }
        match self.registry.lookup(class, key).exposed_name() {
            Some(alias) if alias != key => None,
            _ => Some(key.to_string()),
        }
    }

    fn convert_property(
        &mut self,
        class: Option<ClassId>,
        property: &str,
        rule: &PropertyRule,
        raw: Value,
        container: &Value,
    ) -> Result<Value> {
        let filter = ExposureFilter::new(self.options, self.direction);
        let steps: Vec<&TransformStep> = rule
            .transforms
            .iter()
            .filter(|step| filter.step_applies(step))
            .collect();

        let mut value = raw;
        for step in steps.iter().filter(|step| step.stage == TransformStage::BeforeConversion) {
            value = self.apply_step(step, class, property, &value, container)?;
        }

        let spec = TypeResolver::new(self.registry, self.direction).resolve_property(class, property, rule);
        value = self.convert_value(&value, &spec)?;

        for step in steps.iter().filter(|step| step.stage == TransformStage::AfterConversion) {
            value = self.apply_step(step, class, property, &value, container)?;
        }
        Ok(value)
    }

    fn apply_step(
        &self,
        step: &TransformStep,
        class: Option<ClassId>,
        property: &str,
        value: &Value,
        container: &Value,
    ) -> Result<Value> {
        let args = TransformArgs {
            value,
            key: property,
            obj: container,
            direction: self.direction,
            options: self.options,
        };
        step.apply(args).map_err(|source| Error::TransformFunction {
            class: class
                .and_then(|class| self.registry.class_name(class))
                .unwrap_or_else(|| "<plain>".to_string()),
            property: property.to_string(),
            direction: self.direction,
            source,
        })
    }
}
