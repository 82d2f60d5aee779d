//! Keyed store of class definitions and property rules
//!
//! The registry is read-mostly shared state. Registration normally happens
//! once during start-up; lookups then run concurrently from any number of
//! conversions. Writers are serialized against readers with an `RwLock`, so
//! late registration is safe as well, only slower.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::builder::ClassBuilder;
use super::rules::PropertyRule;
use crate::transform::Strategy;
use crate::types::{ClassId, Direction, TypeRef};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static GLOBAL: OnceLock<MetadataRegistry> = OnceLock::new();

/// Shape of a registered class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<ClassId>,
    /// Declared property types, in declaration order
    pub properties: IndexMap<String, TypeRef>,
    /// Class-level exposure strategy, overriding the option bag
    pub strategy: Option<Strategy>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: IndexMap::new(),
            strategy: None,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    classes: HashMap<ClassId, ClassDef>,
    rules: HashMap<ClassId, IndexMap<String, Arc<PropertyRule>>>,
}

impl RegistryState {
    /// `class` followed by its ancestors, nearest first
    fn chain(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = vec![class];
        let mut seen = HashSet::from([class]);
        let mut current = class;
        while let Some(parent) = self.classes.get(&current).and_then(|def| def.parent) {
            if !seen.insert(parent) {
                log::warn!("Inheritance cycle detected at {}; stopping ancestor walk", parent);
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn lookup(&self, class: ClassId, property: &str) -> Option<Arc<PropertyRule>> {
        self.chain(class).into_iter().find_map(|id| {
            self.rules
                .get(&id)
                .and_then(|rules| rules.get(property))
                .cloned()
        })
    }

    /// Every property name carrying a rule anywhere in the chain, root
    /// ancestor first
    fn ruled_properties(&self, class: ClassId) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for id in self.chain(class).into_iter().rev() {
            if let Some(rules) = self.rules.get(&id) {
                for name in rules.keys() {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }
}

/// Process-wide (or locally owned) metadata store
pub struct MetadataRegistry {
    state: RwLock<RegistryState>,
    default_rule: Arc<PropertyRule>,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            default_rule: Arc::new(PropertyRule::default()),
        }
    }

    /// The lazily created process-wide registry
    pub fn global() -> &'static MetadataRegistry {
        GLOBAL.get_or_init(MetadataRegistry::new)
    }

    // A panic while holding the lock cannot leave the maps half-updated,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start declaring a class
    pub fn define_class(&self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, ClassId::next(), ClassDef::new(name))
    }

    pub(crate) fn insert_class(&self, id: ClassId, def: ClassDef) {
        log::debug!("Registering class '{}' as {}", def.name, id);
        self.write().classes.insert(id, def);
    }

    pub fn set_parent(&self, class: ClassId, parent: Option<ClassId>) {
        if let Some(def) = self.write().classes.get_mut(&class) {
            def.parent = parent;
        }
    }

    pub fn set_strategy(&self, class: ClassId, strategy: Option<Strategy>) {
        if let Some(def) = self.write().classes.get_mut(&class) {
            def.strategy = strategy;
        }
    }

    /// Record the declared type of a property
    pub fn declare_property(&self, class: ClassId, property: impl Into<String>, ty: TypeRef) {
        if let Some(def) = self.write().classes.get_mut(&class) {
            def.properties.insert(property.into(), ty);
        }
    }

    /// Merge a partial rule into the rule of `(class, property)`, creating
    /// it if absent
    pub fn register(&self, class: ClassId, property: impl Into<String>, partial: PropertyRule) {
        let mut state = self.write();
        let rule = state
            .rules
            .entry(class)
            .or_default()
            .entry(property.into())
            .or_default();
        Arc::make_mut(rule).merge(partial);
    }

    /// Rule of `(class, property)`: the class's own rule, else the nearest
    /// ancestor's, else the empty default rule
    pub fn lookup(&self, class: ClassId, property: &str) -> Arc<PropertyRule> {
        self.read()
            .lookup(class, property)
            .unwrap_or_else(|| self.default_rule())
    }

    /// Rule registered directly on `class`, ignoring ancestors
    pub fn own_rule(&self, class: ClassId, property: &str) -> Option<Arc<PropertyRule>> {
        self.read()
            .rules
            .get(&class)
            .and_then(|rules| rules.get(property))
            .cloned()
    }

    /// Rules registered directly on `class`, in registration order
    pub fn own_rules(&self, class: ClassId) -> Vec<(String, Arc<PropertyRule>)> {
        self.read()
            .rules
            .get(&class)
            .map(|rules| {
                rules
                    .iter()
                    .map(|(name, rule)| (name.clone(), Arc::clone(rule)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The "no special handling" rule
    pub fn default_rule(&self) -> Arc<PropertyRule> {
        Arc::clone(&self.default_rule)
    }

    pub fn class_def(&self, class: ClassId) -> Option<ClassDef> {
        self.read().classes.get(&class).cloned()
    }

    pub fn class_name(&self, class: ClassId) -> Option<String> {
        self.read().classes.get(&class).map(|def| def.name.clone())
    }

    /// Most recently defined class with this name
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.read()
            .classes
            .iter()
            .filter(|(_, def)| def.name == name)
            .map(|(id, _)| *id)
            .max()
    }

    /// All classes, in definition order
    pub fn classes(&self) -> Vec<(ClassId, String)> {
        let mut classes: Vec<(ClassId, String)> = self
            .read()
            .classes
            .iter()
            .map(|(id, def)| (*id, def.name.clone()))
            .collect();
        classes.sort_by_key(|(id, _)| *id);
        classes
    }

    pub fn class_count(&self) -> usize {
        self.read().classes.len()
    }

    pub fn parent_of(&self, class: ClassId) -> Option<ClassId> {
        self.read().classes.get(&class).and_then(|def| def.parent)
    }

    /// `class` followed by its ancestors, nearest first
    pub fn ancestry(&self, class: ClassId) -> Vec<ClassId> {
        self.read().chain(class)
    }

    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.read().chain(class).contains(&ancestor)
    }

    /// Declared type of a property, walking up the inheritance chain
    pub fn declared_type(&self, class: ClassId, property: &str) -> Option<TypeRef> {
        let state = self.read();
        state.chain(class).into_iter().find_map(|id| {
            state
                .classes
                .get(&id)
                .and_then(|def| def.properties.get(property))
                .cloned()
        })
    }

    /// Declared properties of the class and its ancestors, root first
    pub fn declared_properties(&self, class: ClassId) -> Vec<String> {
        let state = self.read();
        let mut names: Vec<String> = Vec::new();
        for id in state.chain(class).into_iter().rev() {
            if let Some(def) = state.classes.get(&id) {
                for name in def.properties.keys() {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }
        names
    }

    /// Whether the class knows `property` at all, by declaration or rule
    pub fn declares(&self, class: ClassId, property: &str) -> bool {
        let state = self.read();
        state.chain(class).into_iter().any(|id| {
            state
                .classes
                .get(&id)
                .map_or(false, |def| def.properties.contains_key(property))
        }) || state.lookup(class, property).is_some()
    }

    /// Effective class-level strategy, inherited from the nearest ancestor
    /// that sets one
    pub fn strategy_for(&self, class: ClassId) -> Option<Strategy> {
        let state = self.read();
        state
            .chain(class)
            .into_iter()
            .find_map(|id| state.classes.get(&id).and_then(|def| def.strategy))
    }

    /// Properties whose effective exposure marking applies to `direction`
    pub fn exposed_properties(&self, class: ClassId, direction: Direction) -> Vec<String> {
        let state = self.read();
        state
            .ruled_properties(class)
            .into_iter()
            .filter(|name| {
                state
                    .lookup(class, name)
                    .map_or(false, |rule| rule.exposure_for(direction).is_some())
            })
            .collect()
    }

    /// Property whose effective alias is `alias`
    pub fn property_for_alias(&self, class: ClassId, alias: &str) -> Option<String> {
        let state = self.read();
        state.ruled_properties(class).into_iter().find(|name| {
            state
                .lookup(class, name)
                .map_or(false, |rule| rule.exposed_name() == Some(alias))
        })
    }

    /// Forget every class and rule
    pub fn clear(&self) {
        let mut state = self.write();
        log::debug!(
            "Clearing metadata registry ({} classes)",
            state.classes.len()
        );
        state.classes.clear();
        state.rules.clear();
    }
}
