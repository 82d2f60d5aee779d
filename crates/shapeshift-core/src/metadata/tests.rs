//! Tests for the metadata registry
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::transform::{Strategy, TransformationOptions};
    use crate::types::{Direction, RuleDirection, TypeRef};
    use crate::value::Value;

    #[test]
    fn test_register_accumulates_partial_rules() {
        let registry = MetadataRegistry::new();
        let user = registry.define_class("User").build();

        registry.register(user, "name", PropertyRule::new().expose(ExposeRule::new().name("user_name")));
        registry.register(
            user,
            "name",
            PropertyRule::new().transform(TransformStep::on_value(|v| Ok(v.clone()))),
        );
        registry.register(
            user,
            "name",
            PropertyRule::new().transform(TransformStep::named("second", |args| Ok(args.value.clone()))),
        );

        let rule = registry.lookup(user, "name");
        assert_eq!(rule.exposed_name(), Some("user_name"));
        assert_eq!(rule.transforms.len(), 2);
        assert_eq!(rule.transforms[1].name(), "second");
    }

    #[test]
    fn test_exposure_overlay_keeps_alias() {
        let mut rule = PropertyRule::new().expose(ExposeRule::new().name("alias"));
        rule.merge(PropertyRule::new().expose(ExposeRule::new().groups(["admin"])));

        let exposure = rule.exposure.unwrap();
        assert_eq!(exposure.name.as_deref(), Some("alias"));
        assert_eq!(exposure.scope.groups, vec!["admin".to_string()]);
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let registry = MetadataRegistry::new();
        let base = registry
            .define_class("Base")
            .expose("id", ExposeRule::new().name("ID"))
            .exclude("secret", ExcludeRule::new())
            .build();
        let child = registry
            .define_class("Child")
            .extends(base)
            .expose("id", ExposeRule::new().name("identifier"))
            .build();

        assert_eq!(registry.lookup(child, "id").exposed_name(), Some("identifier"));
        assert!(registry.lookup(child, "secret").is_excluded_for(Direction::ClassToPlain));
        assert!(registry.lookup(child, "unknown").is_empty());
        assert!(registry.own_rule(child, "secret").is_none());
        assert!(registry.is_subclass_of(child, base));
    }

    #[test]
    fn test_declared_type_is_inherited() {
        let registry = MetadataRegistry::new();
        let base = registry
            .define_class("Base")
            .property("created", TypeRef::Date)
            .build();
        let child = registry
            .define_class("Child")
            .extends(base)
            .property("tags", TypeRef::array_of(TypeRef::String))
            .build();

        assert_eq!(registry.declared_type(child, "created"), Some(TypeRef::Date));
        assert_eq!(registry.declared_type(base, "tags"), None);
        assert_eq!(
            registry.declared_properties(child),
            vec!["created".to_string(), "tags".to_string()]
        );
        assert!(registry.declares(child, "created"));
        assert!(!registry.declares(child, "extra"));
    }

    #[test]
    fn test_exposed_properties_and_aliases() {
        let registry = MetadataRegistry::new();
        let user = registry
            .define_class("User")
            .expose("name", ExposeRule::new().name("user_name"))
            .expose("password", ExposeRule::new().to_class_only())
            .build();

        assert_eq!(
            registry.exposed_properties(user, Direction::PlainToClass),
            vec!["name".to_string(), "password".to_string()]
        );
        assert_eq!(
            registry.exposed_properties(user, Direction::ClassToPlain),
            vec!["name".to_string()]
        );
        assert_eq!(registry.property_for_alias(user, "user_name").as_deref(), Some("name"));
        assert_eq!(registry.property_for_alias(user, "name"), None);
    }

    #[test]
    fn test_strategy_is_inherited() {
        let registry = MetadataRegistry::new();
        let base = registry.define_class("Base").strategy(Strategy::ExcludeAll).build();
        let child = registry.define_class("Child").extends(base).build();
        let other = registry.define_class("Other").build();

        assert_eq!(registry.strategy_for(child), Some(Strategy::ExcludeAll));
        assert_eq!(registry.strategy_for(other), None);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let registry = MetadataRegistry::new();
        let user = registry
            .define_class("User")
            .expose("name", ExposeRule::new().name("n"))
            .build();
        assert_eq!(registry.class_by_name("User"), Some(user));

        registry.clear();

        assert_eq!(registry.class_count(), 0);
        assert_eq!(registry.class_by_name("User"), None);
        assert!(registry.lookup(user, "name").is_empty());
    }

    #[test]
    fn test_class_by_name_prefers_latest_definition() {
        let registry = MetadataRegistry::new();
        let first = registry.define_class("User").build();
        let second = registry.define_class("User").build();
        assert_ne!(first, second);
        assert_eq!(registry.class_by_name("User"), Some(second));
        assert_eq!(registry.classes().len(), 2);
    }

    #[test]
    fn test_scope_version_bounds() {
        let scope = Scope {
            groups: vec![],
            since: Some(1.0),
            until: Some(2.0),
        };
        assert!(!scope.admits_version(Some(0.5)));
        assert!(scope.admits_version(Some(1.0)));
        assert!(scope.admits_version(Some(1.9)));
        assert!(!scope.admits_version(Some(2.0)));
        assert!(scope.admits_version(None));
    }

    #[test]
    fn test_scope_groups() {
        let tagged = Scope {
            groups: vec!["user".to_string()],
            ..Scope::default()
        };
        let options = TransformationOptions::default().with_groups(["user"]);
        assert!(tagged.admits(&options));
        assert!(!tagged.admits(&TransformationOptions::default()));
        assert!(Scope::default().admits(&TransformationOptions::default()));
    }

    #[test]
    fn test_transform_step_applicability() {
        let step = TransformStep::on_value(|v| Ok(v.clone()))
            .to_class_only()
            .groups(["admin"]);
        let admin = TransformationOptions::default().with_groups(["admin"]);

        assert!(step.applies(Direction::PlainToClass, &admin));
        assert!(step.applies(Direction::ClassToClass, &admin));
        assert!(!step.applies(Direction::ClassToPlain, &admin));
        assert!(!step.applies(Direction::PlainToClass, &TransformationOptions::default()));
        assert_eq!(step.direction, RuleDirection::ToClassOnly);
    }

    #[test]
    fn test_discriminator_lookup() {
        let registry = MetadataRegistry::new();
        let landscape = registry.define_class("Landscape").build();
        let portrait = registry.define_class("Portrait").build();
        let discriminator = Discriminator::new("__type")
            .sub_type("landscape", landscape)
            .sub_type("portrait", portrait);

        assert_eq!(discriminator.class_for("portrait"), Some(portrait));
        assert_eq!(discriminator.class_for("square"), None);
        assert_eq!(discriminator.name_for(landscape), Some("landscape"));
    }

    #[test]
    fn test_type_hint_factory_is_lazy() {
        let registry = MetadataRegistry::new();
        let builder = registry.define_class("Node");
        let node = builder.id();
        let hint = TypeHint::new(move || TypeRef::array_of(TypeRef::Class(node)));
        builder.type_hint("children", hint).build();

        let rule = registry.lookup(node, "children");
        let resolved = rule.type_hint.as_ref().map(TypeHint::resolve);
        assert_eq!(resolved, Some(TypeRef::array_of(TypeRef::Class(node))));
    }

    #[test]
    fn test_transform_step_receives_arguments() {
        let step = TransformStep::new(|args| {
            Ok(Value::from(format!("{}:{}", args.key, args.direction)))
        });
        let options = TransformationOptions::default();
        let source = Value::plain_object();
        let result = step
            .apply(TransformArgs {
                value: &Value::Null,
                key: "name",
                obj: &source,
                direction: Direction::ClassToPlain,
                options: &options,
            })
            .unwrap();
        assert_eq!(result, Value::from("name:class_to_plain"));
    }
}
