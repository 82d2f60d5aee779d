#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::metadata::TransformStage;
    use crate::transform::{ClassTransformer, Strategy, TransformationOptions};
    use crate::types::{Direction, RuleDirection, TypeRef};
    use crate::value::Value;
    use serde_json::json;

    const ALBUM_YAML: &str = r#"
classes:
  - name: Photo
    properties:
      url: { type: string }
  - name: Landscape
    extends: Photo
  - name: Portrait
    extends: Photo
  - name: Album
    strategy: expose_all
    properties:
      title:
        type: string
        expose: { name: album_title }
        transforms:
          - use: trim
          - use: to_upper_case
            direction: to_class_only
            since: 2
      photos:
        type_hint:
          type: Photo
          discriminator:
            property: kind
            sub_types:
              landscape: Landscape
              portrait: Portrait
      secret:
        exclude: { direction: to_plain_only }
"#;

    #[test]
    fn test_load_yaml_document() {
        let document = load_schema_str(ALBUM_YAML, SchemaFormat::Yaml).unwrap();
        assert_eq!(document.class_names(), vec!["Photo", "Landscape", "Portrait", "Album"]);

        let album = &document.classes[3];
        assert_eq!(album.strategy, Some(Strategy::ExposeAll));
        let title = &album.properties["title"];
        assert_eq!(title.type_expr.as_deref(), Some("string"));
        assert_eq!(title.transforms.len(), 2);
        assert_eq!(title.transforms[1].direction, RuleDirection::ToClassOnly);
        assert_eq!(title.transforms[1].scope.since, Some(2.0));
        assert_eq!(title.transforms[0].stage, TransformStage::BeforeConversion);
    }

    #[test]
    fn test_register_into_registry() {
        let registry = MetadataRegistry::new();
        let ids = load_schema_str(ALBUM_YAML, SchemaFormat::Yaml)
            .unwrap()
            .register_into(&registry)
            .unwrap();

        let album = ids["Album"];
        assert_eq!(registry.parent_of(ids["Landscape"]), Some(ids["Photo"]));
        assert_eq!(registry.declared_type(ids["Portrait"], "url"), Some(TypeRef::String));
        assert_eq!(registry.lookup(album, "title").exposed_name(), Some("album_title"));
        assert!(registry.lookup(album, "secret").is_excluded_for(Direction::ClassToPlain));

        let plain = Value::from(json!({
            "album_title": "  holiday ",
            "photos": [{"kind": "portrait", "url": "a.png"}]
        }));
        let result = ClassTransformer::new(&registry)
            .plain_to_class(album, &plain, &TransformationOptions::default().with_version(2.0))
            .unwrap();

        assert_eq!(result.get("title"), Some(Value::from("HOLIDAY")));
        let photos = result.get("photos").and_then(|p| p.items()).unwrap();
        assert_eq!(photos[0].class_id(), Some(ids["Portrait"]));
        assert_eq!(photos[0].get("kind"), None);
    }

    #[test]
    fn test_json_document() {
        let text = json!({
            "classes": [
                {"name": "Tag", "properties": {"label": {"type": "string"}}},
                {"name": "Post", "properties": {
                    "tags": {"type": "Tag[]"},
                    "counts": {"type": "Map<string, number>"}
                }}
            ]
        })
        .to_string();
        let registry = MetadataRegistry::new();
        let ids = load_schema_str(&text, SchemaFormat::Json)
            .unwrap()
            .register_into(&registry)
            .unwrap();

        assert_eq!(
            registry.declared_type(ids["Post"], "tags"),
            Some(TypeRef::array_of(TypeRef::Class(ids["Tag"])))
        );
        assert_eq!(
            registry.declared_type(ids["Post"], "counts"),
            Some(TypeRef::map_of(TypeRef::Number))
        );
    }

    #[test]
    fn test_names_resolve_against_existing_classes() {
        let registry = MetadataRegistry::new();
        let base = registry.define_class("Entity").build();
        let text = r#"{"classes": [{"name": "User", "extends": "Entity"}]}"#;

        let ids = load_schema_str(text, SchemaFormat::Json)
            .unwrap()
            .register_into(&registry)
            .unwrap();

        assert_eq!(registry.parent_of(ids["User"]), Some(base));
    }

    #[test]
    fn test_unknown_names_are_schema_errors() {
        let registry = MetadataRegistry::new();

        let missing_class = r#"{"classes": [{"name": "A", "properties": {"b": {"type": "B"}}}]}"#;
        let err = load_schema_str(missing_class, SchemaFormat::Json)
            .unwrap()
            .register_into(&registry)
            .unwrap_err();
        assert!(matches!(err, Error::Schema { ref class, .. } if class.as_deref() == Some("A")));
        assert!(err.to_string().contains("A.b"));

        let missing_transform =
            r#"{"classes": [{"name": "A", "properties": {"b": {"transforms": [{"use": "shout"}]}}}]}"#;
        let err = load_schema_str(missing_transform, SchemaFormat::Json)
            .unwrap()
            .register_into(&registry)
            .unwrap_err();
        assert!(err.to_string().contains("shout"));

        let duplicate = r#"{"classes": [{"name": "A"}, {"name": "A"}]}"#;
        assert!(load_schema_str(duplicate, SchemaFormat::Json)
            .unwrap()
            .register_into(&registry)
            .is_err());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(load_schema_str("[]", SchemaFormat::Json), Err(Error::Schema { .. })));
        assert!(matches!(load_schema_str("{", SchemaFormat::Json), Err(Error::Json { .. })));
        assert!(matches!(
            load_schema_str("classes: [", SchemaFormat::Yaml),
            Err(Error::Yaml { .. })
        ));
    }

    #[test]
    fn test_format_detection() {
        use std::path::Path;
        assert_eq!(SchemaFormat::from_path(Path::new("a.yml")).unwrap(), SchemaFormat::Yaml);
        assert_eq!(SchemaFormat::from_path(Path::new("a.JSON")).unwrap(), SchemaFormat::Json);
        assert!(SchemaFormat::from_path(Path::new("a.toml")).is_err());
    }
}
