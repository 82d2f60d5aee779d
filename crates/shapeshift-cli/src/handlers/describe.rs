//! Describe command handler

use super::utils;
use crate::cli::{DescribeArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use serde::Serialize;
use shapeshift_core::{ClassId, MetadataRegistry, RuleDirection, Strategy, TypeRef};

/// What the registry knows about one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    pub properties: Vec<PropertySummary>,
}

/// Effective rules of one property, inherited ones included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded: Option<RuleDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<String>,
}

/// Handle the describe command
pub fn handle_describe(args: DescribeArgs, _config: &Config, output: &mut OutputWriter) -> Result<()> {
    let schema = utils::load_schema(&args.schema)?;

    let classes: Vec<ClassId> = match &args.class_name {
        Some(name) => vec![schema.class(name, &args.schema)?],
        None => schema
            .registry
            .classes()
            .into_iter()
            .map(|(id, _)| id)
            .collect(),
    };
    let summaries: Vec<ClassSummary> = classes
        .into_iter()
        .map(|class| summarize(&schema.registry, class))
        .collect();

    if summaries.is_empty() {
        output.warning(&format!("{} defines no classes", args.schema.display()))?;
    }

    if output.format() == OutputFormat::Human {
        output.info(&format!("{} classes in {}", summaries.len(), args.schema.display()))?;
        for summary in &summaries {
            write_human(output, summary)?;
        }
        Ok(())
    } else {
        output.data(&summaries)
    }
}

/// Collect the effective rules of `class`
pub fn summarize(registry: &MetadataRegistry, class: ClassId) -> ClassSummary {
    let mut names = registry.declared_properties(class);
    for ancestor in registry.ancestry(class).into_iter().rev() {
        for (property, _) in registry.own_rules(ancestor) {
            if !names.contains(&property) {
                names.push(property);
            }
        }
    }

    let properties = names
        .into_iter()
        .map(|name| {
            let rule = registry.lookup(class, &name);
            PropertySummary {
                declared_type: registry
                    .declared_type(class, &name)
                    .map(|ty| type_name(registry, &ty)),
                exposed_as: rule.exposed_name().map(str::to_string),
                excluded: rule.exclusion.map(|exclusion| exclusion.direction),
                type_hint: rule.type_hint.as_ref().map(|hint| {
                    let ty = type_name(registry, &hint.resolve());
                    match hint.get_discriminator() {
                        Some(discriminator) => format!("{} by '{}'", ty, discriminator.property),
                        None => ty,
                    }
                }),
                transforms: rule
                    .transforms
                    .iter()
                    .map(|step| step.name().to_string())
                    .collect(),
                name,
            }
        })
        .collect();

    ClassSummary {
        name: registry.class_name(class).unwrap_or_else(|| class.to_string()),
        extends: registry
            .parent_of(class)
            .and_then(|parent| registry.class_name(parent)),
        strategy: registry.class_def(class).and_then(|def| def.strategy),
        properties,
    }
}

/// Render a type in schema notation
pub fn type_name(registry: &MetadataRegistry, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Any => "any".to_string(),
        TypeRef::String => "string".to_string(),
        TypeRef::Number => "number".to_string(),
        TypeRef::Boolean => "boolean".to_string(),
        TypeRef::Date => "date".to_string(),
        TypeRef::Bytes => "bytes".to_string(),
        TypeRef::Class(id) => registry.class_name(*id).unwrap_or_else(|| id.to_string()),
        TypeRef::Array(inner) => format!("{}[]", type_name(registry, inner)),
        TypeRef::Set(inner) => format!("Set<{}>", type_name(registry, inner)),
        TypeRef::Map(inner) => format!("Map<string, {}>", type_name(registry, inner)),
    }
}

fn write_human(output: &mut OutputWriter, summary: &ClassSummary) -> Result<()> {
    let title = match &summary.extends {
        Some(parent) => format!("{} extends {}", summary.name, parent),
        None => summary.name.clone(),
    };
    output.section(&title)?;
    if let Some(strategy) = summary.strategy {
        output.writeln(&format!("  strategy: {:?}", strategy))?;
    }

    for property in &summary.properties {
        let mut line = format!(
            "  {}: {}",
            property.name,
            property.declared_type.as_deref().unwrap_or("any")
        );
        if let Some(alias) = &property.exposed_as {
            line.push_str(&format!(" as '{}'", alias));
        }
        if let Some(hint) = &property.type_hint {
            line.push_str(&format!(" hint {}", hint));
        }
        if let Some(direction) = property.excluded {
            line.push_str(&format!(" excluded ({:?})", direction));
        }
        if !property.transforms.is_empty() {
            line.push_str(&format!(" | {}", property.transforms.join(" -> ")));
        }
        output.writeln(&line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeshift_core::{load_schema_str, SchemaFormat};

    const ALBUM_SCHEMA: &str = r#"
classes:
  - name: Photo
    properties:
      url: { type: string }
  - name: Portrait
    extends: Photo
    strategy: exclude_all
    properties:
      url:
        expose: { name: href }
  - name: Album
    properties:
      photos:
        type: Photo[]
        type_hint:
          type: Photo
          discriminator:
            property: kind
            sub_types:
              portrait: Portrait
      tags: { type: "Set<string>" }
      title:
        transforms:
          - use: trim
          - use: to_upper_case
      secret:
        exclude: { direction: to_plain_only }
"#;

    fn registry() -> (MetadataRegistry, std::collections::HashMap<String, ClassId>) {
        let registry = MetadataRegistry::new();
        let ids = load_schema_str(ALBUM_SCHEMA, SchemaFormat::Yaml)
            .unwrap()
            .register_into(&registry)
            .unwrap();
        (registry, ids)
    }

    #[test]
    fn test_summary_merges_inherited_rules() {
        let (registry, ids) = registry();
        let summary = summarize(&registry, ids["Portrait"]);

        assert_eq!(summary.extends.as_deref(), Some("Photo"));
        assert_eq!(summary.strategy, Some(Strategy::ExcludeAll));
        assert_eq!(summary.properties.len(), 1);
        assert_eq!(summary.properties[0].declared_type.as_deref(), Some("string"));
        assert_eq!(summary.properties[0].exposed_as.as_deref(), Some("href"));
    }

    #[test]
    fn test_summary_lists_rules() {
        let (registry, ids) = registry();
        let summary = summarize(&registry, ids["Album"]);
        let names: Vec<&str> = summary.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["photos", "tags", "title", "secret"]);

        let photos = &summary.properties[0];
        assert_eq!(photos.declared_type.as_deref(), Some("Photo[]"));
        assert_eq!(photos.type_hint.as_deref(), Some("Photo by 'kind'"));
        assert_eq!(summary.properties[1].declared_type.as_deref(), Some("Set<string>"));
        assert_eq!(summary.properties[2].transforms, vec!["trim", "to_upper_case"]);
        assert_eq!(summary.properties[3].excluded, Some(RuleDirection::ToPlainOnly));
    }

    #[test]
    fn test_type_names() {
        let (registry, ids) = registry();
        let ty = TypeRef::map_of(TypeRef::array_of(TypeRef::Class(ids["Photo"])));
        assert_eq!(type_name(&registry, &ty), "Map<string, Photo[]>");
    }
}
