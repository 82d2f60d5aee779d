//! Shared utilities for command handlers

use crate::error::{Error, Result};
use shapeshift_core::{load_schema_into, ClassId, MetadataRegistry};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// A schema loaded into its own registry
pub struct LoadedSchema {
    pub registry: MetadataRegistry,
    pub classes: HashMap<String, ClassId>,
}

impl LoadedSchema {
    /// Identity of a class defined by the schema
    pub fn class(&self, name: &str, schema: &Path) -> Result<ClassId> {
        self.classes
            .get(name)
            .copied()
            .ok_or_else(|| Error::ClassNotFound {
                name: name.to_string(),
                schema: schema.to_path_buf(),
            })
    }
}

/// Load a class schema into a fresh registry
pub fn load_schema(path: &Path) -> Result<LoadedSchema> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let registry = MetadataRegistry::new();
    let classes = load_schema_into(&registry, path)?;
    tracing::info!(schema = %path.display(), classes = classes.len(), "Loaded class schema");
    Ok(LoadedSchema { registry, classes })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("yaml") || s.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// Read a JSON or YAML document; `-` reads JSON from stdin
pub fn read_document(path: &Path) -> Result<serde_json::Value> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(serde_json::from_str(&content)?);
    }
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    if is_yaml(path) {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })?;
        Ok(serde_json::to_value(yaml)?)
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

/// Write a document to a file, as YAML or pretty JSON by extension
pub fn write_document(path: &Path, document: &serde_json::Value, pretty: bool) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(document)?
    } else if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_and_yaml_documents() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("user.json");
        fs::write(&json_path, r#"{"user_name": "Johny Cage"}"#).unwrap();
        let yaml_path = dir.path().join("user.yaml");
        fs::write(&yaml_path, "user_name: Johny Cage\n").unwrap();

        assert_eq!(read_document(&json_path).unwrap(), json!({"user_name": "Johny Cage"}));
        assert_eq!(read_document(&yaml_path).unwrap(), json!({"user_name": "Johny Cage"}));
    }

    #[test]
    fn test_read_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_document(&dir.path().join("absent.json")),
            Err(Error::FileNotFound { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        assert!(matches!(
            read_document(&broken),
            Err(Error::InvalidFormat { ref expected, .. }) if expected == "JSON"
        ));
    }

    #[test]
    fn test_write_document_by_extension() {
        let dir = TempDir::new().unwrap();
        let document = json!({"tag": "rust"});

        let yaml_path = dir.path().join("out").join("result.yml");
        write_document(&yaml_path, &document, true).unwrap();
        assert_eq!(fs::read_to_string(&yaml_path).unwrap(), "tag: rust\n");

        let json_path = dir.path().join("result.json");
        write_document(&json_path, &document, false).unwrap();
        assert_eq!(fs::read_to_string(&json_path).unwrap(), r#"{"tag":"rust"}"#);
    }

    #[test]
    fn test_unknown_class_in_schema() {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("classes.json");
        fs::write(&schema, r#"{"classes": [{"name": "User"}]}"#).unwrap();

        let loaded = load_schema(&schema).unwrap();
        assert!(loaded.class("User", &schema).is_ok());
        assert!(matches!(
            loaded.class("Photo", &schema),
            Err(Error::ClassNotFound { ref name, .. }) if name == "Photo"
        ));
    }
}
