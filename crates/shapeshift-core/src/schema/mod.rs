//! Declarative class schemas in JSON or YAML
//!
//! Schemas are the file-based alternative to declaring classes in code.
//! YAML input is read into a JSON tree first so both formats deserialize
//! through the same path.

pub mod document;
pub mod type_expr;

#[cfg(test)]
mod tests;

pub use document::{
    ClassSchema, DiscriminatorSchema, PropertySchema, SchemaDocument, TransformSchema, TypeHintSchema,
};
pub use type_expr::parse_type;

use crate::error::{Error, Result};
use crate::metadata::MetadataRegistry;
use crate::types::ClassId;
use std::collections::HashMap;
use std::path::Path;

/// Supported schema file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl SchemaFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(SchemaFormat::Yaml),
            Some("json") => Ok(SchemaFormat::Json),
            _ => Err(Error::Unsupported {
                message: format!("cannot detect schema format of {}", path.display()),
                feature: Some("schema_format".to_string()),
            }),
        }
    }
}

/// Parse a schema document from text
pub fn load_schema_str(content: &str, format: SchemaFormat) -> Result<SchemaDocument> {
    let tree: serde_json::Value = match format {
        SchemaFormat::Json => serde_json::from_str(content)?,
        SchemaFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
            serde_json::to_value(yaml)?
        }
    };
    if !tree.is_object() {
        return Err(Error::schema("Schema must be an object at the root level", None));
    }
    Ok(serde_json::from_value(tree)?)
}

/// Read and parse a schema file, detecting the format from its extension
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<SchemaDocument> {
    let path = path.as_ref();
    let format = SchemaFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    log::debug!("Loading {:?} schema from {}", format, path.display());
    load_schema_str(&content, format)
}

/// Load a schema file and register its classes
pub fn load_schema_into(registry: &MetadataRegistry, path: impl AsRef<Path>) -> Result<HashMap<String, ClassId>> {
    load_schema_file(path)?.register_into(registry)
}
