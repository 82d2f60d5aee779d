//! Parser for schema type expressions
//!
//! Grammar:
//!
//! ```text
//! type    := element "[]" | "Array<" type ">" | "Set<" type ">"
//!          | "Map<" [ "string" "," ] type ">" | scalar | class
//! scalar  := "string" | "number" | "boolean" | "date" | "bytes" | "any"
//! ```

use crate::error::{Error, Result};
use crate::types::{ClassId, TypeRef};

/// Parse `expr`, resolving class names through `resolve`
pub fn parse_type(expr: &str, resolve: &dyn Fn(&str) -> Option<ClassId>) -> Result<TypeRef> {
    let expr = expr.trim();

    if let Some(inner) = expr.strip_suffix("[]") {
        return Ok(TypeRef::array_of(parse_type(inner, resolve)?));
    }
    if let Some(inner) = generic_argument(expr, "Array") {
        return Ok(TypeRef::array_of(parse_type(inner, resolve)?));
    }
    if let Some(inner) = generic_argument(expr, "Set") {
        return Ok(TypeRef::set_of(parse_type(inner, resolve)?));
    }
    if let Some(inner) = generic_argument(expr, "Map") {
        // Keys are always strings; a leading key type is accepted and ignored
        let value = match split_top_level_comma(inner) {
            Some((key, value)) if key.trim() == "string" => value,
            Some((key, _)) => {
                return Err(Error::schema(
                    format!("Map keys must be strings, found '{}'", key.trim()),
                    None,
                ))
            }
            None => inner,
        };
        return Ok(TypeRef::map_of(parse_type(value, resolve)?));
    }

    match expr {
        "" => Err(Error::schema("Empty type expression", None)),
        "string" => Ok(TypeRef::String),
        "number" => Ok(TypeRef::Number),
        "boolean" | "bool" => Ok(TypeRef::Boolean),
        "date" => Ok(TypeRef::Date),
        "bytes" => Ok(TypeRef::Bytes),
        "any" => Ok(TypeRef::Any),
        name if is_identifier(name) => resolve(name)
            .map(TypeRef::Class)
            .ok_or_else(|| Error::UnknownClass {
                name: name.to_string(),
            }),
        other => Err(Error::schema(
            format!("Invalid type expression '{}'", other),
            None,
        )),
    }
}

fn generic_argument<'e>(expr: &'e str, wrapper: &str) -> Option<&'e str> {
    expr.strip_prefix(wrapper)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

// Split at the first comma outside nested angle brackets
fn split_top_level_comma(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (index, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&inner[..index], &inner[index + 1..])),
            _ => {}
        }
    }
    None
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_classes(_: &str) -> Option<ClassId> {
        None
    }

    #[test]
    fn test_scalars_and_containers() {
        assert_eq!(parse_type("string", &no_classes).unwrap(), TypeRef::String);
        assert_eq!(
            parse_type("number[]", &no_classes).unwrap(),
            TypeRef::array_of(TypeRef::Number)
        );
        assert_eq!(
            parse_type("Set<date>", &no_classes).unwrap(),
            TypeRef::set_of(TypeRef::Date)
        );
        assert_eq!(
            parse_type("Map<string, boolean[]>", &no_classes).unwrap(),
            TypeRef::map_of(TypeRef::array_of(TypeRef::Boolean))
        );
        assert_eq!(
            parse_type("Array<Map<any>>", &no_classes).unwrap(),
            TypeRef::array_of(TypeRef::map_of(TypeRef::Any))
        );
    }

    #[test]
    fn test_nested_maps() {
        let nested = TypeRef::map_of(TypeRef::map_of(TypeRef::Number));
        assert_eq!(parse_type("Map<Map<string, number>>", &no_classes).unwrap(), nested);
        assert_eq!(parse_type("Map<string, Map<string, number>>", &no_classes).unwrap(), nested);
    }

    #[test]
    fn test_class_names() {
        let id = crate::types::ClassId::next();
        let resolve = move |name: &str| (name == "Photo").then_some(id);
        assert_eq!(parse_type("Photo[]", &resolve).unwrap(), TypeRef::array_of(TypeRef::Class(id)));
        assert!(matches!(
            parse_type("Video", &resolve),
            Err(Error::UnknownClass { name }) if name == "Video"
        ));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(matches!(parse_type("", &no_classes), Err(Error::Schema { .. })));
        assert!(matches!(parse_type("Map<number, string>", &no_classes), Err(Error::Schema { .. })));
        assert!(matches!(parse_type("a b", &no_classes), Err(Error::Schema { .. })));
    }
}
