//! Built-in transform steps for common conversions
//!
//! Each function returns a named [`TransformStep`] in both directions and
//! before conversion; callers scope it further with the step's builder
//! methods. [`by_name`] resolves the same steps for declarative schemas.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::resolver::{millis_to_date, parse_bool, parse_date, parse_number};
use crate::error::{Error, Result};
use crate::metadata::TransformStep;
use crate::value::{format_number, Value};
use anyhow::anyhow;
use chrono::format::{Item, StrftimeItems};
use chrono::SecondsFormat;
use serde_json::Value as JsonValue;
use std::fmt::Write;

/// Names accepted by [`by_name`]
pub const BUILT_IN_NAMES: &[&str] = &[
    "to_upper_case",
    "to_lower_case",
    "trim",
    "number_to_string",
    "string_to_number",
    "string_to_boolean",
    "default_value",
    "timestamp_to_date",
    "date_to_timestamp",
    "date_to_string",
    "filter_by_field",
];

fn map_string(name: &'static str, f: fn(&str) -> String) -> TransformStep {
    TransformStep::named(name, move |args| {
        Ok(match args.value {
            Value::String(s) => Value::String(f(s)),
            other => other.clone(),
        })
    })
}

/// Upper-case strings; other values pass through
pub fn to_upper_case() -> TransformStep {
    map_string("to_upper_case", str::to_uppercase)
}

/// Lower-case strings; other values pass through
pub fn to_lower_case() -> TransformStep {
    map_string("to_lower_case", str::to_lowercase)
}

pub fn trim() -> TransformStep {
    map_string("trim", |s| s.trim().to_string())
}

pub fn number_to_string() -> TransformStep {
    TransformStep::named("number_to_string", |args| {
        Ok(match args.value {
            Value::Number(n) => Value::String(format_number(*n)),
            other => other.clone(),
        })
    })
}

/// Parse numeric strings; a non-numeric string is an error
pub fn string_to_number() -> TransformStep {
    TransformStep::named("string_to_number", |args| match args.value {
        Value::String(s) => parse_number(s)
            .map(Value::Number)
            .ok_or_else(|| anyhow!("cannot convert '{}' to a number", s)),
        other => Ok(other.clone()),
    })
}

pub fn string_to_boolean() -> TransformStep {
    TransformStep::named("string_to_boolean", |args| match args.value {
        Value::String(s) => parse_bool(s)
            .map(Value::Bool)
            .ok_or_else(|| anyhow!("cannot convert '{}' to a boolean", s)),
        other => Ok(other.clone()),
    })
}

/// Replace `null` and `undefined` with `value`
pub fn default_value(value: JsonValue) -> TransformStep {
    TransformStep::named("default_value", move |args| {
        if args.value.is_nullish() {
            Ok(Value::from(value.clone()))
        } else {
            Ok(args.value.clone())
        }
    })
}

/// Milliseconds since the epoch into a date
pub fn timestamp_to_date() -> TransformStep {
    TransformStep::named("timestamp_to_date", |args| match args.value {
        Value::Number(ms) => millis_to_date(*ms)
            .map(Value::Date)
            .ok_or_else(|| anyhow!("timestamp {} is out of range", ms)),
        Value::String(s) => parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| anyhow!("cannot parse '{}' as a date", s)),
        other => Ok(other.clone()),
    })
}

/// A date into milliseconds since the epoch
pub fn date_to_timestamp() -> TransformStep {
    TransformStep::named("date_to_timestamp", |args| {
        Ok(match args.value {
            Value::Date(date) => Value::Number(date.timestamp_millis() as f64),
            other => other.clone(),
        })
    })
}

/// Whether `pattern` is a `strftime` pattern chrono can render
pub fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Format a date with a `strftime` pattern, or RFC 3339 when none is given.
///
/// A pattern chrono cannot render fails the step.
pub fn date_to_string(format: Option<String>) -> TransformStep {
    TransformStep::named("date_to_string", move |args| {
        Ok(match (args.value, &format) {
            (Value::Date(date), Some(pattern)) => {
                let mut text = String::new();
                write!(text, "{}", date.format(pattern))
                    .map_err(|_| anyhow!("invalid date format '{}'", pattern))?;
                Value::String(text)
            }
            (Value::Date(date), None) => {
                Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            (other, _) => other.clone(),
        })
    })
}

/// Keep only members of a sequence whose `field` equals `expected`
pub fn filter_by_field(field: impl Into<String>, expected: JsonValue) -> TransformStep {
    let field = field.into();
    TransformStep::named("filter_by_field", move |args| {
        let Some(items) = args.value.items() else {
            return Ok(args.value.clone());
        };
        let expected = Value::from(expected.clone());
        let kept = items
            .into_iter()
            .filter(|item| item.get(&field).as_ref() == Some(&expected));
        Ok(match args.value {
            Value::Set(_) => Value::set(kept),
            _ => Value::array(kept),
        })
    })
}

/// Look up a built-in step by name.
///
/// `args` carries the parameters of parameterized steps:
/// `default_value` takes `{"value": ..}`, `date_to_string` an optional
/// `{"format": ".."}` and `filter_by_field` takes `{"field": "..", "equals": ..}`.
pub fn by_name(name: &str, args: &JsonValue) -> Result<TransformStep> {
    let step = match name {
        "to_upper_case" => to_upper_case(),
        "to_lower_case" => to_lower_case(),
        "trim" => trim(),
        "number_to_string" => number_to_string(),
        "string_to_number" => string_to_number(),
        "string_to_boolean" => string_to_boolean(),
        "timestamp_to_date" => timestamp_to_date(),
        "date_to_timestamp" => date_to_timestamp(),
        "default_value" => {
            let value = args
                .get("value")
                .cloned()
                .ok_or_else(|| Error::schema("default_value requires a 'value' argument", None))?;
            default_value(value)
        }
        "date_to_string" => {
            let format = args
                .get("format")
                .and_then(JsonValue::as_str)
                .map(str::to_string);
            if let Some(pattern) = format.as_deref().filter(|p| !is_valid_date_format(p)) {
                return Err(Error::schema(
                    format!("date_to_string has an invalid 'format' argument '{}'", pattern),
                    None,
                ));
            }
            date_to_string(format)
        }
        "filter_by_field" => {
            let field = args
                .get("field")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| Error::schema("filter_by_field requires a 'field' argument", None))?;
            let expected = args.get("equals").cloned().unwrap_or(JsonValue::Null);
            filter_by_field(field, expected)
        }
        unknown => {
            return Err(Error::schema(
                format!(
                    "Unknown transform '{}'; expected one of: {}",
                    unknown,
                    BUILT_IN_NAMES.join(", ")
                ),
                None,
            ))
        }
    };
    Ok(step)
}
