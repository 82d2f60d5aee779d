//! Convert command handler

use super::utils;
use crate::cli::{ConversionDirection, ConvertArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use shapeshift_core::{ClassId, ClassTransformer, TransformationOptions, Value};

/// Handle the convert command
pub fn handle_convert(args: ConvertArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("convert", &args.class_name);

    // An empty prefix would match every key
    if args.exclude_prefixes.iter().any(String::is_empty) {
        return Err(Error::invalid_args("--exclude-prefix cannot be empty"));
    }

    let schema = utils::load_schema(&args.schema)?;
    let class = schema.class(&args.class_name, &args.schema)?;
    let options = build_options(&args, &config.options);
    let input = Value::from(utils::read_document(&args.input)?);

    output.debug(&format!("direction={:?} options={:?}", args.direction, options))?;

    let transformer = ClassTransformer::new(&schema.registry);
    let result = convert(&transformer, class, &input, args.direction, &options)?;
    let document = result.to_json()?;

    match &args.output_file {
        Some(path) => {
            utils::write_document(path, &document, config.output.pretty)?;
            output.success(&format!("✓ Wrote {} to {}", args.class_name, path.display()))?;
        }
        None => {
            output.section(&args.class_name)?;
            output.data(&document)?;
        }
    }
    Ok(())
}

/// Layer command-line flags over the configured options
pub fn build_options(args: &ConvertArgs, base: &TransformationOptions) -> TransformationOptions {
    let mut options = base.clone().with_groups(args.groups.iter().cloned());
    if let Some(version) = args.target_version {
        options.version = Some(version);
    }
    if let Some(strategy) = args.strategy {
        options.strategy = strategy.into();
    }
    options.exclude_extraneous_values |= args.exclude_extraneous;
    options.enable_implicit_conversion |= args.implicit_conversion;
    options.ignore_decorators |= args.ignore_rules;
    options
        .exclude_prefixes
        .extend(args.exclude_prefixes.iter().cloned());
    options
}

/// Run one conversion of `input` rooted at `class`.
///
/// Class-shaped input is keyed by property names, so it is first
/// hydrated into instances with every rule ignored.
pub fn convert(
    transformer: &ClassTransformer<'_>,
    class: ClassId,
    input: &Value,
    direction: ConversionDirection,
    options: &TransformationOptions,
) -> shapeshift_core::Result<Value> {
    match direction {
        ConversionDirection::PlainToClass => transformer.plain_to_class(class, input, options),
        ConversionDirection::ClassToPlain => {
            let hydrate = TransformationOptions::default()
                .with_ignore_decorators(true)
                .with_implicit_conversion(options.enable_implicit_conversion);
            let instance = transformer.plain_to_class(class, input, &hydrate)?;
            transformer.class_to_plain(&instance, options)
        }
        ConversionDirection::RoundTrip => {
            let instance = transformer.plain_to_class(class, input, options)?;
            transformer.class_to_plain(&instance, options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputFormat, StrategyArg};
    use serde_json::json;
    use shapeshift_core::Strategy;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const USER_SCHEMA: &str = r#"
classes:
  - name: User
    properties:
      name:
        type: string
        expose: { name: user_name }
        transforms:
          - use: to_upper_case
            direction: to_class_only
      password:
        exclude: { direction: to_plain_only }
"#;

    fn args(dir: &Path, input: &str, direction: ConversionDirection) -> ConvertArgs {
        let schema = dir.join("classes.yaml");
        fs::write(&schema, USER_SCHEMA).unwrap();
        let input_path = dir.join("input.json");
        fs::write(&input_path, input).unwrap();

        ConvertArgs {
            input: input_path,
            schema,
            class_name: "User".to_string(),
            direction,
            groups: Vec::new(),
            target_version: None,
            strategy: None,
            exclude_extraneous: false,
            implicit_conversion: false,
            ignore_rules: false,
            exclude_prefixes: Vec::new(),
            output_file: Some(dir.join("result.json")),
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, 0, Box::new(std::io::sink()))
    }

    fn read_result(path: &Option<PathBuf>) -> serde_json::Value {
        let content = fs::read_to_string(path.as_ref().unwrap()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_round_trip_applies_rules() {
        let dir = TempDir::new().unwrap();
        let args = args(
            dir.path(),
            r#"{"user_name": "Johny Cage", "password": "secret"}"#,
            ConversionDirection::RoundTrip,
        );
        let output_file = args.output_file.clone();

        handle_convert(args, &Config::default(), &mut quiet_output()).unwrap();

        assert_eq!(read_result(&output_file), json!({"user_name": "JOHNY CAGE"}));
    }

    #[test]
    fn test_plain_to_class_uses_property_names() {
        let dir = TempDir::new().unwrap();
        let args = args(
            dir.path(),
            r#"{"user_name": "Johny Cage", "password": "secret"}"#,
            ConversionDirection::PlainToClass,
        );
        let output_file = args.output_file.clone();

        handle_convert(args, &Config::default(), &mut quiet_output()).unwrap();

        assert_eq!(
            read_result(&output_file),
            json!({"name": "JOHNY CAGE", "password": "secret"})
        );
    }

    #[test]
    fn test_class_to_plain_reads_property_names() {
        let dir = TempDir::new().unwrap();
        let args = args(
            dir.path(),
            r#"{"name": "Johny Cage", "password": "secret"}"#,
            ConversionDirection::ClassToPlain,
        );
        let output_file = args.output_file.clone();

        handle_convert(args, &Config::default(), &mut quiet_output()).unwrap();

        assert_eq!(read_result(&output_file), json!({"user_name": "Johny Cage"}));
    }

    #[test]
    fn test_unknown_class_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut args = args(dir.path(), "{}", ConversionDirection::PlainToClass);
        args.class_name = "Photo".to_string();

        let err = handle_convert(args, &Config::default(), &mut quiet_output()).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = args(dir.path(), "{}", ConversionDirection::PlainToClass);
        args.exclude_prefixes = vec![String::new()];

        let err = handle_convert(args, &Config::default(), &mut quiet_output()).unwrap_err();
        assert!(err.should_show_help());
    }

    #[test]
    fn test_flags_layer_over_config() {
        let dir = TempDir::new().unwrap();
        let mut args = args(dir.path(), "{}", ConversionDirection::PlainToClass);
        args.groups = vec!["admin".to_string()];
        args.target_version = Some(2.0);
        args.strategy = Some(StrategyArg::ExcludeAll);
        args.exclude_prefixes = vec!["__".to_string()];

        let base = TransformationOptions::default()
            .with_groups(["user"])
            .with_version(1.0)
            .with_exclude_prefixes(["_"])
            .with_implicit_conversion(true);
        let options = build_options(&args, &base);

        assert_eq!(options.strategy, Strategy::ExcludeAll);
        assert_eq!(options.version, Some(2.0));
        assert!(options.groups.contains("user") && options.groups.contains("admin"));
        assert_eq!(options.exclude_prefixes, vec!["_".to_string(), "__".to_string()]);
        assert!(options.enable_implicit_conversion);
        assert!(!options.ignore_decorators);
    }
}
