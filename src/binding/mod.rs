pub mod constraint;

use crate::endpoint::{
    placeholders, EndpointDescriptor, EnumType, ParamKind, ParamLocation, ParamSpec,
};
use crate::error::{Error, Result};
use clap::ArgMatches;
use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Argument,
    Option,
    Prompt,
}

/// Values as they arrived on the command line, before casting.
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    command: String,
    arguments: Vec<(String, Option<String>)>,
    options: BTreeMap<String, String>,
    prompted: BTreeMap<String, String>,
}

impl RawInput {
    pub fn new(command: impl Into<String>) -> Self {
        RawInput {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_argument(mut self, name: &str, value: Option<&str>) -> Self {
        self.arguments
            .push((name.to_string(), value.map(str::to_string)));
        self
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    pub fn from_matches(descriptor: &EndpointDescriptor, matches: &ArgMatches) -> Self {
        let mut input = RawInput::new(descriptor.name.clone());
        for spec in descriptor.positional_params() {
            let value = matches.get_one::<String>(&spec.name).map(String::as_str);
            input = input.with_argument(&spec.name, value);
        }
        for spec in descriptor.option_params() {
            if let Some(value) = matches.get_one::<String>(&spec.name) {
                input = input.with_option(&spec.name, value);
            }
        }
        input
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Positional arguments in definition order; the command name is not one of them.
    pub fn arguments(&self) -> &[(String, Option<String>)] {
        &self.arguments
    }

    pub fn value(&self, name: &str) -> Option<(&str, Source)> {
        if let Some(value) = self.options.get(name) {
            return Some((value, Source::Option));
        }
        let argument = self
            .arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .and_then(|(_, value)| value.as_deref());
        if let Some(value) = argument {
            return Some((value, Source::Argument));
        }
        self.prompted
            .get(name)
            .map(|value| (value.as_str(), Source::Prompt))
    }

    /// Records an answer given at a prompt.
    pub fn supply(&mut self, name: &str, value: String) {
        self.prompted.insert(name.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl ParamValue {
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::Integer(i) => Value::from(*i),
            ParamValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: ParamValue,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        contents: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Map<String, Value>),
    Multipart(Vec<MultipartField>),
}

#[derive(Debug, Clone)]
pub struct BoundRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub parameters: Vec<BoundParameter>,
}

pub(crate) fn parse_integer(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::CastError(format!("'{}' is not an integer", value)))
}

/// Accepts `true/1/yes/on` and `false/0/no/off/""`, ignoring case and surrounding space.
pub(crate) fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::CastError(format!("'{}' is not a boolean", value))),
    }
}

/// Coerces a value to the parameter's declared type. Casting a cast value is a no-op.
pub fn cast_param_type(spec: &ParamSpec, value: ParamValue) -> Result<ParamValue> {
    let target = match &spec.kind {
        ParamKind::Integer => EnumType::Integer,
        ParamKind::Boolean => EnumType::Boolean,
        ParamKind::Enum(e) => e.value_type,
        _ => return Ok(value),
    };

    match (target, value) {
        (EnumType::Integer, ParamValue::Text(s)) => parse_integer(&s).map(ParamValue::Integer),
        (EnumType::Integer, ParamValue::Boolean(b)) => Ok(ParamValue::Integer(i64::from(b))),
        (EnumType::Boolean, ParamValue::Text(s)) => parse_bool(&s).map(ParamValue::Boolean),
        (EnumType::Boolean, ParamValue::Integer(i)) => Ok(ParamValue::Boolean(i != 0)),
        (_, value) => Ok(value),
    }
}

/// Substitutes positional argument values, given or prompted, into the path template.
pub fn resolve_path(template: &str, input: &RawInput) -> Result<String> {
    let mut path = template.to_string();
    for (name, _) in input.arguments() {
        if let Some((value, _)) = input.value(name) {
            path = path.replace(&format!("{{{}}}", name), value);
        }
    }

    let unresolved = placeholders(&path);
    if !unresolved.is_empty() {
        return Err(missing_arguments(&unresolved));
    }
    Ok(path)
}

pub fn missing_arguments(names: &[String]) -> Error {
    Error::InputError(format!(
        "Not enough arguments (missing: \"{}\").",
        names.join(", ")
    ))
}

fn read_upload(name: &str, path: &str) -> Result<MultipartField> {
    let contents = std::fs::read(path)
        .map_err(|e| Error::InputError(format!("Unable to open {} for '{}': {}", path, name, e)))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    Ok(MultipartField::File {
        name: name.to_string(),
        file_name,
        contents,
    })
}

/// Partitions and casts the input into a request for `descriptor`.
pub fn bind(descriptor: &EndpointDescriptor, input: &RawInput) -> Result<BoundRequest> {
    let missing: Vec<String> = descriptor
        .params
        .iter()
        .filter(|spec| spec.required && input.value(&spec.name).is_none())
        .map(|spec| spec.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(missing_arguments(&missing));
    }

    let path = resolve_path(&descriptor.path, input)?;
    let mut query = Vec::new();
    let mut json = Map::new();
    let mut uploads = Vec::new();
    let mut parameters = Vec::new();

    for spec in &descriptor.params {
        let Some((raw, source)) = input.value(&spec.name) else {
            continue;
        };
        let value = cast_param_type(spec, ParamValue::Text(raw.to_string()))?;

        match (spec.location, &spec.kind) {
            (ParamLocation::Path, _) => {}
            (ParamLocation::Query, _) => query.push((spec.name.clone(), value.to_string())),
            (ParamLocation::Post, ParamKind::File) => uploads.push(read_upload(&spec.name, raw)?),
            (ParamLocation::Post, _) => {
                json.insert(spec.name.clone(), value.to_json());
            }
        }

        tracing::debug!(name = %spec.name, ?source, "Bound parameter");
        parameters.push(BoundParameter {
            name: spec.name.clone(),
            value,
            source,
        });
    }

    let body = if !uploads.is_empty() {
        let mut fields: Vec<MultipartField> = json
            .into_iter()
            .map(|(name, value)| MultipartField::Text {
                value: match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                name,
            })
            .collect();
        fields.extend(uploads);
        RequestBody::Multipart(fields)
    } else if !json.is_empty() {
        RequestBody::Json(json)
    } else {
        RequestBody::Empty
    };

    Ok(BoundRequest {
        method: descriptor.method.clone(),
        path,
        query,
        body,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{parse_descriptors, StringParam};
    use serde_json::json;
    use std::io::Write;

    fn spec(kind: ParamKind) -> ParamSpec {
        ParamSpec {
            name: "value".to_string(),
            location: ParamLocation::Query,
            required: false,
            description: None,
            default: None,
            kind,
        }
    }

    fn endpoint() -> Result<EndpointDescriptor> {
        let mut list = parse_descriptors(
            &json!([{
                "name": "environments:update",
                "method": "PUT",
                "path": "/applications/{applicationUuid}/environments/{environmentId}",
                "parameters": [
                    {"name": "applicationUuid", "in": "path", "schema": {"type": "string", "format": "uuid"}},
                    {"name": "environmentId", "in": "path", "schema": {"type": "string"}},
                    {"name": "limit", "in": "query", "schema": {"type": "integer"}},
                    {"name": "label", "in": "body", "required": true, "schema": {"type": "string"}},
                    {"name": "memory", "in": "body", "schema": {"type": "integer"}},
                    {"name": "production", "in": "body", "schema": {"type": "boolean"}},
                    {"name": "archive", "in": "body", "schema": {"type": "string", "format": "binary"}}
                ]
            }])
            .to_string(),
        )?;
        Ok(list.remove(0))
    }

    #[test]
    fn test_cast_integer_and_boolean() -> Result<()> {
        let integer = spec(ParamKind::Integer);
        let boolean = spec(ParamKind::Boolean);

        // Validate
        assert_eq!(
            cast_param_type(&integer, ParamValue::Text("42".to_string()))?,
            ParamValue::Integer(42)
        );
        assert_eq!(
            cast_param_type(&boolean, ParamValue::Text("".to_string()))?,
            ParamValue::Boolean(false)
        );
        assert_eq!(
            cast_param_type(&boolean, ParamValue::Text("TRUE".to_string()))?,
            ParamValue::Boolean(true)
        );
        assert_eq!(
            cast_param_type(&boolean, ParamValue::Text("0".to_string()))?,
            ParamValue::Boolean(false)
        );
        assert!(matches!(
            cast_param_type(&boolean, ParamValue::Text("x".to_string())),
            Err(Error::CastError(_))
        ));
        assert!(matches!(
            cast_param_type(&integer, ParamValue::Text("forty".to_string())),
            Err(Error::CastError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_typed_enum_values_are_cast() -> Result<()> {
        let mut list = parse_descriptors(
            &json!([{
                "name": "environments:resize",
                "method": "POST",
                "path": "/environments/{environmentId}/resize",
                "parameters": [
                    {"name": "environmentId", "in": "path", "schema": {"type": "string"}},
                    {"name": "size", "in": "body", "schema": {"type": "integer", "enum": [1, 2, 4]}},
                    {"name": "enabled", "in": "body", "schema": {"type": "boolean", "enum": [true, false]}},
                    {"name": "tier", "in": "body", "schema": {"type": "string", "enum": ["1", "2"]}}
                ]
            }])
            .to_string(),
        )?;
        let endpoint = list.remove(0);
        let input = RawInput::new("environments:resize")
            .with_argument("environmentId", Some("24-env"))
            .with_option("size", "2")
            .with_option("enabled", "false")
            .with_option("tier", "1");

        // Test
        let request = bind(&endpoint, &input)?;

        // Validate
        let expected = json!({"size": 2, "enabled": false, "tier": "1"});
        assert_eq!(request.body, RequestBody::Json(expected.as_object().cloned().unwrap_or_default()));
        Ok(())
    }

    #[test]
    fn test_cast_is_idempotent() -> Result<()> {
        let kinds = [
            ParamKind::Integer,
            ParamKind::Boolean,
            ParamKind::String(StringParam::default()),
        ];
        let inputs = ["42", "1", "yes", "", "text"];

        for kind in kinds {
            let spec = spec(kind);
            for input in inputs {
                let Ok(once) = cast_param_type(&spec, ParamValue::Text(input.to_string())) else {
                    continue;
                };

                // Test
                let twice = cast_param_type(&spec, once.clone())?;

                // Validate
                assert_eq!(once, twice);
            }
        }
        Ok(())
    }

    #[test]
    fn test_resolve_path_in_argument_order() -> Result<()> {
        let input = RawInput::new("environments:update")
            .with_argument("applicationUuid", Some("app-1"))
            .with_argument("environmentId", Some("24-env"));

        // Test
        let path = resolve_path(
            "/applications/{applicationUuid}/environments/{environmentId}",
            &input,
        )?;

        // Validate
        assert_eq!(path, "/applications/app-1/environments/24-env");
        Ok(())
    }

    #[test]
    fn test_resolve_path_fails_when_unresolved() {
        let input = RawInput::new("environments:update").with_argument("applicationUuid", Some("a"));

        // Test
        let result = resolve_path(
            "/applications/{applicationUuid}/environments/{environmentId}",
            &input,
        );

        // Validate
        match result {
            Err(Error::InputError(message)) => assert!(message.contains("environmentId")),
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn test_command_name_is_never_substituted() -> Result<()> {
        let input = RawInput::new("environments:update");

        // Test
        let path = resolve_path("/account", &input)?;

        // Validate
        assert_eq!(path, "/account");
        assert_eq!(input.command(), "environments:update");
        assert!(input.arguments().is_empty());
        Ok(())
    }

    #[test]
    fn test_bind_partitions_json_body() -> Result<()> {
        let endpoint = endpoint()?;
        let mut input = RawInput::new("environments:update")
            .with_argument("applicationUuid", Some("app-1"))
            .with_argument("environmentId", Some("24-env"))
            .with_option("limit", "10")
            .with_option("memory", "512")
            .with_option("production", "false");
        input.supply("label", "Staging".to_string());

        // Test
        let request = bind(&endpoint, &input)?;

        // Validate
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/applications/app-1/environments/24-env");
        assert_eq!(request.query, vec![("limit".to_string(), "10".to_string())]);
        let expected = json!({"label": "Staging", "memory": 512, "production": false});
        assert_eq!(request.body, RequestBody::Json(expected.as_object().cloned().unwrap_or_default()));
        let label = request.parameters.iter().find(|p| p.name == "label").expect("label");
        assert_eq!(label.source, Source::Prompt);
        let app = request.parameters.iter().find(|p| p.name == "applicationUuid").expect("app");
        assert_eq!(app.source, Source::Argument);
        Ok(())
    }

    #[test]
    fn test_bind_binary_field_as_multipart() -> anyhow::Result<()> {
        let endpoint = endpoint()?;
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "database dump")?;
        let path = file.path().to_string_lossy().into_owned();
        let input = RawInput::new("environments:update")
            .with_argument("applicationUuid", Some("app-1"))
            .with_argument("environmentId", Some("24-env"))
            .with_option("label", "Staging")
            .with_option("archive", &path);

        // Test
        let request = bind(&endpoint, &input)?;

        // Validate
        let RequestBody::Multipart(fields) = request.body else {
            panic!("expected multipart body");
        };
        assert!(fields.contains(&MultipartField::Text {
            name: "label".to_string(),
            value: "Staging".to_string()
        }));
        assert!(fields.iter().any(|field| matches!(
            field,
            MultipartField::File { name, contents, .. } if name == "archive" && contents == b"database dump"
        )));
        Ok(())
    }

    #[test]
    fn test_bind_missing_file_and_missing_required() -> Result<()> {
        let endpoint = endpoint()?;
        let base = RawInput::new("environments:update")
            .with_argument("applicationUuid", Some("app-1"))
            .with_argument("environmentId", Some("24-env"));

        // Test
        let missing_label = bind(&endpoint, &base);
        let missing_file = bind(
            &endpoint,
            &base
                .clone()
                .with_option("label", "Staging")
                .with_option("archive", "/nonexistent/dump.sql.gz"),
        );

        // Validate
        assert!(matches!(missing_label, Err(Error::InputError(m)) if m.contains("label")));
        assert!(matches!(missing_file, Err(Error::InputError(_))));
        Ok(())
    }
}
