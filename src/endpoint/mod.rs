pub mod command;

use crate::binding::constraint::PatternRule;
use crate::error::{Error, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
    #[serde(alias = "body", alias = "formData")]
    Post,
}

#[derive(Debug, Clone, Default)]
pub struct StringParam {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<PatternRule>,
}

/// Primitive type behind an enumerated parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumType {
    #[default]
    String,
    Integer,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParam {
    pub values: Vec<String>,
    pub value_type: EnumType,
}

/// Declared shape of a parameter; each variant carries its own validation rules.
#[derive(Debug, Clone)]
pub enum ParamKind {
    String(StringParam),
    Integer,
    Boolean,
    Enum(EnumParam),
    /// A local file uploaded as a multipart field.
    File,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<String>,
    pub kind: ParamKind,
}

#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub name: String,
    pub method: Method,
    pub path: String,
    pub description: Option<String>,
    pub params: Vec<ParamSpec>,
}

impl EndpointDescriptor {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    /// Path parameters in the order their placeholders appear in the template.
    pub fn positional_params(&self) -> Vec<&ParamSpec> {
        placeholders(&self.path)
            .iter()
            .filter_map(|name| self.param(name))
            .collect()
    }

    pub fn option_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(|spec| spec.location != ParamLocation::Path)
    }
}

/// Names of the `{name}` placeholders in a path template, in order.
pub fn placeholders(template: &str) -> Vec<String> {
    template
        .split('{')
        .skip(1)
        .filter_map(|segment| segment.split_once('}'))
        .map(|(name, _)| name.to_string())
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    name: String,
    method: String,
    path: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<RawParam>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(rename = "type")]
    type_name: Option<String>,
    format: Option<String>,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<Value>>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    default: Option<Value>,
}

// `type` and `format` show up both beside `schema` and inside it.
#[derive(Debug, Deserialize)]
struct RawParam {
    name: String,
    #[serde(rename = "in")]
    location: ParamLocation,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    schema: RawSchema,
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<RawParam> for ParamSpec {
    type Error = Error;

    fn try_from(raw: RawParam) -> Result<Self> {
        let schema = raw.schema;
        let type_name = raw.type_name.or(schema.type_name);
        let format = raw.format.or(schema.format);

        let kind = if let Some(values) = schema.enum_values {
            let value_type = match type_name.as_deref() {
                Some("integer") | Some("int") => EnumType::Integer,
                Some("boolean") | Some("bool") => EnumType::Boolean,
                _ => EnumType::String,
            };
            ParamKind::Enum(EnumParam {
                values: values.iter().map(scalar_to_string).collect(),
                value_type,
            })
        } else if format.as_deref() == Some("binary") {
            ParamKind::File
        } else {
            match type_name.as_deref() {
                Some("integer") | Some("int") => ParamKind::Integer,
                Some("boolean") | Some("bool") => ParamKind::Boolean,
                _ => {
                    let pattern = match (format.as_deref(), schema.pattern) {
                        (Some("uuid"), _) => Some(PatternRule::uuid()?),
                        (_, Some(pattern)) => Some(PatternRule::matching(&pattern)?),
                        _ => None,
                    };
                    ParamKind::String(StringParam {
                        min_length: schema.min_length,
                        max_length: schema.max_length,
                        pattern,
                    })
                }
            }
        };

        Ok(ParamSpec {
            name: raw.name,
            // Path parameters are always required.
            required: raw.required || raw.location == ParamLocation::Path,
            location: raw.location,
            description: raw.description,
            default: schema.default.as_ref().map(scalar_to_string),
            kind,
        })
    }
}

impl TryFrom<RawEndpoint> for EndpointDescriptor {
    type Error = Error;

    fn try_from(raw: RawEndpoint) -> Result<Self> {
        let method = Method::from_bytes(raw.method.to_uppercase().as_bytes()).map_err(|_| {
            Error::DescriptorError(format!("{}: invalid method '{}'", raw.name, raw.method))
        })?;
        let params = raw
            .parameters
            .into_iter()
            .map(ParamSpec::try_from)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        for spec in &params {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::DescriptorError(format!(
                    "{}: duplicate parameter '{}'",
                    raw.name, spec.name
                )));
            }
        }

        let template: BTreeSet<String> = placeholders(&raw.path).into_iter().collect();
        let declared: BTreeSet<String> = params
            .iter()
            .filter(|spec| spec.location == ParamLocation::Path)
            .map(|spec| spec.name.clone())
            .collect();
        if template != declared {
            return Err(Error::DescriptorError(format!(
                "{}: path placeholders {:?} do not match path parameters {:?}",
                raw.name, template, declared
            )));
        }

        Ok(EndpointDescriptor {
            name: raw.name,
            method,
            path: raw.path,
            description: raw.description,
            params,
        })
    }
}

pub fn parse_descriptors(json: &str) -> Result<Vec<EndpointDescriptor>> {
    let raw: Vec<RawEndpoint> = serde_json::from_str(json)?;
    raw.into_iter().map(EndpointDescriptor::try_from).collect()
}

pub fn load_descriptors(path: &Path) -> Result<Vec<EndpointDescriptor>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        Error::DescriptorError(format!("Unable to read {}: {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), "Loading endpoint descriptors");

    parse_descriptors(&json)
}
