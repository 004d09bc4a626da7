use super::{parse_bool, parse_integer};
use crate::endpoint::{ParamKind, ParamSpec};
use crate::error::Result;
use regex::Regex;

pub const UUID_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    message: String,
}

impl PatternRule {
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self> {
        Ok(PatternRule {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    pub fn matching(pattern: &str) -> Result<Self> {
        Self::new(pattern, format!("It must match the pattern {}", pattern))
    }

    pub fn uuid() -> Result<Self> {
        Self::new(UUID_PATTERN, "This is not a valid UUID.")
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Boolean,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    NotBlank,
    Type(PrimitiveType),
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Pattern(PatternRule),
}

impl Constraint {
    /// Checks `value`, returning the violation message on failure.
    pub fn check(&self, value: &str) -> std::result::Result<(), String> {
        match self {
            Constraint::NotBlank if value.trim().is_empty() => {
                Err("This value should not be blank.".to_string())
            }
            Constraint::Type(PrimitiveType::Integer) if parse_integer(value).is_err() => {
                Err("This value should be of type integer.".to_string())
            }
            Constraint::Type(PrimitiveType::Boolean) if parse_bool(value).is_err() => {
                Err("This value should be of type boolean.".to_string())
            }
            Constraint::Length { min, max } => {
                let length = value.chars().count();
                match (min, max) {
                    (Some(min), _) if length < *min => Err(format!(
                        "This value is too short. It should have {} characters or more.",
                        min
                    )),
                    (_, Some(max)) if length > *max => Err(format!(
                        "This value is too long. It should have {} characters or less.",
                        max
                    )),
                    _ => Ok(()),
                }
            }
            Constraint::Pattern(rule) if !rule.regex.is_match(value) => Err(rule.message.clone()),
            _ => Ok(()),
        }
    }
}

/// Ordered list of constraints; validation stops at the first violation.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet(Vec<Constraint>);

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.0.push(constraint);
        self
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.0
    }

    pub fn validate(&self, value: &str) -> std::result::Result<(), String> {
        self.0
            .iter()
            .try_for_each(|constraint| constraint.check(value))
    }

    /// Free-text rules for a parameter, or `None` when it is chosen from an enum.
    pub fn for_param(spec: &ParamSpec) -> Option<ConstraintSet> {
        let set = ConstraintSet::new().with(Constraint::NotBlank);

        match &spec.kind {
            ParamKind::Enum(_) => None,
            ParamKind::Integer => Some(set.with(Constraint::Type(PrimitiveType::Integer))),
            ParamKind::Boolean => Some(set.with(Constraint::Type(PrimitiveType::Boolean))),
            ParamKind::File => Some(set),
            ParamKind::String(rules) => {
                let mut set = set;
                if rules.min_length.is_some() || rules.max_length.is_some() {
                    set = set.with(Constraint::Length {
                        min: rules.min_length,
                        max: rules.max_length,
                    });
                }
                if let Some(pattern) = &rules.pattern {
                    set = set.with(Constraint::Pattern(pattern.clone()));
                }
                Some(set)
            }
        }
    }
}
