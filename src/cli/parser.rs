// CLI parsing utilities for lead commands

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use crate::models::CallStatus;
use crate::utils::date::parse_datetime_expr;
use crate::utils::fuzzy::levenshtein_distance;

/// Parsed lead arguments from the command line.
/// Nullable fields use `Some(None)` for an explicit clear (`field=` or `field=none`).
#[derive(Debug, Default, PartialEq)]
pub struct ParsedLeadArgs {
    pub name_words: Vec<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub stage: Option<String>,
    pub follow_up: Option<Option<DateTime<FixedOffset>>>,
    pub call_status: Option<Option<CallStatus>>,
    pub considering: Option<bool>,
}

impl ParsedLeadArgs {
    /// `name=` wins over free words
    pub fn client_name(&self) -> Option<String> {
        match &self.name {
            Some(name) => Some(name.clone()),
            None if !self.name_words.is_empty() => Some(self.name_words.join(" ")),
            None => None,
        }
    }
}

/// Field token error
#[derive(Debug, PartialEq)]
pub enum FieldParseError {
    InvalidFieldName {
        field: String,
        suggestion: String,
    },
    ReadOnlyField {
        field: String,
        hint: String,
    },
    UnknownFieldToken {
        token: String,
    },
    InvalidValue {
        field: String,
        message: String,
    },
}

impl std::fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldParseError::InvalidFieldName { field, suggestion } => {
                write!(f, "Unrecognized field name '{}'\n  Did you mean '{}'?", field, suggestion)
            }
            FieldParseError::ReadOnlyField { field, hint } => {
                write!(f, "Field '{}' cannot be modified directly.\n  {}", field, hint)
            }
            FieldParseError::UnknownFieldToken { token } => {
                write!(f, "Unrecognized field token '{}'\n  Quote the value if the equals sign is part of the name.", token)
            }
            FieldParseError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for FieldParseError {}

const FIELD_NAMES: &[&str] = &[
    "name",
    "phone",
    "stage",
    "follow_up",
    "call_status",
    "considering",
];

/// Fields the service owns; named here only to give helpful errors
const READ_ONLY_FIELDS: &[&str] = &[
    "id",
    "converted",
    "is_converted",
    "created",
    "created_at",
];

fn find_similar_field_name(field: &str) -> Option<String> {
    let field = field.to_lowercase();
    FIELD_NAMES.iter()
        .map(|name| (*name, levenshtein_distance(&field, name)))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name.to_string())
}

fn get_read_only_hint(field: &str) -> String {
    match field.to_lowercase().as_str() {
        "converted" | "is_converted" => "Use 'leadboard convert <lead>' to convert a lead into a client.".to_string(),
        "created" | "created_at" => "Created timestamp is set by the lead service.".to_string(),
        "id" => "Lead ID is assigned by the lead service and cannot be changed.".to_string(),
        _ => "This field is read-only.".to_string(),
    }
}

fn is_clear(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn parse_bool(field: &str, value: &str) -> Result<bool, FieldParseError> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(true),
        "no" | "false" | "0" | "off" => Ok(false),
        _ => Err(FieldParseError::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is not yes or no", value),
        }),
    }
}

/// Split a `field=value` token; `None` if the token has no `=`
fn split_field_token(token: &str) -> Option<(&str, &str)> {
    token.split_once('=')
}

/// Parse lead add/edit arguments.
/// Tokens without `=` are words of the client name; field tokens may appear anywhere.
pub fn parse_lead_args(args: Vec<String>) -> Result<ParsedLeadArgs, FieldParseError> {
    let mut parsed = ParsedLeadArgs::default();

    for arg in &args {
        let Some((field, value)) = split_field_token(arg) else {
            parsed.name_words.push(arg.clone());
            continue;
        };
        let value = value.trim();

        match field.to_lowercase().as_str() {
            "name" => parsed.name = Some(value.to_string()),
            "phone" => parsed.phone = Some(value.to_string()),
            "stage" => parsed.stage = Some(value.to_string()),
            "follow_up" => {
                parsed.follow_up = if is_clear(value) {
                    Some(None)
                } else {
                    let date = parse_datetime_expr(value).map_err(|e| FieldParseError::InvalidValue {
                        field: field.to_string(),
                        message: e.to_string(),
                    })?;
                    Some(Some(date))
                };
            }
            "call_status" => {
                parsed.call_status = if is_clear(value) {
                    Some(None)
                } else {
                    let status = CallStatus::from_str(value).ok_or_else(|| FieldParseError::InvalidValue {
                        field: field.to_string(),
                        message: format!(
                            "'{}' is not one of answered, not_answered, client_answered, client_not_answered",
                            value
                        ),
                    })?;
                    Some(Some(status))
                };
            }
            "considering" => parsed.considering = Some(parse_bool(field, value)?),
            _ => {
                if READ_ONLY_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(field)) {
                    return Err(FieldParseError::ReadOnlyField {
                        field: field.to_string(),
                        hint: get_read_only_hint(field),
                    });
                }
                return Err(match find_similar_field_name(field) {
                    Some(suggestion) => FieldParseError::InvalidFieldName {
                        field: field.to_string(),
                        suggestion,
                    },
                    None => FieldParseError::UnknownFieldToken { token: arg.clone() },
                });
            }
        }
    }

    Ok(parsed)
}

/// Parse free-form `key=value` tokens into a JSON object.
/// Values that read as JSON scalars (numbers, booleans, null) keep that type.
pub fn parse_key_values(args: &[String]) -> Result<Map<String, Value>, FieldParseError> {
    let mut data = Map::new();
    for arg in args {
        let (key, value) = split_field_token(arg)
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| FieldParseError::UnknownFieldToken { token: arg.clone() })?;
        let value = match serde_json::from_str::<Value>(value) {
            Ok(scalar @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => scalar,
            _ => Value::String(value.to_string()),
        };
        data.insert(key.trim().to_string(), value);
    }
    Ok(data)
}
