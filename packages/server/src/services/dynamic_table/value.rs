use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::FieldDataType;
use sea_orm::Value;
use serde_json::Value as Json;

use super::SchemaError;
use crate::entity::custom_field;

const MAX_TEXT_LEN: usize = 255;
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Validate a choice list sent when defining a field.
///
/// Only text fields accept choices; they must be a non-empty array of strings.
pub fn parse_choices(
    data_type: FieldDataType,
    raw: Option<&Json>,
) -> Result<Option<Vec<String>>, SchemaError> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    if !data_type.supports_choices() {
        return Err(SchemaError::InvalidChoices(format!(
            "{data_type} fields do not support choices"
        )));
    }
    let items = raw
        .as_array()
        .ok_or_else(|| SchemaError::InvalidChoices("expected a JSON array".into()))?;
    if items.is_empty() {
        return Err(SchemaError::InvalidChoices("must not be empty".into()));
    }
    items
        .iter()
        .map(|item| match item.as_str() {
            Some(s) if s.chars().count() <= MAX_TEXT_LEN => Ok(s.to_owned()),
            Some(_) => Err(SchemaError::InvalidChoices(format!(
                "choices must be at most {MAX_TEXT_LEN} characters"
            ))),
            None => Err(SchemaError::InvalidChoices(
                "every choice must be a string".into(),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Check that a stored default value is valid for the field definition.
pub fn parse_default(
    field: &str,
    data_type: FieldDataType,
    choices: &[String],
    default: &str,
) -> Result<Value, SchemaError> {
    coerce(field, data_type, choices, &Json::String(default.to_owned()))
}

/// Choice list stored on a field, empty when unrestricted.
pub(crate) fn stored_choices(field: &custom_field::Model) -> Vec<String> {
    field
        .choices
        .as_ref()
        .and_then(Json::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Convert a JSON input value into a bound database value of the field's type.
pub(crate) fn coerce_field(field: &custom_field::Model, input: &Json) -> Result<Value, SchemaError> {
    coerce(&field.name, field.data_type, &stored_choices(field), input)
}

fn coerce(
    field: &str,
    data_type: FieldDataType,
    choices: &[String],
    input: &Json,
) -> Result<Value, SchemaError> {
    if input.is_null() {
        return Ok(null_of(data_type));
    }
    let value = parse_typed(data_type, input).map_err(|reason| SchemaError::InvalidValue {
        field: field.to_owned(),
        reason,
    })?;
    if data_type.supports_choices()
        && !choices.is_empty()
        && let Value::String(Some(text)) = &value
        && !choices.iter().any(|c| c == text.as_str())
    {
        return Err(SchemaError::InvalidValue {
            field: field.to_owned(),
            reason: format!("must be one of: {}", choices.join(", ")),
        });
    }
    Ok(value)
}

fn null_of(data_type: FieldDataType) -> Value {
    match data_type {
        FieldDataType::Text => Option::<String>::None.into(),
        FieldDataType::Integer => Option::<i32>::None.into(),
        FieldDataType::Decimal => Option::<f64>::None.into(),
        FieldDataType::Boolean => Option::<bool>::None.into(),
        FieldDataType::Date => Option::<NaiveDate>::None.into(),
        FieldDataType::DateTime => Option::<NaiveDateTime>::None.into(),
    }
}

fn parse_typed(data_type: FieldDataType, input: &Json) -> Result<Value, String> {
    match (data_type, input) {
        (FieldDataType::Text, Json::String(s)) => {
            if s.chars().count() > MAX_TEXT_LEN {
                return Err(format!("must be at most {MAX_TEXT_LEN} characters"));
            }
            Ok(s.clone().into())
        }
        (FieldDataType::Text, Json::Number(n)) => Ok(n.to_string().into()),
        (FieldDataType::Integer, Json::Number(n)) => {
            let n = n.as_i64().ok_or("expected a whole number")?;
            to_i32(n)
        }
        (FieldDataType::Integer, Json::String(s)) => {
            let n = s
                .trim()
                .parse::<i64>()
                .map_err(|_| "expected a whole number".to_owned())?;
            to_i32(n)
        }
        (FieldDataType::Decimal, Json::Number(n)) => {
            n.as_f64().map(Value::from).ok_or_else(|| "expected a number".into())
        }
        (FieldDataType::Decimal, Json::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n.into()),
            _ => Err("expected a number".into()),
        },
        (FieldDataType::Boolean, Json::Bool(b)) => Ok((*b).into()),
        (FieldDataType::Boolean, Json::String(s)) => parse_bool_text(s)
            .map(Value::from)
            .ok_or_else(|| "expected true or false".into()),
        (FieldDataType::Date, Json::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Value::from)
            .map_err(|_| "expected a date as YYYY-MM-DD".into()),
        (FieldDataType::DateTime, Json::String(s)) => parse_datetime(s.trim())
            .map(Value::from)
            .ok_or_else(|| "expected a date-time as YYYY-MM-DDTHH:MM:SS".into()),
        (data_type, _) => Err(format!("expected a value of type {data_type}")),
    }
}

fn to_i32(n: i64) -> Result<Value, String> {
    i32::try_from(n)
        .map(Value::from)
        .map_err(|_| "integer out of range".into())
}

fn parse_bool_text(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// RFC 3339 input is converted to UTC; naive input is stored as given.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Convert a column read back as text into JSON of the declared type.
///
/// Values that do not parse are returned as strings rather than dropped.
pub(crate) fn decode_cell(data_type: FieldDataType, raw: Option<String>) -> Json {
    let Some(raw) = raw else {
        return Json::Null;
    };
    match data_type {
        FieldDataType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Json::from)
            .unwrap_or(Json::String(raw)),
        FieldDataType::Decimal => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number)
            .unwrap_or(Json::String(raw)),
        FieldDataType::Boolean => parse_bool_text(&raw)
            .map(Json::Bool)
            .unwrap_or(Json::String(raw)),
        FieldDataType::Text | FieldDataType::Date | FieldDataType::DateTime => Json::String(raw),
    }
}
