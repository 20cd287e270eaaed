//! Result decoder / view mapper.
//!
//! Turns the text payload of a catalog tool call into [`Beverage`] values.
//! Object keys are matched case-insensitively, so `Name`, `name` and `NAME`
//! all land in [`Beverage::name`]. The key names used by the older catalog
//! service (`beverageId`, `type`, `mainIngredient`, `origin`) are accepted
//! as aliases.
//!
//! [`decode_beverages`] never fails: any structural problem yields an empty
//! list. Use [`try_decode_beverages`] to find out what went wrong.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::Beverage;

/// Why a payload could not be mapped onto records.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of records, got {0}")]
    NotAnArray(&'static str),

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index} has no integer id")]
    MissingId { index: usize },

    #[error("record {index}: field '{field}' must be {expected}, got {actual}")]
    FieldType {
        index: usize,
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Decode `text` into records, substituting an empty list on any failure.
pub fn decode_beverages(text: &str) -> Vec<Beverage> {
    try_decode_beverages(text).unwrap_or_default()
}

/// Decode `text` into records.
///
/// A top-level `null` decodes to an empty list. Unknown keys are ignored.
pub fn try_decode_beverages(text: &str) -> Result<Vec<Beverage>, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => return Err(DecodeError::NotAnArray(json_type_name(&other))),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => map_record(index, obj),
            _ => Err(DecodeError::NotAnObject { index }),
        })
        .collect()
}

fn map_record(index: usize, obj: &Map<String, Value>) -> Result<Beverage, DecodeError> {
    let mut id = None;
    let mut b = Beverage {
        id: 0,
        name: None,
        category: None,
        primary_ingredient: None,
        origin_region: None,
        calories_per_serving: None,
    };

    for (key, value) in obj {
        match key.to_lowercase().as_str() {
            "id" | "beverageid" => id = value.as_i64(),
            "name" => b.name = text_field(index, "name", value)?,
            "category" | "type" => b.category = text_field(index, "category", value)?,
            "primaryingredient" | "mainingredient" => {
                b.primary_ingredient = text_field(index, "primaryIngredient", value)?
            }
            "originregion" | "origin" => {
                b.origin_region = text_field(index, "originRegion", value)?
            }
            "caloriesperserving" => {
                b.calories_per_serving = int_field(index, "caloriesPerServing", value)?
            }
            _ => {}
        }
    }

    b.id = id.ok_or(DecodeError::MissingId { index })?;
    Ok(b)
}

fn text_field(
    index: usize,
    field: &'static str,
    value: &Value,
) -> Result<Option<String>, DecodeError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(DecodeError::FieldType {
            index,
            field,
            expected: "a string",
            actual: json_type_name(other),
        }),
    }
}

fn int_field(index: usize, field: &'static str, value: &Value) -> Result<Option<i64>, DecodeError> {
    match value {
        Value::Null => Ok(None),
        v => v.as_i64().map(Some).ok_or(DecodeError::FieldType {
            index,
            field,
            expected: "an integer",
            actual: json_type_name(v),
        }),
    }
}

/// JSON type name for error messages.
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
