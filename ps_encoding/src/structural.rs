// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

//! Generic JSON mapping used when no dedicated JSON codec exists for a type.

use base64::Engine;

use ps_api::data::{DataType, DataValue};
use ps_api::error::{EncodeError, ParseError};

use crate::declaration::ValueShape;

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Decode `value` according to the shape of `data_type`.
pub fn decode(value: &serde_json::Value, shape: ValueShape, data_type: &DataType) -> Result<DataValue, ParseError> {
    let mismatch = || ParseError::TypeMismatch {
        expected: data_type.to_string(),
        found: json_kind(value).to_string(),
    };

    match shape {
        ValueShape::Boolean => value.as_bool().map(DataValue::Boolean).ok_or_else(mismatch),
        ValueShape::Integer => value.as_i64().map(DataValue::Integer).ok_or_else(mismatch),
        ValueShape::Double => value.as_f64().map(DataValue::Double).ok_or_else(mismatch),
        ValueShape::Text => value.as_str().map(|s| DataValue::Text(s.to_string())).ok_or_else(mismatch),
        ValueShape::Array if value.is_array() => Ok(DataValue::Structured(value.clone())),
        ValueShape::Object if value.is_object() => Ok(DataValue::Structured(value.clone())),
        ValueShape::Array | ValueShape::Object => Err(mismatch()),
        ValueShape::Uncertainty => Ok(DataValue::Uncertainty(uncertml::from_json(value.clone())?)),
        ValueShape::Binary => {
            let encoded = value.as_str().ok_or_else(mismatch)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| ParseError::Malformed(format!("invalid base64 content: {}", e)))?;
            Ok(DataValue::Binary(bytes))
        }
    }
}

/// Encode any inline value as JSON.
pub fn encode(value: &DataValue) -> Result<serde_json::Value, EncodeError> {
    match value {
        DataValue::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        DataValue::Integer(i) => Ok(serde_json::Value::from(*i)),
        DataValue::Double(d) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .ok_or_else(|| EncodeError::Unsupported {
                codec: "structural JSON".to_string(),
                found: d.to_string(),
            }),
        DataValue::Text(s) => Ok(serde_json::Value::String(s.clone())),
        DataValue::Structured(v) => Ok(v.clone()),
        DataValue::Uncertainty(u) => Ok(uncertml::to_json(u)?),
        DataValue::Binary(bytes) => Ok(serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))),
        DataValue::Reference(_) => Err(crate::codec::unsupported("structural JSON", value)),
    }
}
