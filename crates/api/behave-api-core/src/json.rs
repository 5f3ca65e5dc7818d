use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::{Value, ValueKind};

/// Errors produced while reading an expected value from JSON.
#[derive(Debug, Error, PartialEq)]
pub enum JsonValueError {
    #[error("expected value is null")]
    Missing,
    #[error("numeric array of length {0} does not map to a value kind")]
    BadArity(usize),
    #[error("unsupported value json: {0}")]
    Unsupported(String),
}

/// Parse shorthand or canonical value JSON.
///
/// Accepted forms:
/// - canonical `{ "type": "vec3", "data": [0, 1, 0] }`
/// - tagged shorthand such as `{ "int": 3 }`, `{ "quat": [0, 0, 0, 1] }`, `{ "mat4": [...16] }`
/// - primitive aliases: numbers become `Float`, booleans `Bool`, numeric arrays of length
///   2/3/4/16 become `Vec2`/`Vec3`/`Vec4`/`Mat4`
/// - the strings `"NaN"`, `"Infinity"` and `"-Infinity"` become the matching float, since
///   JSON numbers cannot carry them
///
/// `null` is reported as [`JsonValueError::Missing`].
pub fn value_from_json(value: &JsonValue) -> Result<Value, JsonValueError> {
    match value {
        JsonValue::Null => Err(JsonValueError::Missing),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => n
            .as_f64()
            .map(|f| Value::Float(f as f32))
            .ok_or_else(|| JsonValueError::Unsupported(n.to_string())),
        JsonValue::String(s) => special_float(s)
            .map(Value::Float)
            .ok_or_else(|| JsonValueError::Unsupported(s.clone())),
        JsonValue::Array(items) => {
            let data = numbers(items)?;
            let kind = match data.len() {
                2 => ValueKind::Vec2,
                3 => ValueKind::Vec3,
                4 => ValueKind::Vec4,
                16 => ValueKind::Mat4,
                other => return Err(JsonValueError::BadArity(other)),
            };
            Value::from_components(kind, &data).ok_or(JsonValueError::BadArity(data.len()))
        }
        JsonValue::Object(obj) => {
            if obj.contains_key("type") && obj.contains_key("data") {
                return serde_json::from_value(value.clone())
                    .map_err(|e| JsonValueError::Unsupported(e.to_string()));
            }
            if let Some(i) = obj.get("int").and_then(|x| x.as_i64()) {
                return Ok(Value::Int(i as i32));
            }
            if let Some(f) = obj.get("float") {
                return match value_from_json(f)? {
                    Value::Float(f) => Ok(Value::Float(f)),
                    other => Err(JsonValueError::Unsupported(other.to_string())),
                };
            }
            if let Some(b) = obj.get("bool").and_then(|x| x.as_bool()) {
                return Ok(Value::Bool(b));
            }
            let tagged = [
                ("vec2", ValueKind::Vec2),
                ("vec3", ValueKind::Vec3),
                ("vec4", ValueKind::Vec4),
                ("quat", ValueKind::Quat),
                ("mat4", ValueKind::Mat4),
            ];
            for (key, kind) in tagged {
                if let Some(arr) = obj.get(key).and_then(|x| x.as_array()) {
                    let data = numbers(arr)?;
                    return Value::from_components(kind, &data)
                        .ok_or(JsonValueError::BadArity(data.len()));
                }
            }
            Err(JsonValueError::Unsupported(value.to_string()))
        }
    }
}

fn special_float(s: &str) -> Option<f32> {
    match s {
        "NaN" | "nan" => Some(f32::NAN),
        "Infinity" | "inf" => Some(f32::INFINITY),
        "-Infinity" | "-inf" => Some(f32::NEG_INFINITY),
        _ => None,
    }
}

fn numbers(items: &[JsonValue]) -> Result<Vec<f32>, JsonValueError> {
    items
        .iter()
        .map(|item| match item {
            JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
            JsonValue::String(s) => special_float(s),
            _ => None,
        })
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| JsonValueError::Unsupported(JsonValue::Array(items.to_vec()).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_and_arrays() {
        assert_eq!(value_from_json(&json!(3.0)), Ok(Value::Float(3.0)));
        assert_eq!(value_from_json(&json!(true)), Ok(Value::Bool(true)));
        assert_eq!(
            value_from_json(&json!([0, 1, 0])),
            Ok(Value::Vec3([0.0, 1.0, 0.0]))
        );
        assert_eq!(value_from_json(&json!([1, 2, 3, 4, 5])), Err(JsonValueError::BadArity(5)));
    }

    #[test]
    fn tagged_and_canonical() {
        assert_eq!(value_from_json(&json!({ "int": 4 })), Ok(Value::Int(4)));
        assert_eq!(
            value_from_json(&json!({ "quat": [0, 0, 0, 1] })),
            Ok(Value::Quat([0.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(
            value_from_json(&json!({ "type": "vec2", "data": [1.0, 2.0] })),
            Ok(Value::Vec2([1.0, 2.0]))
        );
    }

    #[test]
    fn null_and_nan() {
        assert_eq!(value_from_json(&JsonValue::Null), Err(JsonValueError::Missing));
        assert!(value_from_json(&json!("NaN")).expect("nan parses").is_nan());
    }
}
