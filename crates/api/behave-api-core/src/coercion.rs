//! Coercion helpers between Value kinds.
//! Numeric kinds flatten to f32 components; bool flattens to 0/1.

use crate::{Value, ValueKind};

/// Attempt to coerce a Value into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Int -> cast
/// - Bool -> 1.0 / 0.0
/// - Vectors, quaternions and matrices -> first component
pub fn to_float(v: &Value) -> f32 {
    match v {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f32,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Vec2(a) => a[0],
        Value::Vec3(a) => a[0],
        Value::Vec4(a) | Value::Quat(a) => a[0],
        Value::Mat4(m) => m[0],
    }
}

/// Flatten a Value into its components.
pub fn to_components(v: &Value) -> Vec<f32> {
    match v {
        Value::Float(_) | Value::Int(_) | Value::Bool(_) => vec![to_float(v)],
        Value::Vec2(a) => a.to_vec(),
        Value::Vec3(a) => a.to_vec(),
        Value::Vec4(a) | Value::Quat(a) => a.to_vec(),
        Value::Mat4(m) => m.to_vec(),
    }
}

/// Coerce a Value to a boolean, treating non-zero numeric entries as `true`.
pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        _ => to_components(v).iter().any(|x| *x != 0.0),
    }
}

/// Coerce a Value to an integer, truncating floats.
pub fn to_int(v: &Value) -> i32 {
    match v {
        Value::Int(i) => *i,
        other => to_float(other) as i32,
    }
}

/// Euclidean length of the flattened components.
pub fn length(data: &[f32]) -> f32 {
    data.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product over the common prefix of two component lists.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Normalise components; zero-length input stays zero.
pub fn normalize(data: &[f32]) -> Vec<f32> {
    let len = length(data);
    if len <= f32::EPSILON {
        return vec![0.0; data.len()];
    }
    data.iter().map(|x| x / len).collect()
}

/// Rebuild a value of `kind` from `data`, falling back to a NaN-filled value on arity mismatch.
pub fn reconstruct(kind: ValueKind, data: &[f32]) -> Value {
    Value::from_components(kind, data).unwrap_or_else(|| {
        let nan = vec![f32::NAN; kind.component_count()];
        Value::from_components(kind, &nan).unwrap_or(Value::Float(f32::NAN))
    })
}
