//! Numeric helper utilities shared across node evaluators.

use behave_api_core::{coercion, Value, ValueKind};

/// Apply `op` pairwise to two numeric values, broadcasting scalars when possible.
///
/// Integer pairs use `int_op` so integer arithmetic stays integral; every other combination is
/// computed on f32 components. Mismatched arities produce a NaN-filled value of the left kind.
pub fn binary_numeric<F, I>(lhs: &Value, rhs: &Value, op: F, int_op: I) -> Value
where
    F: Fn(f32, f32) -> f32 + Copy,
    I: Fn(i32, i32) -> i32,
{
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        return Value::Int(int_op(*a, *b));
    }
    let a = coercion::to_components(lhs);
    let b = coercion::to_components(rhs);
    let (kind, len) = match (a.len(), b.len()) {
        (1, 1) => (ValueKind::Float, 1),
        (1, n) => (rhs.kind(), n),
        (n, _) => (lhs.kind(), n),
    };
    if a.len() != b.len() && a.len() != 1 && b.len() != 1 {
        return coercion::reconstruct(kind, &vec![f32::NAN; len]);
    }
    let at = |v: &[f32], i: usize| if v.len() == 1 { v[0] } else { v[i] };
    let data: Vec<f32> = (0..len).map(|i| op(at(a.as_slice(), i), at(b.as_slice(), i))).collect();
    coercion::reconstruct(kind, &data)
}

/// Apply `op` to every component of `input`. Integers go through `int_op`.
pub fn unary_numeric<F, I>(input: &Value, op: F, int_op: I) -> Value
where
    F: Fn(f32) -> f32 + Copy,
    I: Fn(i32) -> i32,
{
    match input {
        Value::Int(i) => Value::Int(int_op(*i)),
        Value::Bool(_) => Value::Float(op(coercion::to_float(input))),
        other => {
            let data: Vec<f32> = coercion::to_components(other)
                .into_iter()
                .map(op)
                .collect();
            coercion::reconstruct(other.kind(), &data)
        }
    }
}

/// Numeric ordering on scalars; integers compare exactly.
pub fn compare_scalar(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => coercion::to_float(lhs).partial_cmp(&coercion::to_float(rhs)),
    }
}

/// Equality with IEEE semantics: NaN never equals anything, ints and floats compare numerically.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f32 == *b,
        _ => lhs == rhs,
    }
}
