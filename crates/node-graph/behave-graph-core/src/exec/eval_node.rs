//! Pure value-node evaluation for the reference interpreter.

use behave_api_core::{coercion, Value, ValueKind};
use hashbrown::HashMap;

use super::numeric::{binary_numeric, compare_scalar, unary_numeric, values_equal};
use super::ExecError;
use crate::types::{NodeId, NodeParams, NodeType};

type Inputs = HashMap<String, Value>;

fn input<'a>(inputs: &'a Inputs, node: NodeId, key: &str) -> Result<&'a Value, ExecError> {
    inputs.get(key).ok_or_else(|| ExecError::MissingInput {
        node,
        socket: key.to_string(),
    })
}

/// Evaluate output `socket` of a pure node from its already-resolved inputs.
pub fn eval_pure(
    node: NodeId,
    kind: NodeType,
    params: &NodeParams,
    inputs: &Inputs,
    socket: &str,
) -> Result<Value, ExecError> {
    let a = || input(inputs, node, "a");
    let b = || input(inputs, node, "b");
    let value = match kind {
        NodeType::MathAdd => binary_numeric(a()?, b()?, |x, y| x + y, i32::wrapping_add),
        NodeType::MathSub => binary_numeric(a()?, b()?, |x, y| x - y, i32::wrapping_sub),
        NodeType::MathMul => binary_numeric(a()?, b()?, |x, y| x * y, i32::wrapping_mul),
        NodeType::MathDiv => binary_numeric(a()?, b()?, |x, y| x / y, |x, y| {
            if y == 0 {
                0
            } else {
                x.wrapping_div(y)
            }
        }),
        NodeType::MathAbs => unary_numeric(a()?, f32::abs, i32::wrapping_abs),
        NodeType::MathLt => Value::Bool(compare_scalar(a()?, b()?) == Some(std::cmp::Ordering::Less)),
        NodeType::MathGt => {
            Value::Bool(compare_scalar(a()?, b()?) == Some(std::cmp::Ordering::Greater))
        }
        NodeType::MathEq => {
            let (lhs, rhs) = (a()?, b()?);
            let typed = params
                .value_type
                .map_or(true, |k| lhs.kind() == k && rhs.kind() == k);
            Value::Bool(typed && values_equal(lhs, rhs))
        }
        NodeType::MathIsNaN => Value::Bool(match a()? {
            Value::Int(_) | Value::Bool(_) => false,
            other => coercion::to_components(other).iter().any(|c| c.is_nan()),
        }),
        NodeType::MathAnd => match (a()?, b()?) {
            (Value::Int(x), Value::Int(y)) => Value::Int(x & y),
            (x, y) => Value::Bool(coercion::to_bool(x) && coercion::to_bool(y)),
        },
        NodeType::MathOr => match (a()?, b()?) {
            (Value::Int(x), Value::Int(y)) => Value::Int(x | y),
            (x, y) => Value::Bool(coercion::to_bool(x) || coercion::to_bool(y)),
        },
        NodeType::MathNot => match a()? {
            Value::Int(x) => Value::Int(!x),
            other => Value::Bool(!coercion::to_bool(other)),
        },
        NodeType::MathLength => Value::Float(coercion::length(&coercion::to_components(a()?))),
        NodeType::MathNormalize => {
            let v = a()?;
            coercion::reconstruct(v.kind(), &coercion::normalize(&coercion::to_components(v)))
        }
        NodeType::MathDot => Value::Float(coercion::dot(
            &coercion::to_components(a()?),
            &coercion::to_components(b()?),
        )),
        NodeType::MathExtract4x4 => {
            let index: usize = socket.parse().map_err(|_| ExecError::UnknownOutput {
                node,
                socket: socket.to_string(),
            })?;
            match a()? {
                Value::Mat4(m) if index < 16 => Value::Float(m[index]),
                _ => Value::Float(f32::NAN),
            }
        }
        NodeType::MathSelect => {
            if coercion::to_bool(input(inputs, node, "condition")?) {
                a()?.clone()
            } else {
                b()?.clone()
            }
        }
        NodeType::TypeBoolToFloat | NodeType::TypeIntToFloat => {
            Value::Float(coercion::to_float(a()?))
        }
        other => return Err(ExecError::NotPure { node, op: other }),
    };
    Ok(value)
}

/// Default value reported by a typed port that has never been written.
pub fn unset_value(kind: Option<ValueKind>) -> Value {
    kind.map(ValueKind::default_value)
        .unwrap_or(Value::Float(f32::NAN))
}
