//! Value: runtime instances carried by value sockets, variables and pointers.
//! All floating point types use f32, integers are 32-bit like the target runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lightweight kind enum used as the semantic type tag of value sockets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Mat4,
}

impl ValueKind {
    /// Type name as written into serialized graphs.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Vec2 => "float2",
            ValueKind::Vec3 => "float3",
            ValueKind::Vec4 => "float4",
            ValueKind::Quat => "quat",
            ValueKind::Mat4 => "float4x4",
        }
    }

    /// Number of f32 components a value of this kind flattens to.
    pub fn component_count(self) -> usize {
        match self {
            ValueKind::Bool | ValueKind::Int | ValueKind::Float => 1,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Vec4 | ValueKind::Quat => 4,
            ValueKind::Mat4 => 16,
        }
    }

    /// Vectors and rotations: kinds with a meaningful length and direction.
    pub fn is_directional(self) -> bool {
        matches!(
            self,
            ValueKind::Vec2 | ValueKind::Vec3 | ValueKind::Vec4 | ValueKind::Quat
        )
    }

    /// Zero value of this kind (identity for quaternions and matrices).
    pub fn default_value(self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::Quat => Value::Quat([0.0, 0.0, 0.0, 1.0]),
            ValueKind::Mat4 => Value::Mat4(Value::IDENTITY_MAT4),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Boolean
    Bool(bool),

    /// Signed 32-bit integer
    Int(i32),

    /// Scalar float
    Float(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// 4x4 matrix, column-major
    Mat4([f32; 16]),
}

impl Value {
    pub const IDENTITY_MAT4: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    /// Return the semantic kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::Mat4(_) => ValueKind::Mat4,
        }
    }

    /// True only for a scalar float NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    /// Build a directional value of `kind` from its components.
    pub fn from_components(kind: ValueKind, data: &[f32]) -> Option<Value> {
        if data.len() != kind.component_count() {
            return None;
        }
        Some(match kind {
            ValueKind::Bool => Value::Bool(data[0] != 0.0),
            ValueKind::Int => Value::Int(data[0] as i32),
            ValueKind::Float => Value::Float(data[0]),
            ValueKind::Vec2 => Value::Vec2([data[0], data[1]]),
            ValueKind::Vec3 => Value::Vec3([data[0], data[1], data[2]]),
            ValueKind::Vec4 => Value::Vec4([data[0], data[1], data[2], data[3]]),
            ValueKind::Quat => Value::Quat([data[0], data[1], data[2], data[3]]),
            ValueKind::Mat4 => {
                let mut m = [0.0; 16];
                m.copy_from_slice(data);
                Value::Mat4(m)
            }
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

fn write_components(f: &mut fmt::Formatter<'_>, data: &[f32]) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in data.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str(")")
}

/// Human readable rendering used in assertion logs and reports.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Vec2(a) => write_components(f, a),
            Value::Vec3(a) => write_components(f, a),
            Value::Vec4(a) | Value::Quat(a) => write_components(f, a),
            Value::Mat4(m) => {
                f.write_str("[")?;
                for (row, chunk) in m.chunks(4).enumerate() {
                    if row > 0 {
                        f.write_str(", ")?;
                    }
                    write_components(f, chunk)?;
                }
                f.write_str("]")
            }
        }
    }
}
