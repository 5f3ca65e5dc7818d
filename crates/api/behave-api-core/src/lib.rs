//! behave-api-core: typed socket values and pointer templates (engine-agnostic)

pub mod coercion;
pub mod json;
pub mod pointer;
pub mod value;

pub use json::{value_from_json, JsonValueError};
pub use pointer::{PointerError, PointerTemplate};
pub use value::{Value, ValueKind};
