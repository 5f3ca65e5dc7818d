//! Pointer template parsing and resolution.
//!
//! Grammar (JSON-pointer like, with named parameters):
//!   /segment/{param}/segment...
//! - '/' separates segments; the template must start with '/'
//! - a segment wrapped in braces is a parameter resolved from an integer input socket
//!   Examples:
//!   "/nodes/{nodeIndex}/translation" -> params=["nodeIndex"]
//!   "/extensions/KHR_node_visibility/visible" -> params=[]
//!
//! Templates are string-based; the graph exposes one Value-In per parameter on
//! `pointer/get` and `pointer/set` nodes.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer template must start with '/': {0}")]
    MissingRoot(String),
    #[error("invalid pointer template: empty segment in {0}")]
    EmptySegment(String),
    #[error("invalid pointer template: segment contains whitespace in {0}")]
    Whitespace(String),
    #[error("invalid pointer parameter '{0}'")]
    BadParameter(String),
    #[error("missing value for pointer parameter '{0}'")]
    MissingArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerTemplate {
    pub segments: Vec<Segment>,
}

impl PointerTemplate {
    /// Parse a template string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, PointerError> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingRoot(s.to_string()))?;
        let mut segments = Vec::new();
        for seg in rest.split('/') {
            if seg.is_empty() {
                return Err(PointerError::EmptySegment(s.to_string()));
            }
            if seg.chars().any(char::is_whitespace) {
                return Err(PointerError::Whitespace(s.to_string()));
            }
            if let Some(inner) = seg.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .filter(|n| !n.is_empty() && !n.contains(['{', '}']))
                    .ok_or_else(|| PointerError::BadParameter(seg.to_string()))?;
                segments.push(Segment::Param(name.to_string()));
            } else if seg.contains(['{', '}']) {
                return Err(PointerError::BadParameter(seg.to_string()));
            } else {
                segments.push(Segment::Literal(seg.to_string()));
            }
        }
        Ok(PointerTemplate { segments })
    }

    /// Iterate over parameter names in template order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every parameter, producing a concrete pointer path.
    pub fn resolve(&self, args: &[(&str, i32)]) -> Result<String, PointerError> {
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            match seg {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Param(name) => {
                    let value = args
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| PointerError::MissingArgument(name.clone()))?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for PointerTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            match seg {
                Segment::Literal(lit) => write!(f, "/{lit}")?,
                Segment::Param(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for PointerTemplate {
    type Err = PointerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointerTemplate::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for PointerTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PointerTemplate {
    fn deserialize<D>(deserializer: D) -> Result<PointerTemplate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PointerTemplate::parse(&s).map_err(de::Error::custom)
    }
}
