//! Build configuration shared by every case of an export run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Tolerance used when a proximity check does not name its own epsilon.
    pub default_epsilon: f32,
    /// Counter value written by an order check once a flow arrives out of turn.
    pub order_sentinel: i32,
    pub pass_prefix: String,
    pub fail_prefix: String,
    /// Pointer toggled to show or hide a marker node; must expose `{nodeIndex}`.
    pub marker_visibility_pointer: String,
    /// Joins case name, assertion label and suffixes in persistent variable names.
    pub variable_separator: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            default_epsilon: 0.0001,
            order_sentinel: -100_000,
            pass_prefix: "PASS".to_string(),
            fail_prefix: "FAIL".to_string(),
            marker_visibility_pointer: "/nodes/{nodeIndex}/extensions/KHR_node_visibility/visible"
                .to_string(),
            variable_separator: "_".to_string(),
        }
    }
}

impl BuildConfig {
    /// Parse a (possibly partial) JSON configuration; missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
