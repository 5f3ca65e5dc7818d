//! Assertion records handed to report writers.

use serde::Serialize;

use crate::checkbox::CheckBox;
use crate::context::TestContext;
use crate::error::ConstructionError;
use crate::marker::MarkerNodes;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionReport {
    pub label: String,
    pub result_variable_name: String,
    pub result_variable_id: usize,
    pub expected_value_as_string: String,
    pub negated: bool,
    pub marker: MarkerNodes,
}

impl AssertionReport {
    /// Fails with [`ConstructionError::Incomplete`] until the assertion was set up.
    pub fn from_checkbox(checkbox: &CheckBox) -> Result<Self, ConstructionError> {
        let incomplete = || ConstructionError::Incomplete {
            label: checkbox.label().to_string(),
        };
        let (Some(id), Some(name), Some(expected), Some(_)) = (
            checkbox.result_variable(),
            checkbox.result_variable_name(),
            checkbox.expected_value_as_string(),
            checkbox.resolution(),
        ) else {
            return Err(incomplete());
        };
        Ok(AssertionReport {
            label: checkbox.label().to_string(),
            result_variable_name: name.to_string(),
            result_variable_id: id.0,
            expected_value_as_string: expected,
            negated: checkbox.is_negated(),
            marker: *checkbox.marker(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub name: String,
    pub description: String,
    /// Event names that start each entry point, in creation order.
    pub entry_events: Vec<String>,
    /// Settle time before fallbacks run, per entry.
    pub entry_delays: Vec<Option<f32>>,
    pub assertions: Vec<AssertionReport>,
}

impl CaseReport {
    pub fn collect(ctx: &TestContext<'_>, description: &str) -> Result<Self, ConstructionError> {
        let assertions = ctx
            .checkboxes()
            .iter()
            .map(AssertionReport::from_checkbox)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CaseReport {
            name: ctx.case_name().to_string(),
            description: description.to_string(),
            entry_events: ctx.entries().iter().map(|e| e.event().to_string()).collect(),
            entry_delays: ctx.entries().iter().map(|e| e.delay()).collect(),
            assertions,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
