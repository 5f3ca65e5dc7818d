use behave_api_core::{Value, ValueKind};
use behave_graph_core::NodeType;

use crate::case::{prepared, TestCase};
use crate::checkbox::CheckBoxId;
use crate::context::TestContext;
use crate::error::ConstructionError;

#[derive(Default)]
pub struct VariableCase {
    initial: Option<CheckBoxId>,
    written: Option<CheckBoxId>,
    direction: Option<CheckBoxId>,
}

impl TestCase for VariableCase {
    fn name(&self) -> &str {
        "state/variable"
    }

    fn description(&self) -> &str {
        "Variables report their initial value until written, then the written value."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.initial = Some(ctx.add_checkbox("initial speed"));
        self.written = Some(ctx.add_checkbox("written speed"));
        self.direction = Some(ctx.add_checkbox("written heading"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let initial = prepared(self.initial, self.name())?;
        let written = prepared(self.written, self.name())?;
        let direction = prepared(self.direction, self.name())?;
        ctx.new_entry_point("main")?;

        let speed_name = ctx.unique_variable_name(&ctx.persistent_name(&["speed"]));
        let heading_name = ctx.unique_variable_name(&ctx.persistent_name(&["heading"]));
        let graph = ctx.graph_mut();
        let speed = graph.add_variable(&speed_name, 1.5_f32)?;
        let heading = graph.add_variable(&heading_name, Value::vec3(1.0, 0.0, 0.0))?;
        let speed_value = graph.get_variable(speed)?;
        let heading_value = graph.get_variable(heading)?;

        let set_speed = graph.set_variable(speed)?;
        graph.set_input(set_speed, "value", 4.5_f32)?;
        let set_heading = graph.set_variable(heading)?;
        graph.set_input(set_heading, "value", Value::vec3(0.0, 0.0, 2.0))?;
        graph.connect_flow(
            &graph.flow_out(set_speed, "out")?,
            &graph.flow_in(set_heading, "in")?,
        )?;
        let write = graph.flow_in(set_speed, "in")?;

        let before = ctx
            .check(initial)?
            .setup_check_value(&speed_value, Value::Float(1.5), false)?;
        ctx.add_sequenced_flow(&before)?;
        ctx.add_sequenced_flow(&write)?;
        let after = ctx
            .check(written)?
            .setup_check_value(&speed_value, Value::Float(4.5), false)?;
        ctx.add_sequenced_flow(&after)?;
        let heading_after = ctx.check(direction)?.setup_check_value(
            &heading_value.with_kind(ValueKind::Vec3),
            Value::vec3(0.0, 0.0, 2.0),
            true,
        )?;
        ctx.add_sequenced_flow(&heading_after)
    }
}

const SCALE_POINTER: &str = "/nodes/{nodeIndex}/scale";

#[derive(Default)]
pub struct PointerCase {
    written: Option<CheckBoxId>,
    valid: Option<CheckBoxId>,
    untouched: Option<CheckBoxId>,
}

impl TestCase for PointerCase {
    fn name(&self) -> &str {
        "state/pointer"
    }

    fn description(&self) -> &str {
        "A pointer written through pointer/set reads back through pointer/get."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.written = Some(ctx.add_checkbox("written scale"));
        self.valid = Some(ctx.add_checkbox("written pointer valid"));
        self.untouched = Some(ctx.add_checkbox("untouched pointer valid"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let written = prepared(self.written, self.name())?;
        let valid = prepared(self.valid, self.name())?;
        let untouched = prepared(self.untouched, self.name())?;
        ctx.new_entry_point("main")?;

        let scale = Value::vec3(2.0, 2.0, 2.0);
        let graph = ctx.graph_mut();
        let set = graph.pointer_node(
            NodeType::PointerSet,
            SCALE_POINTER,
            ValueKind::Vec3,
            &[("nodeIndex", 0)],
        )?;
        graph.set_input(set, "value", scale.clone())?;
        let get = graph.pointer_node(
            NodeType::PointerGet,
            SCALE_POINTER,
            ValueKind::Vec3,
            &[("nodeIndex", 0)],
        )?;
        let other = graph.pointer_node(
            NodeType::PointerGet,
            SCALE_POINTER,
            ValueKind::Vec3,
            &[("nodeIndex", 1)],
        )?;
        let read = graph.value_out(get, "value")?;
        let read_valid = graph.value_out(get, "isValid")?;
        let other_valid = graph.value_out(other, "isValid")?;
        let write = graph.flow_in(set, "in")?;

        ctx.add_sequenced_flow(&write)?;
        let flow = ctx.check(written)?.setup_check_value(&read, scale, true)?;
        ctx.add_sequenced_flow(&flow)?;
        let flow = ctx
            .check(valid)?
            .setup_check_value(&read_valid, Value::Bool(true), false)?;
        ctx.add_sequenced_flow(&flow)?;
        let flow = ctx
            .check(untouched)?
            .setup_check_value(&other_valid, Value::Bool(false), false)?;
        ctx.add_sequenced_flow(&flow)
    }
}
