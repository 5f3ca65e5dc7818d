use behave_api_core::{Value, ValueKind};
use behave_graph_core::{NodeType, ValueOutRef};
use serde_json::json;

use crate::case::{prepared, TestCase};
use crate::checkbox::CheckBoxId;
use crate::compare::math;
use crate::context::TestContext;
use crate::error::ConstructionError;

fn binary(
    ctx: &mut TestContext<'_>,
    kind: NodeType,
    a: impl Into<Value>,
    b: impl Into<Value>,
) -> Result<ValueOutRef, ConstructionError> {
    let (a, b): (Value, Value) = (a.into(), b.into());
    Ok(math(ctx.graph_mut(), kind, a, Some(b.into()))?)
}

#[derive(Default)]
pub struct AddCase {
    float_sum: Option<CheckBoxId>,
    int_sum: Option<CheckBoxId>,
}

impl TestCase for AddCase {
    fn name(&self) -> &str {
        "math/add"
    }

    fn description(&self) -> &str {
        "Adds floats and integers; integer sums stay integral."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.float_sum = Some(ctx.add_checkbox("float sum"));
        self.int_sum = Some(ctx.add_checkbox("int sum"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let float_sum = prepared(self.float_sum, self.name())?;
        let int_sum = prepared(self.int_sum, self.name())?;
        ctx.new_entry_point("main")?;

        let sum = binary(ctx, NodeType::MathAdd, 2.5_f32, 0.5_f32)?;
        let flow = ctx
            .check(float_sum)?
            .setup_check_value(&sum, Value::Float(3.0), false)?;
        ctx.add_sequenced_flow(&flow)?;

        let sum = binary(ctx, NodeType::MathAdd, 2, 3)?;
        let flow = ctx
            .check(int_sum)?
            .setup_check_value(&sum, Value::Int(5), false)?;
        ctx.add_sequenced_flow(&flow)
    }
}

#[derive(Default)]
pub struct DivideByZeroCase {
    zero_by_zero: Option<CheckBoxId>,
    one_by_zero: Option<CheckBoxId>,
    int_by_zero: Option<CheckBoxId>,
}

impl TestCase for DivideByZeroCase {
    fn name(&self) -> &str {
        "math/div by zero"
    }

    fn description(&self) -> &str {
        "Float division by zero follows IEEE rules; integer division by zero yields 0."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.zero_by_zero = Some(ctx.add_checkbox("zero by zero is NaN"));
        self.one_by_zero = Some(ctx.add_checkbox("one by zero is infinite"));
        self.int_by_zero = Some(ctx.add_checkbox("int by zero"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let zero_by_zero = prepared(self.zero_by_zero, self.name())?;
        let one_by_zero = prepared(self.one_by_zero, self.name())?;
        let int_by_zero = prepared(self.int_by_zero, self.name())?;
        ctx.new_entry_point("main")?;

        let nan = binary(ctx, NodeType::MathDiv, 0.0_f32, 0.0_f32)?;
        let flow = ctx
            .check(zero_by_zero)?
            .setup_check_value(&nan, Value::Float(f32::NAN), false)?;
        ctx.add_sequenced_flow(&flow)?;

        let inf = binary(ctx, NodeType::MathDiv, 1.0_f32, 0.0_f32)?;
        let flow = ctx
            .check(one_by_zero)?
            .setup_check_value_json(&inf, &json!("Infinity"), false)?;
        ctx.add_sequenced_flow(&flow)?;

        let zero = binary(ctx, NodeType::MathDiv, 7, 0)?;
        let flow = ctx
            .check(int_by_zero)?
            .setup_check_value_json(&zero, &json!({ "int": 0 }), false)?;
        ctx.add_sequenced_flow(&flow)
    }
}

#[derive(Default)]
pub struct NormalizeCase {
    vector: Option<CheckBoxId>,
    quaternion: Option<CheckBoxId>,
    double_cover: Option<CheckBoxId>,
}

impl TestCase for NormalizeCase {
    fn name(&self) -> &str {
        "math/normalize"
    }

    fn description(&self) -> &str {
        "Normalizes vectors and quaternions, compared by direction and magnitude."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.vector = Some(ctx.add_checkbox("vec3 direction"));
        self.quaternion = Some(ctx.add_checkbox("quat rotation"));
        self.double_cover = Some(ctx.add_checkbox("quat negated rotation"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let vector = prepared(self.vector, self.name())?;
        let quaternion = prepared(self.quaternion, self.name())?;
        let double_cover = prepared(self.double_cover, self.name())?;
        ctx.new_entry_point("main")?;

        let unit = math(
            ctx.graph_mut(),
            NodeType::MathNormalize,
            Value::vec3(3.0, 4.0, 0.0),
            None,
        )?;
        let flow = ctx
            .check(vector)?
            .setup_check_value(&unit, Value::vec3(0.6, 0.8, 0.0), true)?;
        ctx.add_sequenced_flow(&flow)?;

        let rotation = math(
            ctx.graph_mut(),
            NodeType::MathNormalize,
            Value::quat(0.0, 0.0, 0.0, 2.0),
            None,
        )?;
        let flow = ctx.check(quaternion)?.setup_check_value(
            &rotation,
            Value::quat(0.0, 0.0, 0.0, 1.0),
            true,
        )?;
        ctx.add_sequenced_flow(&flow)?;
        let flow = ctx.check(double_cover)?.setup_check_value_json(
            &rotation,
            &json!({ "quat": [0, 0, 0, -1] }),
            true,
        )?;
        ctx.add_sequenced_flow(&flow)
    }
}

#[derive(Default)]
pub struct MatrixCase {
    scaled: Option<CheckBoxId>,
    element: Option<CheckBoxId>,
}

impl TestCase for MatrixCase {
    fn name(&self) -> &str {
        "math/matrix"
    }

    fn description(&self) -> &str {
        "Scales the identity matrix and reads back single elements."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.scaled = Some(ctx.add_checkbox("scaled identity"));
        self.element = Some(ctx.add_checkbox("diagonal element"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let scaled = prepared(self.scaled, self.name())?;
        let element = prepared(self.element, self.name())?;
        ctx.new_entry_point("main")?;

        let matrix = binary(
            ctx,
            NodeType::MathMul,
            Value::Mat4(Value::IDENTITY_MAT4),
            2.0_f32,
        )?
        .with_kind(ValueKind::Mat4);
        let expected = Value::IDENTITY_MAT4.map(|c| c * 2.0);
        let flow = ctx
            .check(scaled)?
            .setup_check_value(&matrix, Value::Mat4(expected), true)?;
        ctx.add_sequenced_flow(&flow)?;

        let graph = ctx.graph_mut();
        let extract = graph.create_node(NodeType::MathExtract4x4)?;
        graph.link_input(extract, "a", &matrix)?;
        let diagonal = graph.value_out(extract, "5")?;
        let flow = ctx
            .check(element)?
            .setup_check_value(&diagonal, Value::Float(2.0), false)?;
        ctx.add_sequenced_flow(&flow)
    }
}

#[derive(Default)]
pub struct RandomCase {
    differs: Option<CheckBoxId>,
    in_range: Option<CheckBoxId>,
}

impl TestCase for RandomCase {
    fn name(&self) -> &str {
        "math/random"
    }

    fn description(&self) -> &str {
        "Two random sources sampled together produce different values in [0, 1)."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.differs = Some(ctx.add_checkbox("samples differ"));
        self.in_range = Some(ctx.add_checkbox("sample below one"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let differs = prepared(self.differs, self.name())?;
        let in_range = prepared(self.in_range, self.name())?;
        ctx.new_entry_point("main")?;

        let graph = ctx.graph_mut();
        let first = graph.create_node(NodeType::MathRandom)?;
        let first = graph.value_out(first, "value")?;
        let second = graph.create_node(NodeType::MathRandom)?;
        let second = graph.value_out(second, "value")?;

        let check = ctx.check(differs)?.setup_check_value_differs()?;
        let graph = ctx.graph_mut();
        graph.connect_value(&check.a, &first)?;
        graph.connect_value(&check.b, &second)?;
        ctx.add_sequenced_flow(&check.flow)?;

        let below = math(
            ctx.graph_mut(),
            NodeType::MathLt,
            &first,
            Some(Value::Float(1.0).into()),
        )?;
        let flow = ctx
            .check(in_range)?
            .setup_check_value(&below, Value::Bool(true), false)?;
        ctx.add_sequenced_flow(&flow)
    }
}
