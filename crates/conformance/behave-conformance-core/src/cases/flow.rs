use behave_api_core::Value;
use behave_graph_core::{NodeId, NodeParams, NodeType};

use crate::case::{prepared, TestCase};
use crate::checkbox::CheckBoxId;
use crate::context::TestContext;
use crate::error::ConstructionError;

fn for_loop(ctx: &mut TestContext<'_>, start: i32, end: i32) -> Result<NodeId, ConstructionError> {
    let graph = ctx.graph_mut();
    let node = graph.create_node(NodeType::FlowFor)?;
    graph.set_input(node, "startIndex", start)?;
    graph.set_input(node, "endIndex", end)?;
    Ok(node)
}

#[derive(Default)]
pub struct BranchCase {
    taken: Option<CheckBoxId>,
    skipped: Option<CheckBoxId>,
}

impl TestCase for BranchCase {
    fn name(&self) -> &str {
        "flow/branch"
    }

    fn description(&self) -> &str {
        "A true condition runs the true output and never the false output."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.taken = Some(ctx.add_checkbox("true output"));
        self.skipped = Some(ctx.add_negated_checkbox("false output"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let taken = prepared(self.taken, self.name())?;
        let skipped = prepared(self.skipped, self.name())?;
        ctx.new_entry_point("main")?;

        let on_true = ctx.check(taken)?.setup_check_flow()?;
        let on_false = ctx.check(skipped)?.setup_check_flow()?;
        let graph = ctx.graph_mut();
        let branch = graph.create_node(NodeType::FlowBranch)?;
        graph.set_input(branch, "condition", true)?;
        graph.connect_flow(&graph.flow_out(branch, "true")?, &on_true)?;
        graph.connect_flow(&graph.flow_out(branch, "false")?, &on_false)?;
        let head = graph.flow_in(branch, "in")?;
        ctx.add_sequenced_flow(&head)
    }
}

#[derive(Default)]
pub struct SequenceCase {
    in_order: Option<CheckBoxId>,
    reversed: Option<CheckBoxId>,
}

impl TestCase for SequenceCase {
    fn name(&self) -> &str {
        "flow/sequence"
    }

    fn description(&self) -> &str {
        "Sequence outputs run in index order."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.in_order = Some(ctx.add_checkbox("outputs in order"));
        self.reversed = Some(ctx.add_negated_checkbox("outputs in reverse order"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let in_order = prepared(self.in_order, self.name())?;
        let reversed = prepared(self.reversed, self.name())?;
        ctx.new_entry_point("main")?;

        let graph = ctx.graph_mut();
        let sequence = graph.create_node(NodeType::FlowSequence)?;
        let outputs = ["0", "1", "2"]
            .iter()
            .map(|socket| graph.flow_out(sequence, socket))
            .collect::<Result<Vec<_>, _>>()?;
        let head = graph.flow_in(sequence, "in")?;

        ctx.check(in_order)?.setup_order_flow_check(&outputs)?;
        let backwards: Vec<_> = outputs.iter().rev().cloned().collect();
        ctx.check(reversed)?.setup_order_flow_check(&backwards)?;
        ctx.add_sequenced_flow(&head)
    }
}

#[derive(Default)]
pub struct ForLoopCase {
    body: Option<CheckBoxId>,
    final_index: Option<CheckBoxId>,
}

impl TestCase for ForLoopCase {
    fn name(&self) -> &str {
        "flow/for"
    }

    fn description(&self) -> &str {
        "A loop over [0, 4) runs its body four times and completes at index 4."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.body = Some(ctx.add_checkbox("loop body"));
        self.final_index = Some(ctx.add_checkbox("index on completion"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let body = prepared(self.body, self.name())?;
        let final_index = prepared(self.final_index, self.name())?;
        ctx.new_entry_point("main")?;

        let node = for_loop(ctx, 0, 4)?;
        let index = ctx.graph().value_out(node, "index")?;
        let per_iteration = ctx.check(body)?.setup_check_flow_times(4)?;
        let on_completed = ctx
            .check(final_index)?
            .setup_check_value(&index, Value::Int(4), false)?;

        let graph = ctx.graph_mut();
        graph.connect_flow(&graph.flow_out(node, "loopBody")?, &per_iteration)?;
        graph.connect_flow(&graph.flow_out(node, "completed")?, &on_completed)?;
        let head = graph.flow_in(node, "in")?;
        ctx.add_sequenced_flow(&head)
    }
}

#[derive(Default)]
pub struct DoNCase {
    passes: Option<CheckBoxId>,
    count: Option<CheckBoxId>,
}

impl TestCase for DoNCase {
    fn name(&self) -> &str {
        "flow/doN"
    }

    fn description(&self) -> &str {
        "Do N lets the first two of three triggers through."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.passes = Some(ctx.add_checkbox("output runs"));
        self.count = Some(ctx.add_checkbox("current count"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let passes = prepared(self.passes, self.name())?;
        let count = prepared(self.count, self.name())?;
        ctx.new_entry_point("main")?;

        let driver = for_loop(ctx, 0, 3)?;
        let graph = ctx.graph_mut();
        let do_n = graph.create_node(NodeType::FlowDoN)?;
        graph.set_input(do_n, "n", 2)?;
        let current = graph.value_out(do_n, "currentCount")?;

        let on_out = ctx.check(passes)?.setup_check_flow_times(2)?;
        let on_completed = ctx
            .check(count)?
            .setup_check_value(&current, Value::Int(2), false)?;

        let graph = ctx.graph_mut();
        graph.connect_flow(&graph.flow_out(driver, "loopBody")?, &graph.flow_in(do_n, "in")?)?;
        graph.connect_flow(&graph.flow_out(do_n, "out")?, &on_out)?;
        graph.connect_flow(&graph.flow_out(driver, "completed")?, &on_completed)?;
        let head = graph.flow_in(driver, "in")?;
        ctx.add_sequenced_flow(&head)
    }
}

#[derive(Default)]
pub struct MultiGateCase {
    every_output: Option<CheckBoxId>,
    last_index: Option<CheckBoxId>,
}

impl TestCase for MultiGateCase {
    fn name(&self) -> &str {
        "flow/multiGate"
    }

    fn description(&self) -> &str {
        "Three triggers of a non-looping multi gate reach each of its three outputs."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.every_output = Some(ctx.add_checkbox("every output"));
        self.last_index = Some(ctx.add_checkbox("last index"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let every_output = prepared(self.every_output, self.name())?;
        let last_index = prepared(self.last_index, self.name())?;
        ctx.new_entry_point("main")?;

        let driver = for_loop(ctx, 0, 3)?;
        let graph = ctx.graph_mut();
        let gate = graph.create_configured(
            NodeType::FlowMultiGate,
            NodeParams {
                is_loop: Some(false),
                ..Default::default()
            },
        )?;
        let last = graph.value_out(gate, "lastIndex")?;

        let arrivals = ctx
            .check(every_output)?
            .setup_multi_flow_check(3, &["first", "second", "third"])?;
        let on_completed = ctx
            .check(last_index)?
            .setup_check_value(&last, Value::Int(2), false)?;

        let graph = ctx.graph_mut();
        for (index, arrival) in arrivals.iter().enumerate() {
            graph.connect_flow(&graph.flow_out(gate, &index.to_string())?, arrival)?;
        }
        graph.connect_flow(&graph.flow_out(driver, "loopBody")?, &graph.flow_in(gate, "in")?)?;
        graph.connect_flow(&graph.flow_out(driver, "completed")?, &on_completed)?;
        let head = graph.flow_in(driver, "in")?;
        ctx.add_sequenced_flow(&head)
    }
}

#[derive(Default)]
pub struct WaitAllCase {
    completed: Option<CheckBoxId>,
    partial: Option<CheckBoxId>,
}

impl TestCase for WaitAllCase {
    fn name(&self) -> &str {
        "flow/waitAll"
    }

    fn description(&self) -> &str {
        "Wait all reports one partial arrival, then completes once both inputs arrived."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.completed = Some(ctx.add_checkbox("completed"));
        self.partial = Some(ctx.add_checkbox("partial arrivals"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let completed = prepared(self.completed, self.name())?;
        let partial = prepared(self.partial, self.name())?;
        ctx.new_entry_point("main")?;

        let graph = ctx.graph_mut();
        let wait = graph.create_configured(
            NodeType::FlowWaitAll,
            NodeParams {
                input_flows: Some(2),
                ..Default::default()
            },
        )?;
        let first = graph.flow_in(wait, "0")?;
        let second = graph.flow_in(wait, "1")?;

        let on_completed = ctx.check(completed)?.setup_check_flow()?;
        let on_partial = ctx.check(partial)?.setup_check_flow_times(1)?;
        let graph = ctx.graph_mut();
        graph.connect_flow(&graph.flow_out(wait, "completed")?, &on_completed)?;
        graph.connect_flow(&graph.flow_out(wait, "out")?, &on_partial)?;

        ctx.add_sequenced_flow(&first)?;
        ctx.add_sequenced_flow(&second)
    }
}

#[derive(Default)]
pub struct DelayCase {
    done: Option<CheckBoxId>,
    no_error: Option<CheckBoxId>,
    cancelled: Option<CheckBoxId>,
}

impl TestCase for DelayCase {
    fn name(&self) -> &str {
        "flow/setDelay"
    }

    fn description(&self) -> &str {
        "A half second delay fires before the one second settle time; a cancelled delay never fires."
    }

    fn prepare_objects(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        self.done = Some(ctx.add_checkbox("done after delay"));
        self.no_error = Some(ctx.add_negated_checkbox("error output"));
        self.cancelled = Some(ctx.add_negated_checkbox("cancelled delay done"));
        Ok(())
    }

    fn create_nodes(&mut self, ctx: &mut TestContext<'_>) -> Result<(), ConstructionError> {
        let done = prepared(self.done, self.name())?;
        let no_error = prepared(self.no_error, self.name())?;
        let cancelled = prepared(self.cancelled, self.name())?;
        ctx.new_entry_point_with_delay("main", 1.0)?;

        let on_done = ctx.check(done)?.setup_check_flow()?;
        let on_err = ctx.check(no_error)?.setup_check_flow()?;
        let on_cancelled_done = ctx.check(cancelled)?.setup_check_flow()?;

        let graph = ctx.graph_mut();
        let delay = graph.create_node(NodeType::FlowSetDelay)?;
        graph.set_input(delay, "duration", 0.5_f32)?;
        graph.connect_flow(&graph.flow_out(delay, "done")?, &on_done)?;
        graph.connect_flow(&graph.flow_out(delay, "err")?, &on_err)?;

        let aborted = graph.create_node(NodeType::FlowSetDelay)?;
        graph.set_input(aborted, "duration", 0.75_f32)?;
        graph.connect_flow(&graph.flow_out(aborted, "done")?, &on_cancelled_done)?;

        let start = graph.flow_in(delay, "in")?;
        let start_aborted = graph.flow_in(aborted, "in")?;
        let cancel = graph.flow_in(aborted, "cancel")?;
        ctx.add_sequenced_flow(&start)?;
        ctx.add_sequenced_flow(&start_aborted)?;
        ctx.add_sequenced_flow(&cancel)
    }
}
