//! Comparison strategy selection.
//!
//! [`select_comparator`] emits the node fragment that decides whether a candidate value matches
//! an expected value. The fragment shape depends only on the expected value's kind and on
//! whether proximity was requested:
//!
//! | expected            | proximity | fragment                                              |
//! |---------------------|-----------|-------------------------------------------------------|
//! | float NaN           | any       | `math/isNaN(candidate)`                               |
//! | 4x4 matrix          | yes       | `abs(a[i] - e[i]) < eps` for all 16 elements, ANDed   |
//! | vector, quaternion  | yes       | magnitude within eps AND normalized dot > 1 - eps     |
//! | float, int, bool    | yes       | `abs(float(a) - e) < eps`                             |
//! | anything else       | no        | `math/eq` restricted to the expected kind             |
//!
//! Equality against NaN is never emitted: it can not be true for any input.

use behave_api_core::{coercion, Value, ValueKind};
use behave_graph_core::{
    Graph, GraphError, NodeId, NodeParams, NodeType, ValueInRef, ValueOutRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareStrategy {
    IsNaN,
    MatrixProximity,
    DirectionalProximity,
    ScalarProximity,
    Exact,
}

/// Pick the comparison strategy for `expected`.
pub fn strategy_for(expected: &Value, proximity: bool) -> CompareStrategy {
    if expected.is_nan() {
        return CompareStrategy::IsNaN;
    }
    if !proximity {
        return CompareStrategy::Exact;
    }
    match expected.kind() {
        ValueKind::Mat4 => CompareStrategy::MatrixProximity,
        kind if kind.is_directional() => CompareStrategy::DirectionalProximity,
        _ => CompareStrategy::ScalarProximity,
    }
}

/// An emitted comparison fragment.
#[derive(Debug, Clone)]
pub struct Comparator {
    pub strategy: CompareStrategy,
    /// Every Value-In the candidate value must feed.
    pub candidates: Vec<ValueInRef>,
    /// Boolean Value-Out: true when the candidate matches.
    pub is_equal: ValueOutRef,
}

impl Comparator {
    /// Feed `source` into every candidate input.
    pub fn connect_candidate(
        &self,
        graph: &mut Graph<'_>,
        source: &ValueOutRef,
    ) -> Result<(), GraphError> {
        for input in &self.candidates {
            graph.connect_value(input, source)?;
        }
        Ok(())
    }
}

/// Either a producing socket or a literal bound to a Value-In.
#[derive(Debug, Clone)]
pub(crate) enum Operand {
    Link(ValueOutRef),
    Literal(Value),
}

impl From<&ValueOutRef> for Operand {
    fn from(src: &ValueOutRef) -> Self {
        Operand::Link(src.clone())
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Literal(v)
    }
}

pub(crate) fn bind(
    graph: &mut Graph<'_>,
    node: NodeId,
    socket: &str,
    operand: Operand,
) -> Result<(), GraphError> {
    match operand {
        Operand::Link(src) => graph.link_input(node, socket, &src),
        Operand::Literal(v) => graph.set_input(node, socket, v),
    }
}

/// Create a pure node of `kind` with `a` (and `b` when given) bound; returns its `value` output.
pub(crate) fn math(
    graph: &mut Graph<'_>,
    kind: NodeType,
    a: impl Into<Operand>,
    b: Option<Operand>,
) -> Result<ValueOutRef, GraphError> {
    let node = graph.create_node(kind)?;
    bind(graph, node, "a", a.into())?;
    if let Some(b) = b {
        bind(graph, node, "b", b)?;
    }
    graph.value_out(node, "value")
}

/// AND together `first` and every value in `rest`, left to right.
pub(crate) fn all_of(
    graph: &mut Graph<'_>,
    first: ValueOutRef,
    rest: impl IntoIterator<Item = ValueOutRef>,
) -> Result<ValueOutRef, GraphError> {
    let mut acc = first;
    for next in rest {
        acc = math(graph, NodeType::MathAnd, &acc, Some((&next).into()))?;
    }
    Ok(acc)
}

fn within_epsilon(
    graph: &mut Graph<'_>,
    difference: &ValueOutRef,
    epsilon: f32,
) -> Result<ValueOutRef, GraphError> {
    let abs = math(graph, NodeType::MathAbs, difference, None)?;
    math(
        graph,
        NodeType::MathLt,
        &abs,
        Some(Value::Float(epsilon).into()),
    )
}

/// `abs(extract[index] - element) < epsilon`
fn element_check(
    graph: &mut Graph<'_>,
    extract: NodeId,
    index: usize,
    element: f32,
    epsilon: f32,
) -> Result<ValueOutRef, GraphError> {
    let actual = graph.value_out(extract, &index.to_string())?;
    let diff = math(
        graph,
        NodeType::MathSub,
        &actual,
        Some(Value::Float(element).into()),
    )?;
    within_epsilon(graph, &diff, epsilon)
}

/// A node whose `a` input is left open for the candidate.
fn candidate_node(
    graph: &mut Graph<'_>,
    kind: NodeType,
    candidates: &mut Vec<ValueInRef>,
) -> Result<NodeId, GraphError> {
    let node = graph.create_node(kind)?;
    candidates.push(graph.value_in(node, "a")?);
    Ok(node)
}

/// Emit the comparison fragment for `expected` and return its open candidate inputs.
pub fn select_comparator(
    graph: &mut Graph<'_>,
    expected: &Value,
    proximity: bool,
    epsilon: f32,
) -> Result<Comparator, GraphError> {
    let strategy = strategy_for(expected, proximity);
    let mut candidates = Vec::new();
    let is_equal = match strategy {
        CompareStrategy::IsNaN => {
            let node = candidate_node(graph, NodeType::MathIsNaN, &mut candidates)?;
            graph.value_out(node, "value")?
        }
        CompareStrategy::Exact => {
            let node = graph.create_configured(
                NodeType::MathEq,
                NodeParams {
                    value_type: Some(expected.kind()),
                    ..Default::default()
                },
            )?;
            graph.set_input(node, "b", expected.clone())?;
            candidates.push(graph.value_in(node, "a")?);
            graph.value_out(node, "value")?
        }
        CompareStrategy::ScalarProximity => {
            let as_float = match expected.kind() {
                ValueKind::Int => Some(NodeType::TypeIntToFloat),
                ValueKind::Bool => Some(NodeType::TypeBoolToFloat),
                _ => None,
            };
            let target = Value::Float(coercion::to_float(expected));
            let sub = match as_float {
                Some(kind) => {
                    let conv = candidate_node(graph, kind, &mut candidates)?;
                    let converted = graph.value_out(conv, "value")?;
                    math(graph, NodeType::MathSub, &converted, Some(target.into()))?
                }
                None => {
                    let node = candidate_node(graph, NodeType::MathSub, &mut candidates)?;
                    graph.set_input(node, "b", target)?;
                    graph.value_out(node, "value")?
                }
            };
            within_epsilon(graph, &sub, epsilon)?
        }
        CompareStrategy::MatrixProximity => {
            let extract = candidate_node(graph, NodeType::MathExtract4x4, &mut candidates)?;
            let elements = coercion::to_components(expected);
            let mut acc = element_check(graph, extract, 0, elements[0], epsilon)?;
            for (index, element) in elements.iter().enumerate().skip(1) {
                let ok = element_check(graph, extract, index, *element, epsilon)?;
                acc = all_of(graph, acc, [ok])?;
            }
            acc
        }
        CompareStrategy::DirectionalProximity => {
            let kind = expected.kind();
            let components = coercion::to_components(expected);
            let magnitude = coercion::length(&components);

            let length = candidate_node(graph, NodeType::MathLength, &mut candidates)?;
            let length = graph.value_out(length, "value")?;
            let diff = math(
                graph,
                NodeType::MathSub,
                &length,
                Some(Value::Float(magnitude).into()),
            )?;
            let magnitude_ok = within_epsilon(graph, &diff, epsilon)?;

            // normalize() yields zeros at or below this length
            if magnitude <= f32::EPSILON {
                log::warn!("expected {kind} {expected} has no direction; checking magnitude only");
                magnitude_ok
            } else {
                let normalize = candidate_node(graph, NodeType::MathNormalize, &mut candidates)?;
                let unit = graph.value_out(normalize, "value")?;
                let expected_unit = coercion::reconstruct(kind, &coercion::normalize(&components));
                let mut alignment =
                    math(graph, NodeType::MathDot, &unit, Some(expected_unit.into()))?;
                // q and -q are the same rotation
                if kind == ValueKind::Quat {
                    alignment = math(graph, NodeType::MathAbs, &alignment, None)?;
                }
                let direction_ok = math(
                    graph,
                    NodeType::MathGt,
                    &alignment,
                    Some(Value::Float(1.0 - epsilon).into()),
                )?;
                all_of(graph, magnitude_ok, [direction_ok])?
            }
        }
    };
    log::trace!(
        "comparator {strategy:?} for {expected} ({} candidate inputs)",
        candidates.len()
    );
    Ok(Comparator {
        strategy,
        candidates,
        is_equal: is_equal.with_kind(ValueKind::Bool),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use behave_graph_core::{FlowRuntime, Registry};

    const EPS: f32 = 0.0001;

    fn matches(expected: Value, proximity: bool, observed: Value) -> bool {
        let registry = Registry::standard();
        let mut graph = Graph::new(&registry);
        let var = graph.add_variable("observed", observed).expect("variable");
        let source = graph.get_variable(var).expect("variable/get");
        let cmp = select_comparator(&mut graph, &expected, proximity, EPS).expect("comparator");
        cmp.connect_candidate(&mut graph, &source).expect("connect candidate");
        graph.validate().expect("comparator graph is complete");
        let mut rt = FlowRuntime::new(&graph);
        rt.output(&cmp.is_equal).expect("evaluate") == Value::Bool(true)
    }

    #[test]
    fn dispatch_follows_kind_and_proximity() {
        use CompareStrategy::*;
        assert_eq!(strategy_for(&Value::Float(f32::NAN), false), IsNaN);
        assert_eq!(strategy_for(&Value::Float(f32::NAN), true), IsNaN);
        assert_eq!(strategy_for(&Value::Mat4(Value::IDENTITY_MAT4), true), MatrixProximity);
        assert_eq!(strategy_for(&Value::vec3(0.0, 1.0, 0.0), true), DirectionalProximity);
        assert_eq!(strategy_for(&Value::quat(0.0, 0.0, 0.0, 1.0), true), DirectionalProximity);
        assert_eq!(strategy_for(&Value::Int(3), true), ScalarProximity);
        assert_eq!(strategy_for(&Value::vec3(0.0, 1.0, 0.0), false), Exact);
        assert_eq!(strategy_for(&Value::Mat4(Value::IDENTITY_MAT4), false), Exact);
    }

    #[test]
    fn exact_equality_is_strict() {
        assert!(matches(Value::Float(3.0), false, Value::Float(3.0)));
        assert!(!matches(Value::Float(3.0), false, Value::Float(3.0001)));
        // restricted to the expected kind
        assert!(!matches(Value::Float(3.0), false, Value::Int(3)));
        assert!(matches(Value::Bool(true), false, Value::Bool(true)));
    }

    #[test]
    fn scalar_proximity_uses_epsilon() {
        assert!(matches(Value::Float(1.0), true, Value::Float(1.00005)));
        assert!(!matches(Value::Float(1.0), true, Value::Float(1.001)));
        assert!(matches(Value::Int(3), true, Value::Int(3)));
        assert!(!matches(Value::Int(3), true, Value::Int(4)));
        assert!(matches(Value::Bool(false), true, Value::Bool(false)));
    }

    #[test]
    fn nan_expected_uses_the_predicate() {
        assert!(matches(Value::Float(f32::NAN), false, Value::Float(f32::NAN)));
        assert!(!matches(Value::Float(f32::NAN), false, Value::Float(1.0)));
        assert!(matches(Value::Float(f32::NAN), true, Value::Float(f32::NAN)));
    }

    #[test]
    fn vector_proximity_tolerates_scale_and_drift() {
        let up = Value::vec3(0.0, 1.0, 0.0);
        assert!(matches(up.clone(), true, Value::vec3(0.00001, 1.00004, 0.0)));
        assert!(matches(up.clone(), true, Value::vec3(0.0, 0.99995, 0.0)));
        assert!(!matches(up.clone(), true, Value::vec3(0.0, -1.0, 0.0)));
        assert!(!matches(up, true, Value::vec3(0.0, 1.01, 0.0)));
    }

    #[test]
    fn quaternion_proximity_accepts_the_double_cover() {
        let identity = Value::quat(0.0, 0.0, 0.0, 1.0);
        assert!(matches(identity.clone(), true, Value::quat(0.0, 0.0, 0.0, -1.0)));
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!(!matches(identity, true, Value::quat(half, 0.0, 0.0, half)));
    }

    #[test]
    fn zero_vector_checks_magnitude_only() {
        let zero = Value::vec3(0.0, 0.0, 0.0);
        assert!(matches(zero.clone(), true, Value::vec3(0.0, 0.0, 0.00001)));
        assert!(!matches(zero, true, Value::vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn tiny_vectors_check_magnitude_only() {
        let tiny = Value::vec3(1e-8, 0.0, 0.0);
        assert!(matches(tiny.clone(), true, tiny.clone()));
        assert!(matches(tiny.clone(), true, Value::vec3(0.0, 1e-8, 0.0)));
        assert!(!matches(tiny, true, Value::vec3(0.0, 1.0, 0.0)));
    }

    #[test]
    fn matrix_proximity_checks_every_element() {
        let mut close = Value::IDENTITY_MAT4;
        close[7] += 0.00002;
        assert!(matches(Value::Mat4(Value::IDENTITY_MAT4), true, Value::Mat4(close)));
        let mut off = Value::IDENTITY_MAT4;
        off[12] = 0.5;
        assert!(!matches(Value::Mat4(Value::IDENTITY_MAT4), true, Value::Mat4(off)));
    }
}
