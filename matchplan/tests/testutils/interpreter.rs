//! Reference executor for emitted plans
//!
//! Runs fragments step by step over a [`DataGraph`] and joins with the
//! crate's own nested-loop join operator.

use super::data_graph::{passes, same_element, DataGraph};
use matchplan::exec::{
    collect_traversers, Bindings, ExecutionError, ExecutionResult, NestedLoopJoin, Traverser,
    VecBindingIterator,
};
use matchplan::pattern::{Direction, ElementKind, Value};
use matchplan::plan::{Access, ExecutablePlan, Fragment, PlanNode, RetrievalStep};

/// Execute `plan` from a single empty binding
pub fn execute(data: &DataGraph, plan: &ExecutablePlan) -> ExecutionResult<Vec<Bindings>> {
    let traversers = run(data, &plan.root, vec![Traverser::empty()])?;
    let mut rows = Vec::new();
    for traverser in traversers {
        for _ in 0..traverser.bulk {
            rows.push(traverser.bindings.clone());
        }
    }
    Ok(rows)
}

fn run(data: &DataGraph, node: &PlanNode, input: Vec<Traverser>) -> ExecutionResult<Vec<Traverser>> {
    match node {
        PlanNode::Fragment(fragment) => run_fragment(data, fragment, input),
        PlanNode::NestedLoopJoin {
            left,
            right,
            attributes,
            after,
        } => {
            let left = run(data, left, input)?;
            let right = run(data, right, vec![Traverser::empty()])?;
            let join = NestedLoopJoin::new(
                VecBindingIterator::new(left),
                VecBindingIterator::new(right),
                attributes.clone(),
            );
            let mut joined = collect_traversers(join)?;
            for fragment in after {
                joined = run_fragment(data, fragment, joined)?;
            }
            Ok(joined)
        }
        PlanNode::Empty => Ok(input),
    }
}

fn run_fragment(
    data: &DataGraph,
    fragment: &Fragment,
    mut traversers: Vec<Traverser>,
) -> ExecutionResult<Vec<Traverser>> {
    for step in &fragment.steps {
        let mut next = Vec::new();
        for traverser in traversers {
            for candidate in candidates(data, step, &traverser)? {
                if !passes(&candidate, step.label.as_ref(), &step.properties) {
                    continue;
                }
                match traverser.get(step.element) {
                    Some(bound) if !same_element(bound, &candidate) => {}
                    Some(_) => next.push(traverser.clone()),
                    None => {
                        let mut extended = traverser.clone();
                        extended.bind(step.element, candidate);
                        next.push(extended);
                    }
                }
            }
        }
        traversers = next;
    }
    Ok(traversers)
}

/// Stored elements a step can bind. Walking from an unbound element or a
/// dangling edge endpoint is an input error.
fn candidates(
    data: &DataGraph,
    step: &RetrievalStep,
    traverser: &Traverser,
) -> ExecutionResult<Vec<Value>> {
    let (source, direction) = match step.access {
        Access::Scan => return Ok(data.scan(step.kind)),
        Access::Walk { source, direction } => (source, direction),
    };
    let bound = traverser.get(source).ok_or_else(|| {
        ExecutionError::Input(format!(
            "step {} walks from unbound element {}",
            step.binding, source
        ))
    })?;

    match (step.kind, bound) {
        (ElementKind::Node, Value::Edge(edge)) => {
            let end = match direction {
                Direction::In => &edge.to_node,
                Direction::Out => &edge.from_node,
            };
            let node = data.node(end).ok_or_else(|| {
                ExecutionError::Input(format!("edge {} ends at missing node {}", edge.id, end))
            })?;
            Ok(vec![Value::Node(node.clone())])
        }
        (ElementKind::Edge, Value::Node(node)) => {
            let edges: Vec<_> = match direction {
                Direction::In => data.edges_from(&node.id).collect(),
                Direction::Out => data.edges_to(&node.id).collect(),
            };
            Ok(edges.into_iter().cloned().map(Value::Edge).collect())
        }
        (kind, value) => Err(ExecutionError::Input(format!(
            "cannot walk to a {} from {}",
            kind, value
        ))),
    }
}
