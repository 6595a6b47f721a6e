//! Naive pattern evaluation: try every assignment, keep the consistent ones

use super::data_graph::{identity, passes, DataGraph};
use matchplan::exec::Bindings;
use matchplan::pattern::{Direction, ElementId, PatternGraph, Value};
use matchplan::plan::Projection;
use std::collections::BTreeMap;

/// Every homomorphism of `pattern` into `data`, one binding map each
pub fn evaluate(data: &DataGraph, pattern: &PatternGraph) -> Vec<Bindings> {
    let mut results = Vec::new();
    let mut current = Bindings::new();
    assign(data, pattern, 0, &mut current, &mut results);
    results
}

fn assign(
    data: &DataGraph,
    pattern: &PatternGraph,
    position: usize,
    current: &mut Bindings,
    results: &mut Vec<Bindings>,
) {
    let Some(element) = pattern.elements().get(position) else {
        results.push(current.clone());
        return;
    };
    for candidate in data.scan(element.kind()) {
        if !passes(&candidate, element.label_filter(), element.property_filters()) {
            continue;
        }
        current.insert(element.id(), candidate);
        if consistent(pattern, current) {
            assign(data, pattern, position + 1, current, results);
        }
        current.remove(&element.id());
    }
}

/// Bound edges agree with their bound endpoints
fn consistent(pattern: &PatternGraph, bindings: &Bindings) -> bool {
    pattern.edges().all(|edge| {
        let Some(Value::Edge(bound)) = bindings.get(&edge.id()) else {
            return true;
        };
        let ends = [
            (Direction::Out, &bound.from_node),
            (Direction::In, &bound.to_node),
        ];
        ends.iter().all(|(side, expected)| {
            edge.neighbors(*side).iter().all(|node| match bindings.get(node) {
                Some(Value::Node(n)) => &n.id == *expected,
                _ => true,
            })
        })
    })
}

/// Order-independent form of a result multiset over all elements
pub fn canonical(rows: &[Bindings]) -> Vec<BTreeMap<ElementId, String>> {
    let mut rows: Vec<BTreeMap<ElementId, String>> = rows
        .iter()
        .map(|row| row.iter().map(|(id, value)| (*id, identity(value))).collect())
        .collect();
    rows.sort();
    rows
}

/// Order-independent form of the returned columns
pub fn project(rows: &[Bindings], projection: &[Projection]) -> Vec<BTreeMap<String, String>> {
    let mut projected: Vec<BTreeMap<String, String>> = rows
        .iter()
        .map(|row| {
            projection
                .iter()
                .filter_map(|p| row.get(&p.element).map(|v| (p.name.clone(), identity(v))))
                .collect()
        })
        .collect();
    projected.sort();
    projected
}
