//! Seeded random data graphs and patterns

use super::data_graph::DataGraph;
use matchplan::pattern::{Direction, ElementId, PatternGraph, PatternGraphBuilder, Predicate, Value};

const NODE_LABELS: [&str; 3] = ["Person", "City", "Company"];
const EDGE_LABELS: [&str; 2] = ["KNOWS", "LOCATED_IN"];

/// Nodes carry up to two labels and a `rank` in 0..4; edges a `weight` in 0..4
pub fn random_data_graph(rng: &mut fastrand::Rng, nodes: usize, edges: usize) -> DataGraph {
    let mut data = DataGraph::new();
    for i in 0..nodes {
        let labels: Vec<&str> = NODE_LABELS.iter().copied().filter(|_| rng.u8(..3) == 0).take(2).collect();
        let node = data.add_node(&format!("n{}", i), &labels);
        node.set_property("rank", Value::from(rng.i64(0..4)));
    }
    for i in 0..edges {
        let from = format!("n{}", rng.usize(..nodes));
        let to = format!("n{}", rng.usize(..nodes));
        let label = EDGE_LABELS[rng.usize(..EDGE_LABELS.len())];
        let edge = data.add_edge(&format!("e{}", i), &from, &to, label);
        edge.set_property("weight", Value::from(rng.i64(0..4)));
    }
    data
}

/// A pattern over `nodes` node placeholders and `edges` edges between them.
/// Edges may repeat endpoints, loop on one node or leave one end open.
/// Every element is returned under its alias.
pub fn random_pattern(rng: &mut fastrand::Rng, nodes: usize, edges: usize) -> PatternGraph {
    let mut builder = PatternGraphBuilder::new();
    let mut node_ids: Vec<ElementId> = Vec::new();
    let mut returned: Vec<(ElementId, String)> = Vec::new();

    for i in 0..nodes {
        let alias = format!("v{}", i);
        let id = builder.add_node(Some(&alias)).unwrap();
        if rng.bool() {
            builder.set_label(id, NODE_LABELS[rng.usize(..NODE_LABELS.len())]).unwrap();
        }
        if rng.u8(..4) == 0 {
            builder
                .add_property_filter(id, "rank", Predicate::Lte(Value::from(rng.i64(0..4))))
                .unwrap();
        }
        node_ids.push(id);
        returned.push((id, alias));
    }

    for i in 0..edges {
        let alias = format!("r{}", i);
        let id = builder.add_edge(Some(&alias)).unwrap();
        if rng.bool() {
            builder.set_label(id, EDGE_LABELS[rng.usize(..EDGE_LABELS.len())]).unwrap();
        }
        if rng.u8(..4) == 0 {
            builder
                .add_property_filter(id, "weight", Predicate::Gte(Value::from(rng.i64(0..4))))
                .unwrap();
        }
        // chain the first edges so most patterns are connected
        let from = if i + 1 < nodes {
            node_ids[i]
        } else {
            node_ids[rng.usize(..nodes)]
        };
        let to = if i + 1 < nodes {
            node_ids[i + 1]
        } else {
            node_ids[rng.usize(..nodes)]
        };
        // one edge in five binds a single end
        match rng.u8(..10) {
            0 => builder.connect(id, from, Direction::Out).unwrap(),
            1 => builder.connect(id, to, Direction::In).unwrap(),
            _ => builder.link(from, id, to).unwrap(),
        }
        returned.push((id, alias));
    }

    for (id, name) in returned {
        builder.returning(id, &name).unwrap();
    }
    builder.build().unwrap()
}
