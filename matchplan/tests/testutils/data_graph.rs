//! In-memory data graph for executing plans in tests

use matchplan::pattern::{Edge, ElementKind, LabelFilter, Node, PatternGraph, PropertyFilter, Value};
use matchplan::stats::GraphStatistics;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DataGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl DataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str, labels: &[&str]) -> &mut Node {
        let labels = labels.iter().map(|l| l.to_string()).collect();
        self.nodes.push(Node::with_labels(id, labels));
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn add_edge(&mut self, id: &str, from: &str, to: &str, label: &str) -> &mut Edge {
        self.edges.push(Edge::new(id, from, to, label));
        let last = self.edges.len() - 1;
        &mut self.edges[last]
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_from<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from_node == node)
    }

    pub fn edges_to<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to_node == node)
    }

    /// Every stored element of `kind`
    pub fn scan(&self, kind: ElementKind) -> Vec<Value> {
        match kind {
            ElementKind::Node => self.nodes.iter().cloned().map(Value::Node).collect(),
            ElementKind::Edge => self.edges.iter().cloned().map(Value::Edge).collect(),
        }
    }

    fn count(&self, kind: ElementKind, label: &LabelFilter, property: Option<&PropertyFilter>) -> u64 {
        let properties: Vec<PropertyFilter> = property.into_iter().cloned().collect();
        self.scan(kind)
            .iter()
            .filter(|value| passes(value, Some(label), &properties))
            .count() as u64
    }

    fn connections(&self, node: &LabelFilter, edge: &LabelFilter, outgoing: bool) -> u64 {
        self.edges
            .iter()
            .filter(|e| edge_has_label(e, edge))
            .filter(|e| {
                let end = if outgoing { &e.from_node } else { &e.to_node };
                self.node(end).is_some_and(|n| node_has_label(n, node))
            })
            .count() as u64
    }

    /// Exact statistics for every filter `pattern` can ask about
    pub fn statistics_for(&self, pattern: &PatternGraph) -> GraphStatistics {
        let mut stats = GraphStatistics::with_totals(self.nodes.len() as u64, self.edges.len() as u64);

        let mut node_labels: BTreeSet<String> =
            self.nodes.iter().flat_map(|n| n.labels.iter().cloned()).collect();
        let mut edge_labels: BTreeSet<String> = self.edges.iter().map(|e| e.label.clone()).collect();
        for element in pattern.elements() {
            if let Some(label) = element.label_filter().and_then(|f| f.label()) {
                match element.kind() {
                    ElementKind::Node => node_labels.insert(label.to_string()),
                    ElementKind::Edge => edge_labels.insert(label.to_string()),
                };
            }
        }

        for label in &node_labels {
            let filter = LabelFilter::new(ElementKind::Node, label.as_str());
            stats.set_label_count(ElementKind::Node, label.as_str(), self.count(ElementKind::Node, &filter, None));
        }
        for label in &edge_labels {
            let filter = LabelFilter::new(ElementKind::Edge, label.as_str());
            stats.set_label_count(ElementKind::Edge, label.as_str(), self.count(ElementKind::Edge, &filter, None));
        }

        for element in pattern.elements() {
            let Some(label) = element.label_filter() else {
                continue;
            };
            for property in element.property_filters() {
                let count = self.count(element.kind(), label, Some(property));
                stats.set_property_count(label.clone(), property.clone(), count);
            }
        }

        let node_filters: Vec<LabelFilter> = std::iter::once(LabelFilter::empty(ElementKind::Node))
            .chain(node_labels.iter().map(|l| LabelFilter::new(ElementKind::Node, l.as_str())))
            .collect();
        let edge_filters: Vec<LabelFilter> = std::iter::once(LabelFilter::empty(ElementKind::Edge))
            .chain(edge_labels.iter().map(|l| LabelFilter::new(ElementKind::Edge, l.as_str())))
            .collect();
        for node in &node_filters {
            for edge in &edge_filters {
                stats.set_connection_count(node.clone(), edge.clone(), self.connections(node, edge, true));
                stats.set_connection_count(edge.clone(), node.clone(), self.connections(node, edge, false));
            }
        }
        stats
    }
}

fn node_has_label(node: &Node, label: &LabelFilter) -> bool {
    label.accepts(node.labels.iter().map(String::as_str))
}

fn edge_has_label(edge: &Edge, label: &LabelFilter) -> bool {
    label.accepts(std::iter::once(edge.label.as_str()))
}

/// Whether a stored element passes a step's or pattern element's filters
pub fn passes(value: &Value, label: Option<&LabelFilter>, properties: &[PropertyFilter]) -> bool {
    match value {
        Value::Node(node) => {
            label.map_or(true, |l| node_has_label(node, l))
                && properties.iter().all(|p| p.accepts(&node.properties))
        }
        Value::Edge(edge) => {
            label.map_or(true, |l| edge_has_label(edge, l))
                && properties.iter().all(|p| p.accepts(&edge.properties))
        }
        _ => false,
    }
}

/// Identity of a bound value, for comparing result multisets
pub fn identity(value: &Value) -> String {
    match value {
        Value::Node(node) => format!("n:{}", node.id),
        Value::Edge(edge) => format!("e:{}", edge.id),
        other => other.to_string(),
    }
}

/// Same stored element
pub fn same_element(a: &Value, b: &Value) -> bool {
    identity(a) == identity(b)
}
