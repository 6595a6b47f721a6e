// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern elements
//!
//! A pattern element is a node or edge placeholder of a graph-pattern query,
//! carrying optional label/property constraints. Elements refer to each other
//! by [`ElementId`]; the enclosing [`PatternGraph`](super::PatternGraph) owns
//! all of them, so node/edge adjacency never forms an ownership cycle.

use crate::error::{PlanningError, PlanningResult};
use crate::pattern::filter::{LabelFilter, PropertyFilter};
use crate::plan::retrieval::{DependentRetrieval, DirectRetrieval, Retrieval};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-unique identifier of a pattern element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an element matches nodes or edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Node,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Node => write!(f, "NODE"),
            ElementKind::Edge => write!(f, "EDGE"),
        }
    }
}

/// Edge direction as seen from an edge: `Out` is its start, `In` its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "IN"),
            Direction::Out => write!(f, "OUT"),
        }
    }
}

/// Adjacency of an element, by variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Neighbors {
    /// Incident edges of a node, split by which end the node sits on.
    /// `incoming` edges end at the node, `outgoing` edges start at it.
    Node {
        incoming: Vec<ElementId>,
        outgoing: Vec<ElementId>,
    },
    /// Endpoints of an edge; either end may be open
    Edge {
        out_vertex: Option<ElementId>,
        in_vertex: Option<ElementId>,
    },
}

/// A node or edge placeholder with its constraints and retrieval candidates
#[derive(Debug, Clone)]
pub struct PatternElement {
    id: ElementId,
    alias: Option<String>,
    label_filter: Option<LabelFilter>,
    property_filters: Vec<PropertyFilter>,
    neighbors: Neighbors,
    retrievals: Vec<Retrieval>,
}

impl PatternElement {
    pub(crate) fn new_node(id: ElementId, alias: Option<String>) -> Self {
        Self::with_neighbors(
            id,
            alias,
            Neighbors::Node {
                incoming: Vec::new(),
                outgoing: Vec::new(),
            },
        )
    }

    pub(crate) fn new_edge(id: ElementId, alias: Option<String>) -> Self {
        Self::with_neighbors(
            id,
            alias,
            Neighbors::Edge {
                out_vertex: None,
                in_vertex: None,
            },
        )
    }

    fn with_neighbors(id: ElementId, alias: Option<String>, neighbors: Neighbors) -> Self {
        Self {
            id,
            alias,
            label_filter: None,
            property_filters: Vec::new(),
            neighbors,
            retrievals: Vec::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Name the query front-end gave this element, if any
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn kind(&self) -> ElementKind {
        match self.neighbors {
            Neighbors::Node { .. } => ElementKind::Node,
            Neighbors::Edge { .. } => ElementKind::Edge,
        }
    }

    pub fn is_node(&self) -> bool {
        self.kind() == ElementKind::Node
    }

    pub fn is_edge(&self) -> bool {
        self.kind() == ElementKind::Edge
    }

    pub fn label_filter(&self) -> Option<&LabelFilter> {
        self.label_filter.as_ref()
    }

    pub fn has_label_filter(&self) -> bool {
        self.label_filter.is_some()
    }

    /// Label filter to use for statistics lookups: the element's own filter,
    /// or the empty filter of its kind when it has none.
    pub fn effective_label_filter(&self) -> LabelFilter {
        self.label_filter
            .clone()
            .unwrap_or_else(|| LabelFilter::empty(self.kind()))
    }

    pub fn property_filters(&self) -> &[PropertyFilter] {
        &self.property_filters
    }

    pub fn incidence(&self) -> &Neighbors {
        &self.neighbors
    }

    /// Neighbours on one side.
    ///
    /// For a node these are the incident edges ending (`In`) or starting
    /// (`Out`) at it; for an edge, its end (`In`) or start (`Out`) node.
    pub fn neighbors(&self, direction: Direction) -> Vec<ElementId> {
        match (&self.neighbors, direction) {
            (Neighbors::Node { incoming, .. }, Direction::In) => incoming.clone(),
            (Neighbors::Node { outgoing, .. }, Direction::Out) => outgoing.clone(),
            (Neighbors::Edge { in_vertex, .. }, Direction::In) => in_vertex.iter().copied().collect(),
            (Neighbors::Edge { out_vertex, .. }, Direction::Out) => {
                out_vertex.iter().copied().collect()
            }
        }
    }

    /// All neighbours, IN side first
    pub fn all_neighbors(&self) -> Vec<ElementId> {
        let mut all = self.neighbors(Direction::In);
        all.extend(self.neighbors(Direction::Out));
        all
    }

    pub fn retrievals(&self) -> &[Retrieval] {
        &self.retrievals
    }

    pub(crate) fn retrievals_mut(&mut self) -> &mut [Retrieval] {
        &mut self.retrievals
    }

    pub fn retrievals_initialized(&self) -> bool {
        !self.retrievals.is_empty()
    }

    /// Generate the direct retrieval and one dependent retrieval per
    /// neighbour. Runs once; later calls keep the existing candidates.
    pub fn initialize_retrievals(&mut self) {
        if self.retrievals_initialized() {
            return;
        }

        self.retrievals
            .push(Retrieval::Direct(DirectRetrieval::new(self.id)));

        let dependents: Vec<DependentRetrieval> = match &self.neighbors {
            Neighbors::Node { incoming, outgoing } => incoming
                .iter()
                .map(|edge| DependentRetrieval::new(self.id, *edge, Direction::In))
                .chain(
                    outgoing
                        .iter()
                        .map(|edge| DependentRetrieval::new(self.id, *edge, Direction::Out)),
                )
                .collect(),
            // an edge reached from its start node walks out of it, and vice versa
            Neighbors::Edge {
                out_vertex,
                in_vertex,
            } => out_vertex
                .iter()
                .map(|start| DependentRetrieval::new(self.id, *start, Direction::In))
                .chain(
                    in_vertex
                        .iter()
                        .map(|end| DependentRetrieval::new(self.id, *end, Direction::Out)),
                )
                .collect(),
        };

        self.retrievals
            .extend(dependents.into_iter().map(Retrieval::Dependent));
    }

    /// Cheapest retrieval by estimated size; the earliest candidate wins ties,
    /// so a direct retrieval is preferred over an equally cheap dependent one.
    pub fn best_retrieval(&self) -> PlanningResult<&Retrieval> {
        let mut best: Option<&Retrieval> = None;
        for retrieval in &self.retrievals {
            match best {
                Some(current) if current.estimated_size() <= retrieval.estimated_size() => {}
                _ => best = Some(retrieval),
            }
        }
        best.ok_or(PlanningError::NoRetrievalsInitialized(self.id))
    }

    pub fn best_dependent_retrieval(&self) -> Option<&DependentRetrieval> {
        self.dependent_retrievals()
            .min_by_key(|r| r.estimated_size())
    }

    /// Cheapest dependent retrieval that walks from `source`
    pub fn dependent_retrieval_from(&self, source: ElementId) -> Option<&DependentRetrieval> {
        self.dependent_retrievals()
            .filter(|r| r.source() == source)
            .min_by_key(|r| r.estimated_size())
    }

    /// The dependent retrieval walking from `source` in `direction`.
    /// Only a self-loop edge and its node have two retrievals per source.
    pub fn dependent_retrieval(
        &self,
        source: ElementId,
        direction: Direction,
    ) -> Option<&DependentRetrieval> {
        self.dependent_retrievals()
            .find(|r| r.source() == source && r.direction() == direction)
    }

    fn dependent_retrievals(&self) -> impl Iterator<Item = &DependentRetrieval> {
        self.retrievals.iter().filter_map(Retrieval::as_dependent)
    }

    /// Structural equality: same kind, same label filter, and the same
    /// multiset of property filters. Ids, adjacency and estimates are ignored.
    pub fn matches_structure(&self, other: &PatternElement) -> bool {
        if self.kind() != other.kind() || self.label_filter != other.label_filter {
            return false;
        }
        if self.property_filters.len() != other.property_filters.len() {
            return false;
        }

        let mut used = vec![false; other.property_filters.len()];
        self.property_filters.iter().all(|filter| {
            let position = other
                .property_filters
                .iter()
                .enumerate()
                .position(|(i, candidate)| !used[i] && candidate == filter);
            match position {
                Some(i) => {
                    used[i] = true;
                    true
                }
                None => false,
            }
        })
    }

    pub(crate) fn set_label_filter(&mut self, filter: LabelFilter) {
        self.label_filter = Some(filter);
    }

    pub(crate) fn add_property_filter(&mut self, filter: PropertyFilter) {
        self.property_filters.push(filter);
    }

    pub(crate) fn neighbors_mut(&mut self) -> &mut Neighbors {
        &mut self.neighbors
    }
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.kind())?;
        if let Some(alias) = &self.alias {
            write!(f, " '{}'", alias)?;
        }
        if let Some(label) = &self.label_filter {
            write!(f, " ({})", label)?;
        }
        if !self.property_filters.is_empty() {
            let rendered: Vec<String> = self.property_filters.iter().map(|p| p.to_string()).collect();
            write!(f, " {{{}}}", rendered.join(", "))?;
        }
        match self.best_retrieval() {
            Ok(best) => write!(f, " best: {}", best),
            Err(_) => write!(f, " best: unknown"),
        }
    }
}
