// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern graph arena and its construction context
//!
//! A [`PatternGraph`] owns every [`PatternElement`] of one query pattern.
//! Adjacency is stored as [`ElementId`]s and resolved through the graph, so
//! the node/edge incidence cycle never turns into an ownership cycle.

use crate::error::{PlanningError, PlanningResult};
use crate::pattern::element::{Direction, ElementId, ElementKind, Neighbors, PatternElement};
use crate::pattern::filter::{LabelFilter, Predicate, PropertyFilter};
use crate::plan::retrieval::{DependentRetrieval, Retrieval};
use petgraph::algo::{connected_components, is_isomorphic_matching};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic element id source.
///
/// Ids are never reused. Share one allocator through an `Arc` when several
/// pattern graphs are built concurrently and their ids must not collide.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> ElementId {
        ElementId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Element the caller wants back, with its external binding name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedElement {
    pub element: ElementId,
    pub name: String,
}

/// Builds a [`PatternGraph`], keeping node incidence lists and edge endpoints
/// mutually consistent.
#[derive(Debug)]
pub struct PatternGraphBuilder {
    allocator: Arc<IdAllocator>,
    elements: Vec<PatternElement>,
    index: HashMap<ElementId, usize>,
    aliases: HashMap<String, ElementId>,
    returned: Vec<ReturnedElement>,
}

impl Default for PatternGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternGraphBuilder {
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(IdAllocator::new()))
    }

    pub fn with_allocator(allocator: Arc<IdAllocator>) -> Self {
        Self {
            allocator,
            elements: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            returned: Vec::new(),
        }
    }

    pub fn add_node(&mut self, alias: Option<&str>) -> PlanningResult<ElementId> {
        self.add_element(ElementKind::Node, alias)
    }

    pub fn add_edge(&mut self, alias: Option<&str>) -> PlanningResult<ElementId> {
        self.add_element(ElementKind::Edge, alias)
    }

    fn add_element(&mut self, kind: ElementKind, alias: Option<&str>) -> PlanningResult<ElementId> {
        if let Some(alias) = alias {
            if self.aliases.contains_key(alias) {
                return Err(PlanningError::DuplicateAlias(alias.to_string()));
            }
        }

        let id = self.allocator.next_id();
        let alias = alias.map(str::to_string);
        let element = match kind {
            ElementKind::Node => PatternElement::new_node(id, alias.clone()),
            ElementKind::Edge => PatternElement::new_edge(id, alias.clone()),
        };
        if let Some(alias) = alias {
            self.aliases.insert(alias, id);
        }
        self.index.insert(id, self.elements.len());
        self.elements.push(element);
        Ok(id)
    }

    pub fn set_label(&mut self, id: ElementId, label: &str) -> PlanningResult<()> {
        let element = self.element_mut(id)?;
        let filter = LabelFilter::new(element.kind(), label);
        element.set_label_filter(filter);
        Ok(())
    }

    pub fn add_property_filter(
        &mut self,
        id: ElementId,
        key: &str,
        predicate: Predicate,
    ) -> PlanningResult<()> {
        let element = self.element_mut(id)?;
        let filter = PropertyFilter::new(element.kind(), key, predicate);
        element.add_property_filter(filter);
        Ok(())
    }

    /// Bind one end of `edge` to `node`.
    ///
    /// `Out` makes `node` the edge's start, `In` its end. The node's incidence
    /// list on the same side gets the edge.
    pub fn connect(
        &mut self,
        edge: ElementId,
        node: ElementId,
        direction: Direction,
    ) -> PlanningResult<()> {
        self.expect_kind(node, ElementKind::Node)?;
        self.expect_kind(edge, ElementKind::Edge)?;

        if let Neighbors::Edge {
            out_vertex,
            in_vertex,
        } = self.element_mut(edge)?.neighbors_mut()
        {
            let end = match direction {
                Direction::Out => out_vertex,
                Direction::In => in_vertex,
            };
            if end.is_some() {
                return Err(PlanningError::EndpointAlreadyBound { edge, direction });
            }
            *end = Some(node);
        }

        if let Neighbors::Node { incoming, outgoing } = self.element_mut(node)?.neighbors_mut() {
            match direction {
                Direction::Out => outgoing.push(edge),
                Direction::In => incoming.push(edge),
            }
        }
        Ok(())
    }

    /// Shorthand for `(from)-[edge]->(to)`
    pub fn link(&mut self, from: ElementId, edge: ElementId, to: ElementId) -> PlanningResult<()> {
        self.connect(edge, from, Direction::Out)?;
        self.connect(edge, to, Direction::In)
    }

    /// Ask for `id` in the results under the external `name`
    pub fn returning(&mut self, id: ElementId, name: &str) -> PlanningResult<()> {
        self.element_mut(id)?;
        self.returned.push(ReturnedElement {
            element: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn build(self) -> PlanningResult<PatternGraph> {
        if self.elements.is_empty() {
            return Err(PlanningError::EmptyPattern);
        }
        log::debug!(
            "Built pattern graph with {} elements, {} returned",
            self.elements.len(),
            self.returned.len()
        );
        Ok(PatternGraph {
            elements: self.elements,
            index: self.index,
            aliases: self.aliases,
            returned: self.returned,
        })
    }

    fn element_mut(&mut self, id: ElementId) -> PlanningResult<&mut PatternElement> {
        let position = *self
            .index
            .get(&id)
            .ok_or(PlanningError::UnknownElement(id))?;
        Ok(&mut self.elements[position])
    }

    fn expect_kind(&mut self, id: ElementId, expected: ElementKind) -> PlanningResult<()> {
        let actual = self.element_mut(id)?.kind();
        if actual != expected {
            return Err(PlanningError::KindMismatch {
                element: id,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Arena of pattern elements for one query
#[derive(Debug, Clone)]
pub struct PatternGraph {
    elements: Vec<PatternElement>,
    index: HashMap<ElementId, usize>,
    aliases: HashMap<String, ElementId>,
    returned: Vec<ReturnedElement>,
}

impl PatternGraph {
    /// All elements in creation order
    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(PatternElement::id).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> PlanningResult<&PatternElement> {
        self.index
            .get(&id)
            .map(|&position| &self.elements[position])
            .ok_or(PlanningError::UnknownElement(id))
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> PlanningResult<&mut PatternElement> {
        let position = *self
            .index
            .get(&id)
            .ok_or(PlanningError::UnknownElement(id))?;
        Ok(&mut self.elements[position])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PatternElement> {
        self.elements.iter().filter(|e| e.is_node())
    }

    pub fn edges(&self) -> impl Iterator<Item = &PatternElement> {
        self.elements.iter().filter(|e| e.is_edge())
    }

    pub fn element_by_alias(&self, alias: &str) -> Option<&PatternElement> {
        self.aliases
            .get(alias)
            .and_then(|id| self.element(*id).ok())
    }

    pub fn returned(&self) -> &[ReturnedElement] {
        &self.returned
    }

    pub fn neighbors(&self, id: ElementId, direction: Direction) -> PlanningResult<Vec<ElementId>> {
        Ok(self.element(id)?.neighbors(direction))
    }

    /// Distinct neighbours of `id`, IN side first
    pub fn all_neighbors(&self, id: ElementId) -> PlanningResult<Vec<ElementId>> {
        let mut seen = HashSet::new();
        Ok(self
            .element(id)?
            .all_neighbors()
            .into_iter()
            .filter(|n| seen.insert(*n))
            .collect())
    }

    /// Generate retrieval candidates for every element (idempotent)
    pub fn initialize_retrievals(&mut self) {
        for element in &mut self.elements {
            element.initialize_retrievals();
        }
    }

    /// Forget all estimates so the graph can be planned again
    pub(crate) fn reset_estimates(&mut self) {
        for element in &mut self.elements {
            for retrieval in element.retrievals_mut() {
                retrieval.reset();
            }
        }
    }

    pub fn best_retrieval(&self, id: ElementId) -> PlanningResult<&Retrieval> {
        self.element(id)?.best_retrieval()
    }

    pub fn best_dependent_retrieval(
        &self,
        id: ElementId,
    ) -> PlanningResult<Option<&DependentRetrieval>> {
        Ok(self.element(id)?.best_dependent_retrieval())
    }

    pub fn dependent_retrieval_from(
        &self,
        id: ElementId,
        source: ElementId,
    ) -> PlanningResult<Option<&DependentRetrieval>> {
        Ok(self.element(id)?.dependent_retrieval_from(source))
    }

    /// Neighbours whose best retrieval walks from `id`
    pub fn dependent_neighbors(&self, id: ElementId) -> PlanningResult<Vec<ElementId>> {
        let mut dependents = Vec::new();
        for neighbor in self.all_neighbors(id)? {
            let best = self.best_retrieval(neighbor)?;
            if best.as_dependent().map(|d| d.source()) == Some(id) {
                dependents.push(neighbor);
            }
        }
        Ok(dependents)
    }

    /// Elements whose best retrieval is impossible
    pub fn unplannable_elements(&self) -> PlanningResult<Vec<ElementId>> {
        let mut unplannable = Vec::new();
        for element in &self.elements {
            if element.best_retrieval()?.is_impossible() {
                unplannable.push(element.id());
            }
        }
        Ok(unplannable)
    }

    /// Structural isomorphism: a bijection of elements that preserves
    /// [`PatternElement::matches_structure`], edge endpoints and which
    /// elements are returned. External names are not compared.
    pub fn is_isomorphic_to(&self, other: &PatternGraph) -> bool {
        if self.len() != other.len() || self.returned.len() != other.returned.len() {
            return false;
        }
        let ours = self.to_petgraph();
        let theirs = other.to_petgraph();
        is_isomorphic_matching(
            &ours,
            &theirs,
            |a, b| a.1 == b.1 && a.0.matches_structure(b.0),
            |_, _| true,
        )
    }

    /// Number of weakly connected components
    pub fn connected_components(&self) -> usize {
        connected_components(&self.to_petgraph())
    }

    /// Directed view: start node → edge → end node. Node weights carry the
    /// element and whether it is returned.
    fn to_petgraph(&self) -> DiGraph<(&PatternElement, bool), ()> {
        let returned: HashSet<ElementId> = self.returned.iter().map(|r| r.element).collect();
        let mut graph = DiGraph::new();
        let mut indices: HashMap<ElementId, NodeIndex> = HashMap::new();

        for element in &self.elements {
            let index = graph.add_node((element, returned.contains(&element.id())));
            indices.insert(element.id(), index);
        }

        for element in self.edges() {
            let Neighbors::Edge {
                out_vertex,
                in_vertex,
            } = element.incidence()
            else {
                continue;
            };
            let edge_index = indices[&element.id()];
            if let Some(start) = out_vertex.and_then(|v| indices.get(&v)) {
                graph.add_edge(*start, edge_index, ());
            }
            if let Some(end) = in_vertex.and_then(|v| indices.get(&v)) {
                graph.add_edge(edge_index, *end, ());
            }
        }

        graph
    }
}

impl fmt::Display for PatternGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            writeln!(f, "{}", element)?;
        }
        if !self.returned.is_empty() {
            let names: Vec<String> = self
                .returned
                .iter()
                .map(|r| format!("{}:{}", r.name, r.element))
                .collect();
            writeln!(f, "returning {}", names.join(", "))?;
        }
        Ok(())
    }
}
