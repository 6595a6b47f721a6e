// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dependency trees
//!
//! A dependency tree is a fragment that can be matched locally: its root is
//! retrieved first, and every child is walked to from its parent. Trees built
//! from the optimizer's best retrievals are rooted at directly retrieved
//! anchors; subtrees cut off around joins are rooted at dependent retrievals.

use crate::error::{PlanningError, PlanningResult};
use crate::pattern::element::{Direction, ElementId, ElementKind};
use crate::pattern::graph::PatternGraph;
use crate::plan::retrieval::Retrieval;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    root: Retrieval,
    kind: ElementKind,
    children: Vec<DependencyTree>,
}

impl DependencyTree {
    pub fn new(root: Retrieval, kind: ElementKind, children: Vec<DependencyTree>) -> Self {
        Self {
            root,
            kind,
            children,
        }
    }

    pub fn leaf(root: Retrieval, kind: ElementKind) -> Self {
        Self::new(root, kind, Vec::new())
    }

    /// Build the tree below `root` from the graph's current best retrievals.
    ///
    /// Children are the root element's dependent neighbours, recursively.
    /// An edge root additionally gets a leaf for every endpoint that is not
    /// already bound through its source or a child, so no fragment leaves an
    /// edge with an open end.
    pub fn of(graph: &PatternGraph, root: &Retrieval) -> PlanningResult<Self> {
        let element = graph.element(root.element())?;
        let mut tree = Self::leaf(root.clone(), element.kind());

        for neighbor in graph.dependent_neighbors(element.id())? {
            let child = Self::of(graph, graph.best_retrieval(neighbor)?)?;
            tree.children.push(child);
        }

        tree.ensure_vertex_closure(graph)?;
        Ok(tree)
    }

    fn ensure_vertex_closure(&mut self, graph: &PatternGraph) -> PlanningResult<()> {
        let edge = graph.element(self.element())?;
        if !edge.is_edge() {
            return Ok(());
        }

        // ends of the edge already bound, as the side they sit on
        let mut covered: Vec<Direction> = Vec::new();
        if let Some(dependent) = self.root.as_dependent() {
            covered.push(dependent.direction().opposite());
        }
        for child in &self.children {
            if let Some(dependent) = child.root.as_dependent() {
                if dependent.source() == edge.id() {
                    covered.push(dependent.direction());
                }
            }
        }

        for side in [Direction::Out, Direction::In] {
            if covered.contains(&side) {
                continue;
            }
            for endpoint in edge.neighbors(side) {
                let node = graph.element(endpoint)?;
                let retrieval = node
                    .dependent_retrieval(edge.id(), side)
                    .ok_or(PlanningError::NoRetrievalsInitialized(endpoint))?;
                log::trace!(
                    "Closing {} end of edge {} with node {}",
                    side,
                    edge.id(),
                    endpoint
                );
                self.children.push(Self::leaf(
                    Retrieval::Dependent(retrieval.clone()),
                    node.kind(),
                ));
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Retrieval {
        &self.root
    }

    pub fn element(&self) -> ElementId {
        self.root.element()
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn children(&self) -> &[DependencyTree] {
        &self.children
    }

    /// A directly retrieved root is a scan and stays where it is
    pub fn is_movable(&self) -> bool {
        !self.root.is_direct()
    }

    /// Elements covered by the tree
    pub fn elements(&self) -> BTreeSet<ElementId> {
        let mut elements = BTreeSet::new();
        self.collect_elements(&mut elements);
        elements
    }

    fn collect_elements(&self, elements: &mut BTreeSet<ElementId>) {
        elements.insert(self.element());
        for child in &self.children {
            child.collect_elements(elements);
        }
    }

    /// Retrievals in pre-order: every retrieval follows the one it walks from
    pub fn retrievals(&self) -> Vec<&Retrieval> {
        let mut retrievals = vec![&self.root];
        for child in &self.children {
            retrievals.extend(child.retrievals());
        }
        retrievals
    }

    /// Detach every subtree that covers none of `keep`.
    ///
    /// Subtrees that do cover a kept element stay attached and are cut
    /// recursively. The root is never detached.
    pub fn general_cut(&mut self, keep: &BTreeSet<ElementId>) -> Vec<DependencyTree> {
        let mut cut = Vec::new();
        let mut kept = Vec::new();
        for mut child in std::mem::take(&mut self.children) {
            if child.elements().is_disjoint(keep) {
                cut.push(child);
            } else {
                cut.extend(child.general_cut(keep));
                kept.push(child);
            }
        }
        self.children = kept;
        cut
    }

    /// Detach dependently retrieved node leaves on the `border`
    pub fn explicit_cut(&mut self, border: &BTreeSet<ElementId>) -> Vec<DependencyTree> {
        let mut cut = Vec::new();
        let mut kept = Vec::new();
        for mut child in std::mem::take(&mut self.children) {
            if !child.children.is_empty() {
                cut.extend(child.explicit_cut(border));
                kept.push(child);
            } else if border.contains(&child.element())
                && child.kind == ElementKind::Node
                && child.is_movable()
            {
                cut.push(child);
            } else {
                kept.push(child);
            }
        }
        self.children = kept;
        cut
    }
}

impl fmt::Display for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element(), self.root)?;
        if !self.children.is_empty() {
            let children: Vec<String> = self.children.iter().map(|c| c.to_string()).collect();
            write!(f, " -> {{{}}}", children.join(", "))?;
        }
        Ok(())
    }
}
