// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Retrieval strategies and their cost estimates
//!
//! Every pattern element gets one [`DirectRetrieval`] (scan the store) and one
//! [`DependentRetrieval`] per incident neighbour (walk from an already
//! retrieved neighbour). Estimates are expected result sizes; the cheapest
//! retrieval of an element is its best retrieval.

use crate::error::PlanningResult;
use crate::pattern::element::{Direction, ElementId, PatternElement};
use crate::pattern::graph::PatternGraph;
use crate::stats::{Count, StatisticsProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Estimated number of results of a retrieval
pub type Cost = u64;

/// Cost of a retrieval that cannot be executed
pub const IMPOSSIBLE: Cost = Cost::MAX;

/// Estimate state of a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Estimate {
    #[default]
    Unestimated,
    Estimated(Cost),
}

impl Estimate {
    /// Size used for comparisons; an unestimated retrieval is impossible
    pub fn size(self) -> Cost {
        match self {
            Estimate::Unestimated => IMPOSSIBLE,
            Estimate::Estimated(cost) => cost,
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Unestimated => write!(f, "~?"),
            Estimate::Estimated(IMPOSSIBLE) => write!(f, "impossible"),
            Estimate::Estimated(cost) => write!(f, "~{}", cost),
        }
    }
}

/// Scan of all stored elements matching the element's filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRetrieval {
    element: ElementId,
    estimate: Estimate,
}

impl DirectRetrieval {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            estimate: Estimate::Unestimated,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn estimate(&self) -> Estimate {
        self.estimate
    }

    pub fn estimated_size(&self) -> Cost {
        self.estimate.size()
    }
}

/// Walk from an already retrieved `source` to the element.
///
/// `direction` names the end of the edge involved: a node reached `In` from
/// an edge is that edge's end, reached `Out` its start. An edge reached `In`
/// from a node starts at it; reached `Out`, it ends at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentRetrieval {
    element: ElementId,
    source: ElementId,
    direction: Direction,
    estimate: Estimate,
}

impl DependentRetrieval {
    pub fn new(element: ElementId, source: ElementId, direction: Direction) -> Self {
        Self {
            element,
            source,
            direction,
            estimate: Estimate::Unestimated,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn source(&self) -> ElementId {
        self.source
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn estimate(&self) -> Estimate {
        self.estimate
    }

    pub fn estimated_size(&self) -> Cost {
        self.estimate.size()
    }
}

/// Candidate strategy for obtaining a pattern element's matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    Direct(DirectRetrieval),
    Dependent(DependentRetrieval),
}

impl Retrieval {
    pub fn element(&self) -> ElementId {
        match self {
            Retrieval::Direct(direct) => direct.element,
            Retrieval::Dependent(dependent) => dependent.element,
        }
    }

    pub fn estimate(&self) -> Estimate {
        match self {
            Retrieval::Direct(direct) => direct.estimate,
            Retrieval::Dependent(dependent) => dependent.estimate,
        }
    }

    pub fn estimated_size(&self) -> Cost {
        self.estimate().size()
    }

    pub fn is_impossible(&self) -> bool {
        self.estimated_size() == IMPOSSIBLE
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Retrieval::Direct(_))
    }

    pub fn as_dependent(&self) -> Option<&DependentRetrieval> {
        match self {
            Retrieval::Dependent(dependent) => Some(dependent),
            Retrieval::Direct(_) => None,
        }
    }

    pub(crate) fn set_estimated_size(&mut self, size: Cost) {
        let estimate = match self {
            Retrieval::Direct(direct) => &mut direct.estimate,
            Retrieval::Dependent(dependent) => &mut dependent.estimate,
        };
        *estimate = Estimate::Estimated(size);
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Retrieval::Direct(direct) => direct.estimate = Estimate::Unestimated,
            Retrieval::Dependent(dependent) => dependent.estimate = Estimate::Unestimated,
        }
    }
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Direct(direct) => write!(f, "Direct {}", direct.estimate),
            Retrieval::Dependent(dependent) => write!(
                f,
                "via {} ({}) {}",
                dependent.source, dependent.direction, dependent.estimate
            ),
        }
    }
}

/// Expected size of scanning for `element` directly.
///
/// Unlabeled elements cost the kind's total. Labeled ones cost the smaller of
/// the label count and the most selective property filter count.
pub fn estimate_direct<S: StatisticsProvider + ?Sized>(element: &PatternElement, stats: &S) -> Cost {
    let Some(label) = element.label_filter() else {
        return stats.totals(element.kind());
    };

    let by_property = element
        .property_filters()
        .iter()
        .map(|filter| stats.with_property(label, filter))
        .min()
        .unwrap_or(IMPOSSIBLE);

    by_property.min(stats.with_label(label))
}

/// Expected size of reaching `retrieval`'s element from its source, given the
/// source's current best estimate.
pub fn estimate_dependent<S: StatisticsProvider + ?Sized>(
    graph: &PatternGraph,
    retrieval: &DependentRetrieval,
    stats: &S,
) -> PlanningResult<Cost> {
    if is_self_dependent(graph, retrieval)? {
        return Ok(IMPOSSIBLE);
    }

    let element = graph.element(retrieval.element)?;
    let source = graph.element(retrieval.source)?;
    let incoming = source.best_retrieval()?.estimated_size();
    if incoming == IMPOSSIBLE {
        return Ok(IMPOSSIBLE);
    }

    let label_selectivity = label_selectivity(element, source, retrieval.direction, stats);
    let filter_selectivity = filter_selectivity(element, stats);
    let size = (incoming as f64 * label_selectivity * filter_selectivity).ceil();

    // a finite input never becomes impossible
    Ok((size as Cost).min(IMPOSSIBLE - 1))
}

/// Average number of element matches per source match
fn label_selectivity<S: StatisticsProvider + ?Sized>(
    element: &PatternElement,
    source: &PatternElement,
    direction: Direction,
    stats: &S,
) -> f64 {
    let element_label = element.effective_label_filter();
    let source_label = source.effective_label_filter();

    let connections = match direction {
        Direction::Out => stats.connections(&element_label, &source_label),
        Direction::In => stats.connections(&source_label, &element_label),
    };
    let sources = if source.has_label_filter() {
        stats.with_label(&source_label)
    } else {
        stats.totals(source.kind())
    };

    ratio(connections, sources, element.id(), "label")
}

/// Fraction of the element's label population passing its property filters
fn filter_selectivity<S: StatisticsProvider + ?Sized>(element: &PatternElement, stats: &S) -> f64 {
    let Some(label) = element.label_filter() else {
        return 1.0;
    };

    let labeled = stats.with_label(label);
    let passing = element
        .property_filters()
        .iter()
        .map(|filter| stats.with_property(label, filter))
        .min()
        .unwrap_or(labeled);

    ratio(passing, labeled, element.id(), "filter")
}

fn ratio(numerator: Count, denominator: Count, element: ElementId, what: &str) -> f64 {
    if denominator == 0 {
        log::debug!(
            "Zero denominator in {} selectivity of element {}, assuming 1.0",
            what,
            element
        );
        return 1.0;
    }
    numerator as f64 / denominator as f64
}

/// Whether the chain of best retrievals starting at `retrieval`'s source
/// leads back to its own element. Revisiting any element also counts, so the
/// walk always terminates.
pub fn is_self_dependent(graph: &PatternGraph, retrieval: &DependentRetrieval) -> PlanningResult<bool> {
    let mut visited = HashSet::new();
    let mut current = retrieval.clone();
    loop {
        if current.source == retrieval.element || !visited.insert(current.source) {
            return Ok(true);
        }
        match graph.best_retrieval(current.source)? {
            Retrieval::Direct(_) => return Ok(false),
            Retrieval::Dependent(next) => current = next.clone(),
        }
    }
}

/// Estimate every element's direct retrieval
pub fn estimate_direct_retrievals<S: StatisticsProvider + ?Sized>(
    graph: &mut PatternGraph,
    stats: &S,
) -> PlanningResult<()> {
    for id in graph.element_ids() {
        let size = estimate_direct(graph.element(id)?, stats);
        let element = graph.element_mut(id)?;
        for retrieval in element.retrievals_mut() {
            if retrieval.is_direct() {
                retrieval.set_estimated_size(size);
            }
        }
    }
    Ok(())
}

/// Re-estimate all dependent retrievals of `id` against the current state of
/// the graph. Estimates are computed first and applied together.
pub fn estimate_dependent_retrievals<S: StatisticsProvider + ?Sized>(
    graph: &mut PatternGraph,
    id: ElementId,
    stats: &S,
) -> PlanningResult<()> {
    let mut sizes = Vec::new();
    for (position, retrieval) in graph.element(id)?.retrievals().iter().enumerate() {
        if let Retrieval::Dependent(dependent) = retrieval {
            sizes.push((position, estimate_dependent(graph, dependent, stats)?));
        }
    }

    let retrievals = graph.element_mut(id)?.retrievals_mut();
    for (position, size) in sizes {
        retrievals[position].set_estimated_size(size);
    }
    Ok(())
}
