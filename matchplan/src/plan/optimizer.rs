// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern planner
//!
//! Finds the cheapest retrieval of every pattern element by fixed-point
//! relaxation, then assembles the chosen retrievals into dependency trees
//! rooted at the directly retrieved anchors and folds the trees into joins.

use std::collections::{HashSet, VecDeque};

use crate::error::{PlanningError, PlanningResult};
use crate::pattern::element::ElementId;
use crate::pattern::graph::PatternGraph;
use crate::plan::config::{AnchorOrder, PlannerConfig};
use crate::plan::dependency_tree::DependencyTree;
use crate::plan::join::{Join, PartialQueryPlan};
use crate::plan::physical::{ExecutablePlan, PlanNode, Projection};
use crate::plan::retrieval::{estimate_dependent_retrievals, estimate_direct_retrievals, Cost};
use crate::plan::trace::{PlanTrace, PlanTracer, PlanningPhase, TraceMetadata};
use crate::stats::StatisticsProvider;

/// Result of planning a pattern graph
#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    pub plan: ExecutablePlan,
    /// Present when tracing is enabled
    pub trace: Option<PlanTrace>,
}

/// Cost-based planner over a statistics provider
#[derive(Debug, Clone)]
pub struct PatternPlanner<S> {
    stats: S,
    config: PlannerConfig,
}

impl<S: StatisticsProvider> PatternPlanner<S> {
    /// Create a planner with default settings
    pub fn new(stats: S) -> Self {
        Self::with_config(stats, PlannerConfig::default())
    }

    pub fn with_config(stats: S, config: PlannerConfig) -> Self {
        Self { stats, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn statistics(&self) -> &S {
        &self.stats
    }

    /// Plan `graph`. Retrieval estimates are recomputed from scratch, so a
    /// graph can be planned again with other statistics or settings.
    pub fn plan(&self, graph: &mut PatternGraph) -> PlanningResult<OptimizedPlan> {
        self.config.validate()?;
        let mut tracer = if self.config.trace {
            PlanTracer::new()
        } else {
            PlanTracer::disabled()
        };

        self.find_best_retrievals(graph, &mut tracer)?;

        tracer.start_step();
        let trees = self.build_trees(graph)?;
        tracer.end_step(
            PlanningPhase::TreeAssembly,
            format!("Built {} dependency trees", trees.len()),
            TraceMetadata::with_elements(trees.iter().map(DependencyTree::element).collect()),
        );

        tracer.start_step();
        let assembled = self.fold_joins(trees);
        tracer.end_step(
            PlanningPhase::JoinPlanning,
            format!(
                "Folded anchors into joins (rearrange: {})",
                self.config.rearrange_joins
            ),
            TraceMetadata::default(),
        );

        tracer.start_step();
        let root = PlanNode::from_partial(graph, &assembled)?;
        let projection = graph
            .returned()
            .iter()
            .map(|returned| Projection {
                element: returned.element,
                name: returned.name.clone(),
            })
            .collect();
        let plan = ExecutablePlan::new(root, projection);
        tracer.end_step(
            PlanningPhase::Emission,
            format!("Emitted plan with {} joins", plan.root.join_count()),
            TraceMetadata::default(),
        );

        log::debug!("Planned pattern graph:\n{}", plan.explain());
        Ok(OptimizedPlan {
            plan,
            trace: tracer.finalize(),
        })
    }

    /// Estimate every retrieval and relax dependent estimates to a fixed
    /// point. Fails if some element has no retrieval of finite cost.
    pub fn find_best_retrievals(
        &self,
        graph: &mut PatternGraph,
        tracer: &mut PlanTracer,
    ) -> PlanningResult<()> {
        tracer.start_step();
        graph.initialize_retrievals();
        graph.reset_estimates();
        if tracer.is_enabled() {
            tracer.end_step(
                PlanningPhase::Initialization,
                format!("Initialized retrievals of {} elements", graph.len()),
                TraceMetadata::with_elements(graph.element_ids()).with_note(format!(
                    "{} connected components",
                    graph.connected_components()
                )),
            );
        }

        tracer.start_step();
        estimate_direct_retrievals(graph, &self.stats)?;
        tracer.end_step(
            PlanningPhase::DirectEstimation,
            "Estimated direct retrievals".to_string(),
            TraceMetadata::default(),
        );

        tracer.start_step();
        let steps = self.relax(graph, tracer)?;
        tracer.end_step(
            PlanningPhase::Relaxation,
            format!("Relaxation converged after {} steps", steps),
            TraceMetadata::default(),
        );

        let unplannable = graph.unplannable_elements()?;
        if !unplannable.is_empty() {
            log::warn!("Pattern elements cannot be retrieved: {:?}", unplannable);
            return Err(PlanningError::UnplannableElements(unplannable));
        }
        Ok(())
    }

    /// Fixed-point loop over a FIFO frontier. Returns the number of steps.
    fn relax(&self, graph: &mut PatternGraph, tracer: &mut PlanTracer) -> PlanningResult<usize> {
        let mut ranked = Vec::with_capacity(graph.len());
        for element in graph.elements() {
            ranked.push((element.best_retrieval()?.estimated_size(), element.id()));
        }
        let Some(&(_, start)) = ranked.iter().min() else {
            return Err(PlanningError::EmptyPattern);
        };
        log::debug!("Starting relaxation from element {}", start);

        let mut frontier: VecDeque<ElementId> = ranked
            .iter()
            .map(|(_, id)| *id)
            .filter(|id| *id != start)
            .collect();
        let mut queued: HashSet<ElementId> = frontier.iter().copied().collect();

        let mut steps = 0;
        while let Some(id) = frontier.pop_front() {
            queued.remove(&id);
            steps += 1;
            if steps > self.config.max_relaxation_steps {
                return Err(PlanningError::RelaxationLimitExceeded {
                    limit: self.config.max_relaxation_steps,
                });
            }

            let before = best_size(graph, id)?;
            estimate_dependent_retrievals(graph, id, &self.stats)?;
            let after = best_size(graph, id)?;
            tracer.record_relaxation(id, before, after);

            if after < before {
                log::trace!("Element {} improved from {} to {}", id, before, after);
                for neighbor in graph.all_neighbors(id)? {
                    if queued.insert(neighbor) {
                        frontier.push_back(neighbor);
                    }
                }
            }
        }
        Ok(steps)
    }

    /// One dependency tree per directly retrieved element, in anchor order
    fn build_trees(&self, graph: &PatternGraph) -> PlanningResult<Vec<DependencyTree>> {
        let mut anchors = Vec::new();
        for element in graph.elements() {
            let best = element.best_retrieval()?;
            if best.is_direct() {
                anchors.push((best.estimated_size(), element.id()));
            }
        }
        match self.config.anchor_order {
            AnchorOrder::Cheapest => anchors.sort(),
            AnchorOrder::Creation => anchors.sort_by_key(|(_, id)| *id),
        }

        let mut trees = Vec::with_capacity(anchors.len());
        for (_, anchor) in anchors {
            let tree = DependencyTree::of(graph, graph.best_retrieval(anchor)?)?;
            log::debug!("Dependency tree {}", tree);
            trees.push(tree);
        }
        Ok(trees)
    }

    fn fold_joins(&self, trees: Vec<DependencyTree>) -> PartialQueryPlan {
        let mut trees = trees.into_iter();
        let Some(first) = trees.next() else {
            return PartialQueryPlan::Empty;
        };
        trees.fold(PartialQueryPlan::Tree(first), |left, next| {
            PartialQueryPlan::Join(Box::new(Join::new(
                left,
                PartialQueryPlan::Tree(next),
                self.config.rearrange_joins,
            )))
        })
    }
}

fn best_size(graph: &PatternGraph, id: ElementId) -> PlanningResult<Cost> {
    Ok(graph.best_retrieval(id)?.estimated_size())
}
