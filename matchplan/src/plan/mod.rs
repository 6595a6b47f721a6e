// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Retrieval planning for graph patterns
//!
//! Estimates the cost of every way to retrieve each pattern element, relaxes
//! the estimates to a fixed point, and assembles the cheapest retrievals into
//! an executable plan of fragments and nested-loop joins.

pub mod config;
pub mod dependency_tree;
pub mod join;
pub mod optimizer;
pub mod physical;
pub mod retrieval;
pub mod trace;

pub use config::{AnchorOrder, PlannerConfig};
pub use dependency_tree::DependencyTree;
pub use join::{Join, JoinAttribute, JoinPosition, MatchOn, PartialQueryPlan};
pub use optimizer::{OptimizedPlan, PatternPlanner};
pub use physical::{Access, ExecutablePlan, Fragment, FragmentStart, PlanNode, Projection, RetrievalStep};
pub use retrieval::{Cost, DependentRetrieval, DirectRetrieval, Estimate, Retrieval, IMPOSSIBLE};
pub use trace::{PlanTrace, PlanTracer, PlanningPhase, RelaxationStep, TraceMetadata, TraceStep};
