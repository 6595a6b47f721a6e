// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! matchplan - cost-based retrieval planning for graph pattern queries
//!
//! A query front-end describes a pattern as a [`PatternGraph`] of node and
//! edge placeholders with label and property constraints. The
//! [`PatternPlanner`] estimates, from a [`StatisticsProvider`], how expensive
//! each way of retrieving every element is, and emits an [`ExecutablePlan`]
//! of scan-and-walk fragments combined by nested-loop joins.
//!
//! ```ignore
//! let mut builder = PatternGraphBuilder::new();
//! let person = builder.add_node(Some("p"))?;
//! let knows = builder.add_edge(None)?;
//! let friend = builder.add_node(Some("f"))?;
//! builder.set_label(person, "Person")?;
//! builder.link(person, knows, friend)?;
//! builder.returning(friend, "friend")?;
//! let mut graph = builder.build()?;
//!
//! let planned = PatternPlanner::new(stats).plan(&mut graph)?;
//! println!("{}", planned.plan.explain());
//! ```

pub mod error;
pub mod exec;
pub mod pattern;
pub mod plan;
pub mod stats;

pub use error::{PlanningError, PlanningResult};
pub use exec::{ExecutionError, NestedLoopJoin, Traverser};
pub use pattern::{
    Direction, ElementId, ElementKind, PatternElement, PatternGraph, PatternGraphBuilder, Value,
};
pub use plan::{ExecutablePlan, OptimizedPlan, PatternPlanner, PlanNode, PlannerConfig};
pub use stats::{GraphStatistics, StatisticsProvider};

/// matchplan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
