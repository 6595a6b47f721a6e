// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cardinality statistics consumed by the planner
//!
//! The planner asks a [`StatisticsProvider`] four kinds of questions and never
//! retries or times out: a provider backed by a cache or a remote catalog owns
//! its own failure handling and reports missing data as 0.

pub mod graph_statistics;

pub use graph_statistics::GraphStatistics;

use crate::pattern::element::ElementKind;
use crate::pattern::filter::{LabelFilter, PropertyFilter};

/// Non-negative element or connection count
pub type Count = u64;

/// Read-only source of cardinality estimates
pub trait StatisticsProvider {
    /// Number of nodes or edges in the whole graph
    fn totals(&self, kind: ElementKind) -> Count;

    /// Number of elements carrying the filter's label
    fn with_label(&self, label: &LabelFilter) -> Count;

    /// Number of elements carrying the label and passing the property filter
    fn with_property(&self, label: &LabelFilter, property: &PropertyFilter) -> Count;

    /// Number of directed connections between a node filter and an edge
    /// filter, in either order. `(node, edge)` counts edges starting at a
    /// matching node, `(edge, node)` counts edges ending at one.
    /// Node-node and edge-edge pairs are not meaningful.
    fn connections(&self, from: &LabelFilter, to: &LabelFilter) -> Count;
}

impl<T: StatisticsProvider + ?Sized> StatisticsProvider for &T {
    fn totals(&self, kind: ElementKind) -> Count {
        (**self).totals(kind)
    }

    fn with_label(&self, label: &LabelFilter) -> Count {
        (**self).with_label(label)
    }

    fn with_property(&self, label: &LabelFilter, property: &PropertyFilter) -> Count {
        (**self).with_property(label, property)
    }

    fn connections(&self, from: &LabelFilter, to: &LabelFilter) -> Count {
        (**self).connections(from, to)
    }
}
