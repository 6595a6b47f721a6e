// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory statistics provider
//!
//! Holds explicit counts, typically collected from a data graph or loaded
//! from JSON, and answers [`StatisticsProvider`] queries from them.

use super::{Count, StatisticsProvider};
use crate::pattern::element::ElementKind;
use crate::pattern::filter::{LabelFilter, PropertyFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Count of elements with a label that pass a property filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCount {
    pub label: LabelFilter,
    pub filter: PropertyFilter,
    pub count: Count,
}

/// Count of directed connections between two label filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCount {
    pub from: LabelFilter,
    pub to: LabelFilter,
    pub count: Count,
}

/// Statistics about a data graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStatistics {
    /// Total number of nodes in the graph
    pub total_nodes: Count,
    /// Total number of edges in the graph
    pub total_edges: Count,
    /// Node count by label
    pub node_labels: HashMap<String, Count>,
    /// Edge count by label
    pub edge_labels: HashMap<String, Count>,
    /// Counts for (label, property filter) pairs
    pub properties: Vec<PropertyCount>,
    /// Node→edge and edge→node connection counts
    pub connections: Vec<ConnectionCount>,
}

impl GraphStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_totals(total_nodes: Count, total_edges: Count) -> Self {
        Self {
            total_nodes,
            total_edges,
            ..Self::default()
        }
    }

    /// Record how many elements of `kind` carry `label`
    pub fn set_label_count(&mut self, kind: ElementKind, label: impl Into<String>, count: Count) {
        let counts = match kind {
            ElementKind::Node => &mut self.node_labels,
            ElementKind::Edge => &mut self.edge_labels,
        };
        counts.insert(label.into(), count);
    }

    pub fn set_property_count(&mut self, label: LabelFilter, filter: PropertyFilter, count: Count) {
        match self
            .properties
            .iter_mut()
            .find(|entry| entry.label == label && entry.filter == filter)
        {
            Some(entry) => entry.count = count,
            None => self.properties.push(PropertyCount {
                label,
                filter,
                count,
            }),
        }
    }

    pub fn set_connection_count(&mut self, from: LabelFilter, to: LabelFilter, count: Count) {
        match self
            .connections
            .iter_mut()
            .find(|entry| entry.from == from && entry.to == to)
        {
            Some(entry) => entry.count = count,
            None => self.connections.push(ConnectionCount { from, to, count }),
        }
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl StatisticsProvider for GraphStatistics {
    fn totals(&self, kind: ElementKind) -> Count {
        match kind {
            ElementKind::Node => self.total_nodes,
            ElementKind::Edge => self.total_edges,
        }
    }

    fn with_label(&self, label: &LabelFilter) -> Count {
        let Some(name) = label.label() else {
            return self.totals(label.kind());
        };
        let counts = match label.kind() {
            ElementKind::Node => &self.node_labels,
            ElementKind::Edge => &self.edge_labels,
        };
        counts.get(name).copied().unwrap_or(0)
    }

    fn with_property(&self, label: &LabelFilter, property: &PropertyFilter) -> Count {
        self.properties
            .iter()
            .find(|entry| &entry.label == label && &entry.filter == property)
            .map(|entry| entry.count)
            .unwrap_or_else(|| self.with_label(label))
    }

    fn connections(&self, from: &LabelFilter, to: &LabelFilter) -> Count {
        if from.kind() == to.kind() {
            return 0;
        }
        self.connections
            .iter()
            .find(|entry| &entry.from == from && &entry.to == to)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
