// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pattern graph model
//!
//! Node and edge placeholders of a graph-pattern query, their label and
//! property constraints, and the arena that owns them.

pub mod element;
pub mod filter;
pub mod graph;
pub mod value;

pub use element::{Direction, ElementId, ElementKind, Neighbors, PatternElement};
pub use filter::{LabelFilter, Predicate, PropertyFilter};
pub use graph::{IdAllocator, PatternGraph, PatternGraphBuilder, ReturnedElement};
pub use value::{Edge, Node, Value};
