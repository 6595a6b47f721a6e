// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Planning error types

use crate::pattern::element::{Direction, ElementId, ElementKind};
use thiserror::Error;

/// Planning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("No retrievals initialized for pattern element {0}")]
    NoRetrievalsInitialized(ElementId),

    #[error("Pattern elements cannot be retrieved: {}", format_ids(.0))]
    UnplannableElements(Vec<ElementId>),

    #[error("Unknown pattern element: {0}")]
    UnknownElement(ElementId),

    #[error("Pattern element {element} is {actual}, expected {expected}")]
    KindMismatch {
        element: ElementId,
        expected: ElementKind,
        actual: ElementKind,
    },

    #[error("Edge {edge} already has a bound {direction} end")]
    EndpointAlreadyBound { edge: ElementId, direction: Direction },

    #[error("Alias '{0}' is already used by another pattern element")]
    DuplicateAlias(String),

    #[error("Pattern graph has no elements")]
    EmptyPattern,

    #[error("Fixed-point relaxation did not converge within {limit} steps")]
    RelaxationLimitExceeded { limit: usize },

    #[error("Invalid planner configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

fn format_ids(ids: &[ElementId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
