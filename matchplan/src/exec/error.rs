// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use crate::pattern::element::ElementId;
use crate::plan::join::MatchOn;
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// A join attribute asked for an endpoint of a value that is not an edge.
    /// Correctly assembled plans never produce this.
    #[error("Join attribute resolves {match_on} of element {element}, which is not bound to an edge")]
    NotAnEdge { element: ElementId, match_on: MatchOn },

    #[error("Input error: {0}")]
    Input(String),
}

/// Result alias for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;
