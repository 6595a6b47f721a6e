// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Nested-loop join operator
//!
//! The right input is pulled completely on the first activation and kept for
//! the lifetime of the operator. Every left traverser is then compared against
//! each stored candidate.

use std::collections::VecDeque;

use crate::exec::binding::{Bindings, Traverser};
use crate::exec::binding_iterator::{BindingIterator, EmptyBindingIterator};
use crate::exec::error::{ExecutionError, ExecutionResult};
use crate::pattern::element::ElementId;
use crate::pattern::value::Value;
use crate::plan::join::{JoinAttribute, MatchOn};

/// Value one side of a join attribute compares
#[derive(Debug, Clone, Copy)]
enum Resolved<'a> {
    Value(&'a Value),
    /// Endpoint of a bound edge
    NodeId(&'a str),
}

impl PartialEq for Resolved<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resolved::Value(Value::Node(a)), Resolved::Value(Value::Node(b))) => a.id == b.id,
            (Resolved::Value(Value::Edge(a)), Resolved::Value(Value::Edge(b))) => a.id == b.id,
            (Resolved::Value(a), Resolved::Value(b)) => a == b,
            (Resolved::Value(Value::Node(node)), Resolved::NodeId(id))
            | (Resolved::NodeId(id), Resolved::Value(Value::Node(node))) => node.id == *id,
            (Resolved::NodeId(a), Resolved::NodeId(b)) => a == b,
            _ => false,
        }
    }
}

fn resolve(
    bindings: &Bindings,
    element: ElementId,
    match_on: MatchOn,
) -> ExecutionResult<Option<Resolved<'_>>> {
    let Some(value) = bindings.get(&element) else {
        return Ok(None);
    };
    let resolved = match match_on {
        MatchOn::Element => Resolved::Value(value),
        MatchOn::In | MatchOn::Out => {
            let edge = value
                .as_edge()
                .ok_or(ExecutionError::NotAnEdge { element, match_on })?;
            if match_on == MatchOn::In {
                Resolved::NodeId(&edge.to_node)
            } else {
                Resolved::NodeId(&edge.from_node)
            }
        }
    };
    Ok(Some(resolved))
}

/// Whether `left` and `right` agree on `attribute`. An attribute either side
/// has not bound yet imposes no constraint.
pub fn do_match(
    attribute: &JoinAttribute,
    left: &Bindings,
    right: &Bindings,
) -> ExecutionResult<bool> {
    let left_value = resolve(left, attribute.left, attribute.left_match)?;
    let right_value = resolve(right, attribute.right, attribute.right_match)?;
    Ok(match (left_value, right_value) {
        (Some(l), Some(r)) => l == r,
        _ => true,
    })
}

/// Right input of a join, pulled once
enum RightInput<'a> {
    Pending(Box<dyn BindingIterator + 'a>),
    Materialized(Vec<Bindings>),
    /// Pulling failed; every later activation reports the error again
    Failed(ExecutionError),
}

/// Nested-loop join of a left traverser stream against a materialized right
/// input
pub struct NestedLoopJoin<'a> {
    left: Box<dyn BindingIterator + 'a>,
    right: RightInput<'a>,
    attributes: Vec<JoinAttribute>,
    pending: VecDeque<Traverser>,
    failed: bool,
}

impl<'a> NestedLoopJoin<'a> {
    pub fn new(
        left: impl BindingIterator + 'a,
        right: impl BindingIterator + 'a,
        attributes: Vec<JoinAttribute>,
    ) -> Self {
        Self {
            left: Box::new(left),
            right: RightInput::Pending(Box::new(right)),
            attributes,
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Operator without a left stream, driven through [`Self::activate`]
    pub fn activated_by_caller(
        right: impl BindingIterator + 'a,
        attributes: Vec<JoinAttribute>,
    ) -> Self {
        Self::new(EmptyBindingIterator, right, attributes)
    }

    pub fn attributes(&self) -> &[JoinAttribute] {
        &self.attributes
    }

    /// Whether the right input has been pulled completely
    pub fn is_materialized(&self) -> bool {
        matches!(self.right, RightInput::Materialized(_))
    }

    /// Join one left traverser against every candidate. Each match is emitted
    /// `bulk` times; on conflicting keys the left value wins.
    pub fn activate(&mut self, traverser: &Traverser) -> ExecutionResult<Vec<Traverser>> {
        let candidates = materialize(&mut self.right, &self.attributes)?;

        let mut results = Vec::new();
        for candidate in candidates {
            if !matches(&self.attributes, &traverser.bindings, candidate)? {
                continue;
            }
            let mut merged = candidate.clone();
            merged.extend(
                traverser
                    .bindings
                    .iter()
                    .map(|(element, value)| (*element, value.clone())),
            );
            for _ in 0..traverser.bulk {
                results.push(Traverser::new(merged.clone()));
            }
        }
        Ok(results)
    }
}

/// Pull the right input on first use. Candidates are only kept once the
/// whole input has been read.
fn materialize<'r>(
    right: &'r mut RightInput<'_>,
    attributes: &[JoinAttribute],
) -> ExecutionResult<&'r [Bindings]> {
    if let RightInput::Pending(input) = right {
        let input = std::mem::replace(input, Box::new(EmptyBindingIterator));
        *right = match pull(input) {
            Ok(candidates) => {
                log::debug!(
                    "Materialized {} join candidates on [{}]",
                    candidates.len(),
                    attributes
                        .iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                RightInput::Materialized(candidates)
            }
            Err(error) => {
                log::warn!("Join right input failed: {}", error);
                RightInput::Failed(error)
            }
        };
    }
    match right {
        RightInput::Materialized(candidates) => Ok(candidates.as_slice()),
        RightInput::Failed(error) => Err(error.clone()),
        RightInput::Pending(_) => Ok(&[][..]),
    }
}

/// Drain `input`, expanding bulk into copies
fn pull(input: Box<dyn BindingIterator + '_>) -> ExecutionResult<Vec<Bindings>> {
    let mut candidates = Vec::new();
    for traverser in input {
        let traverser = traverser?;
        for _ in 0..traverser.bulk {
            candidates.push(traverser.bindings.clone());
        }
    }
    Ok(candidates)
}

fn matches(attributes: &[JoinAttribute], left: &Bindings, right: &Bindings) -> ExecutionResult<bool> {
    for attribute in attributes {
        if !do_match(attribute, left, right)? {
            return Ok(false);
        }
    }
    Ok(true)
}

impl Iterator for NestedLoopJoin<'_> {
    type Item = ExecutionResult<Traverser>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(traverser) = self.pending.pop_front() {
                return Some(Ok(traverser));
            }
            if self.failed {
                return None;
            }
            let outcome = match self.left.next()? {
                Ok(traverser) => self.activate(&traverser),
                Err(error) => Err(error),
            };
            match outcome {
                Ok(results) => self.pending.extend(results),
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl BindingIterator for NestedLoopJoin<'_> {}
