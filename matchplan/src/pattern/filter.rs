// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Label and property filters attached to pattern elements
//!
//! The planner never looks inside a predicate: filters are compared for
//! equality, handed to the statistics provider, and passed through to the
//! execution engine. [`Predicate::test`] exists for engines that evaluate them.

use crate::pattern::element::ElementKind;
use crate::pattern::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Label constraint on a node or edge.
///
/// A filter without a label is the "empty" filter: it fixes the element kind
/// but accepts any label. Statistics lookups use it for unlabeled elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelFilter {
    kind: ElementKind,
    label: Option<String>,
}

impl LabelFilter {
    pub fn new(kind: ElementKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: Some(label.into()),
        }
    }

    /// Filter that only fixes the element kind
    pub fn empty(kind: ElementKind) -> Self {
        Self { kind, label: None }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none()
    }

    /// Check whether a data element carrying `labels` passes this filter
    pub fn accepts<'a>(&self, mut labels: impl Iterator<Item = &'a str>) -> bool {
        match &self.label {
            Some(required) => labels.any(|l| l == required),
            None => true,
        }
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "~label='{}'", label),
            None => write!(f, "~label=*"),
        }
    }
}

/// Comparison applied to a single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(Value),
    Neq(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    Within(Vec<Value>),
    /// Property is present with any value
    Exists,
}

impl Predicate {
    /// Evaluate against a property value; a missing property never passes
    pub fn test(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Predicate::Eq(expected) => value == expected,
            Predicate::Neq(expected) => value != expected,
            Predicate::Lt(bound) => value.compare(bound) == Some(Ordering::Less),
            Predicate::Lte(bound) => matches!(
                value.compare(bound),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Predicate::Gt(bound) => value.compare(bound) == Some(Ordering::Greater),
            Predicate::Gte(bound) => matches!(
                value.compare(bound),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Predicate::Within(candidates) => candidates.iter().any(|c| c == value),
            Predicate::Exists => !value.is_null(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(v) => write!(f, "eq({})", v),
            Predicate::Neq(v) => write!(f, "neq({})", v),
            Predicate::Lt(v) => write!(f, "lt({})", v),
            Predicate::Lte(v) => write!(f, "lte({})", v),
            Predicate::Gt(v) => write!(f, "gt({})", v),
            Predicate::Gte(v) => write!(f, "gte({})", v),
            Predicate::Within(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "within({})", rendered.join(", "))
            }
            Predicate::Exists => write!(f, "exists"),
        }
    }
}

/// Property constraint `(kind, key, predicate)` on a node or edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    kind: ElementKind,
    key: String,
    predicate: Predicate,
}

impl PropertyFilter {
    pub fn new(kind: ElementKind, key: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            kind,
            key: key.into(),
            predicate,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Evaluate against the property map of a data element
    pub fn accepts(&self, properties: &HashMap<String, Value>) -> bool {
        self.predicate.test(properties.get(&self.key))
    }
}

impl fmt::Display for PropertyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.predicate)
    }
}
