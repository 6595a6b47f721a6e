// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bindings flowing between plan operators

use crate::pattern::element::ElementId;
use crate::pattern::value::Value;
use std::collections::HashMap;

/// Values bound to pattern elements so far
pub type Bindings = HashMap<ElementId, Value>;

/// A binding map and how many identical results it stands for
#[derive(Debug, Clone, PartialEq)]
pub struct Traverser {
    pub bindings: Bindings,
    pub bulk: u64,
}

impl Traverser {
    pub fn new(bindings: Bindings) -> Self {
        Self { bindings, bulk: 1 }
    }

    pub fn with_bulk(bindings: Bindings, bulk: u64) -> Self {
        Self { bindings, bulk }
    }

    /// No bindings, bulk 1
    pub fn empty() -> Self {
        Self::new(Bindings::new())
    }

    pub fn get(&self, element: ElementId) -> Option<&Value> {
        self.bindings.get(&element)
    }

    pub fn bind(&mut self, element: ElementId, value: Value) {
        self.bindings.insert(element, value);
    }
}

impl From<Bindings> for Traverser {
    fn from(bindings: Bindings) -> Self {
        Self::new(bindings)
    }
}
