// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Binding Iterator - pull-based streams of traversers
//!
//! Operators consume and produce traversers one at a time. An error ends the
//! stream for the query; callers stop at the first `Err`.

use crate::exec::binding::Traverser;
use crate::exec::error::ExecutionResult;

/// Iterator trait for lazy traverser streams
pub trait BindingIterator: Iterator<Item = ExecutionResult<Traverser>> {
    /// Number of traversers still to come, if known without pulling them
    fn size_hint_traversers(&self) -> Option<usize> {
        None
    }

    /// Convert to a boxed trait object
    fn boxed<'a>(self) -> Box<dyn BindingIterator + 'a>
    where
        Self: Sized + 'a,
    {
        Box::new(self)
    }
}

impl<I: BindingIterator + ?Sized> BindingIterator for Box<I> {
    fn size_hint_traversers(&self) -> Option<usize> {
        (**self).size_hint_traversers()
    }
}

/// Iterator over materialized traversers
pub struct VecBindingIterator {
    traversers: std::vec::IntoIter<Traverser>,
}

impl VecBindingIterator {
    pub fn new(traversers: Vec<Traverser>) -> Self {
        Self {
            traversers: traversers.into_iter(),
        }
    }
}

impl Iterator for VecBindingIterator {
    type Item = ExecutionResult<Traverser>;

    fn next(&mut self) -> Option<Self::Item> {
        self.traversers.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.traversers.size_hint()
    }
}

impl BindingIterator for VecBindingIterator {
    fn size_hint_traversers(&self) -> Option<usize> {
        Some(self.traversers.len())
    }
}

/// Empty iterator (yields no traversers)
pub struct EmptyBindingIterator;

impl Iterator for EmptyBindingIterator {
    type Item = ExecutionResult<Traverser>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl BindingIterator for EmptyBindingIterator {
    fn size_hint_traversers(&self) -> Option<usize> {
        Some(0)
    }
}

/// Collect a stream, stopping at the first error
pub fn collect_traversers<I>(iter: I) -> ExecutionResult<Vec<Traverser>>
where
    I: Iterator<Item = ExecutionResult<Traverser>>,
{
    iter.collect()
}
