// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution-side operators
//!
//! Only the join operator lives here; scans and walks over stored data belong
//! to the engine that runs a plan.

pub mod binding;
pub mod binding_iterator;
pub mod error;
pub mod nested_loop_join;

pub use binding::{Bindings, Traverser};
pub use binding_iterator::{collect_traversers, BindingIterator, EmptyBindingIterator, VecBindingIterator};
pub use error::{ExecutionError, ExecutionResult};
pub use nested_loop_join::{do_match, NestedLoopJoin};
