//! Test utilities for matchplan integration tests
//!
//! - data_graph: in-memory data graph and exact statistics over it
//! - evaluator: naive backtracking evaluation of a pattern
//! - interpreter: reference execution of an emitted plan
//! - generator: seeded random data graphs and patterns

#![allow(dead_code)]

pub mod data_graph;
pub mod evaluator;
pub mod generator;
pub mod interpreter;

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
