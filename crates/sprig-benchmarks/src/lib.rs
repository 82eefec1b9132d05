//! Sprig benchmarking suite
//!
//! Benchmarks for attribute matching, repository content filtering and
//! variant artifact resolution.

pub mod common;

pub use common::*;
