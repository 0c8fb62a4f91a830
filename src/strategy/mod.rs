//! Evaluation Strategy Module
//!
//! Sequential evaluation lives in [`crate::xpath`]; this module adds
//! strategies for running many queries over one document.

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(feature = "parallel")]
pub use parallel::{evaluate_parallel, query_map, xmap};
