//! Evolution-chain extraction.
//!
//! - `classifier`: raw transition condition -> canonical method tag
//! - `normalizer`: chain tree -> member set + pre-order transition list
//! - `cache`: per-run memoization of species and flattened chains
//! - `resolver`: species id -> owning chain, filtered by membership

pub mod cache;
pub mod classifier;
pub mod normalizer;
pub mod resolver;

pub use cache::*;
pub use classifier::*;
pub use normalizer::*;
pub use resolver::*;
