//! Benchmark support crate for boundjoin.
//!
//! Provides seeded synthetic distance sources and parameter types used by the
//! Criterion benchmarks that compare the bounded and naive searches.

pub mod error;
pub mod params;
pub mod source;
