//! Property-based tests for the bounded search.
//!
//! Checks the pruned row walk against an unpruned oracle at every iteration
//! of a run, compares whole runs against the naive engine, and confirms that
//! the worker count never changes the outcome. Inputs cover continuous
//! distances, heavily tied integer distances, additive trees and matrices
//! with identical rows.

mod agreement;
mod concurrency;
mod oracle;
mod pruning;
mod strategies;
mod types;
