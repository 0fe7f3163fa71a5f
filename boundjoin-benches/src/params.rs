//! Benchmark parameter types.

use std::fmt;

use boundjoin_core::Algorithm;

/// Parameters for one tree-construction benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct JoinBenchParams {
    /// Number of taxa in the matrix.
    pub taxa: usize,
    /// Algorithm under test.
    pub algorithm: Algorithm,
    /// Worker threads in the pool.
    pub threads: usize,
}

impl fmt::Display for JoinBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},n={},t={}",
            self.algorithm.as_str(),
            self.taxa,
            self.threads
        )
    }
}
