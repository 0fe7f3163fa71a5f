//! Command-line interface orchestration for boundjoin.
//!
//! The `run` command reads a PHYLIP distance matrix, optionally paired with a
//! PHYLIP variance matrix, builds a tree and writes it in Newick format.

mod commands;
mod source;

pub use commands::{
    AlgorithmArg, Cli, CliError, Command, ExecutionSummary, Precision, RunCommand,
    render_summary, run_cli,
};
pub use source::VarianceSource;
