//! Command implementations and argument parsing for the boundjoin CLI.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use boundjoin_core::{
    Algorithm, DistanceSource, JoinError, Joiner, JoinerBuilder, PhyloTree, Real,
};
use boundjoin_providers_phylip::{PhylipError, PhylipMatrix};
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::source::VarianceSource;

const DEFAULT_DECIMALS: usize = 6;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "boundjoin", about = "Build neighbour-joining trees from distance matrices.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a tree from a PHYLIP distance matrix.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the PHYLIP distance matrix.
    pub path: PathBuf,

    /// PHYLIP variance matrix over the same taxa, used by the BIONJ variants.
    #[arg(long)]
    pub variance: Option<PathBuf>,

    /// Tree-building algorithm.
    #[arg(long, value_enum, default_value_t = AlgorithmArg::RapidNj)]
    pub algorithm: AlgorithmArg,

    /// Worker threads (defaults to the available parallelism).
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Floating-point precision used while joining.
    #[arg(long, value_enum, default_value_t = Precision::Double)]
    pub precision: Precision,

    /// Decimal places written for branch lengths.
    #[arg(long, default_value_t = DEFAULT_DECIMALS)]
    pub decimals: usize,

    /// Write the tree to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Override name for the data source (defaults to the file name).
    #[arg(long)]
    pub name: Option<String>,
}

/// Algorithms selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Neighbour joining with the branch-and-bound search.
    RapidNj,
    /// BIONJ with the branch-and-bound search.
    RapidBionj,
    /// Neighbour joining with a full scan per join.
    Nj,
    /// BIONJ with a full scan per join.
    Bionj,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::RapidNj => Self::RapidNj,
            AlgorithmArg::RapidBionj => Self::RapidBionj,
            AlgorithmArg::Nj => Self::Nj,
            AlgorithmArg::Bionj => Self::Bionj,
        }
    }
}

/// Element type used for the working matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Precision {
    /// 32-bit floats; halves memory use.
    Single,
    /// 64-bit floats.
    Double,
}

impl Precision {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while reading input or writing the tree.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A PHYLIP file could not be parsed.
    #[error(transparent)]
    Phylip(#[from] PhylipError),
    /// The variance matrix does not describe the distance matrix's taxa.
    #[error("variance taxon {index} is `{found}` but the distance matrix has `{expected}`")]
    VarianceLabels {
        /// First mismatching taxon.
        index: usize,
        /// Label in the distance matrix, or empty when it has fewer taxa.
        expected: String,
        /// Label in the variance matrix, or empty when it has fewer taxa.
        found: String,
    },
    /// Tree construction failed.
    #[error(transparent)]
    Core(#[from] JoinError),
}

impl CliError {
    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CLI_IO",
            Self::Phylip(_) => "CLI_PHYLIP",
            Self::VarianceLabels { .. } => "CLI_VARIANCE_LABELS",
            Self::Core(core) => core.code().as_str(),
        }
    }

    /// Returns the nested matrix or source code when tree construction failed.
    #[must_use]
    pub fn detail_code(&self) -> Option<&'static str> {
        match self {
            Self::Core(core) => core
                .matrix_code()
                .map(|code| code.as_str())
                .or_else(|| core.source_code().map(|code| code.as_str())),
            _ => None,
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name reported by the data source implementation.
    pub data_source: String,
    /// Number of taxa in the tree.
    pub taxa: usize,
    /// Algorithm that built the tree.
    pub algorithm: Algorithm,
    /// The tree in Newick format, terminated by `;`.
    pub newick: String,
    /// File the tree was written to, if any.
    pub output: Option<PathBuf>,
    /// Wall-clock time spent loading and joining.
    pub elapsed: Duration,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when reading, parsing, tree construction or writing
/// the output file fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use boundjoin_cli::cli::{Cli, Command, RunCommand, AlgorithmArg, Precision, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "3\na\nb 2.0\nc 4.0 3.0\n")?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         path: file.path().to_path_buf(),
///         variance: None,
///         algorithm: AlgorithmArg::RapidNj,
///         threads: Some(1),
///         precision: Precision::Double,
///         decimals: 1,
///         output: None,
///         name: Some("demo".into()),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.newick, "(a:1.5,b:0.5,c:2.5);");
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        algorithm = field::Empty,
        precision = field::Empty,
        threads = field::Empty,
        override_name = field::Empty,
    ),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let started = Instant::now();
    let algorithm = Algorithm::from(command.algorithm);
    let span = Span::current();
    span.record("algorithm", field::display(algorithm.as_str()));
    span.record("precision", field::display(command.precision.as_str()));
    if let Some(threads) = command.threads {
        span.record("threads", field::display(threads));
    }
    span.record(
        "override_name",
        field::display(command.name.as_deref().unwrap_or("<derived>")),
    );

    let mut builder = JoinerBuilder::new().with_algorithm(algorithm);
    if let Some(threads) = command.threads {
        builder = builder.with_threads(threads);
    }
    let joiner = builder.build()?;

    let name = derive_data_source_name(&command.path, command.name.as_deref());
    let distances = read_phylip(&command.path, name)?;
    let data_source = distances.name().to_owned();
    let taxa = distances.len();
    let newick = match &command.variance {
        Some(path) => {
            let variances = read_phylip(path, derive_data_source_name(path, None))?;
            check_variance_labels(&distances, &variances)?;
            let source = VarianceSource::new(distances, variances);
            build_newick(&joiner, &source, command.precision, command.decimals)?
        }
        None => build_newick(&joiner, &distances, command.precision, command.decimals)?,
    };

    if let Some(path) = &command.output {
        write_tree(path, &newick)?;
    }
    let elapsed = started.elapsed();
    info!(
        data_source = data_source.as_str(),
        taxa,
        algorithm = algorithm.as_str(),
        elapsed = ?elapsed,
        "command completed"
    );
    Ok(ExecutionSummary {
        data_source,
        taxa,
        algorithm,
        newick,
        output: command.output,
        elapsed,
    })
}

fn build_newick<S: DistanceSource + ?Sized>(
    joiner: &Joiner,
    source: &S,
    precision: Precision,
    decimals: usize,
) -> Result<String, CliError> {
    Ok(match precision {
        Precision::Single => newick::<f32, S>(joiner, source, decimals)?,
        Precision::Double => newick::<f64, S>(joiner, source, decimals)?,
    })
}

fn newick<T: Real, S: DistanceSource + ?Sized>(
    joiner: &Joiner,
    source: &S,
    decimals: usize,
) -> Result<String, JoinError> {
    let tree: PhyloTree<T> = joiner.run_as(source)?;
    Ok(tree.to_newick(decimals))
}

#[instrument(name = "cli.read_phylip", err, skip(name), fields(path = field::Empty))]
pub(super) fn read_phylip(path: &Path, name: String) -> Result<PhylipMatrix, CliError> {
    Span::current().record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PhylipMatrix::try_from_reader(name, BufReader::new(file))?)
}

pub(super) fn check_variance_labels(
    distances: &PhylipMatrix,
    variances: &PhylipMatrix,
) -> Result<(), CliError> {
    let expected = distances.labels();
    let found = variances.labels();
    let mismatch = (0..expected.len().max(found.len()))
        .find(|&index| expected.get(index) != found.get(index));
    match mismatch {
        Some(index) => Err(CliError::VarianceLabels {
            index,
            expected: expected.get(index).cloned().unwrap_or_default(),
            found: found.get(index).cloned().unwrap_or_default(),
        }),
        None => Ok(()),
    }
}

fn write_tree(path: &Path, newick: &str) -> Result<(), CliError> {
    fs::write(path, format!("{newick}\n")).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| "data_source".to_owned())
}

/// Writes the tree in `summary` to `writer` unless it went to a file.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::time::Duration;
/// # use boundjoin_cli::cli::{ExecutionSummary, render_summary};
/// # use boundjoin_core::Algorithm;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     data_source: "demo".into(),
///     taxa: 2,
///     algorithm: Algorithm::RapidNj,
///     newick: "(a:1.0,b:1.0);".into(),
///     output: None,
///     elapsed: Duration::ZERO,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(buffer, b"(a:1.0,b:1.0);\n");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    if summary.output.is_none() {
        writeln!(writer, "{}", summary.newick)?;
    }
    Ok(())
}
