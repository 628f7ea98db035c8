// crates/ra_cli/src/args.rs
//
// Offline CLI argument surface: clap definitions, post-parse checks, and the
// mapping from flags to parameter overrides.
//
// Rules:
// - Exactly one of --input / --sample.
// - No networked paths (any scheme:// is rejected) for --input, --params, --out.
// - --input and --params must exist as regular files; --input needs a supported extension.
// - --render writes report files and therefore needs --out.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use ra_core::{HeadlineMetric, Quantity, TrailMode};
use ra_io::loader::InputFormat;
use ra_io::looks_like_url_strict;
use ra_pipeline::{InputSource, ParamOverrides};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "ra",
    version,
    disable_help_subcommand = true,
    about = "Reallocate residual demand to idle capacity (offline, deterministic)"
)]
pub struct Args {
    // --- Input ---
    /// Unit table (.csv, .xlsx/.xls/.ods, or .json records).
    #[arg(long, conflicts_with = "sample")]
    pub input: Option<PathBuf>,
    /// Use the built-in sample table instead of a file.
    #[arg(long)]
    pub sample: bool,

    // --- Parameters (flags override --params) ---
    /// Params JSON file.
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Allow destinations in any group.
    #[arg(long, conflicts_with = "same_group_only")]
    pub any_group: bool,
    /// Restrict destinations to the origin's group (default).
    #[arg(long)]
    pub same_group_only: bool,
    /// Smallest amount worth one allocation edge.
    #[arg(long, value_parser = parse_quantity)]
    pub min_allocation: Option<Quantity>,
    /// Re-sort destinations by remaining idle capacity before each origin.
    #[arg(long)]
    pub rebalance_ordering: bool,
    /// Trail representation: per_origin, edge_table, or both.
    #[arg(long, value_parser = parse_trail)]
    pub trail: Option<TrailMode>,
    /// Headline efficiency metric: recovery or utilization.
    #[arg(long, value_parser = parse_metric)]
    pub metric: Option<HeadlineMetric>,

    // --- Output & rendering ---
    /// Output directory for artifacts. Without it nothing is written.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Report(s) to emit into --out (json, html).
    #[arg(long, value_parser = ["json", "html"], num_args = 1..=2, requires = "out")]
    pub render: Vec<String>,
    /// Print the result tables to stdout (implied when --out is absent).
    #[arg(long)]
    pub print: bool,

    // --- Control ---
    /// Load and validate only; run nothing, write nothing.
    #[arg(long)]
    pub validate_only: bool,
    /// Only warnings and errors on stderr.
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument validation.
/// Messages are short and stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    InputChoice,
    NonLocalPath(String),
    NotFound(String),
    Unsupported(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CliError::*;
        match self {
            InputChoice => write!(f, "exactly one of --input or --sample is required"),
            NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            Unsupported(m) => write!(f, "unsupported input: {m}"),
        }
    }
}

impl std::error::Error for CliError {}

fn parse_quantity(s: &str) -> Result<Quantity, String> {
    s.parse::<Quantity>().map_err(|e| e.to_string())
}

fn parse_trail(s: &str) -> Result<TrailMode, String> {
    s.parse::<TrailMode>().map_err(|e| e.to_string())
}

fn parse_metric(s: &str) -> Result<HeadlineMetric, String> {
    s.parse::<HeadlineMetric>().map_err(|e| e.to_string())
}

impl Args {
    pub fn source(&self) -> InputSource {
        match &self.input {
            Some(p) => InputSource::Path(p.clone()),
            None => InputSource::Sample,
        }
    }

    pub fn overrides(&self) -> ParamOverrides {
        let same_group_only = if self.any_group {
            Some(false)
        } else if self.same_group_only {
            Some(true)
        } else {
            None
        };
        ParamOverrides {
            same_group_only,
            min_allocation: self.min_allocation,
            rebalance_ordering: self.rebalance_ordering.then_some(true),
            trail: self.trail,
            headline_metric: self.metric,
        }
    }

    /// Text tables go to stdout on request, or when nothing else is produced.
    pub fn wants_print(&self) -> bool {
        self.print || self.out.is_none()
    }
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    check(Args::parse())
}

/// Post-parse checks clap cannot express.
pub fn check(args: Args) -> Result<Args, CliError> {
    if args.input.is_none() && !args.sample {
        return Err(CliError::InputChoice);
    }
    for p in [args.input.as_deref(), args.params.as_deref(), args.out.as_deref()]
        .into_iter()
        .flatten()
    {
        ensure_local_path(p)?;
    }
    if let Some(input) = &args.input {
        ensure_local_exists(input, "--input")?;
        InputFormat::from_path(input).map_err(|e| CliError::Unsupported(e.to_string()))?;
    }
    if let Some(params) = &args.params {
        ensure_local_exists(params, "--params")?;
    }
    Ok(args)
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    let s = p.to_string_lossy();
    if looks_like_url_strict(&s) {
        return Err(CliError::NonLocalPath(s.into_owned()));
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}
