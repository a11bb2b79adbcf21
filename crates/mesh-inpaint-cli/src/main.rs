//! inpaint: fill the hole in a triangle mesh from the command line.
//!
//! Loads a mesh, closes its largest boundary loop with a faired patch,
//! decimates to a face budget and writes the result.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mesh_inpaint=info` - Stage summaries
//! - `RUST_LOG=mesh_inpaint=debug` - Detailed progress logging
//! - `RUST_LOG=mesh_inpaint::timing=debug` - Per-stage timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Fill the hole, upsample twice, keep at most 20k faces
//! inpaint -in scan.obj -out filled.obj -outfaces 20000 -upsample 2
//!
//! # Same, with parameters from a file and JSON output
//! inpaint --in scan.obj --out filled.stl --config inpaint.toml --format json
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use mesh_inpaint::{CollapseCost, MeshError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

/// Single-dash long flags accepted for compatibility with older scripts.
const LEGACY_FLAGS: [&str; 4] = ["in", "out", "outfaces", "upsample"];

/// inpaint - Fill the hole in a triangle mesh.
///
/// Closes the largest boundary loop with a smooth patch, then simplifies
/// the result to a face budget.
#[derive(Parser, Debug)]
#[command(name = "inpaint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input mesh file (.obj or .stl)
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output mesh file (format determined by extension)
    #[arg(long = "out", value_name = "PATH")]
    pub output: PathBuf,

    /// Target face count of the result
    #[arg(long = "outfaces", value_name = "N", required_unless_present = "config")]
    pub outfaces: Option<usize>,

    /// Subdivision level applied to the mesh and the patch
    #[arg(long = "upsample", value_name = "LEVEL", required_unless_present = "config")]
    pub upsample: Option<usize>,

    /// Pipeline parameters from a TOML or JSON file; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fairing order (2 = biharmonic, 3 = triharmonic)
    #[arg(long, value_name = "K")]
    pub fairing_order: Option<usize>,

    /// Edge collapse cost used by decimation
    #[arg(long, value_enum)]
    pub cost: Option<CostArg>,

    /// Distance below which seam vertices are welded
    #[arg(long, value_name = "EPSILON")]
    pub weld_epsilon: Option<f64>,

    /// Never collapse boundary edges during decimation
    #[arg(long)]
    pub preserve_boundary: bool,

    /// Output format for results
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CostArg {
    /// Collapse the shortest edge to its midpoint
    ShortestEdge,
    /// Garland-Heckbert quadric error
    Quadric,
}

impl From<CostArg> for CollapseCost {
    fn from(cost: CostArg) -> Self {
        match cost {
            CostArg::ShortestEdge => CollapseCost::ShortestEdge,
            CostArg::Quadric => CollapseCost::Quadric,
        }
    }
}

/// Rewrite `-in`, `-out`, `-outfaces` and `-upsample` (optionally with
/// `=value`) to their double-dash spelling.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LEGACY_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_inpaint=info",
            2 => "mesh_inpaint=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn report_error(e: &anyhow::Error) {
    if let Some(mesh_err) = e.downcast_ref::<MeshError>() {
        if let MeshError::NoHole { .. } = mesh_err {
            eprintln!("{}: Mesh has no hole!", "Error".red().bold());
        } else {
            eprintln!("{}: {}", "Error".red().bold(), mesh_err);
        }
        eprintln!("  {}: {}", "Code".cyan(), mesh_err.code());
        eprintln!(
            "  {}: {}",
            "Suggestion".green(),
            mesh_err.recovery_suggestion()
        );
        if let Some(location) = mesh_err.location() {
            eprintln!("  {}: {}", "Location".yellow(), location);
        }
    } else {
        eprintln!("{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {}: {}", "Caused by".yellow(), cause);
        }
    }
}

fn main() -> Result<()> {
    // Install miette's panic hook for better error display
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = commands::inpaint::run(&cli) {
        if !cli.quiet {
            report_error(&e);
        }
        std::process::exit(1);
    }

    Ok(())
}
