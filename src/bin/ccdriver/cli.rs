//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Message output format for `build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

/// ccdriver - an external C/C++ toolchain driver
#[derive(Parser)]
#[command(name = "ccdriver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (repeatable: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Number of parallel compile/link jobs (0 = auto-detect)
    #[arg(short = 'j', long, global = true, default_value_t = 0)]
    pub jobs: usize,

    /// Color output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile and link a set of C sources
    Build(BuildArgs),

    /// Replay a previously written build plan
    Replay(ReplayArgs),

    /// Check whether a build plan is stale
    CheckStale(CheckStaleArgs),

    /// Report the detected toolchain and whether it resolves on PATH
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// C/C++ source files to compile
    pub sources: Vec<PathBuf>,

    /// Read source paths from a file, one per line, instead of (or in
    /// addition to) positional arguments
    #[arg(long)]
    pub sources_file: Option<PathBuf>,

    /// Compiler to use (gcc, clang, vcc, ...); auto-detected from
    /// CC/CXX when omitted
    #[arg(long)]
    pub compiler: Option<String>,

    /// Output binary/library path
    #[arg(short, long)]
    pub out: PathBuf,

    /// Intermediate (object/footprint) output directory
    #[arg(long, default_value = ".ccdriver-cache")]
    pub nimcache: PathBuf,

    /// Project name, used for default library/response-file naming
    #[arg(long, default_value = "project")]
    pub project_name: String,

    #[arg(long)]
    pub optimize_speed: bool,

    #[arg(long)]
    pub optimize_size: bool,

    #[arg(long)]
    pub debug: bool,

    #[arg(long)]
    pub gui: bool,

    #[arg(long)]
    pub dll: bool,

    #[arg(long = "static-lib")]
    pub static_lib: bool,

    #[arg(long)]
    pub hcr: bool,

    #[arg(long)]
    pub no_linking: bool,

    #[arg(long)]
    pub compile_only: bool,

    #[arg(long)]
    pub gen_script: bool,

    #[arg(long)]
    pub gen_mapping: bool,

    #[arg(long, value_delimiter = ',')]
    pub include: Vec<PathBuf>,

    #[arg(long = "lib", value_delimiter = ',')]
    pub libs: Vec<String>,

    #[arg(long = "write-plan")]
    pub write_plan: bool,

    #[arg(long, default_value_t = MessageFormat::Human, value_enum)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Path to a `<project>.json` build plan
    pub plan: PathBuf,
}

#[derive(Args)]
pub struct CheckStaleArgs {
    /// Path to a `<project>.json` build plan
    pub plan: PathBuf,

    /// Expected build output to check for existence
    #[arg(long)]
    pub output: PathBuf,

    /// The current invocation's command line, compared against the
    /// plan's recorded `cmdline`
    #[arg(long)]
    pub cmdline: String,

    /// SHA-1 of the compiler driving this invocation, compared against
    /// the plan's recorded `nimexe`
    #[arg(long)]
    pub nim_exe: String,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Show every descriptor considered, not just the winner
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}
