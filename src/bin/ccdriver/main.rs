//! ccdriver CLI - drives the toolchain library end to end.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("ccdriver=info"),
        1 => EnvFilter::new("ccdriver=debug"),
        _ => EnvFilter::new("ccdriver=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let verbosity = cli.verbose;
    let jobs = cli.jobs;

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args, verbosity, jobs),
        Commands::Replay(args) => commands::replay::execute(args, verbosity, jobs),
        Commands::CheckStale(args) => commands::check_stale::execute(args),
        Commands::Doctor(args) => commands::doctor::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if let Err(err) = result {
        ccdriver::diagnostic::report(&err);
        std::process::exit(1);
    }
}
