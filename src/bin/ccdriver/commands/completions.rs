//! `ccdriver completions` - emit a shell completion script to stdout.

use clap::CommandFactory;
use clap_complete::generate;

use ccdriver::error::Result;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
