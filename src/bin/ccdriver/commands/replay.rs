//! `ccdriver replay` - run a previously written build plan.

use ccdriver::error::Result;
use ccdriver::plan;

use crate::cli::ReplayArgs;

pub fn execute(args: ReplayArgs, verbosity: u8, jobs: usize) -> Result<()> {
    let loaded = plan::read_plan(&args.plan)?;
    plan::run_plan(&loaded, jobs, verbosity)?;
    println!("replayed {} compile step(s)", loaded.compile.len());
    Ok(())
}
