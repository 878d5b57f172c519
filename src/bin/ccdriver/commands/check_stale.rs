//! `ccdriver check-stale` - report whether a plan is stale without
//! rebuilding anything. Exit code 0 = fresh, 1 = stale.

use ccdriver::error::Result;
use ccdriver::plan;

use crate::cli::CheckStaleArgs;

pub fn execute(args: CheckStaleArgs) -> Result<()> {
    let status = plan::changed_via_plan(&args.plan, &args.output, &args.cmdline, &args.nim_exe);
    if status.is_stale() {
        println!("stale");
        std::process::exit(1);
    }
    println!("fresh");
    Ok(())
}
