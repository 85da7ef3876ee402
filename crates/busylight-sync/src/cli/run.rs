//! `run` subcommand: the reconciliation loop.

use super::{GlobalOpts, Result, Shutdown, load_context};

pub(super) fn cmd_run(opts: &GlobalOpts, shutdown: &Shutdown) -> Result<()> {
    let ctx = load_context(opts)?;
    let mut reconciler = ctx.reconciler()?;
    println!("Watching for busy state. Press Ctrl+C to stop.");
    reconciler.run(shutdown)?;
    Ok(())
}
