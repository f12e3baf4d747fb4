//! Remove zram swap command.
//!
//! This is a pure shim that delegates to `zram_card_core::lifecycle`.

use super::{report, Context};
use clap::Args;
use std::process::ExitCode;
use zram_card_core::LifecycleManager;

/// Arguments for removing zram swap devices.
#[derive(Args)]
pub struct RemoveArgs {
    /// Device to remove (e.g., "zram0"); omit to remove every device.
    #[arg(short, long, default_value = "")]
    pub device: String,
}

/// Remove one zram swap device, or all of them.
pub fn remove(ctx: &Context, args: &RemoveArgs) -> anyhow::Result<ExitCode> {
    let ops = ctx.ops();
    let result = LifecycleManager::new(&ops, &ctx.settings).remove_device(&args.device);
    report(&result, ctx.format)
}
