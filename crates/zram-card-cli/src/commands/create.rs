//! Create zram swap command.
//!
//! This is a pure shim that delegates to `zram_card_core::lifecycle`.

use super::{report, Context};
use clap::Args;
use std::process::ExitCode;
use zram_card_core::LifecycleManager;

/// Arguments for creating a zram swap device.
#[derive(Args)]
pub struct CreateArgs {
    /// Device size (e.g., "4G", "512M"); defaults to the configured swap size.
    #[arg(short, long)]
    pub size: Option<String>,
}

/// Create a zram device and enable it as swap.
pub fn create(ctx: &Context, args: &CreateArgs) -> anyhow::Result<ExitCode> {
    let size = match &args.size {
        Some(size) => size.clone(),
        None => ctx.settings.load().swap_size,
    };

    let ops = ctx.ops();
    let result = LifecycleManager::new(&ops, &ctx.settings).create_device(&size);
    report(&result, ctx.format)
}
