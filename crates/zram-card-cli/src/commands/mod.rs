//! CLI command implementations.

mod create;
mod remove;
mod serve;
mod status;

pub use create::{create, CreateArgs};
pub use remove::{remove, RemoveArgs};
pub use serve::{serve, ServeArgs};
pub use status::status;

use crate::output::{print_json, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use zram_card_core::{OperationResult, SettingsStore, SystemRunner, ZramctlOps};

/// Settings, tool runner, and output format shared by every command.
pub struct Context {
    /// Settings file store.
    pub settings: SettingsStore,
    /// Runner for the zram and swap tools.
    pub runner: SystemRunner,
    /// Output format.
    pub format: OutputFormat,
}

impl Context {
    /// Build the context from the global flags.
    pub fn new(config: PathBuf, timeout_secs: u64, format: OutputFormat) -> Self {
        Self {
            settings: SettingsStore::new(config),
            runner: SystemRunner::new(Duration::from_secs(timeout_secs.max(1))),
            format,
        }
    }

    /// Zram operations over the system runner.
    pub fn ops(&self) -> ZramctlOps<&SystemRunner> {
        ZramctlOps::new(&self.runner)
    }
}

/// Print a management outcome; the exit code follows `success`.
fn report(result: &OperationResult, format: OutputFormat) -> anyhow::Result<ExitCode> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table | OutputFormat::Raw if result.success => println!("{}", result.message),
        OutputFormat::Table | OutputFormat::Raw => eprintln!("{}", result.message),
    }
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
