//! Zram device operations.
//!
//! The kernel tool contract: every interaction with the zram pool and the
//! swap subsystem is one of the methods below, each mapped to exactly one
//! util-linux invocation.

use crate::tool::{Invocation, ToolRunner};
use crate::{Error, Result};
use std::time::Duration;

/// Minimum time allowed for `swapoff`, which must page every swapped-out
/// page back into RAM before it returns.
pub const SWAPOFF_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for zram operations (allows for testing).
pub trait ZramOps {
    /// Load the zram kernel module.
    fn load_module(&self) -> Result<()>;

    /// List all devices in structured (JSON) form, byte precision.
    fn list_json(&self) -> Result<String>;

    /// List all devices as header-less raw lines, byte precision.
    fn list_raw(&self) -> Result<String>;

    /// Names of all active devices.
    fn device_names(&self) -> Result<Vec<String>>;

    /// Allocate a free device of `size` and return its path.
    fn allocate(&self, size: &str) -> Result<String>;

    /// Format a device as swap space.
    fn make_swap(&self, device: &str) -> Result<()>;

    /// Activate a device as swap with the given priority.
    fn swap_on(&self, device: &str, priority: i32) -> Result<()>;

    /// Deactivate a swap device.
    fn swap_off(&self, device: &str) -> Result<()>;

    /// Reset (free) a device in the kernel pool.
    fn reset(&self, device: &str) -> Result<()>;
}

/// util-linux backed implementation.
#[derive(Debug, Clone, Default)]
pub struct ZramctlOps<R> {
    runner: R,
}

impl<R: ToolRunner> ZramctlOps<R> {
    /// Create operations driving tools through `runner`.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// The underlying runner.
    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn zramctl<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let output = self
            .runner
            .run_checked(&Invocation::new("zramctl").args(args))?;
        Ok(output.stdout)
    }
}

impl<R: ToolRunner> ZramOps for ZramctlOps<R> {
    fn load_module(&self) -> Result<()> {
        self.runner
            .run_checked(&Invocation::new("modprobe").arg("zram"))?;
        Ok(())
    }

    fn list_json(&self) -> Result<String> {
        self.zramctl(["--output-all", "--bytes", "--json"])
    }

    fn list_raw(&self) -> Result<String> {
        self.zramctl(["--output-all", "--bytes", "--noheadings", "--raw"])
    }

    fn device_names(&self) -> Result<Vec<String>> {
        let stdout = self.zramctl(["--noheadings", "--raw", "--output", "NAME"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn allocate(&self, size: &str) -> Result<String> {
        let stdout = self.zramctl(["--find", "--size", size])?;
        stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::MalformedOutput("zramctl --find printed no device name".to_string())
            })
    }

    fn make_swap(&self, device: &str) -> Result<()> {
        self.runner
            .run_checked(&Invocation::new("mkswap").arg(device))?;
        Ok(())
    }

    fn swap_on(&self, device: &str, priority: i32) -> Result<()> {
        self.runner.run_checked(
            &Invocation::new("swapon")
                .arg(device)
                .arg("-p")
                .arg(priority.to_string()),
        )?;
        Ok(())
    }

    fn swap_off(&self, device: &str) -> Result<()> {
        self.runner
            .run_checked(
                &Invocation::new("swapoff")
                    .arg(device)
                    .min_timeout(SWAPOFF_TIMEOUT),
            )?;
        Ok(())
    }

    fn reset(&self, device: &str) -> Result<()> {
        self.zramctl(["--reset", device])?;
        Ok(())
    }
}
