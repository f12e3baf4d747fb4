//! Swap device lifecycle.
//!
//! A device moves `absent -> allocated -> formatted -> swapped-on` when
//! created and `swapped-on -> swapped-off -> absent` when removed. Creation
//! stops at the first failing step and returns an allocated device to the
//! pool. The settings file records what was created here; the kernel's view
//! always wins over it.
//!
//! Operations never return errors: every outcome, including tool failures,
//! is an [`OperationResult`] for the dashboard to display. Callers must
//! serialize operations against the same settings file.

use crate::collector::Collector;
use crate::settings::{PersistedConfig, SettingsStore};
use crate::zram::{device_path, is_zram_name, parse_size, ZramOps, SWAP_PRIORITY};
use crate::Error;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Message for remove requests that match no device.
pub const NO_DEVICE_MESSAGE: &str = "No ZRAM device found to remove";

/// Outcome of a management operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// Whether the operation did what was asked.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl OperationResult {
    /// Successful outcome.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Post-allocation step of device creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    /// `mkswap`.
    Format,
    /// `swapon`.
    Activate,
}

impl fmt::Display for CreateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Format => "format as swap",
            Self::Activate => "activate swap on",
        })
    }
}

/// Creates and removes zram swap devices and keeps the settings in step.
#[derive(Debug)]
pub struct LifecycleManager<'a, O> {
    ops: &'a O,
    settings: &'a SettingsStore,
}

impl<'a, O: ZramOps> LifecycleManager<'a, O> {
    /// Manager driving `ops` and recording into `settings`.
    #[must_use]
    pub fn new(ops: &'a O, settings: &'a SettingsStore) -> Self {
        Self { ops, settings }
    }

    /// Create a zram device of `size_spec` and enable it as swap.
    pub fn create_device(&self, size_spec: &str) -> OperationResult {
        let size = size_spec.trim();
        if let Err(e) = parse_size(size) {
            return OperationResult::failed(format!("Invalid size '{size}': {e}"));
        }

        // The module may be built in or already loaded; allocation tells.
        if let Err(e) = self.ops.load_module() {
            warn!(error = %e, "could not load zram module");
        }

        let device = match self.ops.allocate(size) {
            Ok(device) => device,
            Err(e) => {
                warn!(size, error = %e, "zram allocation failed");
                return OperationResult::failed(format!(
                    "Failed to create ZRAM device: {}",
                    e.diagnostic()
                ));
            }
        };
        debug!(device = %device, size, "zram device allocated");

        if let Err((step, e)) = self.enable_swap(&device) {
            warn!(device = %device, step = %step, error = %e, "swap setup failed, releasing device");
            self.discard(&device);
            return OperationResult::failed(format!(
                "Failed to {step} {device}: {}",
                e.diagnostic()
            ));
        }

        let mut message = format!("Created ZRAM swap on {device} ({size})");
        if let Err(e) = self.settings.update(|c| c.record_created(size, &device)) {
            warn!(device = %device, error = %e, "device created but settings not saved");
            message.push_str(&format!("; settings not saved: {e}"));
        }
        info!(device = %device, size, "zram swap created");
        OperationResult::ok(message)
    }

    /// Remove one device by name, or every device when `device` is empty.
    pub fn remove_device(&self, device: &str) -> OperationResult {
        let device = device.trim();
        if device.is_empty() {
            self.remove_all()
        } else {
            self.remove_one(device)
        }
    }

    fn enable_swap(&self, device: &str) -> Result<(), (CreateStep, Error)> {
        self.ops
            .make_swap(device)
            .map_err(|e| (CreateStep::Format, e))?;
        self.ops
            .swap_on(device, SWAP_PRIORITY)
            .map_err(|e| (CreateStep::Activate, e))
    }

    fn discard(&self, device: &str) {
        if let Err(e) = self.release(device) {
            warn!(device, error = %e, "could not reset device after failed create");
        }
    }

    /// Swap off (an inactive device is fine) and reset.
    fn release(&self, device: &str) -> crate::Result<()> {
        if let Err(e) = self.ops.swap_off(device) {
            debug!(device, error = %e, "swapoff failed, device was not active swap");
        }
        self.ops.reset(device)
    }

    fn remove_one(&self, name: &str) -> OperationResult {
        if !is_zram_name(name) {
            return OperationResult::failed(NO_DEVICE_MESSAGE);
        }
        let path = device_path(name);

        if let Err(e) = self.release(&path) {
            warn!(device = %path, error = %e, "zram removal failed");
            return OperationResult::failed(format!(
                "Failed to remove ZRAM device {path}: {}",
                e.diagnostic()
            ));
        }

        let mut message = format!("Removed ZRAM device {path}");
        let mut forgotten = None;
        if let Err(e) = self
            .settings
            .update(|c| forgotten = c.forget_device(&path))
        {
            warn!(device = %path, error = %e, "device removed but settings not saved");
            message.push_str(&format!("; settings not saved: {e}"));
        }
        if forgotten.is_none() {
            debug!(device = %path, "removed device was not recorded in settings");
        }
        info!(device = %path, "zram swap removed");
        OperationResult::ok(message)
    }

    fn remove_all(&self) -> OperationResult {
        let names = Collector::new(self.ops).device_names();

        let mut removed = 0usize;
        let mut failures = Vec::new();
        for name in &names {
            let path = device_path(name);
            match self.release(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(device = %path, error = %e, "zram removal failed");
                    failures.push(format!("{path} ({})", e.diagnostic()));
                }
            }
        }

        let saved = self.settings.update(PersistedConfig::clear_devices);
        if let Err(e) = &saved {
            warn!(error = %e, "settings not saved after removing all devices");
        }

        if names.is_empty() {
            return OperationResult::failed(NO_DEVICE_MESSAGE);
        }
        if !failures.is_empty() {
            return OperationResult::failed(format!(
                "Failed to remove ZRAM devices: {}",
                failures.join(", ")
            ));
        }

        let mut message = format!("Removed all ZRAM devices ({removed})");
        if let Err(e) = saved {
            message.push_str(&format!("; settings not saved: {e}"));
        }
        info!(removed, "all zram swap removed");
        OperationResult::ok(message)
    }
}
