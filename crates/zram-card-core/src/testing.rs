//! In-memory stand-in for the zram/swap tooling.
//!
//! [`FakeKernel`] implements [`ToolRunner`] by simulating a zram device pool
//! and the swap subsystem, answering the exact invocations the real tools
//! receive. Failures can be injected per command-line prefix.

use crate::tool::{Invocation, ToolOutput, ToolRunner};
use crate::zram::{parse_size, SWAP_PRIORITY};
use crate::{Error, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct FakeDevice {
    disksize: u64,
    data: u64,
    compr: u64,
    total: u64,
    formatted: bool,
    swap_priority: Option<i32>,
}

#[derive(Debug, Default)]
struct FakeState {
    devices: BTreeMap<u32, FakeDevice>,
    calls: Vec<String>,
    failures: Vec<(String, String)>,
    json_listing: Option<String>,
    raw_listing: Option<String>,
    unavailable: bool,
    max_devices: Option<u32>,
}

/// Simulated zram pool.
#[derive(Debug, Default)]
pub struct FakeKernel {
    state: Mutex<FakeState>,
}

impl FakeKernel {
    /// Empty pool, every tool present.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the JSON listing with fixed text instead of the live pool.
    #[must_use]
    pub fn with_json_listing(self, text: &str) -> Self {
        self.lock().json_listing = Some(text.to_string());
        self
    }

    /// Answer the raw listing with fixed text instead of the live pool.
    #[must_use]
    pub fn with_raw_listing(self, text: &str) -> Self {
        self.lock().raw_listing = Some(text.to_string());
        self
    }

    /// Make every command line starting with `prefix` exit 1 with `stderr`.
    #[must_use]
    pub fn fail_on(self, prefix: &str, stderr: &str) -> Self {
        self.lock()
            .failures
            .push((prefix.to_string(), stderr.to_string()));
        self
    }

    /// Pretend none of the tools are installed.
    #[must_use]
    pub fn unavailable(self) -> Self {
        self.lock().unavailable = true;
        self
    }

    /// Limit the pool to `max` devices.
    #[must_use]
    pub fn with_max_devices(self, max: u32) -> Self {
        self.lock().max_devices = Some(max);
        self
    }

    /// Add an active swap device with the given counters, returning its path.
    pub fn add_device(&self, disksize: u64, data: u64, compr: u64, total: u64) -> String {
        let mut state = self.lock();
        let id = next_free_id(&state.devices);
        state.devices.insert(
            id,
            FakeDevice {
                disksize,
                data,
                compr,
                total,
                formatted: true,
                swap_priority: Some(SWAP_PRIORITY),
            },
        );
        format!("/dev/zram{id}")
    }

    /// Every command line run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Paths of devices currently allocated.
    #[must_use]
    pub fn live_devices(&self) -> Vec<String> {
        self.lock()
            .devices
            .keys()
            .map(|id| format!("/dev/zram{id}"))
            .collect()
    }

    /// Swap priority of an active device, `None` when not swapped on.
    #[must_use]
    pub fn swap_priority(&self, device: &str) -> Option<i32> {
        let state = self.lock();
        device_id(device)
            .and_then(|id| state.devices.get(&id))
            .and_then(|d| d.swap_priority)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the state from others.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn next_free_id(devices: &BTreeMap<u32, FakeDevice>) -> u32 {
    (0..).find(|id| !devices.contains_key(id)).unwrap_or(0)
}

fn device_id(device: &str) -> Option<u32> {
    device.trim().strip_prefix("/dev/zram")?.parse().ok()
}

fn json_listing(devices: &BTreeMap<u32, FakeDevice>) -> String {
    let rows: Vec<_> = devices
        .iter()
        .map(|(id, d)| {
            json!({
                "name": format!("/dev/zram{id}"),
                "disksize": d.disksize,
                "data": d.data,
                "compr": d.compr,
                "algorithm": "zstd",
                "streams": 4,
                "zero-pages": 0,
                "total": d.total,
                "mem-limit": 0,
                "mem-used": d.total,
                "migrated": 0,
                "mountpoint": if d.swap_priority.is_some() { Some("[SWAP]") } else { None },
            })
        })
        .collect();
    json!({ "zramctl": rows }).to_string()
}

fn raw_listing(devices: &BTreeMap<u32, FakeDevice>) -> String {
    devices
        .iter()
        .map(|(id, d)| {
            format!(
                "/dev/zram{id} {} {} {} zstd 4 0 {} 0 {} 0 {}\n",
                d.disksize,
                d.data,
                d.compr,
                d.total,
                d.total,
                if d.swap_priority.is_some() { "[SWAP]" } else { "" }
            )
        })
        .collect()
}

impl FakeState {
    fn handle(&mut self, program: &str, args: &[&str]) -> ToolOutput {
        match (program, args) {
            ("modprobe", ["zram"]) => ToolOutput::ok(""),
            ("zramctl", ["--output-all", "--bytes", "--json"]) => ToolOutput::ok(
                self.json_listing
                    .clone()
                    .unwrap_or_else(|| json_listing(&self.devices)),
            ),
            ("zramctl", ["--output-all", "--bytes", "--noheadings", "--raw"]) => ToolOutput::ok(
                self.raw_listing
                    .clone()
                    .unwrap_or_else(|| raw_listing(&self.devices)),
            ),
            ("zramctl", ["--noheadings", "--raw", "--output", "NAME"]) => ToolOutput::ok(
                self.devices
                    .keys()
                    .map(|id| format!("/dev/zram{id}\n"))
                    .collect::<String>(),
            ),
            ("zramctl", ["--find", "--size", size]) => self.allocate(size),
            ("zramctl", ["--reset", device]) => match device_id(device) {
                Some(id) if self.devices.remove(&id).is_some() => ToolOutput::ok(""),
                _ => ToolOutput::failed(1, format!("zramctl: {device}: failed to reset")),
            },
            ("mkswap", [device]) => match device_id(device).and_then(|id| self.devices.get_mut(&id)) {
                Some(dev) => {
                    dev.formatted = true;
                    ToolOutput::ok(format!("Setting up swapspace version 1, size = {}", dev.disksize))
                }
                None => ToolOutput::failed(1, format!("mkswap: cannot open {device}")),
            },
            ("swapon", [device, "-p", prio]) => {
                match device_id(device).and_then(|id| self.devices.get_mut(&id)) {
                    Some(dev) if dev.formatted && dev.swap_priority.is_none() => {
                        dev.swap_priority = prio.parse().ok();
                        ToolOutput::ok("")
                    }
                    Some(_) => ToolOutput::failed(
                        255,
                        format!("swapon: {device}: swapon failed: Device or resource busy"),
                    ),
                    None => ToolOutput::failed(255, format!("swapon: cannot open {device}")),
                }
            }
            ("swapoff", [device]) => {
                match device_id(device).and_then(|id| self.devices.get_mut(&id)) {
                    Some(dev) if dev.swap_priority.is_some() => {
                        dev.swap_priority = None;
                        ToolOutput::ok("")
                    }
                    _ => ToolOutput::failed(
                        255,
                        format!("swapoff: {device}: swapoff failed: Invalid argument"),
                    ),
                }
            }
            _ => ToolOutput::failed(2, format!("{program}: unsupported arguments {args:?}")),
        }
    }

    fn allocate(&mut self, size: &str) -> ToolOutput {
        let Ok(disksize) = parse_size(size) else {
            return ToolOutput::failed(1, format!("zramctl: invalid size '{size}'"));
        };
        let id = next_free_id(&self.devices);
        if self.max_devices.is_some_and(|max| id >= max) {
            return ToolOutput::failed(1, "zramctl: no free zram device found");
        }
        self.devices.insert(
            id,
            FakeDevice {
                disksize,
                ..FakeDevice::default()
            },
        );
        ToolOutput::ok(format!("/dev/zram{id}\n"))
    }
}

impl ToolRunner for FakeKernel {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let line = invocation.to_string();
        let mut state = self.lock();
        state.calls.push(line.clone());

        if state.unavailable {
            return Err(Error::ToolUnavailable {
                program: invocation.program.clone(),
                reason: "No such file or directory (os error 2)".to_string(),
            });
        }
        if let Some((_, stderr)) = state.failures.iter().find(|(p, _)| line.starts_with(p)) {
            return Ok(ToolOutput::failed(1, stderr.clone()));
        }

        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        Ok(state.handle(&invocation.program, &args))
    }
}
