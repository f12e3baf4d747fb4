//! zram statistics and swap lifecycle management.
//!
//! This crate collects per-device statistics from the util-linux zram
//! tooling, reduces them to dashboard summaries, and creates or removes
//! zram-backed swap devices while keeping a persisted settings file in step.
//!
//! # Example
//!
//! ```
//! use zram_card_core::{aggregate, format_bytes, DeviceRecord};
//!
//! let records = [DeviceRecord {
//!     name: "zram0".to_string(),
//!     disk_size_bytes: 1 << 30,
//!     original_data_bytes: 2_147_483_648,
//!     compressed_data_bytes: 536_870_912,
//!     algorithm: "zstd".to_string(),
//!     total_resident_bytes: 600_000_000,
//! }];
//!
//! let stats = aggregate(&records);
//! assert_eq!(format_bytes(stats.memory_saved), "1.44 GB");
//! assert_eq!(stats.ratio, 4.0);
//! ```

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod collector;
mod error;
pub mod lifecycle;
pub mod settings;
pub mod status;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tool;
pub mod zram;

pub use aggregate::{aggregate, SummaryStats};
pub use collector::Collector;
pub use error::{Error, Result};
pub use lifecycle::{LifecycleManager, OperationResult, NO_DEVICE_MESSAGE};
pub use settings::{PersistedConfig, RequestedDevice, SettingsStore, DEFAULT_SETTINGS_PATH};
pub use status::{CardConfig, DeviceRow, StatusReport};
pub use tool::{Invocation, SystemRunner, ToolOutput, ToolRunner};
pub use zram::{format_bytes, parse_size, DeviceRecord, ZramOps, ZramctlOps};
