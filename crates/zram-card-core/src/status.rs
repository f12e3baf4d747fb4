//! Dashboard payloads.

use crate::aggregate::{aggregate, SummaryStats};
use crate::collector::Collector;
use crate::settings::PersistedConfig;
use crate::zram::{format_bytes, DeviceRecord, ZramOps};
use serde::Serialize;

/// One row of the device table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRow {
    /// Device name.
    pub name: String,
    /// Formatted disk size.
    pub disk_size: String,
    /// Formatted original (uncompressed) data size.
    pub used: String,
    /// Formatted compressed data size.
    pub compressed: String,
    /// Compression algorithm.
    pub algorithm: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(rec: &DeviceRecord) -> Self {
        Self {
            name: rec.name.clone(),
            disk_size: format_bytes(rec.disk_size_bytes),
            used: format_bytes(rec.original_data_bytes),
            compressed: format_bytes(rec.compressed_data_bytes),
            algorithm: rec.algorithm.clone(),
        }
    }
}

/// Response to a dashboard poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Formatted RAM saved.
    pub memory_saved: String,
    /// Compression ratio, two decimals.
    pub ratio: f64,
    /// Formatted resident memory.
    pub total_used: String,
    /// Per-device rows.
    pub devices: Vec<DeviceRow>,
}

impl StatusReport {
    /// Build the report for one cycle's records.
    #[must_use]
    pub fn from_records(records: &[DeviceRecord]) -> Self {
        Self::new(&aggregate(records), records)
    }

    /// Build the report from precomputed statistics.
    #[must_use]
    pub fn new(stats: &SummaryStats, records: &[DeviceRecord]) -> Self {
        Self {
            memory_saved: format_bytes(stats.memory_saved),
            ratio: stats.ratio,
            total_used: format_bytes(stats.total_used),
            devices: records.iter().map(DeviceRow::from).collect(),
        }
    }

    /// Degraded response: no devices, zero statistics.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_records(&[])
    }

    /// Collect from the kernel and report.
    #[must_use]
    pub fn collect<O: ZramOps>(ops: &O) -> Self {
        Self::from_records(&Collector::new(ops).collect())
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::empty()
    }
}

/// Settings the dashboard tile needs before it starts polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardConfig {
    /// Whether the tile is shown.
    pub enabled: bool,
    /// Poll interval in milliseconds.
    pub poll_interval: u64,
    /// Default size for new devices.
    pub swap_size: String,
}

impl From<&PersistedConfig> for CardConfig {
    fn from(config: &PersistedConfig) -> Self {
        Self {
            enabled: config.enabled,
            poll_interval: config.poll_interval_ms,
            swap_size: config.swap_size.clone(),
        }
    }
}
