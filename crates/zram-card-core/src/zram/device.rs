//! Observed zram device state.

use serde::Serialize;
use std::fmt;

/// One compressed-RAM device as reported by the kernel for a single
/// collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Device name as reported by zramctl (e.g. `/dev/zram0`).
    pub name: String,
    /// Configured disk size in bytes.
    pub disk_size_bytes: u64,
    /// Original data size (uncompressed) in bytes.
    pub original_data_bytes: u64,
    /// Compressed data size in bytes.
    pub compressed_data_bytes: u64,
    /// Compression algorithm.
    pub algorithm: String,
    /// Total memory used including allocator metadata, in bytes.
    pub total_resident_bytes: u64,
}

impl DeviceRecord {
    /// Calculate compression ratio.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_data_bytes > 0 {
            self.original_data_bytes as f64 / self.compressed_data_bytes as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}B disksize, {}B data, {}B compressed ({:.2}x), {}B total, {} algorithm",
            self.name,
            self.disk_size_bytes,
            self.original_data_bytes,
            self.compressed_data_bytes,
            self.compression_ratio(),
            self.total_resident_bytes,
            self.algorithm
        )
    }
}
