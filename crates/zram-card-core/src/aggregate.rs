//! Summary statistics over one collection cycle.

use crate::zram::DeviceRecord;
use serde::Serialize;

/// Aggregate compression statistics for all devices in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Bytes of RAM saved: original data minus resident memory, floored at 0.
    pub memory_saved: u64,
    /// Overall compression ratio rounded to two decimals, 0 when nothing is
    /// compressed.
    pub ratio: f64,
    /// Total resident memory used by all devices.
    pub total_used: u64,
}

/// Reduce device records to summary statistics.
///
/// Sums are taken in `u128` so no realistic pool can overflow them; results
/// saturate into `u64`. The result does not depend on record order.
#[must_use]
pub fn aggregate(records: &[DeviceRecord]) -> SummaryStats {
    let (original, compressed, resident) =
        records
            .iter()
            .fold((0u128, 0u128, 0u128), |(o, c, r), rec| {
                (
                    o + u128::from(rec.original_data_bytes),
                    c + u128::from(rec.compressed_data_bytes),
                    r + u128::from(rec.total_resident_bytes),
                )
            });

    SummaryStats {
        memory_saved: saturate(original.saturating_sub(resident)),
        ratio: ratio(original, compressed),
        total_used: saturate(resident),
    }
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn ratio(original: u128, compressed: u128) -> f64 {
    if compressed == 0 {
        return 0.0;
    }
    let raw = original as f64 / compressed as f64;
    (raw * 100.0).round() / 100.0
}
