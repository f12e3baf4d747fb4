//! Device collection.
//!
//! Tries the structured listing first and falls back to the raw listing.
//! Collection never fails: a missing tool or unreadable output means
//! "no devices".

use crate::zram::{parse_json_listing, parse_raw_listing, DeviceRecord, ZramOps};
use tracing::{debug, warn};

/// Collects per-device records from the kernel.
#[derive(Debug)]
pub struct Collector<'a, O> {
    ops: &'a O,
}

impl<'a, O: ZramOps> Collector<'a, O> {
    /// Create a collector over the given operations.
    #[must_use]
    pub fn new(ops: &'a O) -> Self {
        Self { ops }
    }

    /// Snapshot of all active devices, possibly empty.
    #[must_use]
    pub fn collect(&self) -> Vec<DeviceRecord> {
        match self.ops.list_json().and_then(|text| parse_json_listing(&text)) {
            Ok(records) => {
                debug!(devices = records.len(), "collected devices from json listing");
                return records;
            }
            Err(e) => debug!(error = %e, "json listing unavailable, falling back to raw"),
        }

        match self.ops.list_raw() {
            Ok(text) => {
                let records = parse_raw_listing(&text);
                debug!(devices = records.len(), "collected devices from raw listing");
                records
            }
            Err(e) => {
                warn!(error = %e, "zram device listing failed");
                Vec::new()
            }
        }
    }

    /// Names of all active devices, empty when the listing fails.
    #[must_use]
    pub fn device_names(&self) -> Vec<String> {
        self.ops.device_names().unwrap_or_else(|e| {
            warn!(error = %e, "zram device name listing failed");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeKernel;
    use crate::zram::ZramctlOps;

    #[test]
    fn test_collect_prefers_json() {
        let kernel = FakeKernel::new().with_json_listing(
            r#"{"zramctl":[{"name":"zram0","disksize":1073741824,"data":2147483648,"compr":536870912,"algorithm":"zstd","total":600000000}]}"#,
        );
        let ops = ZramctlOps::new(&kernel);
        let records = Collector::new(&ops).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "zram0");
        assert!(!kernel.calls().iter().any(|c| c.contains("--raw")));
    }

    #[test]
    fn test_collect_falls_back_on_bad_json() {
        let kernel = FakeKernel::new()
            .with_json_listing("zramctl: unrecognized option '--json'")
            .with_raw_listing("/dev/zram0 4096 100 50 lz4 1 0 64\n");
        let ops = ZramctlOps::new(&kernel);
        let records = Collector::new(&ops).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_resident_bytes, 64);
    }

    #[test]
    fn test_collect_falls_back_on_json_failure() {
        let kernel = FakeKernel::new()
            .fail_on("zramctl --output-all --bytes --json", "unknown option")
            .with_raw_listing("/dev/zram1 8192 10 5 zstd\n");
        let ops = ZramctlOps::new(&kernel);
        let records = Collector::new(&ops).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "/dev/zram1");
    }

    #[test]
    fn test_collect_tool_missing_is_empty() {
        let kernel = FakeKernel::new().unavailable();
        let ops = ZramctlOps::new(&kernel);
        assert!(Collector::new(&ops).collect().is_empty());
        assert!(Collector::new(&ops).device_names().is_empty());
    }

    #[test]
    fn test_collect_both_malformed_is_empty() {
        let kernel = FakeKernel::new()
            .with_json_listing("{not json")
            .with_raw_listing("garbage\nmore garbage here\n");
        let ops = ZramctlOps::new(&kernel);
        assert!(Collector::new(&ops).collect().is_empty());
    }

    #[test]
    fn test_collect_reflects_live_devices() {
        let kernel = FakeKernel::new();
        kernel.add_device(1 << 30, 4096, 1024, 2048);
        kernel.add_device(1 << 29, 0, 0, 0);
        let ops = ZramctlOps::new(&kernel);
        let collector = Collector::new(&ops);

        let records = collector.collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "/dev/zram0");
        assert_eq!(records[0].original_data_bytes, 4096);
        assert_eq!(collector.device_names(), ["/dev/zram0", "/dev/zram1"]);
    }
}
