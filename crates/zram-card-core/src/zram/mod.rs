//! Zram device management.
//!
//! This module provides a shim-style abstraction over the util-linux zram
//! tooling, allowing the collection and lifecycle logic to be tested without
//! touching real block devices.

mod device;
mod ops;
mod parse;

pub use device::DeviceRecord;
pub use ops::{ZramOps, ZramctlOps, SWAPOFF_TIMEOUT};
pub use parse::{parse_json_listing, parse_raw_listing};

use crate::{Error, Result};

/// Substring every compressed-RAM device name carries.
pub const DEVICE_MARKER: &str = "zram";

/// Swap priority given to zram devices so they are preferred over disk swap.
pub const SWAP_PRIORITY: i32 = 100;

/// Size spec used when a create request does not name one.
pub const DEFAULT_SIZE_SPEC: &str = "1G";

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Parse a size spec (e.g. "4G", "512M", "1024") to bytes.
///
/// Accepts the forms `zramctl --size` understands: a plain number of bytes
/// or a number with a K/M/G/T suffix, optionally followed by `iB`.
pub fn parse_size(size: &str) -> Result<u64> {
    let size = size.trim().to_uppercase();
    let size = size.strip_suffix("IB").unwrap_or(&size);

    let (num_str, multiplier) = if let Some(n) = size.strip_suffix('K') {
        (n, 1024u64)
    } else if let Some(n) = size.strip_suffix('M') {
        (n, 1024u64 * 1024)
    } else if let Some(n) = size.strip_suffix('G') {
        (n, 1024u64 * 1024 * 1024)
    } else if let Some(n) = size.strip_suffix('T') {
        (n, 1024u64 * 1024 * 1024 * 1024)
    } else {
        (size, 1u64)
    };

    if num_str.is_empty() || !num_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!("invalid size spec: {size}")));
    }
    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid size number: {num_str}")))?;
    if num == 0 {
        return Err(Error::InvalidInput("size must be greater than zero".to_string()));
    }
    num.checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidInput(format!("size too large: {size}")))
}

/// Format bytes for display using base-1024 units.
///
/// Zero renders as `"0 B"`; everything else gets two decimals in the largest
/// unit whose scaled value is at least one, never beyond TB.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{scaled:.2} {}", BYTE_UNITS[unit])
}

/// Whether a name refers to a compressed-RAM device.
#[must_use]
pub fn is_zram_name(name: &str) -> bool {
    name.contains(DEVICE_MARKER)
}

/// Fully qualified device path for a device name (`zram0` -> `/dev/zram0`).
#[must_use]
pub fn device_path(name: &str) -> String {
    let name = name.trim();
    if name.contains("/dev/") {
        name.to_string()
    } else {
        format!("/dev/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
    }

    #[test]
    fn test_parse_size_kb() {
        assert_eq!(parse_size("4K").unwrap(), 4 * 1024);
        assert_eq!(parse_size("4k").unwrap(), 4 * 1024);
    }

    #[test]
    fn test_parse_size_mb() {
        assert_eq!(parse_size("512M").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_size("1MiB").unwrap(), 1024 * 1024);
    }

    #[test]
    fn test_parse_size_gb() {
        assert_eq!(parse_size("4G").unwrap(), 4 * 1024 * 1024 * 1024);
        assert_eq!(parse_size(" 1g ").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_tb() {
        assert_eq!(parse_size("1T").unwrap(), 1024u64 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("invalid").is_err());
        assert!(parse_size("4X").is_err());
        assert!(parse_size("").is_err());
        assert!(parse_size("G").is_err());
        assert!(parse_size("-1G").is_err());
        assert!(parse_size("1G; rm -rf /").is_err());
    }

    #[test]
    fn test_parse_size_zero_rejected() {
        let err = parse_size("0G").unwrap_err().to_string();
        assert!(err.contains("greater than zero"));
    }

    #[test]
    fn test_parse_size_overflow() {
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn test_format_bytes_unit_boundaries() {
        assert_eq!(format_bytes(1), "1.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_bytes(1024u64.pow(4)), "1.00 TB");
    }

    #[test]
    fn test_format_bytes_fractional() {
        assert_eq!(format_bytes(1536 * 1024 * 1024), "1.50 GB");
        assert_eq!(format_bytes(1_547_483_648), "1.44 GB");
    }

    #[test]
    fn test_format_bytes_clamped_to_tb() {
        assert_eq!(format_bytes(1024u64.pow(5)), "1024.00 TB");
        assert!(format_bytes(u64::MAX).ends_with(" TB"));
    }

    #[test]
    fn test_is_zram_name() {
        assert!(is_zram_name("zram0"));
        assert!(is_zram_name("/dev/zram3"));
        assert!(!is_zram_name("sda1"));
        assert!(!is_zram_name(""));
    }

    #[test]
    fn test_device_path() {
        assert_eq!(device_path("zram0"), "/dev/zram0");
        assert_eq!(device_path("/dev/zram1"), "/dev/zram1");
        assert_eq!(device_path(" zram2\n"), "/dev/zram2");
    }
}
