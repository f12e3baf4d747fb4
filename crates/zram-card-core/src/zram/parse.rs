//! zramctl output adapters.
//!
//! zramctl reports the same counters in two encodings: `--json` and the
//! header-less `--raw` table. Both adapters reduce a device to [`Counters`]
//! and share one normalization step, so callers never see which encoding
//! the data came from.

use super::DeviceRecord;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Minimum whitespace-separated fields for a raw line to be considered.
const RAW_MIN_FIELDS: usize = 5;
/// Position of the TOTAL column in `--output-all` raw output.
const RAW_TOTAL_FIELD: usize = 7;

/// Encoding-neutral view of one device's counters.
struct Counters<'a> {
    name: &'a str,
    disksize: Option<u64>,
    data: Option<u64>,
    compr: Option<u64>,
    algorithm: &'a str,
    total: Option<u64>,
}

fn normalize(c: &Counters<'_>) -> DeviceRecord {
    DeviceRecord {
        name: c.name.trim().to_string(),
        disk_size_bytes: c.disksize.unwrap_or(0),
        original_data_bytes: c.data.unwrap_or(0),
        compressed_data_bytes: c.compr.unwrap_or(0),
        algorithm: c.algorithm.trim().to_string(),
        total_resident_bytes: c.total.unwrap_or(0),
    }
}

#[derive(Deserialize)]
struct JsonListing {
    zramctl: Vec<JsonDevice>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonDevice {
    name: Option<Value>,
    disksize: Option<Value>,
    data: Option<Value>,
    compr: Option<Value>,
    algorithm: Option<Value>,
    total: Option<Value>,
}

/// Older util-linux releases quote numbers in JSON output.
fn json_counter(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_text(value: Option<&Value>) -> &str {
    value.and_then(Value::as_str).unwrap_or("")
}

/// Parse `zramctl --output-all --bytes --json` output.
///
/// Missing or non-numeric fields become zero; only an unparsable document or
/// one without the `zramctl` array is an error.
pub fn parse_json_listing(text: &str) -> Result<Vec<DeviceRecord>> {
    let listing: JsonListing = serde_json::from_str(text)
        .map_err(|e| Error::MalformedOutput(format!("zramctl json: {e}")))?;

    Ok(listing
        .zramctl
        .iter()
        .map(|dev| {
            normalize(&Counters {
                name: json_text(dev.name.as_ref()),
                disksize: json_counter(dev.disksize.as_ref()),
                data: json_counter(dev.data.as_ref()),
                compr: json_counter(dev.compr.as_ref()),
                algorithm: json_text(dev.algorithm.as_ref()),
                total: json_counter(dev.total.as_ref()),
            })
        })
        .collect())
}

/// Parse `zramctl --output-all --bytes --noheadings --raw` output.
///
/// Short lines and lines whose size columns are not numbers are skipped.
#[must_use]
pub fn parse_raw_listing(text: &str) -> Vec<DeviceRecord> {
    text.lines().filter_map(parse_raw_line).collect()
}

fn parse_raw_line(line: &str) -> Option<DeviceRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < RAW_MIN_FIELDS {
        return None;
    }

    let counters = Counters {
        name: fields[0],
        disksize: Some(fields[1].parse().ok()?),
        data: Some(fields[2].parse().ok()?),
        compr: Some(fields[3].parse().ok()?),
        algorithm: fields[4],
        total: fields.get(RAW_TOTAL_FIELD).and_then(|f| f.parse().ok()),
    };
    Some(normalize(&counters))
}
