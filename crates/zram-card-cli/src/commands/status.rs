//! Status command for zram devices.
//!
//! This is a pure shim that delegates to `zram_card_core::collector`.

use super::Context;
use crate::output::{print_json, OutputFormat};
use std::process::ExitCode;
use zram_card_core::{aggregate, format_bytes, Collector, DeviceRecord, StatusReport, SummaryStats};

/// Show device statistics and the compression summary.
pub fn status(ctx: &Context) -> anyhow::Result<ExitCode> {
    let ops = ctx.ops();
    let records = Collector::new(&ops).collect();
    let stats = aggregate(&records);

    match ctx.format {
        OutputFormat::Table => print_table(&stats, &records),
        OutputFormat::Json => print_json(&StatusReport::new(&stats, &records))?,
        OutputFormat::Raw => {
            println!("{} {:.2} {}", stats.memory_saved, stats.ratio, stats.total_used);
            for r in &records {
                println!(
                    "{} {} {} {} {} {}",
                    r.name,
                    r.disk_size_bytes,
                    r.original_data_bytes,
                    r.compressed_data_bytes,
                    r.total_resident_bytes,
                    r.algorithm
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_table(stats: &SummaryStats, records: &[DeviceRecord]) {
    println!(
        "Memory saved: {}   Ratio: {:.2}x   RAM used: {}",
        format_bytes(stats.memory_saved),
        stats.ratio,
        format_bytes(stats.total_used)
    );

    if records.is_empty() {
        println!("No active ZRAM devices");
        return;
    }

    println!();
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10}",
        "DEVICE", "DISK SIZE", "ORIG DATA", "COMPR DATA", "ALGORITHM"
    );
    for r in records {
        println!(
            "{:<12} {:>10} {:>10} {:>10} {:>10}",
            r.name,
            format_bytes(r.disk_size_bytes),
            format_bytes(r.original_data_bytes),
            format_bytes(r.compressed_data_bytes),
            r.algorithm
        );
    }
}
