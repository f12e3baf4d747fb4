//! # zram-card
//!
//! Compressed-RAM (zram) swap statistics and device lifecycle for a host
//! dashboard.
//!
//! This is the workspace root crate that re-exports core functionality.
//! For direct usage, depend on individual sub-crates:
//!
//! - [`zram-card-core`] - device collection, aggregation, settings, lifecycle
//! - [`zram-card-http`] - dashboard endpoints (`/status`, `/swap`, `/config`)
//! - [`zram-card-cli`] - CLI tool (`zram-card` binary)

pub use zram_card_core::*;
