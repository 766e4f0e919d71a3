//! Tree walker and cache file writer for dirstat.
//!
//! This crate walks a directory tree and writes it in the QDirStat cache
//! file format.
//!
//! # Overview
//!
//! - [`TreeWalk`] is a pre-order iterator of [`WalkEvent`]s: one directory
//!   at a time, its files first, then its subdirectories, with filesystem
//!   boundary and listing-error notices in between.
//! - [`CacheWriter`] renders those events as cache file lines.
//! - [`CacheScanner`] ties both to a [`CacheSink`] for one scan target.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirstat_scan::{CacheScanner, MountTable, ScanTarget, TargetConfig};
//!
//! let mounts = MountTable::from_system().unwrap();
//! let config = TargetConfig::new("/srv/data");
//! let target = ScanTarget::resolve(&config, &mounts).unwrap();
//!
//! let report = CacheScanner::new(&mounts).scan(&target).unwrap();
//! println!("{} directories written", report.stats.directories);
//! ```

mod boundary;
mod cache;
mod scanner;
mod sink;
mod walker;

pub use boundary::BoundaryDecision;
pub use cache::{CacheWriter, HEADER, format_elapsed, format_mtime};
pub use scanner::CacheScanner;
pub use sink::CacheSink;
pub use walker::{TreeWalk, WalkEvent};

// Re-export core types for convenience
pub use dirstat_core::{
    ExclusionFilter, MountTable, PathMetadata, ScanError, ScanReport, ScanTarget, ScanWarning,
    TargetConfig, WalkStats, WarningKind,
};
