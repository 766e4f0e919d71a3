//! Core types and configuration for dirstat.
//!
//! This crate provides the data structures shared by the scanner and the
//! command line front end: metadata snapshots, the mount table, exclusion
//! patterns, scan targets and their configuration.

mod config;
mod error;
mod escape;
mod exclude;
mod metadata;
mod mount;
mod report;
mod target;

pub use config::{
    ConfigFile, ConfigOptions, DEFAULT_CACHE_FILE_NAME, IndexDirectory, TargetConfig,
    TargetConfigBuilder,
};
pub use error::{ConfigError, ScanError, ScanWarning, WarningKind};
pub use escape::{escape_bytes, escape_name, escape_path};
pub use exclude::ExclusionFilter;
pub use metadata::{EntryType, PathMetadata, Stat};
pub use mount::MountTable;
pub use report::{ScanReport, WalkStats};
pub use target::ScanTarget;
