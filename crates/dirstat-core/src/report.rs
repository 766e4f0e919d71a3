//! Per-target scan statistics and results.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;

/// Counters collected while walking a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Directories written.
    pub directories: u64,
    /// Non-directory entries written.
    pub files: u64,
    /// Entries left out by exclusion patterns.
    pub excluded: u64,
    /// Entries whose metadata could not be read.
    pub stat_failures: u64,
    /// Directories whose listing failed.
    pub unreadable_dirs: u64,
    /// Directories on a different device than the root.
    pub mount_points: u64,
    /// Mount points whose subtree was not descended into.
    pub pruned_mounts: u64,
}

impl WalkStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries skipped for any reason.
    pub fn skipped(&self) -> u64 {
        self.excluded + self.stat_failures
    }

    /// Record a directory.
    pub fn record_dir(&mut self) {
        self.directories += 1;
    }

    /// Record a file entry.
    pub fn record_file(&mut self) {
        self.files += 1;
    }

    /// Record a mount point and whether it was descended into.
    pub fn record_mount_point(&mut self, descended: bool) {
        self.mount_points += 1;
        if !descended {
            self.pruned_mounts += 1;
        }
    }
}

/// Result of writing one cache file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root path that was scanned.
    pub root: PathBuf,

    /// Cache file that was written.
    pub cache: PathBuf,

    /// When the scan finished.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub duration: Duration,

    /// Walk counters.
    pub stats: WalkStats,

    /// Warnings encountered during scan.
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// Create a new report.
    pub fn new(
        root: PathBuf,
        cache: PathBuf,
        stats: WalkStats,
        duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root,
            cache,
            scanned_at: SystemTime::now(),
            duration,
            stats,
            warnings,
        }
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stats_default() {
        let stats = WalkStats::default();
        assert_eq!(stats.directories, 0);
        assert_eq!(stats.files, 0);
        assert_eq!(stats.skipped(), 0);
    }

    #[test]
    fn test_record_mount_point() {
        let mut stats = WalkStats::new();
        stats.record_mount_point(true);
        stats.record_mount_point(false);
        assert_eq!(stats.mount_points, 2);
        assert_eq!(stats.pruned_mounts, 1);
    }

    #[test]
    fn test_skipped_sums_exclusions_and_failures() {
        let stats = WalkStats {
            excluded: 2,
            stat_failures: 3,
            ..WalkStats::default()
        };
        assert_eq!(stats.skipped(), 5);
    }
}
