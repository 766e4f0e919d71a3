//! Depth-first tree walk producing cache file events.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use compact_str::CompactString;

use dirstat_core::{
    MountTable, PathMetadata, ScanError, ScanTarget, ScanWarning, WalkStats, WarningKind,
};

use crate::boundary::BoundaryDecision;

/// One structural element of a cache file, in output order.
#[derive(Debug, Clone)]
pub enum WalkEvent {
    /// A directory is opened; its entries follow.
    Directory(PathMetadata),
    /// Device label of the scan root, right after the first directory.
    Device(CompactString),
    /// The directory just opened lies on another device.
    Boundary {
        path: PathBuf,
        label: CompactString,
        labels_differ: bool,
    },
    /// The directory just opened could not be listed.
    Unreadable { path: PathBuf, kind: io::ErrorKind },
    /// A non-directory entry of the current directory.
    Entry(PathMetadata),
}

/// Pre-order walk of a scan target.
///
/// Each directory yields its [`WalkEvent::Directory`] event, then all of its
/// non-directory children in byte order of their names, then the events of
/// each subdirectory in the same order. Directories are listed in full before
/// any of their events are yielded.
pub struct TreeWalk<'a> {
    target: &'a ScanTarget,
    mounts: &'a MountTable,
    stack: Vec<PathMetadata>,
    pending: VecDeque<WalkEvent>,
    first: bool,
    stats: WalkStats,
    warnings: Vec<ScanWarning>,
}

impl<'a> TreeWalk<'a> {
    /// Start a walk at the target's root.
    ///
    /// Fails if the root does not exist or is not a directory.
    pub fn new(target: &'a ScanTarget, mounts: &'a MountTable) -> Result<Self, ScanError> {
        let root = PathMetadata::capture_path(&target.root);
        if !root.exists() {
            return Err(ScanError::NotFound {
                path: target.root.clone(),
            });
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: target.root.clone(),
            });
        }

        Ok(Self {
            target,
            mounts,
            stack: vec![root],
            pending: VecDeque::new(),
            first: true,
            stats: WalkStats::new(),
            warnings: Vec::new(),
        })
    }

    /// Counters so far.
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Warnings so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Consume the walk, returning its counters and warnings.
    pub fn into_parts(self) -> (WalkStats, Vec<ScanWarning>) {
        (self.stats, self.warnings)
    }

    fn visit(&mut self, dir: PathMetadata) {
        let path = dir.path().to_path_buf();
        let device = dir.device().unwrap_or(self.target.root_device);

        tracing::info!("Reading {}", path.display());
        self.stats.record_dir();
        self.pending.push_back(WalkEvent::Directory(dir));

        if self.first {
            self.first = false;
            self.pending
                .push_back(WalkEvent::Device(self.target.root_label.clone()));
        }

        let mounts = self.mounts;
        let decision = BoundaryDecision::decide(
            self.target.root_device,
            &self.target.root_label,
            device,
            self.target.scan_mounted,
            || mounts.label_for(&path),
        );
        let descends = decision.descends();

        if let BoundaryDecision::MountPoint {
            label,
            labels_differ,
        } = decision
        {
            self.record_mount_point(&path, &label, labels_differ, descends);
            self.pending.push_back(WalkEvent::Boundary {
                path: path.clone(),
                label,
                labels_differ,
            });
        }
        if !descends {
            return;
        }

        let mut names = match list_dir(&path) {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!("Can't open directory {}: {err}", path.display());
                self.stats.unreadable_dirs += 1;
                self.warnings.push(ScanWarning::read_error(&path, &err));
                self.pending.push_back(WalkEvent::Unreadable {
                    path,
                    kind: err.kind(),
                });
                return;
            }
        };
        names.sort();

        let mut subdirs = Vec::new();
        for name in names {
            let Some(child) = self.admit(PathMetadata::capture(&path, &name)) else {
                continue;
            };

            if child.is_dir() {
                subdirs.push(child);
            } else {
                self.stats.record_file();
                self.pending.push_back(WalkEvent::Entry(child));
            }
        }

        self.stack.extend(subdirs.into_iter().rev());
    }

    /// Drop children that could not be stat'ed or are excluded.
    fn admit(&mut self, child: PathMetadata) -> Option<PathMetadata> {
        if !child.exists() {
            self.stats.stat_failures += 1;
            self.warnings.push(ScanWarning::metadata_error(child.path()));
            return None;
        }
        if self.target.exclude.is_excluded(child.path()) {
            tracing::info!("Skipping excluded entry {}", child.path().display());
            self.stats.excluded += 1;
            self.warnings.push(ScanWarning::excluded(child.path()));
            return None;
        }
        Some(child)
    }

    fn record_mount_point(&mut self, path: &Path, label: &str, labels_differ: bool, descends: bool) {
        if labels_differ {
            tracing::info!(
                "Filesystem boundary at mount point {} on device {label}",
                path.display()
            );
        } else {
            tracing::info!(
                "Mount point {} is still on the same device {label}",
                path.display()
            );
        }

        self.stats.record_mount_point(descends);
        if !descends {
            self.warnings.push(ScanWarning::new(
                path,
                format!("Not descending into mount point on device {label}"),
                WarningKind::CrossFilesystem,
            ));
        }
    }
}

impl Iterator for TreeWalk<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let dir = self.stack.pop()?;
            self.visit(dir);
        }
    }
}

/// Read all entry names of a directory.
fn list_dir(path: &Path) -> io::Result<Vec<OsString>> {
    std::fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect()
}
