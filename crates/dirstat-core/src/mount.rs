//! Mount point to device label lookup.

use std::path::Path;
use std::process::Command;

use compact_str::CompactString;
use indexmap::IndexMap;

use crate::error::ScanError;

/// Maps mount points to the device labels reported by `df`.
///
/// Built once per process and shared read-only by every scan.
#[derive(Debug, Clone)]
pub struct MountTable {
    default_label: CompactString,
    mounts: IndexMap<String, CompactString>,
}

impl MountTable {
    /// Create a table from a root label and `(mount point, label)` pairs.
    pub fn new<I, M, L>(default_label: impl Into<CompactString>, mounts: I) -> Self
    where
        I: IntoIterator<Item = (M, L)>,
        M: Into<String>,
        L: Into<CompactString>,
    {
        Self {
            default_label: default_label.into(),
            mounts: mounts
                .into_iter()
                .map(|(m, l)| (m.into(), l.into()))
                .collect(),
        }
    }

    /// Build the table from the system's `df -P` listing.
    pub fn from_system() -> Result<Self, ScanError> {
        let output = Command::new("df")
            .arg("-P")
            .output()
            .map_err(|e| ScanError::MountListing {
                message: e.to_string(),
            })?;

        // df exits non-zero when a single mount is unreadable but still lists the rest.
        if output.stdout.is_empty() {
            return Err(ScanError::MountListing {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse `df -P` output. The header line is skipped; the first column is
    /// the device label and the last column the mount point.
    pub fn parse(listing: &str) -> Result<Self, ScanError> {
        let mut default_label = None;
        let mut mounts = IndexMap::new();

        for line in listing.lines().skip(1) {
            let columns: Vec<&str> = line.split_whitespace().collect();
            let (Some(device), Some(mount_point)) = (columns.first(), columns.last()) else {
                continue;
            };

            if *mount_point == "/" {
                default_label = Some(CompactString::from(*device));
            } else {
                mounts.insert((*mount_point).to_string(), CompactString::from(*device));
            }
        }

        let default_label = default_label.ok_or(ScanError::NoRootDevice)?;
        Ok(Self {
            default_label,
            mounts,
        })
    }

    /// Label of the device mounted at `/`.
    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Number of non-root mount points.
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    /// Check if only the root mount is known.
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Device label for a path.
    ///
    /// Returns the label of the first stored mount point, in table order, that
    /// is a string prefix of `path`; falls back to the root label. This is a
    /// plain prefix test, not a longest-prefix or component-aware match.
    pub fn label_for(&self, path: &Path) -> &str {
        let bytes = path.as_os_str().as_encoded_bytes();
        let label = self
            .mounts
            .iter()
            .find(|(mount_point, _)| bytes.starts_with(mount_point.as_bytes()))
            .map(|(_, label)| label.as_str())
            .unwrap_or(self.default_label.as_str());

        tracing::debug!("Directory {} is on device {label}", path.display());
        label
    }
}
