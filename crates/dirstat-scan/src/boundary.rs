//! Filesystem boundary decisions.

use compact_str::CompactString;

/// What to do with a directory, judged by the device it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryDecision {
    /// Same device as the scan root; descend.
    SameDevice,
    /// Different device, but the target crosses mounts; descend.
    CrossMountAllowed,
    /// Different device, stopping is up to the label comparison.
    MountPoint {
        /// Label resolved for the directory.
        label: CompactString,
        /// Whether the label differs from the root's label.
        labels_differ: bool,
    },
}

impl BoundaryDecision {
    /// Decide how to treat a directory.
    ///
    /// `label` is only called when the device IDs differ and crossing mounts
    /// is not allowed.
    pub fn decide<'a>(
        root_device: u64,
        root_label: &str,
        device: u64,
        scan_mounted: bool,
        label: impl FnOnce() -> &'a str,
    ) -> Self {
        if device == root_device {
            return Self::SameDevice;
        }
        if scan_mounted {
            return Self::CrossMountAllowed;
        }
        let label = label();
        Self::MountPoint {
            labels_differ: label != root_label,
            label: CompactString::from(label),
        }
    }

    /// Whether the walker lists this directory's children.
    ///
    /// A mount point whose label matches the root's is not descended; one with
    /// a different label is.
    pub fn descends(&self) -> bool {
        match self {
            Self::SameDevice | Self::CrossMountAllowed => true,
            Self::MountPoint { labels_differ, .. } => *labels_differ,
        }
    }

    /// Whether a boundary notice is written for this directory.
    pub fn needs_notice(&self) -> bool {
        matches!(self, Self::MountPoint { .. })
    }
}
