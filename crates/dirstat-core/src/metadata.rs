//! Point-in-time metadata snapshots for filesystem entries.

use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::escape::{escape_name, escape_path};

// File type bits of `st_mode`.
const S_IFMT: u32 = 0o170_000;
const S_IFSOCK: u32 = 0o140_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFREG: u32 = 0o100_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFIFO: u32 = 0o010_000;

/// Type of a filesystem entry. The display form is the cache file type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
pub enum EntryType {
    #[strum(serialize = "F")]
    File,
    #[strum(serialize = "L")]
    Symlink,
    #[strum(serialize = "D")]
    Directory,
    #[strum(serialize = "BlockDev")]
    BlockDevice,
    #[strum(serialize = "CharDev")]
    CharDevice,
    #[strum(serialize = "FIFO")]
    Fifo,
    #[strum(serialize = "Socket")]
    Socket,
}

impl EntryType {
    /// Classify raw `st_mode` bits.
    ///
    /// Bit patterns that match no known type are classified as regular files.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => Self::File,
            S_IFLNK => Self::Symlink,
            S_IFDIR => Self::Directory,
            S_IFBLK => Self::BlockDevice,
            S_IFCHR => Self::CharDevice,
            S_IFIFO => Self::Fifo,
            S_IFSOCK => Self::Socket,
            _ => Self::File,
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Attributes taken from a single `lstat` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Device ID of the filesystem holding the entry.
    pub device: u64,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in whole seconds, truncated toward zero.
    pub mtime: i64,
    /// Raw permission and type bits.
    pub mode: u32,
    /// Number of 512-byte blocks allocated.
    pub blocks: u64,
    /// Number of hard links.
    pub links: u64,
}

impl Stat {
    /// Extract the attributes from OS metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            device: get_dev(metadata),
            size: metadata.len(),
            mtime: get_mtime(metadata),
            mode: get_mode(metadata),
            blocks: get_blocks(metadata),
            links: get_nlink(metadata),
        }
    }

    /// Classify the entry.
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_mode(self.mode)
    }

    /// True when fewer bytes are allocated than the logical size.
    pub fn is_sparse(&self) -> bool {
        self.blocks > 0 && u128::from(self.blocks) * 512 < u128::from(self.size)
    }
}

/// Snapshot of one filesystem entry.
///
/// A failed `lstat` yields a snapshot with no [`Stat`]; callers check
/// [`PathMetadata::exists`] before trusting any attribute.
#[derive(Debug, Clone)]
pub struct PathMetadata {
    path: PathBuf,
    name: OsString,
    stat: Option<Stat>,
}

impl PathMetadata {
    /// Capture metadata for `parent/name` without following symlinks.
    ///
    /// Failures are logged and produce a non-existent snapshot.
    pub fn capture(parent: &Path, name: &OsStr) -> Self {
        Self::from_lstat(parent.join(name), name.to_os_string())
    }

    /// Capture metadata for a path given as a whole, such as a scan root.
    pub fn capture_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        Self::from_lstat(path, name)
    }

    fn from_lstat(path: PathBuf, name: OsString) -> Self {
        let stat = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => Some(Stat::from_metadata(&metadata)),
            Err(err) => {
                tracing::warn!("lstat() failed for {}: {err}", path.display());
                None
            }
        };
        Self { path, name, stat }
    }

    /// Build a snapshot from already-known parts.
    pub fn from_parts(path: impl Into<PathBuf>, name: impl Into<OsString>, stat: Option<Stat>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            stat,
        }
    }

    /// Full path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the entry.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Whether the metadata call succeeded.
    pub fn exists(&self) -> bool {
        self.stat.is_some()
    }

    /// Raw attributes, if the metadata call succeeded.
    pub fn stat(&self) -> Option<&Stat> {
        self.stat.as_ref()
    }

    /// Entry type, if known.
    pub fn entry_type(&self) -> Option<EntryType> {
        self.stat.map(|s| s.entry_type())
    }

    /// Check if this entry exists and is a directory.
    pub fn is_dir(&self) -> bool {
        self.entry_type().is_some_and(|t| t.is_dir())
    }

    /// Device ID, if known.
    pub fn device(&self) -> Option<u64> {
        self.stat.map(|s| s.device)
    }

    /// Percent-encoded path with doubled separators collapsed.
    pub fn escaped_path(&self) -> String {
        escape_path(self.path.as_os_str())
    }

    /// Percent-encoded base name.
    pub fn escaped_name(&self) -> String {
        escape_name(&self.name)
    }
}

// Cross-platform metadata helpers

/// Get the device ID from metadata.
#[cfg(unix)]
fn get_dev(metadata: &Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
fn get_dev(_metadata: &Metadata) -> u64 {
    0
}

/// Get the modification time in seconds, truncated toward zero.
#[cfg(unix)]
fn get_mtime(metadata: &Metadata) -> i64 {
    let secs = metadata.mtime();
    if secs < 0 && metadata.mtime_nsec() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(not(unix))]
fn get_mtime(metadata: &Metadata) -> i64 {
    use std::time::UNIX_EPOCH;
    match metadata.modified() {
        Ok(t) => match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        },
        Err(_) => 0,
    }
}

/// Get the raw mode bits from metadata.
#[cfg(unix)]
fn get_mode(metadata: &Metadata) -> u32 {
    metadata.mode()
}

#[cfg(not(unix))]
fn get_mode(metadata: &Metadata) -> u32 {
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        S_IFDIR
    } else if file_type.is_symlink() {
        S_IFLNK
    } else {
        S_IFREG
    }
}

/// Get the number of 512-byte blocks from metadata.
#[cfg(unix)]
fn get_blocks(metadata: &Metadata) -> u64 {
    metadata.blocks()
}

#[cfg(not(unix))]
fn get_blocks(metadata: &Metadata) -> u64 {
    metadata.len().div_ceil(512)
}

/// Get the number of hard links from metadata.
#[cfg(unix)]
fn get_nlink(metadata: &Metadata) -> u64 {
    metadata.nlink()
}

#[cfg(not(unix))]
fn get_nlink(_metadata: &Metadata) -> u64 {
    1
}
