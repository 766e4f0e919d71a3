//! Resolved, immutable scan targets.

use std::path::PathBuf;

use compact_str::CompactString;

use crate::config::TargetConfig;
use crate::error::ScanError;
use crate::exclude::ExclusionFilter;
use crate::metadata::PathMetadata;
use crate::mount::MountTable;

/// A scan job ready to run: root validated, root device resolved.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    /// Absolute root directory.
    pub root: PathBuf,
    /// Cache file to write.
    pub cache: PathBuf,
    /// Descend into directories on other filesystems.
    pub scan_mounted: bool,
    /// Write full paths for plain files.
    pub long_format: bool,
    /// Gzip the cache file.
    pub compress: bool,
    /// Entries to leave out.
    pub exclude: ExclusionFilter,
    /// Device ID of the root directory.
    pub root_device: u64,
    /// Device label of the root directory.
    pub root_label: CompactString,
}

impl ScanTarget {
    /// Validate a config against the filesystem and the mount table.
    ///
    /// Configs built without the builder (JSON, struct literals) are checked
    /// here for an empty root or cache path.
    pub fn resolve(config: &TargetConfig, mounts: &MountTable) -> Result<Self, ScanError> {
        if config.root.as_os_str().is_empty() {
            return Err(ScanError::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            });
        }
        if config.cache.as_os_str().is_empty() {
            return Err(ScanError::InvalidConfig {
                message: format!("Cache file name cannot be empty for {}", config.root.display()),
            });
        }

        let root = std::path::absolute(&config.root).map_err(|e| ScanError::io(&config.root, e))?;
        let cache = std::path::absolute(&config.cache).map_err(|e| ScanError::io(&config.cache, e))?;

        let meta = PathMetadata::capture_path(&root);
        let Some(stat) = meta.stat() else {
            return Err(ScanError::NotFound { path: root });
        };
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let root_label = CompactString::from(mounts.label_for(&root));

        Ok(Self {
            cache,
            scan_mounted: config.scan_mounted,
            long_format: config.long_format,
            compress: config.should_compress(),
            exclude: ExclusionFilter::new(config.exclude.iter().cloned()),
            root_device: stat.device,
            root_label,
            root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mounts() -> MountTable {
        MountTable::new("/dev/root", Vec::<(String, String)>::new())
    }

    #[test]
    fn test_resolve_directory() {
        let temp = TempDir::new().unwrap();
        let config = TargetConfig::builder()
            .root(temp.path())
            .cache(temp.path().join("out.cache"))
            .exclude(vec!["x".to_string(), "x".to_string()])
            .build()
            .unwrap();

        let target = ScanTarget::resolve(&config, &mounts()).unwrap();
        assert_eq!(target.root, temp.path());
        assert_eq!(target.root_label, "/dev/root");
        assert!(!target.compress);
        assert_eq!(target.exclude.len(), 1);
    }

    #[test]
    fn test_resolve_missing_root() {
        let temp = TempDir::new().unwrap();
        let config = TargetConfig::new(temp.path().join("nope"));
        assert!(matches!(
            ScanTarget::resolve(&config, &mounts()),
            Err(ScanError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_empty_cache() {
        let temp = TempDir::new().unwrap();
        let mut config = TargetConfig::new(temp.path());
        config.cache = PathBuf::new();
        assert!(matches!(
            ScanTarget::resolve(&config, &mounts()),
            Err(ScanError::InvalidConfig { .. })
        ));

        config.root = PathBuf::new();
        config.cache = temp.path().join("out.cache");
        assert!(matches!(
            ScanTarget::resolve(&config, &mounts()),
            Err(ScanError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_resolve_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            ScanTarget::resolve(&TargetConfig::new(&file), &mounts()),
            Err(ScanError::NotADirectory { .. })
        ));
    }
}
