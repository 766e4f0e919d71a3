//! Scan target configuration and the JSON configuration file.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Cache file name used when none is given.
pub const DEFAULT_CACHE_FILE_NAME: &str = ".qdirstat.cache.gz";

/// Configuration for one scan job.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TargetConfig {
    /// Directory to scan.
    pub root: PathBuf,

    /// Cache file to write.
    pub cache: PathBuf,

    /// Descend into directories on other filesystems.
    #[builder(default = "false")]
    #[serde(default)]
    pub scan_mounted: bool,

    /// Write the full path for plain files, not only the name.
    #[builder(default = "false")]
    #[serde(default)]
    pub long_format: bool,

    /// Gzip the cache file. `None` means: compress when the cache file ends in `.gz`.
    #[builder(default)]
    #[serde(default)]
    pub compress: Option<bool>,

    /// Paths or path suffixes to leave out.
    #[builder(default)]
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TargetConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        match self.cache {
            Some(ref cache) if cache.as_os_str().is_empty() => {
                Err("Cache file name cannot be empty".to_string())
            }
            None => Err("Cache file name is required".to_string()),
            _ => Ok(()),
        }
    }
}

impl TargetConfig {
    /// Create a new target config builder.
    pub fn builder() -> TargetConfigBuilder {
        TargetConfigBuilder::default()
    }

    /// Create a simple config writing the default cache file inside `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cache: root.join(DEFAULT_CACHE_FILE_NAME),
            root,
            scan_mounted: false,
            long_format: false,
            compress: None,
            exclude: Vec::new(),
        }
    }

    /// Whether the cache file should be gzipped.
    pub fn should_compress(&self) -> bool {
        self.compress
            .unwrap_or_else(|| self.cache.extension().is_some_and(|ext| ext == "gz"))
    }
}

/// Global options of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOptions {
    #[serde(default)]
    pub long_format: bool,
    #[serde(default)]
    pub scan_mounted: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub debug: bool,
}

/// One `index_directories` entry. Missing fields are reported, not fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDirectory {
    #[serde(default)]
    pub index: Option<PathBuf>,
    #[serde(default)]
    pub cache: Option<PathBuf>,
    /// `None` leaves the choice to the cache file extension.
    #[serde(default)]
    pub compress: Option<bool>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// JSON configuration file listing several scan targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub options: ConfigOptions,
    #[serde(default)]
    pub global_exclude: Vec<String>,
    #[serde(default)]
    pub index_directories: Vec<IndexDirectory>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Parse configuration text; `path` is used for error messages.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.index_directories.is_empty() {
            return Err(ConfigError::NoIndexDirectories {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// Resolve the entries into target configs.
    ///
    /// Entries without `index` or `cache` are skipped with a warning. Global
    /// exclusions are merged into every target.
    pub fn targets(&self, path: &Path) -> Result<Vec<TargetConfig>, ConfigError> {
        let mut targets = Vec::with_capacity(self.index_directories.len());

        for (i, item) in self.index_directories.iter().enumerate() {
            let n = i + 1;
            let Some(root) = item.index.clone() else {
                tracing::warn!("Missing `index` top level directory for directory config item {n}, skipping");
                continue;
            };
            let Some(cache) = item.cache.clone() else {
                tracing::warn!("Missing `cache` file name for directory config item {n}, skipping");
                continue;
            };

            let mut exclude = item.exclude.clone();
            exclude.extend(self.global_exclude.iter().cloned());

            targets.push(TargetConfig {
                root,
                cache,
                scan_mounted: self.options.scan_mounted,
                long_format: self.options.long_format,
                compress: item.compress,
                exclude,
            });
        }

        if targets.is_empty() {
            return Err(ConfigError::NoValidTargets {
                path: path.to_path_buf(),
            });
        }
        Ok(targets)
    }
}
