//! Per-target cache file generation.

use std::io::Write;
use std::time::Instant;

use dirstat_core::{MountTable, ScanError, ScanReport, ScanTarget};

use crate::cache::CacheWriter;
use crate::sink::CacheSink;
use crate::walker::TreeWalk;

/// Writes cache files for scan targets against one shared mount table.
pub struct CacheScanner<'m> {
    mounts: &'m MountTable,
}

impl<'m> CacheScanner<'m> {
    /// Create a new scanner.
    pub fn new(mounts: &'m MountTable) -> Self {
        Self { mounts }
    }

    /// Walk the target and write its cache file.
    ///
    /// The cache file is only created once the root has been validated, and
    /// is closed before this returns.
    pub fn scan(&self, target: &ScanTarget) -> Result<ScanReport, ScanError> {
        let walk = TreeWalk::new(target, self.mounts)?;
        let sink = CacheSink::create(&target.cache, target.compress)?;

        tracing::info!(
            "Writing {} for {}",
            target.cache.display(),
            target.root.display()
        );

        let (report, sink) = self.write(target, walk, sink)?;
        sink.finish().map_err(|e| ScanError::io(&target.cache, e))?;
        Ok(report)
    }

    /// Walk the target, writing the cache document to `out` instead of the
    /// target's cache file.
    pub fn scan_into<W: Write>(&self, target: &ScanTarget, out: W) -> Result<(ScanReport, W), ScanError> {
        let walk = TreeWalk::new(target, self.mounts)?;
        self.write(target, walk, out)
    }

    fn write<W: Write>(
        &self,
        target: &ScanTarget,
        mut walk: TreeWalk<'_>,
        out: W,
    ) -> Result<(ScanReport, W), ScanError> {
        let start = Instant::now();
        let io_err = |e: std::io::Error| ScanError::io(&target.cache, e);

        let mut writer = CacheWriter::begin(out, target.long_format).map_err(io_err)?;
        for event in walk.by_ref() {
            writer.emit(&event).map_err(io_err)?;
        }
        let out = writer.finish().map_err(io_err)?;

        let (stats, warnings) = walk.into_parts();
        tracing::info!(
            "Finished {}: {} directories, {} entries, {} skipped, {} mount points",
            target.root.display(),
            stats.directories,
            stats.files,
            stats.skipped(),
            stats.mount_points
        );

        let report = ScanReport::new(
            target.root.clone(),
            target.cache.clone(),
            stats,
            start.elapsed(),
            warnings,
        );
        Ok((report, out))
    }
}
