//! Cache file output, plain or gzip-compressed.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use dirstat_core::ScanError;

/// Open cache file.
pub enum CacheSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl CacheSink {
    /// Create (or truncate) the cache file.
    pub fn create(path: &Path, compress: bool) -> Result<Self, ScanError> {
        let file = File::create(path).map_err(|e| ScanError::io(path, e))?;
        let out = BufWriter::new(file);
        Ok(if compress {
            Self::Gzip(GzEncoder::new(out, Compression::default()))
        } else {
            Self::Plain(out)
        })
    }

    /// Flush buffered output and write the gzip trailer if any.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut out) => out.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for CacheSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(out) => out.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(out) => out.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}
