//! QDirStat cache file serializer.

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use dirstat_core::{PathMetadata, Stat};

use crate::walker::WalkEvent;

/// Fixed banner at the top of every cache file.
pub const HEADER: &str = "\
[qdirstat 1.0 cache file]
# Generated by dirstat
# Do not edit!
#
# Type  path            size    mtime           <optional fields>


";

/// Writes walk events in the cache file line format.
pub struct CacheWriter<W: Write> {
    out: W,
    long_format: bool,
    started: Instant,
}

impl<W: Write> CacheWriter<W> {
    /// Write the header and start the elapsed-time clock.
    pub fn begin(mut out: W, long_format: bool) -> io::Result<Self> {
        let started = Instant::now();
        out.write_all(HEADER.as_bytes())?;
        Ok(Self {
            out,
            long_format,
            started,
        })
    }

    /// Write the lines for one event.
    pub fn emit(&mut self, event: &WalkEvent) -> io::Result<()> {
        match event {
            WalkEvent::Directory(meta) => self.write_directory(meta),
            WalkEvent::Device(label) => write!(self.out, "# Device: {label}\n\n"),
            WalkEvent::Boundary {
                path,
                label,
                labels_differ: true,
            } => {
                self.write_comment("Filesystem boundary at mount point ", path)?;
                write!(self.out, " on device {label}\n\n")
            }
            WalkEvent::Boundary { path, label, .. } => {
                self.write_comment("Mount point ", path)?;
                write!(self.out, " is still on the same device {label}\n\n")
            }
            WalkEvent::Unreadable { path, kind } => {
                self.write_comment("Can't open ", path)?;
                writeln!(self.out, ": {kind}")
            }
            WalkEvent::Entry(meta) => self.write_entry(meta),
        }
    }

    /// Write the elapsed-time footer, flush, and hand back the output.
    pub fn finish(mut self) -> io::Result<W> {
        writeln!(
            self.out,
            "# Elapsed time: {}",
            format_elapsed(self.started.elapsed())
        )?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Start a comment line; the path goes out as raw bytes, unescaped.
    fn write_comment(&mut self, text: &str, path: &Path) -> io::Result<()> {
        write!(self.out, "# {text}")?;
        self.out.write_all(path.as_os_str().as_encoded_bytes())
    }

    fn write_directory(&mut self, meta: &PathMetadata) -> io::Result<()> {
        let Some(stat) = meta.stat() else {
            return Ok(());
        };
        writeln!(
            self.out,
            "D {}\t{}\t0x{}",
            meta.escaped_path(),
            stat.size,
            format_mtime(stat.mtime)
        )
    }

    fn write_entry(&mut self, meta: &PathMetadata) -> io::Result<()> {
        let Some(stat) = meta.stat() else {
            return Ok(());
        };
        let name = if self.long_format {
            format!(" {}", meta.escaped_path())
        } else {
            format!("\t{}", meta.escaped_name())
        };
        writeln!(
            self.out,
            "{}{name}\t{}\t0x{}{}",
            stat.entry_type(),
            stat.size,
            format_mtime(stat.mtime),
            optional_fields(stat)
        )
    }
}

/// Trailing block and link count fields.
fn optional_fields(stat: &Stat) -> String {
    let mut fields = String::new();
    if stat.is_sparse() {
        fields.push_str(&format!("\t{}", stat.blocks));
    }
    if stat.links > 0 {
        fields.push_str(&format!("\t{}", stat.links));
    }
    fields
}

/// Lowercase hex of a modification time. Negative times keep their sign after
/// the `0x` prefix, e.g. `0x-1`.
pub fn format_mtime(mtime: i64) -> String {
    if mtime < 0 {
        format!("-{:x}", mtime.unsigned_abs())
    } else {
        format!("{mtime:x}")
    }
}

/// Format a duration as `H:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const REG_MODE: u32 = 0o100_644;
    const DIR_MODE: u32 = 0o040_755;

    fn stat(mode: u32, size: u64, blocks: u64, links: u64) -> Stat {
        Stat {
            device: 1,
            size,
            mtime: 0x5f00_0000,
            mode,
            blocks,
            links,
        }
    }

    fn render(long_format: bool, events: &[WalkEvent]) -> String {
        let mut writer = CacheWriter::begin(Vec::new(), long_format).unwrap();
        for event in events {
            writer.emit(event).unwrap();
        }
        let out = writer.finish().unwrap();
        String::from_utf8(out).unwrap()
    }

    fn body(rendered: &str) -> &str {
        let rest = rendered.strip_prefix(HEADER).unwrap();
        &rest[..rest.rfind("# Elapsed time:").unwrap()]
    }

    #[test]
    fn test_header_and_footer() {
        let out = render(false, &[]);
        assert!(out.starts_with("[qdirstat 1.0 cache file]\n"));
        assert!(out.ends_with("# Elapsed time: 0:00:00\n"));
    }

    #[test]
    fn test_directory_and_device_lines() {
        let dir = PathMetadata::from_parts("/data//sub dir", "sub dir", Some(stat(DIR_MODE, 4096, 8, 2)));
        let out = render(false, &[WalkEvent::Directory(dir), WalkEvent::Device("/dev/sda1".into())]);
        assert_eq!(
            body(&out),
            "D /data/sub%20dir\t4096\t0x5f000000\n# Device: /dev/sda1\n\n"
        );
    }

    #[test]
    fn test_file_entry_short_format() {
        let file = PathMetadata::from_parts("/data/a.txt", "a.txt", Some(stat(REG_MODE, 10, 0, 1)));
        let out = render(false, &[WalkEvent::Entry(file)]);
        assert_eq!(body(&out), "F\ta.txt\t10\t0x5f000000\t1\n");
    }

    #[test]
    fn test_file_entry_long_format() {
        let file = PathMetadata::from_parts("/data/a b", "a b", Some(stat(REG_MODE, 10, 0, 1)));
        let out = render(true, &[WalkEvent::Entry(file)]);
        assert_eq!(body(&out), "F /data/a%20b\t10\t0x5f000000\t1\n");
    }

    #[test]
    fn test_sparse_block_field() {
        let sparse = PathMetadata::from_parts("/d/s", "s", Some(stat(REG_MODE, 1_000_000, 8, 1)));
        let dense = PathMetadata::from_parts("/d/t", "t", Some(stat(REG_MODE, 1000, 8, 1)));
        let out = render(false, &[WalkEvent::Entry(sparse), WalkEvent::Entry(dense)]);
        assert_eq!(
            body(&out),
            "F\ts\t1000000\t0x5f000000\t8\t1\nF\tt\t1000\t0x5f000000\t1\n"
        );
    }

    #[test]
    fn test_zero_links_omitted() {
        let file = PathMetadata::from_parts("/d/x", "x", Some(stat(REG_MODE, 5, 0, 0)));
        let out = render(false, &[WalkEvent::Entry(file)]);
        assert_eq!(body(&out), "F\tx\t5\t0x5f000000\n");
    }

    #[test]
    fn test_special_file_tags() {
        let link = PathMetadata::from_parts("/d/l", "l", Some(stat(0o120_777, 3, 0, 1)));
        let fifo = PathMetadata::from_parts("/d/p", "p", Some(stat(0o010_644, 0, 0, 1)));
        let out = render(false, &[WalkEvent::Entry(link), WalkEvent::Entry(fifo)]);
        assert_eq!(body(&out), "L\tl\t3\t0x5f000000\t1\nFIFO\tp\t0\t0x5f000000\t1\n");
    }

    #[test]
    fn test_boundary_and_error_comments() {
        let out = render(
            false,
            &[
                WalkEvent::Boundary {
                    path: PathBuf::from("/mnt/usb"),
                    label: "/dev/sdb1".into(),
                    labels_differ: true,
                },
                WalkEvent::Boundary {
                    path: PathBuf::from("/mnt/bind"),
                    label: "/dev/sda1".into(),
                    labels_differ: false,
                },
                WalkEvent::Unreadable {
                    path: PathBuf::from("/root"),
                    kind: io::ErrorKind::PermissionDenied,
                },
            ],
        );
        assert_eq!(
            body(&out),
            "# Filesystem boundary at mount point /mnt/usb on device /dev/sdb1\n\n\
             # Mount point /mnt/bind is still on the same device /dev/sda1\n\n\
             # Can't open /root: permission denied\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_comment_paths_keep_raw_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(OsStr::from_bytes(b"/mnt/caf\xe9"));
        let mut writer = CacheWriter::begin(Vec::new(), false).unwrap();
        writer
            .emit(&WalkEvent::Unreadable {
                path,
                kind: io::ErrorKind::NotFound,
            })
            .unwrap();
        let out = writer.finish().unwrap();

        let expected: &[u8] = b"# Can't open /mnt/caf\xe9: entity not found\n";
        assert!(out.windows(expected.len()).any(|w| w == expected));
    }

    #[test]
    fn test_format_mtime() {
        assert_eq!(format_mtime(255), "ff");
        assert_eq!(format_mtime(0), "0");
        assert_eq!(format_mtime(-1), "-1");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(90_000)), "25:00:00");
    }
}
