//! Percent-encoding for names and paths written to cache files.

use std::ffi::OsStr;
use std::fmt::Write;

/// Returns true for bytes that are written as-is.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-' | b'/')
}

/// Percent-encode raw bytes. Every byte outside `[A-Za-z0-9_.-/]` becomes `%XX`.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Escape a single path component.
pub fn escape_name(name: &OsStr) -> String {
    escape_bytes(name.as_encoded_bytes())
}

/// Escape a full path, collapsing doubled separators first.
///
/// Each non-overlapping `//` pair becomes a single `/`, scanning left to
/// right, so `///` collapses to `//`.
pub fn escape_path(path: &OsStr) -> String {
    escape_bytes(&collapse_separators(path.as_encoded_bytes()))
}

fn collapse_separators(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'/') {
            out.push(b'/');
            i += 2;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}
