//! Flat-file JSON artifact helpers.
//!
//! Intermediate artifacts (search parameters, raw listings, normalized
//! records) and the metadata cache are pretty-printed UTF-8 JSON files,
//! overwritten on each run. Writes go through a temp file followed by a
//! rename so a concurrent reader never observes a half-written file.

use std::io;
use std::path::Path;

use serde::Serialize;

/// Write `value` as pretty-printed JSON, atomically replacing `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text.as_bytes())?;
    std::fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), bytes = text.len(), "artifact written");
    Ok(())
}

/// Read a JSON file into a value, if it exists and parses.
///
/// A missing or corrupt file reads as `None`; callers treat either as a
/// cache miss.
pub fn read_json_lenient(path: &Path) -> Option<serde_json::Value> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}
