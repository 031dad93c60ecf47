//! Carrier traits for trace context propagation.
//!
//! A carrier adapts a transport's native attribute container to the two
//! operations a [`Tracer`](crate::Tracer) needs:
//!
//! - [`TextMapWriter::set`] stores a string value under a string key
//! - [`TextMapReader::for_each_string_entry`] visits every string-valued entry
//!
//! Carriers borrow the container of a single message and live only for the
//! duration of one inject or extract call. Extraction-only carriers implement
//! [`TextMapReader`] alone.

use crate::error::Result;
use std::collections::HashMap;

/// Propagation formats understood by a [`Tracer`](crate::Tracer).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Flat string-to-string map.
    TextMap,
}

/// Visitor invoked for each string entry of a carrier.
///
/// Returning an error stops enumeration and the error is propagated.
pub type EntryVisitor<'v> = dyn FnMut(&str, &str) -> Result<()> + 'v;

/// Read side of a carrier.
pub trait TextMapReader {
    /// Calls `visitor` for every entry whose value is a string.
    ///
    /// Entries holding other kinds of value are skipped silently. Enumeration
    /// order is unspecified.
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()>;
}

/// Write side of a carrier.
pub trait TextMapWriter {
    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: std::hash::BuildHasher> TextMapReader for HashMap<String, String, S> {
    fn for_each_string_entry(&self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for (key, value) in self {
            visitor(key, value)?;
        }
        Ok(())
    }
}

impl<S: std::hash::BuildHasher> TextMapWriter for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Collects every string entry of a carrier into an owned map.
pub(crate) fn collect_entries(carrier: &dyn TextMapReader) -> Result<HashMap<String, String>> {
    let mut entries = HashMap::new();
    carrier.for_each_string_entry(&mut |key, value| {
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    })?;
    Ok(entries)
}
