//! Stream content storage
//!
//! Content destined for a stream object accumulates here before the filter
//! chain runs. Small content stays in memory; once it crosses the spool
//! threshold it transparently moves to an unnamed temporary file. Filters
//! and the serializer only ever see the same append/read interface.

use crate::error::Result;
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;

/// Default spill threshold: 2 MiB in memory before moving to disk
pub const DEFAULT_SPOOL_THRESHOLD: usize = 2 * 1024 * 1024;

/// Growable byte storage with transparent spill-to-disk
pub struct StreamBuffer {
    inner: SpooledTempFile,
    len: usize,
}

impl StreamBuffer {
    /// Create an empty buffer with the default spool threshold
    pub fn new() -> Self {
        Self::with_spool_threshold(DEFAULT_SPOOL_THRESHOLD)
    }

    /// Create an empty buffer that spills to a temp file past `threshold` bytes
    pub fn with_spool_threshold(threshold: usize) -> Self {
        Self {
            inner: SpooledTempFile::new(threshold),
            len: 0,
        }
    }

    /// Append bytes at the end of the buffer
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.len += data.len();
        Ok(())
    }

    /// Number of bytes stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the content has moved out of memory into a temp file
    pub fn is_spilled(&self) -> bool {
        self.inner.is_rolled()
    }

    /// Read the full contents back out
    ///
    /// The write position is restored afterwards, so appending may continue.
    pub fn to_vec(&mut self) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(0))?;
        let mut out = Vec::with_capacity(self.len);
        self.inner.read_to_end(&mut out)?;
        self.inner.seek(SeekFrom::End(0))?;
        Ok(out)
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("len", &self.len)
            .field("spilled", &self.is_spilled())
            .finish()
    }
}
