//! Push-style pipeline for stream encoding
//!
//! Encoders are chained sinks: each `write` may emit zero or more bytes to
//! the downstream pipeline immediately, and `finish` flushes pending state,
//! writes the stage's end marker, and then finalizes the downstream stage.
//! Whether a sink participates in finalize propagation is fixed by its type
//! when the chain is composed; there is no runtime inspection.

use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// A boxed pipeline stage for ownership and chaining
pub type PipelineBox = Box<dyn Pipeline + Send>;

/// Pipeline stage: processes data and forwards it downstream
pub trait Pipeline {
    /// Write data into this stage
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush pending state, write the end marker if any, then finalize
    /// the downstream stage
    fn finish(&mut self) -> Result<()>;
}

#[derive(Default)]
struct SinkState {
    data: Vec<u8>,
    ready: bool,
}

/// Terminal sink that collects everything written to it
///
/// The collected bytes are read through a [`SinkHandle`], which stays valid
/// after the chain that owned the sink has been consumed.
pub struct BufferSink {
    state: Arc<Mutex<SinkState>>,
}

/// Shared read handle to a [`BufferSink`]'s collected output
pub struct SinkHandle {
    state: Arc<Mutex<SinkState>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                data: Vec::new(),
                ready: true,
            })),
        }
    }

    /// Handle for retrieving the output once the chain has finished
    pub fn handle(&self) -> SinkHandle {
        SinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for BufferSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline for BufferSink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::argument("buffer sink poisoned"))?;
        state.data.extend_from_slice(data);
        state.ready = false;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::argument("buffer sink poisoned"))?;
        state.ready = true;
        Ok(())
    }
}

impl SinkHandle {
    /// Take the collected bytes; errors if the chain was never finished
    pub fn take(&self) -> Result<Vec<u8>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::argument("buffer sink poisoned"))?;
        if !state.ready {
            return Err(Error::argument(
                "sink read before the pipeline was finished",
            ));
        }
        Ok(std::mem::take(&mut state.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_collects() {
        let sink = BufferSink::new();
        let handle = sink.handle();
        let mut p: PipelineBox = Box::new(sink);
        p.write(b"Hello, ").unwrap();
        p.write(b"World!").unwrap();
        p.finish().unwrap();
        assert_eq!(handle.take().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_take_before_finish_fails() {
        let sink = BufferSink::new();
        let handle = sink.handle();
        let mut p: PipelineBox = Box::new(sink);
        p.write(b"pending").unwrap();
        assert!(handle.take().is_err());
        p.finish().unwrap();
        assert_eq!(handle.take().unwrap(), b"pending");
    }

    #[test]
    fn test_empty_sink_is_ready() {
        let sink = BufferSink::new();
        let handle = sink.handle();
        drop(sink);
        assert_eq!(handle.take().unwrap(), Vec::<u8>::new());
    }
}
