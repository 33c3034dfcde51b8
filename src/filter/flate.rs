//! Flate (zlib) stage
//!
//! Unlike the byte-oriented codecs, deflate needs the whole input to
//! produce a sensible result, so this stage buffers everything written to
//! it and runs the compressor when the chain finalizes.

use super::pipeline::{Pipeline, PipelineBox};
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Default compression level
const DEFAULT_LEVEL: u32 = 6;
/// Output chunk size while draining the compressor
const OUT_BUFSIZE: usize = 65536;

/// Streaming Flate encoder stage
pub struct FlateEncoder {
    next: PipelineBox,
    level: u32,
    buffer: Vec<u8>,
}

impl FlateEncoder {
    pub fn new(next: PipelineBox) -> Self {
        Self {
            next,
            level: DEFAULT_LEVEL,
            buffer: Vec::new(),
        }
    }

    /// Set the compression level (0-9)
    pub fn set_compression_level(&mut self, level: u32) {
        self.level = level.min(9);
    }

    fn process(&mut self) -> Result<()> {
        let mut encoder = ZlibEncoder::new(&self.buffer[..], Compression::new(self.level));
        let mut output = vec![0u8; OUT_BUFSIZE];
        loop {
            let n = encoder
                .read(&mut output)
                .map_err(|e| Error::format(format!("Flate deflate error: {}", e)))?;
            if n == 0 {
                break;
            }
            self.next.write(&output[..n])?;
        }
        Ok(())
    }
}

impl Pipeline for FlateEncoder {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.process()?;
        self.buffer.clear();
        self.next.finish()
    }
}

/// Decode zlib data, the inverse of [`FlateEncoder`]
pub fn decode_flate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| Error::format(format!("Flate inflate error: {}", e)))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::pipeline::BufferSink;

    fn encode(data: &[u8]) -> Vec<u8> {
        let sink = BufferSink::new();
        let handle = sink.handle();
        let mut enc = FlateEncoder::new(Box::new(sink));
        enc.write(data).unwrap();
        enc.finish().unwrap();
        handle.take().unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let data = b"Hello, Flate! Hello, Flate! Hello, Flate!";
        let encoded = encode(data);
        assert_eq!(decode_flate(&encoded).unwrap(), data);
    }

    #[test]
    fn test_empty_roundtrip() {
        let encoded = encode(&[]);
        assert!(!encoded.is_empty()); // zlib header + empty block
        assert_eq!(decode_flate(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_compresses_repetition() {
        let data = vec![b'x'; 4096];
        let encoded = encode(&data);
        assert!(encoded.len() < data.len() / 4);
        assert_eq!(decode_flate(&encoded).unwrap(), data);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_flate(b"not zlib data").is_err());
    }
}
