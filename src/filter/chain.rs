//! Filter chain assembly
//!
//! A chain holds filters in the order they were attached, which is also the
//! order they transform the raw content. `encode` wires the stages back to
//! front so that writing raw bytes into the head runs every filter in turn,
//! and finalizing the head finalizes every stage down to the sink.

use super::pipeline::{BufferSink, PipelineBox};
use super::{
    Ascii85Encoder, AsciiHexEncoder, FilterType, FlateEncoder, RunLengthEncoder, decode_ascii85,
    decode_ascii_hex, decode_flate, decode_run_length,
};
use crate::error::Result;
use smallvec::SmallVec;

/// An ordered list of filters to apply to stream content
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: SmallVec<[FilterType; 2]>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; it runs after every filter already in the chain
    pub fn add(&mut self, filter: FilterType) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Filter names in application order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|f| f.to_name())
    }

    pub fn iter(&self) -> impl Iterator<Item = FilterType> + '_ {
        self.filters.iter().copied()
    }

    fn stage(filter: FilterType, next: PipelineBox) -> PipelineBox {
        match filter {
            FilterType::ASCII85Decode => Box::new(Ascii85Encoder::new(next)),
            FilterType::ASCIIHexDecode => Box::new(AsciiHexEncoder::new(next)),
            FilterType::RunLengthDecode => Box::new(RunLengthEncoder::new(next)),
            FilterType::FlateDecode => Box::new(FlateEncoder::new(next)),
        }
    }

    /// Run raw content through every filter in the chain.
    ///
    /// An empty chain returns the input unchanged.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.filters.is_empty() {
            return Ok(data.to_vec());
        }

        let sink = BufferSink::new();
        let handle = sink.handle();
        // Build from the sink outward so the first-attached filter sees the
        // raw bytes and the last-attached writes into the sink.
        let mut head: PipelineBox = Box::new(sink);
        for &filter in self.filters.iter().rev() {
            head = Self::stage(filter, head);
        }

        head.write(data)?;
        head.finish()?;
        handle.take()
    }

    /// Invert the chain: decode filters in reverse application order
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut current = data.to_vec();
        for &filter in self.filters.iter().rev() {
            current = match filter {
                FilterType::ASCII85Decode => decode_ascii85(&current)?,
                FilterType::ASCIIHexDecode => decode_ascii_hex(&current)?,
                FilterType::RunLengthDecode => decode_run_length(&current)?,
                FilterType::FlateDecode => decode_flate(&current)?,
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.encode(b"raw bytes").unwrap(), b"raw bytes");
        assert_eq!(chain.decode(b"raw bytes").unwrap(), b"raw bytes");
    }

    #[test]
    fn test_single_filter() {
        let mut chain = FilterChain::new();
        chain.add(FilterType::ASCIIHexDecode);
        assert_eq!(chain.encode(b"\xAB\xCD").unwrap(), b"ABCD>");
    }

    #[test]
    fn test_application_order() {
        // RunLength first, then ASCII85: the outer encoding must be pure
        // ASCII85 text ending in its marker
        let mut chain = FilterChain::new();
        chain.add(FilterType::RunLengthDecode);
        chain.add(FilterType::ASCII85Decode);

        let data = vec![b'R'; 64];
        let encoded = chain.encode(&data).unwrap();
        assert!(encoded.ends_with(b"~>"));

        // Manual two-step inverse matches chain.decode
        let inner = decode_ascii85(&encoded).unwrap();
        assert_eq!(decode_run_length(&inner).unwrap(), data);
        assert_eq!(chain.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_names_in_attach_order() {
        let mut chain = FilterChain::new();
        chain.add(FilterType::FlateDecode);
        chain.add(FilterType::ASCII85Decode);
        let names: Vec<&str> = chain.names().collect();
        assert_eq!(names, vec!["FlateDecode", "ASCII85Decode"]);
    }

    #[test]
    fn test_triple_chain_roundtrip() {
        let mut chain = FilterChain::new();
        chain.add(FilterType::FlateDecode);
        chain.add(FilterType::RunLengthDecode);
        chain.add(FilterType::ASCIIHexDecode);

        let data: Vec<u8> = (0..512u32).map(|i| (i % 7) as u8).collect();
        let encoded = chain.encode(&data).unwrap();
        assert!(encoded.ends_with(b">"));
        assert_eq!(chain.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_finalize_reaches_inner_stage() {
        // Without finalize propagation the run-length stage would never
        // emit its end-of-data byte for pending state
        let mut chain = FilterChain::new();
        chain.add(FilterType::RunLengthDecode);
        let encoded = chain.encode(b"ZZ").unwrap();
        assert_eq!(encoded, vec![1, b'Z', b'Z', 128]);
    }
}
