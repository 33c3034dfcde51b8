//! Stream filters
//!
//! Each filter is a named byte-stream transform with a defined inverse and
//! a finalize step. Encoders are push-style pipeline stages; decoders are
//! one-shot functions over the full encoded input.

pub mod ascii85;
pub mod asciihex;
pub mod chain;
pub mod flate;
pub mod pipeline;
pub mod runlength;

pub use ascii85::{Ascii85Encoder, decode_ascii85};
pub use asciihex::{AsciiHexEncoder, decode_ascii_hex};
pub use chain::FilterChain;
pub use flate::{FlateEncoder, decode_flate};
pub use pipeline::{BufferSink, Pipeline, PipelineBox, SinkHandle};
pub use runlength::{RunLengthEncoder, decode_run_length};

use crate::error::{Error, Result};

/// Filter types this writer can apply to stream content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// ASCII base-85 encoding
    ASCII85Decode,
    /// Hexadecimal encoding
    ASCIIHexDecode,
    /// PackBits run-length encoding
    RunLengthDecode,
    /// zlib/deflate compression
    FlateDecode,
}

impl FilterType {
    /// Parse filter type from its name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCII85Decode" | "A85" => Some(FilterType::ASCII85Decode),
            "ASCIIHexDecode" | "AHx" => Some(FilterType::ASCIIHexDecode),
            "RunLengthDecode" | "RL" => Some(FilterType::RunLengthDecode),
            "FlateDecode" | "Fl" => Some(FilterType::FlateDecode),
            _ => None,
        }
    }

    /// Get the name written into a stream's descriptive header
    pub fn to_name(&self) -> &'static str {
        match self {
            FilterType::ASCII85Decode => "ASCII85Decode",
            FilterType::ASCIIHexDecode => "ASCIIHexDecode",
            FilterType::RunLengthDecode => "RunLengthDecode",
            FilterType::FlateDecode => "FlateDecode",
        }
    }

    /// Check a parameter set against this filter's capabilities.
    ///
    /// Raised at configuration time, never deferred to output time.
    pub fn validate_params(&self, params: &FilterParams) -> Result<()> {
        match self {
            FilterType::FlateDecode => {
                if params.predictor > 1 {
                    return Err(Error::argument(format!(
                        "{}: predictor {} not supported",
                        self.to_name(),
                        params.predictor
                    )));
                }
                if params.colors != 0 || params.bits_per_component != 0 || params.columns != 0 {
                    return Err(Error::argument(format!(
                        "{}: sample layout parameters require a predictor",
                        self.to_name()
                    )));
                }
                Ok(())
            }
            _ => {
                if *params != FilterParams::default() {
                    return Err(Error::argument(format!(
                        "{} takes no parameters",
                        self.to_name()
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Optional filter parameters, validated against the filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterParams {
    /// Predictor algorithm (0/1 = none)
    pub predictor: i32,
    /// Color components per sample
    pub colors: i32,
    /// Bits per color component
    pub bits_per_component: i32,
    /// Samples per row
    pub columns: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_from_name() {
        assert_eq!(
            FilterType::from_name("ASCII85Decode"),
            Some(FilterType::ASCII85Decode)
        );
        assert_eq!(FilterType::from_name("AHx"), Some(FilterType::ASCIIHexDecode));
        assert_eq!(FilterType::from_name("RL"), Some(FilterType::RunLengthDecode));
        assert_eq!(FilterType::from_name("Invalid"), None);
    }

    #[test]
    fn test_filter_type_to_name() {
        assert_eq!(FilterType::ASCII85Decode.to_name(), "ASCII85Decode");
        assert_eq!(FilterType::RunLengthDecode.to_name(), "RunLengthDecode");
    }

    #[test]
    fn test_default_params_accepted_everywhere() {
        let params = FilterParams::default();
        for f in [
            FilterType::ASCII85Decode,
            FilterType::ASCIIHexDecode,
            FilterType::RunLengthDecode,
            FilterType::FlateDecode,
        ] {
            assert!(f.validate_params(&params).is_ok());
        }
    }

    #[test]
    fn test_predictor_rejected_on_ascii85() {
        let params = FilterParams {
            predictor: 12,
            ..Default::default()
        };
        let err = FilterType::ASCII85Decode.validate_params(&params);
        assert!(matches!(err, Err(crate::error::Error::Argument(_))));
    }

    #[test]
    fn test_flate_predictor_validation() {
        let none = FilterParams {
            predictor: 1,
            ..Default::default()
        };
        assert!(FilterType::FlateDecode.validate_params(&none).is_ok());

        let png = FilterParams {
            predictor: 15,
            ..Default::default()
        };
        assert!(FilterType::FlateDecode.validate_params(&png).is_err());

        let layout = FilterParams {
            columns: 80,
            ..Default::default()
        };
        assert!(FilterType::FlateDecode.validate_params(&layout).is_err());
    }
}
