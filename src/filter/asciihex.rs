//! ASCII-Hex codec
//!
//! Two hex digits per input byte, wrapped at 80 output characters per line,
//! terminated by `>`.

use super::pipeline::{Pipeline, PipelineBox};
use crate::error::{Error, Result};

/// Column at which encoder output wraps with a line feed (40 input bytes)
pub const LINE_WIDTH: usize = 80;

const TERMINATOR: u8 = b'>';
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Streaming ASCII-Hex encoder stage
pub struct AsciiHexEncoder {
    next: PipelineBox,
    column: usize,
}

impl AsciiHexEncoder {
    pub fn new(next: PipelineBox) -> Self {
        Self { next, column: 0 }
    }

    fn put(&mut self, c: u8, out: &mut Vec<u8>) {
        if self.column == LINE_WIDTH {
            out.push(b'\n');
            self.column = 0;
        }
        out.push(c);
        self.column += 1;
    }
}

impl Pipeline for AsciiHexEncoder {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(data.len() * 2 + 2);
        for &byte in data {
            self.put(HEX_DIGITS[(byte >> 4) as usize], &mut out);
            self.put(HEX_DIGITS[(byte & 0x0F) as usize], &mut out);
        }
        self.next.write(&out)
    }

    fn finish(&mut self) -> Result<()> {
        let mut out = Vec::new();
        self.put(TERMINATOR, &mut out);
        self.next.write(&out)?;
        self.next.finish()
    }
}

/// Decode ASCII-Hex data, the inverse of [`AsciiHexEncoder`]
pub fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high_nibble: Option<u8> = None;

    for &byte in data {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if byte == TERMINATOR {
            break;
        }

        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'A'..=b'F' => byte - b'A' + 10,
            b'a'..=b'f' => byte - b'a' + 10,
            _ => {
                return Err(Error::format(format!(
                    "ASCIIHex: invalid character 0x{:02x}",
                    byte
                )));
            }
        };

        match high_nibble {
            None => high_nibble = Some(nibble),
            Some(high) => {
                result.push((high << 4) | nibble);
                high_nibble = None;
            }
        }
    }

    // An odd trailing digit pads with a zero low nibble
    if let Some(high) = high_nibble {
        result.push(high << 4);
    }

    Ok(result)
}
