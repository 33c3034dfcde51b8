//! Run-length codec (PackBits style)
//!
//! Control byte `n < 128`: the next `n + 1` bytes are literal. Control byte
//! `n > 128`: the next byte repeats `257 - n` times. Control byte 128 is
//! end-of-data. The encoder keeps a window of up to 129 bytes: 128 bytes of
//! literal payload plus one byte of lookahead, so a repeat run forming right
//! at the payload limit is still detected.

use super::pipeline::{Pipeline, PipelineBox};
use crate::error::{Error, Result};

/// End-of-data control byte
pub const EOD: u8 = 128;

/// Longest run either control code can express
const MAX_RUN: usize = 128;

/// What the encoder is in the middle of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Nothing pending yet
    Undetermined,
    /// Accumulating literal bytes in the window
    Literal,
    /// Counting repetitions of `run_byte`
    Repeat,
}

/// Streaming run-length encoder stage
pub struct RunLengthEncoder {
    next: PipelineBox,
    mode: RunMode,
    window: Vec<u8>,
    run_byte: u8,
    run_len: usize,
}

impl RunLengthEncoder {
    pub fn new(next: PipelineBox) -> Self {
        Self {
            next,
            mode: RunMode::Undetermined,
            window: Vec::with_capacity(MAX_RUN + 1),
            run_byte: 0,
            run_len: 0,
        }
    }

    fn flush_literal(window: &[u8], out: &mut Vec<u8>) {
        debug_assert!(!window.is_empty() && window.len() <= MAX_RUN);
        out.push((window.len() - 1) as u8);
        out.extend_from_slice(window);
    }

    fn flush_repeat(&mut self, out: &mut Vec<u8>) {
        debug_assert!(self.run_len >= 2 && self.run_len <= MAX_RUN);
        out.push((257 - self.run_len) as u8);
        out.push(self.run_byte);
        self.run_len = 0;
    }

    fn push(&mut self, byte: u8, out: &mut Vec<u8>) {
        if self.mode == RunMode::Repeat {
            if byte == self.run_byte {
                if self.run_len == MAX_RUN {
                    // Run continues past what one code expresses: emit the
                    // full code and keep counting in repeat mode.
                    self.flush_repeat(out);
                    self.run_len = 1;
                } else {
                    self.run_len += 1;
                }
            } else {
                if self.run_len == 1 {
                    // A single leftover repetition has no repeat code
                    Self::flush_literal(&[self.run_byte], out);
                } else {
                    self.flush_repeat(out);
                }
                self.mode = RunMode::Literal;
                self.window.push(byte);
            }
            return;
        }

        self.window.push(byte);
        self.mode = RunMode::Literal;
        let len = self.window.len();

        if len >= 3 && self.window[len - 1] == self.window[len - 2] && self.window[len - 2] == self.window[len - 3]
        {
            // Three identical bytes open a repeat run; whatever precedes
            // them flushes as a literal.
            if len > 3 {
                Self::flush_literal(&self.window[..len - 3], out);
            }
            self.run_byte = byte;
            self.run_len = 3;
            self.mode = RunMode::Repeat;
            self.window.clear();
        } else if len == MAX_RUN + 1 {
            // Window full: the lookahead byte did not complete a run, so
            // the first 128 bytes leave as one literal.
            Self::flush_literal(&self.window[..MAX_RUN], out);
            let kept = self.window[MAX_RUN];
            self.window.clear();
            self.window.push(kept);
        }
    }
}

impl Pipeline for RunLengthEncoder {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
        for &byte in data {
            self.push(byte, &mut out);
        }
        self.next.write(&out)
    }

    fn finish(&mut self) -> Result<()> {
        let mut out = Vec::new();
        match self.mode {
            RunMode::Repeat => {
                if self.run_len == 1 {
                    Self::flush_literal(&[self.run_byte], &mut out);
                } else {
                    self.flush_repeat(&mut out);
                }
            }
            RunMode::Literal => {
                Self::flush_literal(&self.window, &mut out);
                self.window.clear();
            }
            RunMode::Undetermined => {}
        }
        self.mode = RunMode::Undetermined;
        out.push(EOD);
        self.next.write(&out)?;
        self.next.finish()
    }
}

/// Decode run-length data, the inverse of [`RunLengthEncoder`]
pub fn decode_run_length(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let control = data[i];
        i += 1;

        if control == EOD {
            break;
        } else if control < EOD {
            let count = control as usize + 1;
            if i + count > data.len() {
                return Err(Error::format("RunLength: truncated literal run"));
            }
            result.extend_from_slice(&data[i..i + count]);
            i += count;
        } else {
            let count = 257 - control as usize;
            if i >= data.len() {
                return Err(Error::format("RunLength: truncated repeat run"));
            }
            let byte = data[i];
            i += 1;
            result.resize(result.len() + count, byte);
        }
    }

    Ok(result)
}
