//! ASCII85 codec
//!
//! Encodes 4-byte big-endian groups as 5 base-85 digits from the alphabet
//! `!`..`u`, with `z` as shortcut for an all-zero full group, `~>` as the
//! end marker, and output wrapped at 80 columns.

use super::pipeline::{Pipeline, PipelineBox};
use crate::error::{Error, Result};

/// Column at which encoder output wraps with a line feed
pub const LINE_WIDTH: usize = 80;

const BASE: u32 = 85;
const FIRST_DIGIT: u8 = b'!';
const LAST_DIGIT: u8 = b'u';
const ZERO_GROUP: u8 = b'z';
const MARKER_FIRST: u8 = b'~';
const MARKER_SECOND: u8 = b'>';

/// Streaming ASCII85 encoder stage
pub struct Ascii85Encoder {
    next: PipelineBox,
    group: [u8; 4],
    group_len: usize,
    column: usize,
}

impl Ascii85Encoder {
    pub fn new(next: PipelineBox) -> Self {
        Self {
            next,
            group: [0; 4],
            group_len: 0,
            column: 0,
        }
    }

    /// Emit characters, breaking the line whenever the column fills.
    /// A single group may be split across the wrap boundary.
    fn put(&mut self, chars: &[u8], out: &mut Vec<u8>) {
        for &c in chars {
            if self.column == LINE_WIDTH {
                out.push(b'\n');
                self.column = 0;
            }
            out.push(c);
            self.column += 1;
        }
    }

    fn encode_group(&mut self, out: &mut Vec<u8>) {
        let word = u32::from_be_bytes(self.group);
        // The shortcut only ever replaces a complete group
        if word == 0 && self.group_len == 4 {
            self.put(&[ZERO_GROUP], out);
        } else {
            let mut digits = [0u8; 5];
            let mut rest = word;
            for slot in digits.iter_mut().rev() {
                *slot = (rest % BASE) as u8 + FIRST_DIGIT;
                rest /= BASE;
            }
            let take = if self.group_len == 4 {
                5
            } else {
                self.group_len + 1
            };
            self.put(&digits[..take], out);
        }
        self.group = [0; 4];
        self.group_len = 0;
    }
}

impl Pipeline for Ascii85Encoder {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(data.len() * 5 / 4 + 8);
        for &byte in data {
            self.group[self.group_len] = byte;
            self.group_len += 1;
            if self.group_len == 4 {
                self.encode_group(&mut out);
            }
        }
        self.next.write(&out)
    }

    fn finish(&mut self) -> Result<()> {
        let mut out = Vec::new();
        if self.group_len > 0 {
            // Trailing partial group: zero padding is already in place
            self.encode_group(&mut out);
        }
        // The two marker characters must stay adjacent; break early rather
        // than let the wrap separate them.
        if self.column > LINE_WIDTH - 2 {
            out.push(b'\n');
            self.column = 0;
        }
        out.extend_from_slice(&[MARKER_FIRST, MARKER_SECOND]);
        self.column += 2;
        self.next.write(&out)?;
        self.next.finish()
    }
}

fn is_skippable(byte: u8) -> bool {
    matches!(byte, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// Decode ASCII85 data, the inverse of [`Ascii85Encoder`]
pub fn decode_ascii85(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut group_len = 0usize;

    let mut iter = data.iter();
    while let Some(&byte) = iter.next() {
        if is_skippable(byte) {
            continue;
        }
        if byte == MARKER_FIRST {
            match iter.next() {
                Some(&MARKER_SECOND) => break,
                _ => {
                    return Err(Error::format(
                        "ASCII85: end marker '~' not followed by '>'",
                    ));
                }
            }
        }
        if byte == ZERO_GROUP {
            if group_len != 0 {
                return Err(Error::format("ASCII85: 'z' inside a group"));
            }
            result.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(FIRST_DIGIT..=LAST_DIGIT).contains(&byte) {
            return Err(Error::format(format!(
                "ASCII85: invalid character 0x{:02x}",
                byte
            )));
        }

        group[group_len] = byte - FIRST_DIGIT;
        group_len += 1;

        if group_len == 5 {
            let word = fold_group(&group)?;
            result.extend_from_slice(&word.to_be_bytes());
            group_len = 0;
        }
    }

    match group_len {
        0 => {}
        1 => {
            return Err(Error::format(
                "ASCII85: a group needs at least 2 characters",
            ));
        }
        k => {
            // Pad missing positions with the maximum digit value
            for slot in group.iter_mut().skip(k) {
                *slot = (BASE - 1) as u8;
            }
            let word = fold_group(&group)?;
            result.extend_from_slice(&word.to_be_bytes()[..k - 1]);
        }
    }

    Ok(result)
}

fn fold_group(group: &[u8; 5]) -> Result<u32> {
    let mut value: u64 = 0;
    for &d in group {
        value = value * BASE as u64 + d as u64;
    }
    u32::try_from(value).map_err(|_| Error::format("ASCII85: group value out of range"))
}
