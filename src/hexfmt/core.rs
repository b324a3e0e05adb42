//! Fixed-width hex line codec for dataset files.
//!
//! Every element is stored as exactly 8 lowercase hex digits, zero-padded,
//! followed by `\n` (`%08x`). No prefix, no uppercase.

use std::io::{self, Write};

use memchr::memchr_iter;

/// Digits per encoded element.
pub const HEX_WIDTH: usize = 8;

/// Bytes per encoded line, including the newline.
pub const LINE_LEN: usize = HEX_WIDTH + 1;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Flush the batch buffer to the writer once it reaches this size.
const BATCH_SIZE: usize = 256 * 1024;

/// Errors from decoding a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("line {line}: not an 8-digit lowercase hex value")]
    Malformed { line: usize },

    #[error("line {line}: missing trailing newline")]
    Unterminated { line: usize },
}

impl DecodeError {
    /// 1-based line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            DecodeError::Malformed { line } | DecodeError::Unterminated { line } => *line,
        }
    }
}

/// Encode one value as `%08x\n` into a fixed 9-byte buffer.
#[inline]
pub fn encode_line(value: u32, out: &mut [u8; LINE_LEN]) {
    let mut v = value;
    for i in (0..HEX_WIDTH).rev() {
        out[i] = HEX_DIGITS[(v & 0xf) as usize];
        v >>= 4;
    }
    out[HEX_WIDTH] = b'\n';
}

/// Write every element as one `%08x` line.
///
/// Lines are batched into a local buffer so the writer sees a few large
/// `write_all` calls instead of one per element.
pub fn write_elements<W: Write>(out: &mut W, elements: &[i32]) -> io::Result<()> {
    let mut batch = Vec::with_capacity(BATCH_SIZE.min(elements.len().saturating_mul(LINE_LEN)));
    let mut line = [0u8; LINE_LEN];
    for &e in elements {
        // Elements are non-negative, so the bit pattern is the value.
        encode_line(e as u32, &mut line);
        batch.extend_from_slice(&line);
        if batch.len() >= BATCH_SIZE {
            out.write_all(&batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        out.write_all(&batch)?;
    }
    Ok(())
}

#[inline]
fn hex_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u32),
        b'a'..=b'f' => Some((b - b'a' + 10) as u32),
        _ => None,
    }
}

/// Parse one line body (without its newline).
/// Returns None unless it is exactly 8 lowercase hex digits.
#[inline]
pub fn parse_line(line: &[u8]) -> Option<u32> {
    if line.len() != HEX_WIDTH {
        return None;
    }
    let mut v: u32 = 0;
    for &b in line {
        v = (v << 4) | hex_value(b)?;
    }
    Some(v)
}

/// Decode a whole file body into values, one per `\n`-terminated line.
pub fn decode(data: &[u8]) -> Result<Vec<u32>, DecodeError> {
    let mut values = Vec::with_capacity(data.len() / LINE_LEN);
    let mut start = 0;
    for (idx, nl) in memchr_iter(b'\n', data).enumerate() {
        match parse_line(&data[start..nl]) {
            Some(v) => values.push(v),
            None => return Err(DecodeError::Malformed { line: idx + 1 }),
        }
        start = nl + 1;
    }
    if start < data.len() {
        let line = values.len() + 1;
        return Err(match parse_line(&data[start..]) {
            Some(_) => DecodeError::Unterminated { line },
            None => DecodeError::Malformed { line },
        });
    }
    Ok(values)
}
