//! Byte-oriented run-length coder with a literal/run hybrid record scheme.
//!
//! ```text
//! run record:      [0xFF, run_len, value]        run_len in 4..=255
//! literal record:  [lit_len, bytes × lit_len]    lit_len in 1..=254
//! ```
//! Literal lengths stop at 254 so the length byte of a literal record can never
//! be mistaken for the run marker.

use std::iter;

use tensorpack_core::{Error, Result};

pub const RUN_MARKER: u8 = 0xFF;
pub const MIN_RUN: usize = 4;
pub const MAX_RUN: usize = 255;
pub const MAX_LITERAL: usize = 254;

/// Length of the run of `data[start]` beginning at `start`, capped at `cap`.
fn run_length(data: &[u8], start: usize, cap: usize) -> usize {
    let value = data[start];
    data[start..]
        .iter()
        .take(cap)
        .take_while(|&&b| b == value)
        .count()
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let run = run_length(data, i, MAX_RUN);
        if run >= MIN_RUN {
            out.extend_from_slice(&[RUN_MARKER, run as u8, data[i]]);
            i += run;
            continue;
        }

        // literal run ends where a run worth encoding begins
        let start = i;
        while i < data.len() && i - start < MAX_LITERAL {
            if run_length(data, i, MIN_RUN) >= MIN_RUN {
                break;
            }
            i += 1;
        }
        out.push((i - start) as u8);
        out.extend_from_slice(&data[start..i]);
    }

    out
}

pub fn decode(encoded: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded.len() * 2);
    let mut i = 0;

    while i < encoded.len() {
        let tag = encoded[i];
        if tag == RUN_MARKER {
            let record = encoded.get(i + 1..i + 3).ok_or_else(|| {
                Error::TruncatedRecord(format!("run record at offset {} is cut short", i))
            })?;
            out.extend(iter::repeat(record[1]).take(record[0] as usize));
            i += 3;
        } else {
            let len = tag as usize;
            let literal = encoded.get(i + 1..i + 1 + len).ok_or_else(|| {
                Error::TruncatedRecord(format!(
                    "literal record at offset {} declares {} bytes, {} remain",
                    i,
                    len,
                    encoded.len() - i - 1
                ))
            })?;
            out.extend_from_slice(literal);
            i += 1 + len;
        }
    }

    Ok(out)
}
