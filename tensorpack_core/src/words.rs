//! Checked little-endian conversions between byte buffers and numeric arrays.
//!
//! Tensor bytes are never aliased as `[f32]` / `[u32]` in place; every view is
//! decoded explicitly so the on-disk byte order holds on any host.

use crate::error::{Error, Result};

fn check_width(bytes: &[u8], width: usize, what: &str) -> Result<()> {
    if bytes.len() % width != 0 {
        return Err(Error::TruncatedRecord(format!(
            "{} buffer of {} bytes is not a multiple of {}",
            what,
            bytes.len(),
            width
        )));
    }
    Ok(())
}

pub fn bytes_to_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    check_width(bytes, 4, "f32")?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn f32s_to_bytes(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn bytes_to_u32s(bytes: &[u8]) -> Result<Vec<u32>> {
    check_width(bytes, 4, "u32")?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn u32s_to_bytes(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

pub fn bytes_to_u16s(bytes: &[u8]) -> Result<Vec<u16>> {
    check_width(bytes, 2, "u16")?;
    Ok(bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

pub fn u16s_to_bytes(halves: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(halves.len() * 2);
    for h in halves {
        out.extend_from_slice(&h.to_le_bytes());
    }
    out
}
