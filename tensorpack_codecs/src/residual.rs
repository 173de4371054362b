//! Residual transforms that turn slowly varying streams into low-entropy ones.
//!
//! Two independent variants:
//! - sign-magnitude byte deltas, used by the quantized pipeline;
//! - a whole-word XOR chain, used by the lossless pipeline.

const SIGN_BIT: u8 = 0x80;
const MAGNITUDE_MASK: u8 = 0x7F;

/// Largest delta magnitude the 7-bit field stores without loss.
pub const MAX_EXACT_DELTA: u8 = 127;

/// Replace each code after the first with `sign | (|delta| & 0x7F)`.
///
/// Deltas span `[-255, 255]` but only seven magnitude bits are kept, so any
/// step larger than [`MAX_EXACT_DELTA`] is truncated and [`delta_decode`] will
/// not recover it. The bound is part of the format and is not widened here.
pub fn delta_encode(codes: &[u8]) -> Vec<u8> {
    let Some(&first) = codes.first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(codes.len());
    out.push(first);
    for pair in codes.windows(2) {
        let delta = pair[1] as i32 - pair[0] as i32;
        let sign = if delta < 0 { SIGN_BIT } else { 0 };
        out.push(sign | (delta.unsigned_abs() as u8 & MAGNITUDE_MASK));
    }
    out
}

/// Rebuild codes by applying each signed step to the previously decoded code.
pub fn delta_decode(encoded: &[u8]) -> Vec<u8> {
    let Some(&first) = encoded.first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(encoded.len());
    let mut prev = first;
    out.push(prev);
    for &step in &encoded[1..] {
        let magnitude = step & MAGNITUDE_MASK;
        prev = if step & SIGN_BIT != 0 {
            prev.wrapping_sub(magnitude)
        } else {
            prev.wrapping_add(magnitude)
        };
        out.push(prev);
    }
    out
}

/// XOR every word with its predecessor's original value.
///
/// Walks from the last index down to 1 so each predecessor is still
/// unmodified when it is read.
pub fn xor_chain_encode(mut words: Vec<u32>) -> Vec<u32> {
    for i in (1..words.len()).rev() {
        words[i] ^= words[i - 1];
    }
    words
}

/// Inverse of [`xor_chain_encode`].
///
/// Walks from index 1 upward so each predecessor has already been decoded.
pub fn xor_chain_decode(mut words: Vec<u32>) -> Vec<u32> {
    for i in 1..words.len() {
        words[i] ^= words[i - 1];
    }
    words
}
