//! Bit-level float32 ↔ half-precision conversion.
//!
//! The encoder truncates the mantissa instead of rounding to nearest, and both
//! directions flush subnormals to signed zero. Values outside the half
//! exponent range saturate to signed infinity.

const F16_SIGN: u16 = 0x8000;
const F16_INF: u16 = 0x7C00;
const F32_EXP_MASK: u32 = 0x7F80_0000;

/// Encode one f32 as a half-precision bit pattern.
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xFF) as i32 - 127 + 15;
    let mantissa = ((bits >> 13) & 0x3FF) as u16;

    if exponent <= 0 {
        return sign;
    }
    if exponent >= 31 {
        return sign | F16_INF;
    }
    sign | ((exponent as u16) << 10) | mantissa
}

/// Decode a half-precision bit pattern into an f32.
pub fn f16_to_f32(half: u16) -> f32 {
    let sign = ((half & F16_SIGN) as u32) << 16;
    let exponent = ((half >> 10) & 0x1F) as u32;
    let mantissa = (half & 0x3FF) as u32;

    let bits = match exponent {
        0 => sign,
        31 => sign | F32_EXP_MASK | (mantissa << 13),
        e => sign | ((e + 127 - 15) << 23) | (mantissa << 13),
    };
    f32::from_bits(bits)
}

pub fn encode_all(values: &[f32]) -> Vec<u16> {
    values.iter().map(|&v| f32_to_f16(v)).collect()
}

pub fn decode_all(halves: &[u16]) -> Vec<f32> {
    halves.iter().map(|&h| f16_to_f32(h)).collect()
}
