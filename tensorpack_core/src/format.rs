use std::fmt;

use crate::error::{Error, Result};

/// Fixed size of the lossy-family header in bytes.
///   original_size:u64 + metadata_len:u64 + element_count:u32
///   + method:u32 + min:f32 + max:f32
///   = 8 + 8 + 4 + 4 + 4 + 4 = 32
pub const LOSSY_HEADER_SIZE: usize = 32;

/// Fixed size of the lossless-family header in bytes.
///   original_size:u64 + metadata_len:u64 + element_count:u32
///   + block_count:u32 + payload_size:u64
///   = 8 + 8 + 4 + 4 + 8 = 32
pub const LOSSLESS_HEADER_SIZE: usize = 32;

/// Size of one block record: compressed_size:u64 + original_size:u64.
pub const BLOCK_RECORD_SIZE: usize = 16;

/// Width of the u64 length that precedes the lossy RLE payload.
pub const PAYLOAD_LEN_SIZE: usize = 8;

/// Spans narrower than this are treated as a unit range.
pub const DEGENERATE_SPAN: f32 = 1e-8;

// ── Method tags ────────────────────────────────────────────────────────────

pub const METHOD_HALF_WIDTH: u32 = 0;
pub const METHOD_QUANTIZED: u32 = 1;
pub const METHOD_LOSSLESS: u32 = 2;

/// The two on-disk header shapes. They are not interchangeable; callers pick
/// the family explicitly instead of sniffing the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Lossy,
    Lossless,
}

/// Closed set of compression pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// float32 → float16 → RLE.
    HalfWidth,
    /// float32 → 8-bit codes → sign-magnitude delta → RLE.
    Quantized,
    /// float32 words → XOR chain → zstd frame.
    Lossless,
}

impl Method {
    pub fn tag(self) -> u32 {
        match self {
            Method::HalfWidth => METHOD_HALF_WIDTH,
            Method::Quantized => METHOD_QUANTIZED,
            Method::Lossless => METHOD_LOSSLESS,
        }
    }

    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            METHOD_HALF_WIDTH => Ok(Method::HalfWidth),
            METHOD_QUANTIZED => Ok(Method::Quantized),
            METHOD_LOSSLESS => Ok(Method::Lossless),
            other => Err(Error::UnknownMethod(other)),
        }
    }

    pub fn family(self) -> Family {
        match self {
            Method::HalfWidth | Method::Quantized => Family::Lossy,
            Method::Lossless => Family::Lossless,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::HalfWidth => "half-width",
            Method::Quantized => "quantized",
            Method::Lossless => "lossless",
        };
        f.write_str(name)
    }
}

// ── Quantization range ─────────────────────────────────────────────────────

/// Min/max of one tensor payload, stored verbatim in the lossy header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuantizationRange {
    pub min: f32,
    pub max: f32,
}

impl QuantizationRange {
    /// Width used for scaling; degenerate ranges collapse to 1.0 so constant
    /// tensors never divide by zero.
    pub fn span(&self) -> f32 {
        let span = self.max - self.min;
        if span < DEGENERATE_SPAN {
            1.0
        } else {
            span
        }
    }
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(b)
}

// ── Lossy header ───────────────────────────────────────────────────────────

/// Header of a quantized or half-width file.
#[derive(Debug, Clone, PartialEq)]
pub struct LossyHeader {
    pub original_size: u64,
    /// The archive's declared `L`, excluding the 8-byte prefix itself.
    pub metadata_len: u64,
    pub element_count: u32,
    pub method: Method,
    /// Zeroed for half-width files.
    pub range: QuantizationRange,
}

impl LossyHeader {
    pub fn to_bytes(&self) -> [u8; LOSSY_HEADER_SIZE] {
        let mut buf = [0u8; LOSSY_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.original_size.to_le_bytes());
        buf[8..16].copy_from_slice(&self.metadata_len.to_le_bytes());
        buf[16..20].copy_from_slice(&self.element_count.to_le_bytes());
        buf[20..24].copy_from_slice(&self.method.tag().to_le_bytes());
        buf[24..28].copy_from_slice(&self.range.min.to_le_bytes());
        buf[28..32].copy_from_slice(&self.range.max.to_le_bytes());
        buf
    }

    /// Decode from `LOSSY_HEADER_SIZE` bytes, rejecting tags that do not name
    /// a lossy method.
    pub fn from_bytes(buf: &[u8; LOSSY_HEADER_SIZE]) -> Result<Self> {
        let tag = read_u32(buf, 20);
        let method = Method::from_tag(tag)?;
        if method.family() != Family::Lossy {
            return Err(Error::UnknownMethod(tag));
        }
        Ok(Self {
            original_size: read_u64(buf, 0),
            metadata_len: read_u64(buf, 8),
            element_count: read_u32(buf, 16),
            method,
            range: QuantizationRange {
                min: f32::from_bits(read_u32(buf, 24)),
                max: f32::from_bits(read_u32(buf, 28)),
            },
        })
    }
}

// ── Lossless header ────────────────────────────────────────────────────────

/// Header of a lossless file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LosslessHeader {
    pub original_size: u64,
    /// Length of the whole metadata block, 8-byte prefix included.
    pub metadata_len: u64,
    pub element_count: u32,
    pub block_count: u32,
    /// Block records plus their compressed bytes.
    pub payload_size: u64,
}

impl LosslessHeader {
    pub fn to_bytes(&self) -> [u8; LOSSLESS_HEADER_SIZE] {
        let mut buf = [0u8; LOSSLESS_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.original_size.to_le_bytes());
        buf[8..16].copy_from_slice(&self.metadata_len.to_le_bytes());
        buf[16..20].copy_from_slice(&self.element_count.to_le_bytes());
        buf[20..24].copy_from_slice(&self.block_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.payload_size.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; LOSSLESS_HEADER_SIZE]) -> Self {
        Self {
            original_size: read_u64(buf, 0),
            metadata_len: read_u64(buf, 8),
            element_count: read_u32(buf, 16),
            block_count: read_u32(buf, 20),
            payload_size: read_u64(buf, 24),
        }
    }
}

// ── Block record ───────────────────────────────────────────────────────────

/// Locates one compressed frame inside the lossless payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRecord {
    pub compressed_size: u64,
    pub original_size: u64,
}

impl BlockRecord {
    pub fn to_bytes(&self) -> [u8; BLOCK_RECORD_SIZE] {
        let mut buf = [0u8; BLOCK_RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[8..16].copy_from_slice(&self.original_size.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; BLOCK_RECORD_SIZE]) -> Self {
        Self {
            compressed_size: read_u64(buf, 0),
            original_size: read_u64(buf, 8),
        }
    }
}
