use std::io::{self, Read};

use log::debug;
use tensorpack_core::{Error, Result};
use zstd::bulk::Compressor;
use zstd::stream::read::Decoder;
use zstd::zstd_safe::CParameter;

/// Largest window the decoder will accept; the ceiling zstd allows on
/// 32-bit targets.
pub const MAX_WINDOW_LOG: u32 = 30;

/// Tuning for the single zstd frame written by the lossless pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
    /// zstd worker threads; 0 compresses on the calling thread.
    pub workers: u32,
    /// log2 of the match window (27 ≈ 128 MiB).
    pub window_log: u32,
    /// Long-distance matching across the whole tensor.
    pub long_distance: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            level: 10,
            workers: default_workers(),
            window_log: 27,
            long_distance: true,
        }
    }
}

/// Hardware parallelism, or 4 when it cannot be determined.
pub fn default_workers() -> u32 {
    match num_cpus::get() {
        0 => 4,
        n => n as u32,
    }
}

/// One self-contained compressed frame and the size it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub compressed: Vec<u8>,
    pub original_len: u64,
}

fn frame_error(stage: &'static str) -> impl Fn(io::Error) -> Error {
    move |e| Error::FrameCodec(format!("{}: {}", stage, e))
}

/// Compress `raw` as exactly one zstd frame.
pub fn compress(raw: &[u8], config: &FrameConfig) -> Result<Block> {
    let mut compressor = Compressor::new(config.level).map_err(frame_error("init"))?;
    compressor
        .set_parameter(CParameter::NbWorkers(config.workers))
        .map_err(frame_error("workers"))?;
    compressor
        .set_parameter(CParameter::EnableLongDistanceMatching(config.long_distance))
        .map_err(frame_error("long-distance matching"))?;
    compressor
        .set_parameter(CParameter::WindowLog(config.window_log))
        .map_err(frame_error("window log"))?;

    let compressed = compressor.compress(raw).map_err(frame_error("compress"))?;
    debug!(
        "zstd frame: level {} workers {} window_log {} ldm {}: {} -> {} bytes",
        config.level,
        config.workers,
        config.window_log,
        config.long_distance,
        raw.len(),
        compressed.len()
    );

    Ok(Block {
        compressed,
        original_len: raw.len() as u64,
    })
}

/// Decompress one frame, requiring it to expand to exactly `original_len` bytes.
///
/// `original_len` comes from the file, so output grows with the decoded data
/// instead of being reserved up front; decoding stops one byte past it.
pub fn decompress(compressed: &[u8], original_len: u64) -> Result<Vec<u8>> {
    let mut decoder = Decoder::with_buffer(compressed).map_err(frame_error("init"))?;
    decoder
        .window_log_max(MAX_WINDOW_LOG)
        .map_err(frame_error("window log"))?;

    let mut raw = Vec::new();
    decoder
        .take(original_len.saturating_add(1))
        .read_to_end(&mut raw)
        .map_err(frame_error("decompress"))?;

    if raw.len() as u64 > original_len {
        return Err(Error::FrameCodec(format!(
            "frame expands past the {} bytes the block record declares",
            original_len
        )));
    }
    if (raw.len() as u64) < original_len {
        return Err(Error::FrameCodec(format!(
            "frame expanded to {} bytes, block record says {}",
            raw.len(),
            original_len
        )));
    }
    Ok(raw)
}
