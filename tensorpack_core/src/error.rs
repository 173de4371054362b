use thiserror::Error;

use crate::format::Method;

/// Every way a compress or decompress call can fail.
///
/// None of these are retried: the first failing stage aborts the whole call.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, read, or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The tensor archive envelope is missing its length prefix, declares more
    /// metadata than the file holds, or carries a ragged tensor region.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// The zstd frame stage rejected its input.
    #[error("frame codec error: {0}")]
    FrameCodec(String),

    /// A header, block record, or RLE record ends before its declared length.
    #[error("truncated record: {0}")]
    TruncatedRecord(String),

    /// The lossy header carries a method tag no codec knows about.
    #[error("unknown compression method tag {0}")]
    UnknownMethod(u32),

    /// A reader was opened with a codec that does not match the header.
    #[error("codec mismatch: file uses {file} but provided codec is {codec}")]
    CodecMismatch { file: Method, codec: Method },
}

pub type Result<T> = std::result::Result<T, Error>;
