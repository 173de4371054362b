pub mod float16;
pub mod frame;
pub mod quantize;
pub mod residual;
pub mod rle;

mod half_codec;
mod lossless_codec;
mod quantized_codec;

pub use frame::FrameConfig;
pub use half_codec::HalfWidthCodec;
pub use lossless_codec::LosslessCodec;
pub use quantized_codec::QuantizedCodec;

use tensorpack_core::{Family, Method, Reader, Result, TensorCodec, Writer};

/// Resolve a codec from its method, with default tuning.
///
/// Used when opening an existing file: the lossy header names its method, the
/// lossless family has exactly one.
pub fn codec_by_method(method: Method) -> Box<dyn TensorCodec> {
    match method {
        Method::HalfWidth => Box::new(HalfWidthCodec),
        Method::Quantized => Box::new(QuantizedCodec),
        Method::Lossless => Box::new(LosslessCodec::default()),
    }
}

/// Compress a raw tensor archive with the given method.
pub fn compress(file: &[u8], method: Method) -> Result<Vec<u8>> {
    Writer::new(codec_by_method(method)).compress(file)
}

/// Decompress a file of the given family back into the original archive.
pub fn decompress(data: &[u8], family: Family) -> Result<Vec<u8>> {
    let codec = codec_by_method(Reader::peek_method(data, family)?);
    Reader::open(data, codec.as_ref())?.decompress()
}
