use log::debug;
use tensorpack_core::codec::{SideInfo, TensorCodec};
use tensorpack_core::format::Method;
use tensorpack_core::{words, Result};

use crate::frame::{self, FrameConfig};
use crate::residual::{xor_chain_decode, xor_chain_encode};

/// Bit-exact codec: f32 words → XOR chain → one zstd frame.
///
/// Neighbouring weights tend to share sign, exponent and high mantissa bits,
/// so XORing each word with its predecessor leaves mostly-zero high bytes that
/// zstd's long-distance matcher compresses well across the whole tensor.
#[derive(Default)]
pub struct LosslessCodec {
    pub config: FrameConfig,
}

impl LosslessCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl TensorCodec for LosslessCodec {
    fn method(&self) -> Method {
        Method::Lossless
    }

    fn name(&self) -> &'static str {
        "lossless"
    }

    fn encode(&self, tensor: &[u8], _side: &mut SideInfo) -> Result<Vec<u8>> {
        let residual = xor_chain_encode(words::bytes_to_u32s(tensor)?);
        let block = frame::compress(&words::u32s_to_bytes(&residual), &self.config)?;
        debug!(
            "xor chain over {} words framed into {} bytes",
            residual.len(),
            block.compressed.len()
        );
        Ok(block.compressed)
    }

    fn decode(&self, payload: &[u8], side: &SideInfo) -> Result<Vec<u8>> {
        // The frame carries the residual words; its raw size is fixed by the
        // element count.
        let raw = frame::decompress(payload, side.element_count as u64 * 4)?;
        let words = xor_chain_decode(words::bytes_to_u32s(&raw)?);
        Ok(words::u32s_to_bytes(&words))
    }
}
