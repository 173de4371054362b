use log::debug;
use tensorpack_core::codec::{SideInfo, TensorCodec};
use tensorpack_core::format::Method;
use tensorpack_core::{words, Error, Result};

use crate::float16;
use crate::rle;

/// Alternate lossy codec: float16 → RLE.
///
/// Keeps ~3 significant decimal digits and no magnitude outside the half
/// exponent range; far less lossy than 8-bit quantization, but larger.
pub struct HalfWidthCodec;

impl TensorCodec for HalfWidthCodec {
    fn method(&self) -> Method {
        Method::HalfWidth
    }

    fn name(&self) -> &'static str {
        "half-width"
    }

    fn encode(&self, tensor: &[u8], _side: &mut SideInfo) -> Result<Vec<u8>> {
        let halves = float16::encode_all(&words::bytes_to_f32s(tensor)?);
        let payload = rle::encode(&words::u16s_to_bytes(&halves));
        debug!("{} halves -> rle {} bytes", halves.len(), payload.len());
        Ok(payload)
    }

    fn decode(&self, payload: &[u8], side: &SideInfo) -> Result<Vec<u8>> {
        let halves = words::bytes_to_u16s(&rle::decode(payload)?)?;
        if halves.len() != side.element_count {
            return Err(Error::TruncatedRecord(format!(
                "rle payload decoded to {} halves, expected {}",
                halves.len(),
                side.element_count
            )));
        }
        Ok(words::f32s_to_bytes(&float16::decode_all(&halves)))
    }
}
