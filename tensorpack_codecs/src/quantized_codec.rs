use log::debug;
use tensorpack_core::codec::{SideInfo, TensorCodec};
use tensorpack_core::format::Method;
use tensorpack_core::{words, Error, Result};

use crate::quantize::{dequantize, quantize};
use crate::residual::{delta_decode, delta_encode};
use crate::rle;

/// Default lossy codec: 8-bit codes → sign-magnitude delta → RLE.
///
/// The range is reported through [`SideInfo::range`] and stored in the lossy
/// header. Adjacent codes more than 127 apart do not survive the delta stage;
/// see [`crate::residual::delta_encode`].
pub struct QuantizedCodec;

impl TensorCodec for QuantizedCodec {
    fn method(&self) -> Method {
        Method::Quantized
    }

    fn name(&self) -> &'static str {
        "quantized"
    }

    fn encode(&self, tensor: &[u8], side: &mut SideInfo) -> Result<Vec<u8>> {
        let values = words::bytes_to_f32s(tensor)?;
        let (codes, range) = quantize(&values);
        debug!("quantized {} values over [{}, {}]", values.len(), range.min, range.max);
        side.range = Some(range);

        let deltas = delta_encode(&codes);
        let payload = rle::encode(&deltas);
        debug!("delta {} bytes -> rle {} bytes", deltas.len(), payload.len());
        Ok(payload)
    }

    fn decode(&self, payload: &[u8], side: &SideInfo) -> Result<Vec<u8>> {
        let range = side.range.ok_or_else(|| {
            Error::MalformedContainer("quantized payload without a min/max range".into())
        })?;

        let codes = delta_decode(&rle::decode(payload)?);
        if codes.len() != side.element_count {
            return Err(Error::TruncatedRecord(format!(
                "rle payload decoded to {} codes, expected {}",
                codes.len(),
                side.element_count
            )));
        }
        Ok(words::f32s_to_bytes(&dequantize(&codes, &range)))
    }
}
