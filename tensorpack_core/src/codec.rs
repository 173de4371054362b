use crate::error::Result;
use crate::format::{Method, QuantizationRange};

/// Per-call side channel between the orchestrator and a codec.
///
/// On encode the codec fills in whatever it needs to reverse itself later
/// (the quantized codec records its range). On decode the orchestrator hands
/// back the values it parsed from the header.
#[derive(Default, Debug, Clone)]
pub struct SideInfo {
    /// Number of f32 elements in the tensor region.
    pub element_count: usize,
    /// Only the quantized codec sets this.
    pub range: Option<QuantizationRange>,
}

/// One compression pipeline over the tensor region of an archive.
///
/// Each implementation:
/// - Is identified by a stable [`Method`] whose tag the header records.
/// - Receives tensor bytes as consecutive little-endian f32 values and must
///   return exactly `4 * element_count` bytes on decode.
/// - Never touches the metadata block; the orchestrator copies that verbatim.
pub trait TensorCodec: Send + Sync {
    fn method(&self) -> Method;

    /// Human-readable name for CLI display.
    fn name(&self) -> &'static str;

    /// Encode the tensor region into a payload.
    fn encode(&self, tensor: &[u8], side: &mut SideInfo) -> Result<Vec<u8>>;

    /// Reverse [`encode`](TensorCodec::encode), stage by stage in reverse order.
    fn decode(&self, payload: &[u8], side: &SideInfo) -> Result<Vec<u8>>;
}
