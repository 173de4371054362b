use log::debug;

use crate::codec::{SideInfo, TensorCodec};
use crate::container::{self, Container};
use crate::error::{Error, Result};
use crate::format::{
    BlockRecord, Family, LosslessHeader, LossyHeader, BLOCK_RECORD_SIZE,
    LOSSLESS_HEADER_SIZE, LOSSY_HEADER_SIZE, PAYLOAD_LEN_SIZE,
};

/// Compresses whole tensor archives with one codec.
///
/// # Layout written
/// ```text
/// lossy:     [LossyHeader: 32] [metadata: 8 + L] [payload_len: u64] [RLE payload]
/// lossless:  [LosslessHeader: 32] [metadata: 8 + L] [BlockRecord: 16] [zstd frame]
/// ```
/// The header shape follows the codec's [`Family`]; nothing else in the file
/// says which family it belongs to.
pub struct Writer {
    codec: Box<dyn TensorCodec>,
}

impl Writer {
    pub fn new(codec: Box<dyn TensorCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &dyn TensorCodec {
        self.codec.as_ref()
    }

    /// Compress a raw archive held in memory.
    pub fn compress(&self, file: &[u8]) -> Result<Vec<u8>> {
        let container = container::split(file)?;
        let element_count = u32::try_from(container.element_count()).map_err(|_| {
            Error::MalformedContainer(format!(
                "{} elements do not fit the u32 element count field",
                container.element_count()
            ))
        })?;

        let mut side = SideInfo {
            element_count: container.element_count(),
            range: None,
        };
        let payload = self.codec.encode(&container.tensor, &mut side)?;
        debug!(
            "{}: {} elements, tensor {} bytes -> payload {} bytes",
            self.codec.name(),
            element_count,
            container.tensor.len(),
            payload.len()
        );

        let out = match self.codec.method().family() {
            Family::Lossy => self.assemble_lossy(&container, element_count, &side, &payload),
            Family::Lossless => self.assemble_lossless(&container, element_count, &payload),
        };
        Ok(out)
    }

    fn assemble_lossy(
        &self,
        container: &Container,
        element_count: u32,
        side: &SideInfo,
        payload: &[u8],
    ) -> Vec<u8> {
        let header = LossyHeader {
            original_size: container.file_len() as u64,
            metadata_len: container.declared_metadata_len(),
            element_count,
            method: self.codec.method(),
            range: side.range.unwrap_or_default(),
        };

        let mut out = Vec::with_capacity(
            LOSSY_HEADER_SIZE + container.metadata.len() + PAYLOAD_LEN_SIZE + payload.len(),
        );
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&container.metadata);
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn assemble_lossless(&self, container: &Container, element_count: u32, frame: &[u8]) -> Vec<u8> {
        let record = BlockRecord {
            compressed_size: frame.len() as u64,
            original_size: container.tensor.len() as u64,
        };
        let header = LosslessHeader {
            original_size: container.file_len() as u64,
            metadata_len: container.metadata.len() as u64,
            element_count,
            block_count: 1,
            payload_size: (BLOCK_RECORD_SIZE + frame.len()) as u64,
        };

        let mut out = Vec::with_capacity(
            LOSSLESS_HEADER_SIZE + container.metadata.len() + BLOCK_RECORD_SIZE + frame.len(),
        );
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&container.metadata);
        out.extend_from_slice(&record.to_bytes());
        out.extend_from_slice(frame);
        out
    }
}
