use log::debug;

use crate::codec::{SideInfo, TensorCodec};
use crate::container::{self, LENGTH_PREFIX_SIZE};
use crate::error::{Error, Result};
use crate::format::{
    BlockRecord, Family, LosslessHeader, LossyHeader, Method, BLOCK_RECORD_SIZE,
    LOSSLESS_HEADER_SIZE, LOSSY_HEADER_SIZE, PAYLOAD_LEN_SIZE,
};

/// Parsed header of either family.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Lossy(LossyHeader),
    Lossless(LosslessHeader),
}

impl Header {
    pub fn method(&self) -> Method {
        match self {
            Header::Lossy(h) => h.method,
            Header::Lossless(_) => Method::Lossless,
        }
    }

    pub fn original_size(&self) -> u64 {
        match self {
            Header::Lossy(h) => h.original_size,
            Header::Lossless(h) => h.original_size,
        }
    }

    pub fn element_count(&self) -> u32 {
        match self {
            Header::Lossy(h) => h.element_count,
            Header::Lossless(h) => h.element_count,
        }
    }
}

/// Bounds-checked forward cursor over a compressed file.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: u64, what: &str) -> Result<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        let len = usize::try_from(len)
            .ok()
            .filter(|&n| n <= remaining)
            .ok_or_else(|| {
                Error::TruncatedRecord(format!(
                    "{} needs {} bytes at offset {} but only {} remain",
                    what, len, self.pos, remaining
                ))
            })?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N as u64, what)?);
        Ok(buf)
    }
}

/// Decompresses one file produced by [`Writer`](crate::Writer).
///
/// # Open sequence
/// 1. Parse the header shape belonging to the codec's family.
/// 2. For lossy files, check the header's method tag against the codec.
/// 3. Slice out the metadata block and the payload, validating every length
///    against the bytes actually present.
///
/// Nothing is decoded until [`decompress`](Reader::decompress) is called.
pub struct Reader<'a> {
    pub header: Header,
    metadata: &'a [u8],
    payload: &'a [u8],
    compressed_size: usize,
    codec: &'a dyn TensorCodec,
}

impl<'a> Reader<'a> {
    /// Read only the method from a compressed file of the given family, so a
    /// caller can pick the right codec before opening a [`Reader`].
    pub fn peek_method(data: &[u8], family: Family) -> Result<Method> {
        match family {
            Family::Lossy => {
                let mut cursor = Cursor::new(data);
                let buf = cursor.take_array::<LOSSY_HEADER_SIZE>("lossy header")?;
                Ok(LossyHeader::from_bytes(&buf)?.method)
            }
            Family::Lossless => Ok(Method::Lossless),
        }
    }

    pub fn open(data: &'a [u8], codec: &'a dyn TensorCodec) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let (header, metadata, payload) = match codec.method().family() {
            Family::Lossy => {
                let buf = cursor.take_array::<LOSSY_HEADER_SIZE>("lossy header")?;
                let header = LossyHeader::from_bytes(&buf)?;
                if header.method != codec.method() {
                    return Err(Error::CodecMismatch {
                        file: header.method,
                        codec: codec.method(),
                    });
                }
                let block_len = header
                    .metadata_len
                    .checked_add(LENGTH_PREFIX_SIZE as u64)
                    .ok_or_else(|| {
                        Error::MalformedContainer(format!(
                            "metadata length {} overflows",
                            header.metadata_len
                        ))
                    })?;
                let metadata = cursor.take(block_len, "metadata block")?;
                check_metadata_prefix(metadata, header.metadata_len)?;
                let len = u64::from_le_bytes(cursor.take_array::<PAYLOAD_LEN_SIZE>("payload length")?);
                let payload = cursor.take(len, "RLE payload")?;
                (Header::Lossy(header), metadata, payload)
            }
            Family::Lossless => {
                let buf = cursor.take_array::<LOSSLESS_HEADER_SIZE>("lossless header")?;
                let header = LosslessHeader::from_bytes(&buf);
                if header.metadata_len < LENGTH_PREFIX_SIZE as u64 {
                    return Err(Error::MalformedContainer(format!(
                        "metadata block of {} bytes cannot hold its length prefix",
                        header.metadata_len
                    )));
                }
                let metadata = cursor.take(header.metadata_len, "metadata block")?;
                check_metadata_prefix(metadata, header.metadata_len - LENGTH_PREFIX_SIZE as u64)?;
                if header.block_count != 1 {
                    return Err(Error::MalformedContainer(format!(
                        "expected exactly one block, header declares {}",
                        header.block_count
                    )));
                }

                let mut blocks = Cursor::new(cursor.take(header.payload_size, "block payload")?);
                let record = BlockRecord::from_bytes(
                    &blocks.take_array::<BLOCK_RECORD_SIZE>("block record")?,
                );
                if record.original_size != header.element_count as u64 * 4 {
                    return Err(Error::MalformedContainer(format!(
                        "block holds {} raw bytes but header declares {} elements",
                        record.original_size, header.element_count
                    )));
                }
                let frame = blocks.take(record.compressed_size, "compressed block")?;
                (Header::Lossless(header), metadata, frame)
            }
        };

        debug!(
            "opened {} file: {} metadata bytes, {} payload bytes",
            header.method(),
            metadata.len(),
            payload.len()
        );

        Ok(Self {
            header,
            metadata,
            payload,
            compressed_size: data.len(),
            codec,
        })
    }

    /// The metadata block exactly as it appears in the original archive.
    pub fn metadata(&self) -> &'a [u8] {
        self.metadata
    }

    /// Encoded tensor payload (RLE stream or zstd frame).
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn method(&self) -> Method {
        self.header.method()
    }

    pub fn original_size(&self) -> u64 {
        self.header.original_size()
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size as u64
    }

    /// Compression ratio (original / compressed).
    pub fn ratio(&self) -> f64 {
        if self.compressed_size == 0 {
            return 1.0;
        }
        self.original_size() as f64 / self.compressed_size as f64
    }

    /// Run the codec's inverse pipeline and reassemble the archive.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        let element_count = self.header.element_count() as usize;
        let side = SideInfo {
            element_count,
            range: match &self.header {
                Header::Lossy(h) if h.method == Method::Quantized => Some(h.range),
                _ => None,
            },
        };

        let tensor = self.codec.decode(self.payload, &side)?;
        if tensor.len() != element_count * 4 {
            return Err(Error::TruncatedRecord(format!(
                "payload decoded to {} tensor bytes, header declares {} elements",
                tensor.len(),
                element_count
            )));
        }

        let file = container::join(self.metadata, &tensor);
        if file.len() as u64 != self.original_size() {
            return Err(Error::MalformedContainer(format!(
                "reassembled archive is {} bytes, header declares {}",
                file.len(),
                self.original_size()
            )));
        }
        Ok(file)
    }
}

fn check_metadata_prefix(block: &[u8], declared: u64) -> Result<()> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&block[..LENGTH_PREFIX_SIZE]);
    let stored = u64::from_le_bytes(prefix);
    if stored != declared {
        return Err(Error::MalformedContainer(format!(
            "metadata block declares {} bytes but header says {}",
            stored, declared
        )));
    }
    Ok(())
}
