use crate::error::{Error, Result};

/// Width of the little-endian u64 metadata length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// A tensor archive split into its two regions.
///
/// `metadata` is the whole leading block, length prefix included, so that
/// [`join`] can reproduce it byte-for-byte without re-encoding anything.
/// `tensor` always holds a whole number of little-endian f32 elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub metadata: Vec<u8>,
    pub tensor: Vec<u8>,
}

impl Container {
    /// The `L` stored in the first eight bytes of the metadata block.
    pub fn declared_metadata_len(&self) -> u64 {
        // split() guarantees the prefix is present
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&self.metadata[..LENGTH_PREFIX_SIZE]);
        u64::from_le_bytes(prefix)
    }

    /// Number of f32 elements in the tensor region.
    pub fn element_count(&self) -> usize {
        self.tensor.len() / 4
    }

    /// Total size of the archive this container was split from.
    pub fn file_len(&self) -> usize {
        self.metadata.len() + self.tensor.len()
    }
}

/// Split a raw tensor archive into metadata and tensor regions.
///
/// The metadata is treated as an opaque blob and is never parsed.
pub fn split(file: &[u8]) -> Result<Container> {
    if file.len() < LENGTH_PREFIX_SIZE {
        return Err(Error::MalformedContainer(format!(
            "file is {} bytes, too short for the {}-byte metadata length prefix",
            file.len(),
            LENGTH_PREFIX_SIZE
        )));
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&file[..LENGTH_PREFIX_SIZE]);
    let declared = u64::from_le_bytes(prefix);

    let available = (file.len() - LENGTH_PREFIX_SIZE) as u64;
    if declared > available {
        return Err(Error::MalformedContainer(format!(
            "declared metadata length {} exceeds the {} bytes after the prefix",
            declared, available
        )));
    }

    let boundary = LENGTH_PREFIX_SIZE + declared as usize;
    let tensor = &file[boundary..];
    if tensor.len() % 4 != 0 {
        return Err(Error::MalformedContainer(format!(
            "tensor region is {} bytes, not a whole number of f32 elements",
            tensor.len()
        )));
    }

    Ok(Container {
        metadata: file[..boundary].to_vec(),
        tensor: tensor.to_vec(),
    })
}

/// Reassemble an archive; the exact inverse of [`split`].
pub fn join(metadata: &[u8], tensor: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(metadata.len() + tensor.len());
    out.extend_from_slice(metadata);
    out.extend_from_slice(tensor);
    out
}
