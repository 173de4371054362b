pub mod codec;
pub mod container;
pub mod error;
pub mod format;
pub mod reader;
pub mod words;
pub mod writer;

pub use codec::{SideInfo, TensorCodec};
pub use container::Container;
pub use error::{Error, Result};
pub use format::{BlockRecord, Family, LosslessHeader, LossyHeader, Method, QuantizationRange};
pub use reader::{Header, Reader};
pub use writer::Writer;
