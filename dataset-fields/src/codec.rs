//! Array codec: n-D arrays to compressed opaque blobs and back.
//!
//! The payload is the `bincode` encoding of the dtype-tagged [`NdArray`]
//! (dtype, shape and row-major data), compressed with zstd.

use tracing::trace;

use crate::array::NdArray;
use crate::error::{FieldError, Result};

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Lossless serializer for [`NdArray`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCodec {
    compression_level: i32,
}

impl ArrayCodec {
    pub fn new(compression_level: i32) -> Self {
        Self {
            compression_level: compression_level.clamp(1, 22), // zstd compression levels 1-22
        }
    }

    pub fn compression_level(&self) -> i32 {
        self.compression_level
    }

    /// Serialize an array to a compressed blob.
    pub fn serialize(&self, array: &NdArray) -> Result<Vec<u8>> {
        let payload = bincode::serialize(array)
            .map_err(|e| FieldError::codec(format!("encoding failed: {e}")))?;
        let blob = zstd::encode_all(payload.as_slice(), self.compression_level)
            .map_err(|e| FieldError::codec(format!("compression failed: {e}")))?;
        trace!(
            dtype = %array.dtype(),
            shape = ?array.shape(),
            raw = payload.len(),
            compressed = blob.len(),
            "serialized array"
        );
        Ok(blob)
    }

    /// Decode a blob produced by [`ArrayCodec::serialize`].
    pub fn deserialize(&self, blob: &[u8]) -> Result<NdArray> {
        let payload = zstd::decode_all(blob)
            .map_err(|e| FieldError::codec(format!("decompression failed: {e}")))?;
        bincode::deserialize(&payload).map_err(|e| FieldError::codec(format!("decoding failed: {e}")))
    }
}

impl Default for ArrayCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}
