//! Page compression for the paged (R2004+) section layout.

pub mod lz77_ac18;

pub use lz77_ac18::{Lz77Ac18Compressor, Lz77Ac18Decompressor};

use crate::error::Result;

/// Compresses one page payload.
pub trait Compressor {
    /// Compress `source` into a self-terminated stream.
    fn compress(&self, source: &[u8]) -> Result<Vec<u8>>;
}

/// Expands one page payload.
pub trait Decompressor {
    /// Decompress `source`, which must expand to exactly `decompressed_size` bytes.
    fn decompress(&self, source: &[u8], decompressed_size: usize) -> Result<Vec<u8>>;
}
