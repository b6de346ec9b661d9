//! Page framing of the paged layout.
//!
//! A page on disk is one Reed-Solomon block followed by the rest of the
//! payload. The block's data part holds the masked 32-byte page header and
//! the first payload bytes, zero padded:
//!
//! ```text
//! | header (32) | payload[..207] | pad | parity (16) | payload[207..] |
//! ```

use tracing::trace;

use super::encryption::{PageHeader, PAGE_HEADER_SIZE};
use super::reed_solomon::{self, BLOCK_SIZE, DATA_SIZE};
use crate::error::{DwgError, Result};

/// Payload bytes carried inside the protected block.
pub const INLINE_PAYLOAD: usize = DATA_SIZE - PAGE_HEADER_SIZE;

/// On-disk size of a page whose stored payload is `payload_len` bytes.
pub fn page_size(payload_len: usize) -> usize {
    BLOCK_SIZE + payload_len.saturating_sub(INLINE_PAYLOAD)
}

/// A page read back from the file.
#[derive(Debug, Clone)]
pub struct Page {
    pub header: PageHeader,
    /// Stored payload (compressed when `header.compression == 2`).
    pub payload: Vec<u8>,
    /// Bytes repaired by the Reed-Solomon decoder.
    pub corrected: usize,
}

/// Read the page starting at `offset`.
///
/// The block is repaired on a copy. When `verify` is set the page
/// checksums must match.
pub fn read_page(data: &[u8], offset: u64, verify: bool) -> Result<Page> {
    let start = usize::try_from(offset).map_err(|_| DwgError::OutOfBounds {
        position: offset.saturating_mul(8),
        size: data.len() as u64,
    })?;
    let out_of_bounds = |end: usize| DwgError::OutOfBounds {
        position: end as u64 * 8,
        size: data.len() as u64,
    };

    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(
        data.get(start..start + BLOCK_SIZE)
            .ok_or_else(|| out_of_bounds(start + BLOCK_SIZE))?,
    );
    let corrected = reed_solomon::decode(&mut block, offset)?;

    let header = PageHeader::decrypt(&block[..PAGE_HEADER_SIZE], offset)?;
    let stored = header.compressed_size as usize;
    let inline = stored.min(INLINE_PAYLOAD);
    let mut payload = Vec::with_capacity(stored);
    payload.extend_from_slice(&block[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + inline]);
    if stored > inline {
        let rest_start = start + BLOCK_SIZE;
        let rest_end = rest_start + (stored - inline);
        payload.extend_from_slice(data.get(rest_start..rest_end).ok_or_else(|| out_of_bounds(rest_end))?);
    }

    if verify && !header.verify(&payload)? {
        let mut expected = header;
        expected.seal(&payload)?;
        return Err(DwgError::ChecksumMismatch {
            expected: header.data_checksum,
            actual: expected.data_checksum,
        });
    }

    trace!(
        offset,
        page_type = header.page_type,
        section = header.section_number,
        stored,
        corrected,
        "read page"
    );
    Ok(Page {
        header,
        payload,
        corrected,
    })
}

/// Append a page to `out`; the header checksums are filled in here.
///
/// The page is masked for the offset it lands at, which is `out.len()`.
pub fn write_page(out: &mut Vec<u8>, mut header: PageHeader, payload: &[u8]) -> Result<()> {
    header.compressed_size = u32::try_from(payload.len())
        .map_err(|_| DwgError::Encode(format!("page payload of {} bytes", payload.len())))?;
    header.seal(payload)?;

    let offset = out.len() as u64;
    let inline = payload.len().min(INLINE_PAYLOAD);
    let mut data = [0u8; DATA_SIZE];
    data[..PAGE_HEADER_SIZE].copy_from_slice(&header.encrypt(offset)?);
    data[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + inline].copy_from_slice(&payload[..inline]);

    out.extend_from_slice(&reed_solomon::encode(&data)?);
    out.extend_from_slice(&payload[inline..]);
    Ok(())
}
