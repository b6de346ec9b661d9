//! DWG Handle/Object Map section reader.
//!
//! `AcDb:Handles` maps every object handle to the offset of its record. The
//! map is split into chunks of at most 2032 bytes, each starting with a
//! big-endian size (body + 2), followed by delta-encoded handle/offset pairs
//! and a big-endian CRC. Deltas restart from zero in every chunk. A chunk of
//! size 2 ends the map.

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use super::stream_reader::DwgStreamReader;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::object_map::MAX_CHUNK_SIZE;
use crate::io::dwg::crc::{crc8, SECTION_SEED};
use crate::types::DwgVersion;

/// One object map entry: absolute handle and record offset.
pub type ObjectMapEntry = (u64, i64);

/// Reader for the `AcDb:Handles` section.
pub struct DwgHandleReader<'a> {
    data: &'a [u8],
    version: DwgVersion,
    verify_crc: bool,
}

impl<'a> DwgHandleReader<'a> {
    pub fn new(data: &'a [u8], version: DwgVersion, verify_crc: bool) -> Self {
        Self {
            data,
            version,
            verify_crc,
        }
    }

    /// Entries in map order.
    pub fn read(&self) -> Result<Vec<ObjectMapEntry>> {
        let mut entries = Vec::new();
        let mut pos = 0usize;
        loop {
            let size_bytes = self.data.get(pos..pos + 2).ok_or(DwgError::OutOfBounds {
                position: pos as u64 * 8,
                size: self.data.len() as u64 * 8,
            })?;
            let size = BigEndian::read_u16(size_bytes) as usize;
            if size < 2 {
                return Err(DwgError::Parse(format!("object map chunk of size {size}")));
            }
            let body_len = size - 2;
            if body_len > MAX_CHUNK_SIZE {
                return Err(DwgError::Parse(format!(
                    "object map chunk of {body_len} bytes exceeds {MAX_CHUNK_SIZE}"
                )));
            }
            let body_end = pos + 2 + body_len;
            let chunk = self.data.get(pos..body_end + 2).ok_or(DwgError::OutOfBounds {
                position: (body_end + 2) as u64 * 8,
                size: self.data.len() as u64 * 8,
            })?;

            let stored = BigEndian::read_u16(&chunk[2 + body_len..]);
            if self.verify_crc {
                let actual = crc8(SECTION_SEED, &chunk[..2 + body_len]);
                if actual != stored {
                    return Err(DwgError::ChecksumMismatch {
                        expected: stored as u32,
                        actual: actual as u32,
                    });
                }
            }
            if body_len == 0 {
                break;
            }

            let mut reader = DwgStreamReader::new(&chunk[2..2 + body_len], self.version);
            let mut handle = 0u64;
            let mut offset = 0i64;
            while reader.position() < body_len {
                let delta = reader.read_modular_char()?;
                handle = handle.checked_add(delta).ok_or_else(|| DwgError::Overflow("object map handle".into()))?;
                offset = offset.wrapping_add(reader.read_signed_modular_char()?);
                entries.push((handle, offset));
            }
            trace!(chunk = pos, bytes = body_len, total = entries.len(), "object map chunk");
            pos = body_end + 2;
        }
        Ok(entries)
    }
}
