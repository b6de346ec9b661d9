//! DWG Handle (Object Map) section writer.

use crate::error::{DwgError, Result};
use crate::io::dwg::constants::object_map::MAX_CHUNK_SIZE;
use crate::io::dwg::crc::{crc8, SECTION_SEED};
use crate::io::dwg::reader::handle_reader::ObjectMapEntry;
use crate::io::dwg::writer::stream_writer::DwgStreamWriter;
use crate::types::DwgVersion;

/// Writer for the `AcDb:Handles` section.
pub struct DwgHandleWriter {
    version: DwgVersion,
}

impl DwgHandleWriter {
    pub fn new(version: DwgVersion) -> Self {
        Self { version }
    }

    /// Encode `entries`, which must be sorted by ascending handle.
    pub fn write(&self, entries: &[ObjectMapEntry]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut chunk: Vec<u8> = Vec::with_capacity(MAX_CHUNK_SIZE);
        let mut last_handle = 0u64;
        let mut last_offset = 0i64;
        let mut previous: Option<u64> = None;

        for &(handle, offset) in entries {
            if previous.is_some_and(|p| handle <= p) {
                return Err(DwgError::Encode(format!(
                    "object map handles out of order at {handle:#X}"
                )));
            }
            let mut pair = self.encode_pair(handle - last_handle, offset - last_offset);
            if chunk.len() + pair.len() > MAX_CHUNK_SIZE {
                flush_chunk(&mut output, &chunk);
                chunk.clear();
                pair = self.encode_pair(handle, offset);
            }
            chunk.extend_from_slice(&pair);
            last_handle = handle;
            last_offset = offset;
            previous = Some(handle);
        }
        if !chunk.is_empty() {
            flush_chunk(&mut output, &chunk);
        }
        flush_chunk(&mut output, &[]);
        Ok(output)
    }

    fn encode_pair(&self, handle_delta: u64, offset_delta: i64) -> Vec<u8> {
        let mut w = DwgStreamWriter::new(self.version);
        w.write_modular_char(handle_delta);
        w.write_signed_modular_char(offset_delta);
        w.into_bytes()
    }
}

fn flush_chunk(output: &mut Vec<u8>, body: &[u8]) {
    let start = output.len();
    output.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
    output.extend_from_slice(body);
    let crc = crc8(SECTION_SEED, &output[start..]);
    output.extend_from_slice(&crc.to_be_bytes());
}
