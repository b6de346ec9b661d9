//! `AcDb:Preview` writer.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{DwgError, Result};
use crate::io::dwg::constants::sentinels;
use crate::preview::DwgPreview;

const HEADER_ENTRY: u8 = 1;
const ENTRY_SIZE: usize = 9;

/// Writes the preview section framed by its sentinels.
pub struct DwgPreviewWriter {
    /// Address recorded for the section start: the file offset in pre-2004
    /// files, 0 in paged ones
    start: u64,
}

impl DwgPreviewWriter {
    pub fn new(start: u64) -> Self {
        Self { start }
    }

    /// Section for `preview`; `None` writes a directory without entries.
    pub fn write(&self, preview: Option<&DwgPreview>) -> Result<Vec<u8>> {
        let mut entries: Vec<(u8, &[u8])> = Vec::new();
        if let Some(preview) = preview {
            if !preview.raw_header.is_empty() {
                entries.push((HEADER_ENTRY, &preview.raw_header));
            }
            if !preview.is_empty() {
                entries.push((preview.code.code(), &preview.raw_image));
            }
        }

        let data_len: usize = entries.iter().map(|(_, bytes)| bytes.len()).sum();
        let mut out = Vec::with_capacity(16 + 5 + entries.len() * ENTRY_SIZE + data_len + 16);
        out.extend_from_slice(&sentinels::PREVIEW_START);
        out.write_u32::<LittleEndian>(to_u32(1 + entries.len() * ENTRY_SIZE + data_len)?)?;
        out.write_u8(entries.len() as u8)?;

        let mut address = self.start + (out.len() + entries.len() * ENTRY_SIZE) as u64;
        for (code, bytes) in &entries {
            out.write_u8(*code)?;
            out.write_u32::<LittleEndian>(
                u32::try_from(address)
                    .map_err(|_| DwgError::Encode("preview starts beyond 4 GiB".into()))?,
            )?;
            out.write_u32::<LittleEndian>(to_u32(bytes.len())?)?;
            address += bytes.len() as u64;
        }
        for (_, bytes) in &entries {
            out.extend_from_slice(bytes);
        }
        out.extend_from_slice(&sentinels::PREVIEW_END);
        Ok(out)
    }
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| DwgError::Encode(format!("preview of {len} bytes")))
}
