//! `AcDb:Preview` reader.
//!
//! ```text
//! start sentinel
//! RL  size of what follows up to the image data end
//! RC  entry count
//!     per entry: RC code (1 = header, else image type), RL start, RL size
//! header bytes, image bytes
//! end sentinel
//! ```
//!
//! Entry starts are absolute in pre-2004 files; the data is read in entry
//! order right after the directory either way.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{DwgError, Result};
use crate::io::dwg::constants::sentinels;
use crate::preview::{DwgPreview, PreviewType};

const HEADER_ENTRY: u8 = 1;

pub struct DwgPreviewReader<'a> {
    /// Section bytes, starting at the start sentinel
    data: &'a [u8],
}

impl<'a> DwgPreviewReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn read(&self) -> Result<DwgPreview> {
        let mut cursor = Cursor::new(self.data);
        expect_sentinel(&mut cursor, &sentinels::PREVIEW_START, "preview start")?;
        let _overall_size = cursor.read_u32::<LittleEndian>()?;
        let count = cursor.read_u8()?;

        let mut header_size = 0usize;
        let mut images = Vec::new();
        for _ in 0..count {
            let code = cursor.read_u8()?;
            let _start = cursor.read_u32::<LittleEndian>()?;
            let size = cursor.read_u32::<LittleEndian>()? as usize;
            if code == HEADER_ENTRY {
                header_size = size;
            } else {
                images.push((PreviewType::from_code(code), size));
            }
        }

        let raw_header = self.take(&mut cursor, header_size)?;
        let mut preview = DwgPreview::new(PreviewType::Unknown, raw_header, Vec::new());
        for (code, size) in images {
            preview.code = code;
            preview.raw_image = self.take(&mut cursor, size)?;
        }

        expect_sentinel(&mut cursor, &sentinels::PREVIEW_END, "preview end")?;
        Ok(preview)
    }

    fn take(&self, cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Vec<u8>> {
        let position = cursor.position();
        let end = position.saturating_add(size as u64);
        if end > self.data.len() as u64 {
            return Err(DwgError::OutOfBounds {
                position: end * 8,
                size: self.data.len() as u64,
            });
        }
        let mut bytes = vec![0u8; size];
        cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

fn expect_sentinel(cursor: &mut Cursor<&[u8]>, expected: &[u8; 16], what: &str) -> Result<()> {
    let mut found = [0u8; 16];
    cursor
        .read_exact(&mut found)
        .map_err(|_| DwgError::InvalidSentinel(what.to_string()))?;
    if &found != expected {
        return Err(DwgError::InvalidSentinel(what.to_string()));
    }
    Ok(())
}
