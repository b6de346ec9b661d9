//! One page of a logical section in the paged layout.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::Result;

/// Where a page of a section lives and which part of the section it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalSectionMap {
    /// Page number in the page map
    pub page_number: u32,
    /// Decompressed bytes the page contributes to the section
    pub data_size: u32,
    /// Offset of the page's decompressed bytes within the section
    pub start_offset: u64,
}

impl LocalSectionMap {
    /// Bytes per entry in the section map.
    pub const ENCODED_SIZE: usize = 16;

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            page_number: reader.read_u32::<LittleEndian>()?,
            data_size: reader.read_u32::<LittleEndian>()?,
            start_offset: reader.read_u64::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.page_number)?;
        writer.write_u32::<LittleEndian>(self.data_size)?;
        writer.write_u64::<LittleEndian>(self.start_offset)?;
        Ok(())
    }
}
