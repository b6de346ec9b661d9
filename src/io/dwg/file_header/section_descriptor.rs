//! Section map of the paged layout.
//!
//! The section map page lists every logical section with its pages:
//!
//! ```text
//! RL count, RL 2, RL 0x7400, RL 0, RL count
//! per section:
//!   RLL size, RL page count, RL max page size, RL 1, RL compression,
//!   RL section id, RL encrypted, 64-byte name
//!   per page: RL page number, RL data size, RLL start offset
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

use super::local_section_map::LocalSectionMap;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::paged::{COMPRESSION_LZ77, MAX_PAGE_SIZE, SECTION_NAME_SIZE};

/// One logical section and the pages it is split into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub name: String,
    pub section_id: u32,
    /// Decompressed size of the whole section.
    pub size: u64,
    pub max_page_size: u32,
    /// 1 = raw, 2 = compressed
    pub compression: u32,
    pub encrypted: u32,
    pub pages: Vec<LocalSectionMap>,
}

impl SectionDescriptor {
    pub fn new(name: &str, section_id: u32) -> Self {
        Self {
            name: name.to_string(),
            section_id,
            size: 0,
            max_page_size: MAX_PAGE_SIZE as u32,
            compression: COMPRESSION_LZ77,
            encrypted: 0,
            pages: Vec::new(),
        }
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let size = reader.read_u64::<LittleEndian>()?;
        let page_count = reader.read_u32::<LittleEndian>()?;
        let max_page_size = reader.read_u32::<LittleEndian>()?;
        reader.read_u32::<LittleEndian>()?;
        let compression = reader.read_u32::<LittleEndian>()?;
        let section_id = reader.read_u32::<LittleEndian>()?;
        let encrypted = reader.read_u32::<LittleEndian>()?;
        let mut raw_name = [0u8; SECTION_NAME_SIZE];
        reader.read_exact(&mut raw_name)?;
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(SECTION_NAME_SIZE);
        let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

        let mut pages = Vec::new();
        for _ in 0..page_count {
            pages.push(LocalSectionMap::read_from(reader)?);
        }
        Ok(Self {
            name,
            section_id,
            size,
            max_page_size,
            compression,
            encrypted,
            pages,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.name.len() >= SECTION_NAME_SIZE {
            return Err(DwgError::Encode(format!("section name {:?} is too long", self.name)));
        }
        writer.write_u64::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.pages.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.max_page_size)?;
        writer.write_u32::<LittleEndian>(1)?;
        writer.write_u32::<LittleEndian>(self.compression)?;
        writer.write_u32::<LittleEndian>(self.section_id)?;
        writer.write_u32::<LittleEndian>(self.encrypted)?;
        let mut raw_name = [0u8; SECTION_NAME_SIZE];
        raw_name[..self.name.len()].copy_from_slice(self.name.as_bytes());
        writer.write_all(&raw_name)?;
        for page in &self.pages {
            page.write_to(writer)?;
        }
        Ok(())
    }
}

/// Decode a section map page payload.
pub fn read_section_map(data: &[u8]) -> Result<Vec<SectionDescriptor>> {
    let mut cursor = Cursor::new(data);
    let count = cursor.read_u32::<LittleEndian>()?;
    for _ in 0..4 {
        cursor.read_u32::<LittleEndian>()?;
    }
    // Each descriptor takes at least 96 bytes; reject counts the page cannot hold.
    if count as usize > data.len() / 96 {
        return Err(DwgError::Parse(format!("section map claims {count} sections")));
    }
    let mut sections = Vec::with_capacity(count as usize);
    for _ in 0..count {
        sections.push(SectionDescriptor::read_from(&mut cursor)?);
    }
    Ok(sections)
}

/// Encode a section map page payload.
pub fn write_section_map(sections: &[SectionDescriptor]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let count = sections.len() as u32;
    out.write_u32::<LittleEndian>(count)?;
    out.write_u32::<LittleEndian>(2)?;
    out.write_u32::<LittleEndian>(MAX_PAGE_SIZE as u32)?;
    out.write_u32::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(count)?;
    for section in sections {
        section.write_to(&mut out)?;
    }
    Ok(out)
}

/// Entry of the page map: page number and on-disk size, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMapEntry {
    pub number: i32,
    pub size: u32,
}

/// Decode a page map payload.
pub fn read_page_map(data: &[u8]) -> Result<Vec<PageMapEntry>> {
    let mut cursor = Cursor::new(data);
    let mut entries = Vec::with_capacity(data.len() / 8);
    while (cursor.position() as usize) + 8 <= data.len() {
        let number = cursor.read_i32::<LittleEndian>()?;
        let size = cursor.read_u32::<LittleEndian>()?;
        entries.push(PageMapEntry { number, size });
    }
    Ok(entries)
}

/// Encode a page map payload.
pub fn write_page_map(entries: &[PageMapEntry]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(entries.len() * 8);
    for entry in entries {
        out.write_i32::<LittleEndian>(entry.number)?;
        out.write_u32::<LittleEndian>(entry.size)?;
    }
    Ok(out)
}
