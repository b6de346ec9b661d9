//! Logical section buffers.
//!
//! Turns the on-disk layout into one contiguous buffer per named section,
//! whatever the revision. Pre-2004 files are addressed through the locator
//! records of the file header; R2004+ files through the page map and the
//! section map, with every data page repaired, verified and decompressed.

use std::borrow::Cow;

use ahash::AHashMap;
use tracing::debug;

use super::context::DecodeContext;
use crate::error::{DwgError, Result};
use crate::io::dwg::compression::{Decompressor, Lz77Ac18Decompressor};
use crate::io::dwg::constants::paged::{
    COMPRESSION_LZ77, PAGE_TYPE_DATA, PAGE_TYPE_PAGE_MAP, PAGE_TYPE_SECTION_MAP, PREAMBLE_SIZE,
};
use crate::io::dwg::constants::section_names;
use crate::io::dwg::file_header::{
    read_page_map, read_section_map, DwgFileHeader, FlatFileHeader, PagedFileHeader,
    SectionDescriptor,
};
use crate::io::dwg::page::{read_page, Page};
use crate::notification::NotificationType;

/// Source of logical section buffers for one file.
#[derive(Debug)]
pub enum SectionFramer<'a> {
    Flat {
        data: &'a [u8],
        header: &'a FlatFileHeader,
    },
    Paged {
        data: &'a [u8],
        /// Page number to absolute file offset
        pages: AHashMap<i32, u64>,
        sections: Vec<SectionDescriptor>,
    },
}

impl<'a> SectionFramer<'a> {
    /// Prepare section access; for paged files this reads both system pages.
    pub fn new(data: &'a [u8], header: &'a DwgFileHeader, ctx: &mut DecodeContext) -> Result<Self> {
        match header {
            DwgFileHeader::Flat(header) => Ok(SectionFramer::Flat { data, header }),
            DwgFileHeader::Paged(header) => Self::paged(data, header, ctx),
        }
    }

    fn paged(data: &'a [u8], header: &PagedFileHeader, ctx: &mut DecodeContext) -> Result<Self> {
        let map_offset = header.metadata.page_map_offset();
        let page_map = read_system_page(data, map_offset, PAGE_TYPE_PAGE_MAP, ctx)
            .map_err(|e| e.in_section("page map"))?;
        let entries = read_page_map(&page_map).map_err(|e| e.in_section("page map"))?;

        let mut pages = AHashMap::with_capacity(entries.len());
        let mut offset = PREAMBLE_SIZE as u64;
        for entry in &entries {
            // Negative numbers mark gaps; they still take up space.
            if entry.number >= 0 {
                pages.insert(entry.number, offset);
            }
            offset += u64::from(entry.size);
        }
        debug!(pages = pages.len(), "page map");

        let section_map_id = header.metadata.section_map_id as i32;
        let section_map_offset = *pages.get(&section_map_id).ok_or_else(|| {
            DwgError::Parse(format!("section map page {section_map_id} is not in the page map"))
                .in_section("section map")
        })?;
        let section_map =
            read_system_page(data, section_map_offset, PAGE_TYPE_SECTION_MAP, ctx)
                .map_err(|e| e.in_section("section map"))?;
        let sections = read_section_map(&section_map).map_err(|e| e.in_section("section map"))?;
        for section in &sections {
            debug!(
                name = %section.name,
                id = section.section_id,
                size = section.size,
                pages = section.pages.len(),
                "section"
            );
        }

        Ok(SectionFramer::Paged {
            data,
            pages,
            sections,
        })
    }

    /// Whether the file has a section called `name`.
    pub fn has_section(&self, name: &str) -> bool {
        match self {
            SectionFramer::Flat { header, .. } => {
                name == section_names::OBJECTS
                    || section_names::locator_number(name)
                        .and_then(|n| header.record(n))
                        .is_some()
            }
            SectionFramer::Paged { sections, .. } => sections.iter().any(|s| s.name == name),
        }
    }

    /// Names of the sections present, in file order.
    ///
    /// Pre-2004 files list their non-empty locator records; the objects
    /// section has no record there.
    pub fn names(&self) -> Vec<&str> {
        match self {
            SectionFramer::Flat { header, .. } => header
                .records
                .iter()
                .filter(|r| r.size > 0)
                .filter_map(|r| section_names::locator_name(r.number))
                .collect(),
            SectionFramer::Paged { sections, .. } => {
                sections.iter().map(|s| s.name.as_str()).collect()
            }
        }
    }

    /// Decoded bytes of section `name`.
    ///
    /// Pre-2004 sections borrow from the file; the objects "section" is the
    /// whole file since object offsets are absolute there.
    pub fn section(&self, name: &str, ctx: &mut DecodeContext) -> Result<Cow<'a, [u8]>> {
        match self {
            SectionFramer::Flat { data, header } => {
                if name == section_names::OBJECTS {
                    return Ok(Cow::Borrowed(data));
                }
                let record = section_names::locator_number(name)
                    .and_then(|n| header.record(n))
                    .ok_or_else(|| DwgError::MissingSection(name.to_string()))?;
                let range = record.range(data.len()).ok_or_else(|| {
                    DwgError::OutOfBounds {
                        position: (u64::from(record.seeker) + u64::from(record.size)) * 8,
                        size: data.len() as u64,
                    }
                    .in_section(name)
                })?;
                Ok(Cow::Borrowed(&data[range]))
            }
            SectionFramer::Paged {
                data,
                pages,
                sections,
            } => {
                let descriptor = sections
                    .iter()
                    .find(|s| s.name == name)
                    .ok_or_else(|| DwgError::MissingSection(name.to_string()))?;
                read_paged_section(data, pages, descriptor, ctx)
                    .map(Cow::Owned)
                    .map_err(|e| e.in_section(name))
            }
        }
    }
}

fn read_system_page(
    data: &[u8],
    offset: u64,
    page_type: u32,
    ctx: &mut DecodeContext,
) -> Result<Vec<u8>> {
    let page = load_page(data, offset, ctx)?;
    if page.header.page_type != page_type {
        return Err(DwgError::Parse(format!(
            "page at {offset:#X} has type {:#X}, expected {page_type:#X}",
            page.header.page_type
        )));
    }
    let size = page.header.decompressed_size as usize;
    if page.header.compression == COMPRESSION_LZ77 {
        Lz77Ac18Decompressor.decompress(&page.payload, size)
    } else {
        Ok(page.payload)
    }
}

fn read_paged_section(
    data: &[u8],
    pages: &AHashMap<i32, u64>,
    descriptor: &SectionDescriptor,
    ctx: &mut DecodeContext,
) -> Result<Vec<u8>> {
    let size = usize::try_from(descriptor.size)
        .map_err(|_| DwgError::Parse(format!("section of {} bytes", descriptor.size)))?;
    if size > data.len().saturating_mul(16) {
        return Err(DwgError::Parse(format!(
            "section claims {size} bytes in a file of {}",
            data.len()
        )));
    }
    let mut buffer = vec![0u8; size];

    for local in &descriptor.pages {
        let number = local.page_number as i32;
        let offset = *pages
            .get(&number)
            .ok_or_else(|| DwgError::Parse(format!("page {number} is not in the page map")))?;
        let page = load_page(data, offset, ctx)?;
        if page.header.page_type != PAGE_TYPE_DATA {
            return Err(DwgError::Parse(format!(
                "page {number} has type {:#X}, expected a data page",
                page.header.page_type
            )));
        }
        if page.header.section_number != descriptor.section_id {
            return Err(DwgError::Parse(format!(
                "page {number} belongs to section {}, expected {}",
                page.header.section_number, descriptor.section_id
            )));
        }

        let expected = local.data_size as usize;
        let bytes = if descriptor.compression == COMPRESSION_LZ77 {
            Lz77Ac18Decompressor.decompress(&page.payload, expected)?
        } else {
            page.payload
        };
        if bytes.len() != expected {
            return Err(DwgError::Parse(format!(
                "page {number} holds {} bytes, expected {expected}",
                bytes.len()
            )));
        }

        let start = usize::try_from(local.start_offset).unwrap_or(usize::MAX);
        let target = start
            .checked_add(expected)
            .and_then(|end| buffer.get_mut(start..end))
            .ok_or(DwgError::OutOfBounds {
                position: local.start_offset.saturating_add(expected as u64) * 8,
                size: size as u64,
            })?;
        target.copy_from_slice(&bytes);
    }
    Ok(buffer)
}

fn load_page(data: &[u8], offset: u64, ctx: &mut DecodeContext) -> Result<Page> {
    let page = read_page(data, offset, ctx.verify_crc)?;
    if page.corrected > 0 {
        ctx.notify(
            NotificationType::Warning,
            format!("corrected {} bytes of the page at {offset:#X}", page.corrected),
        );
    }
    Ok(page)
}
