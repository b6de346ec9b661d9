//! DWG file header structures.
//!
//! Pre-2004 files start with a [`FlatFileHeader`] that locates each section
//! by file offset. R2004 and later start with a [`PagedFileHeader`] whose
//! metadata leads to the page map and section map. Pre-2004 files repeat
//! their header after the object map as a [`SecondFileHeader`].

mod flat;
mod local_section_map;
mod paged;
mod second_header;
mod section_descriptor;
mod section_locator;

pub use flat::FlatFileHeader;
pub use local_section_map::LocalSectionMap;
pub use paged::{FileMetadata, PagedFileHeader};
pub use second_header::{SecondFileHeader, SEED_VARIABLES};
pub use section_descriptor::{
    read_page_map, read_section_map, write_page_map, write_section_map, PageMapEntry,
    SectionDescriptor,
};
pub use section_locator::SectionLocatorRecord;

use crate::error::{DwgError, Result};
use crate::types::DwgVersion;

/// File header, by layout family.
#[derive(Debug, Clone, PartialEq)]
pub enum DwgFileHeader {
    Flat(FlatFileHeader),
    Paged(PagedFileHeader),
}

impl DwgFileHeader {
    /// Read the version tag and parse the matching header.
    pub fn parse(data: &[u8], verify_crc: bool) -> Result<Self> {
        let tag = data.get(..6).ok_or_else(|| {
            DwgError::InvalidHeader(format!("file of {} bytes has no version tag", data.len()))
        })?;
        let version = DwgVersion::from_tag(tag)?;
        if version.is_paged() {
            Ok(DwgFileHeader::Paged(PagedFileHeader::parse(data, verify_crc)?))
        } else {
            Ok(DwgFileHeader::Flat(FlatFileHeader::parse(data)?))
        }
    }

    pub fn version(&self) -> DwgVersion {
        match self {
            DwgFileHeader::Flat(h) => h.version,
            DwgFileHeader::Paged(h) => h.version,
        }
    }

    pub fn maintenance_version(&self) -> u8 {
        match self {
            DwgFileHeader::Flat(h) => h.maintenance_version,
            DwgFileHeader::Paged(h) => h.maintenance_version,
        }
    }

    pub fn code_page(&self) -> u16 {
        match self {
            DwgFileHeader::Flat(h) => h.code_page,
            DwgFileHeader::Paged(h) => h.code_page,
        }
    }
}
