//! R2004+ file layout.
//!
//! ```text
//! 0x000  preamble (version, code page, masked metadata)
//! 0x100  data pages of every section, in the order added
//!        section map page
//!        page map page
//! ```
//!
//! Page numbers start at 1 and follow file order. The page map lists every
//! page with its on-disk size, itself included, so it is stored raw: its
//! size is then known before it is written.

use tracing::{debug, trace};

use super::FileHeaderWriter;
use crate::error::{DwgError, Result};
use crate::io::dwg::compression::{Compressor, Lz77Ac18Compressor};
use crate::io::dwg::constants::paged::{
    COMPRESSION_LZ77, COMPRESSION_NONE, PAGE_TYPE_DATA, PAGE_TYPE_PAGE_MAP,
    PAGE_TYPE_SECTION_MAP, PREAMBLE_SIZE,
};
use crate::io::dwg::constants::section_names;
use crate::io::dwg::encryption::PageHeader;
use crate::io::dwg::file_header::{
    write_page_map, write_section_map, FileMetadata, LocalSectionMap, PageMapEntry,
    PagedFileHeader, SectionDescriptor,
};
use crate::io::dwg::page::{page_size, write_page};
use crate::types::DwgVersion;

pub struct PagedFileWriter {
    header: PagedFileHeader,
    compress: bool,
    max_page_size: usize,
    /// Whole file; the preamble is filled in last
    output: Vec<u8>,
    pages: Vec<PageMapEntry>,
    sections: Vec<SectionDescriptor>,
    /// Id for the next section without a fixed one
    next_free_id: u32,
}

impl PagedFileWriter {
    pub fn new(
        version: DwgVersion,
        code_page: u16,
        maintenance_version: u8,
        compress: bool,
        max_page_size: usize,
    ) -> Result<Self> {
        if max_page_size == 0 || u32::try_from(max_page_size).is_err() {
            return Err(DwgError::Encode(format!("page size of {max_page_size} bytes")));
        }
        let mut header = PagedFileHeader::new(version);
        header.code_page = code_page;
        header.maintenance_version = maintenance_version;
        Ok(Self {
            header,
            compress,
            max_page_size,
            output: vec![0u8; PREAMBLE_SIZE],
            pages: Vec::new(),
            sections: Vec::new(),
            next_free_id: section_names::FIRST_FREE_SECTION_ID,
        })
    }

    fn compression(&self) -> u32 {
        if self.compress {
            COMPRESSION_LZ77
        } else {
            COMPRESSION_NONE
        }
    }

    fn next_page_number(&self) -> u32 {
        self.pages.len() as u32 + 1
    }

    /// Append one page and register it in the page map; returns its number.
    fn append_page(&mut self, header: PageHeader, stored: &[u8]) -> Result<u32> {
        let number = self.next_page_number();
        let start = self.output.len();
        write_page(&mut self.output, header, stored)?;
        let size = u32::try_from(self.output.len() - start)
            .map_err(|_| DwgError::Encode(format!("page {number} is too large")))?;
        trace!(number, offset = start, size, page_type = header.page_type, "page written");
        self.pages.push(PageMapEntry {
            number: number as i32,
            size,
        });
        Ok(number)
    }

    /// Compress `data` when enabled.
    fn stored_payload(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.compress {
            Lz77Ac18Compressor.compress(data)
        } else {
            Ok(data.to_vec())
        }
    }

    fn append_system_page(&mut self, page_type: u32, data: &[u8], compress: bool) -> Result<u32> {
        let stored = if compress {
            self.stored_payload(data)?
        } else {
            data.to_vec()
        };
        let header = PageHeader {
            page_type,
            decompressed_size: len_u32(data.len())?,
            compression: if compress {
                self.compression()
            } else {
                COMPRESSION_NONE
            },
            ..Default::default()
        };
        self.append_page(header, &stored)
    }
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| DwgError::Encode(format!("{len} bytes exceed a page field")))
}

impl FileHeaderWriter for PagedFileWriter {
    fn objects_offset(&self) -> u64 {
        0
    }

    fn add_section(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let section_id = match section_names::paged_section_id(name) {
            Some(id) => id,
            None => {
                self.next_free_id += 1;
                self.next_free_id - 1
            }
        };
        let mut descriptor = SectionDescriptor::new(name, section_id);
        descriptor.size = data.len() as u64;
        descriptor.max_page_size = self.max_page_size as u32;
        descriptor.compression = self.compression();

        for (i, chunk) in data.chunks(self.max_page_size).enumerate() {
            let start_offset = (i * self.max_page_size) as u64;
            let stored = self.stored_payload(chunk)?;
            let header = PageHeader {
                page_type: PAGE_TYPE_DATA,
                section_number: section_id,
                decompressed_size: len_u32(chunk.len())?,
                start_offset: u32::try_from(start_offset)
                    .map_err(|_| DwgError::Encode(format!("{name} exceeds 4 GiB")))?,
                compression: descriptor.compression,
                ..Default::default()
            };
            let page_number = self.append_page(header, &stored)?;
            descriptor.pages.push(LocalSectionMap {
                page_number,
                data_size: len_u32(chunk.len())?,
                start_offset,
            });
        }
        debug!(section = name, size = data.len(), pages = descriptor.pages.len(), "section paged");
        self.sections.push(descriptor);
        Ok(())
    }

    fn write_file(mut self: Box<Self>) -> Result<Vec<u8>> {
        let section_map = write_section_map(&self.sections)?;
        let section_map_id = self.append_system_page(PAGE_TYPE_SECTION_MAP, &section_map, true)?;

        // The page map lists itself: reserve its entry before encoding.
        let page_map_id = self.next_page_number();
        let page_map_offset = self.output.len() as u64;
        let map_len = (self.pages.len() + 1) * 8;
        self.pages.push(PageMapEntry {
            number: page_map_id as i32,
            size: len_u32(page_size(map_len))?,
        });
        let page_map = write_page_map(&self.pages)?;
        self.pages.pop();
        let written = self.append_system_page(PAGE_TYPE_PAGE_MAP, &page_map, false)?;
        debug_assert_eq!(written, page_map_id);

        let end = self.output.len() as u64;
        self.header.metadata = FileMetadata {
            last_page_id: page_map_id,
            last_page_end_address: end - PREAMBLE_SIZE as u64,
            page_amount: self.pages.len() as u32,
            page_map_id,
            page_map_address: page_map_offset - PREAMBLE_SIZE as u64,
            section_map_id,
            page_array_size: self.pages.len() as u32 + 1,
            ..Default::default()
        };
        debug!(
            pages = self.pages.len(),
            section_map_id,
            page_map_id,
            bytes = end,
            "paged file assembled"
        );
        let preamble = self.header.to_bytes()?;
        self.output[..PREAMBLE_SIZE].copy_from_slice(&preamble);
        Ok(self.output)
    }
}
