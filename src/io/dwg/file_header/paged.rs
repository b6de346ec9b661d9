//! File preamble of the paged layout (R2004 and later).
//!
//! The first 0x100 bytes hold a plain prefix and, at 0x80, a 0x6C-byte
//! metadata block masked with the magic sequence. The metadata locates the
//! page map; everything else is found through it.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

use crate::error::{DwgError, Result};
use crate::io::dwg::constants::paged::{FILE_ID, METADATA_OFFSET, METADATA_SIZE, PREAMBLE_SIZE};
use crate::io::dwg::crc::crc32;
use crate::io::dwg::encryption::{apply_magic_sequence, MAGIC_SEQUENCE};
use crate::types::DwgVersion;

const CRC_OFFSET: usize = 0x68;

/// Decrypted metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileMetadata {
    pub root_tree_gap: u32,
    pub left_gap: u32,
    pub right_gap: u32,
    pub last_page_id: u32,
    pub last_page_end_address: u64,
    /// Address of the repeated header at the end of the file.
    pub second_header_address: u64,
    pub gap_amount: u32,
    pub page_amount: u32,
    pub page_map_id: u32,
    /// Page map address, relative to the end of the preamble.
    pub page_map_address: u64,
    pub section_map_id: u32,
    pub page_array_size: u32,
    pub gap_array_size: u32,
    pub crc: u32,
}

impl FileMetadata {
    /// Absolute file offset of the page map.
    pub fn page_map_offset(&self) -> u64 {
        self.page_map_address + PREAMBLE_SIZE as u64
    }

    /// Decode an unmasked block.
    pub fn parse(plain: &[u8]) -> Result<Self> {
        if plain.len() < METADATA_SIZE {
            return Err(DwgError::InvalidHeader("metadata block is truncated".into()));
        }
        if &plain[..FILE_ID.len()] != FILE_ID {
            return Err(DwgError::InvalidHeader("file id mismatch in metadata block".into()));
        }
        let mut c = Cursor::new(&plain[..METADATA_SIZE]);
        c.set_position(0x18);
        let root_tree_gap = c.read_u32::<LittleEndian>()?;
        let left_gap = c.read_u32::<LittleEndian>()?;
        let right_gap = c.read_u32::<LittleEndian>()?;
        c.read_u32::<LittleEndian>()?;
        let last_page_id = c.read_u32::<LittleEndian>()?;
        let last_page_end_address = c.read_u64::<LittleEndian>()?;
        let second_header_address = c.read_u64::<LittleEndian>()?;
        let gap_amount = c.read_u32::<LittleEndian>()?;
        let page_amount = c.read_u32::<LittleEndian>()?;
        c.set_position(0x50);
        let page_map_id = c.read_u32::<LittleEndian>()?;
        let page_map_address = c.read_u64::<LittleEndian>()?;
        let section_map_id = c.read_u32::<LittleEndian>()?;
        let page_array_size = c.read_u32::<LittleEndian>()?;
        let gap_array_size = c.read_u32::<LittleEndian>()?;
        let crc = c.read_u32::<LittleEndian>()?;
        Ok(Self {
            root_tree_gap,
            left_gap,
            right_gap,
            last_page_id,
            last_page_end_address,
            second_header_address,
            gap_amount,
            page_amount,
            page_map_id,
            page_map_address,
            section_map_id,
            page_array_size,
            gap_array_size,
            crc,
        })
    }

    /// Encode without masking; the CRC field is computed.
    pub fn to_plain_bytes(&self) -> Result<[u8; METADATA_SIZE]> {
        let mut out = [0u8; METADATA_SIZE];
        {
            let mut c = Cursor::new(&mut out[..]);
            c.write_all(FILE_ID)?;
            c.write_u32::<LittleEndian>(0)?;
            c.write_u32::<LittleEndian>(METADATA_SIZE as u32)?;
            c.write_u32::<LittleEndian>(4)?;
            c.write_u32::<LittleEndian>(self.root_tree_gap)?;
            c.write_u32::<LittleEndian>(self.left_gap)?;
            c.write_u32::<LittleEndian>(self.right_gap)?;
            c.write_u32::<LittleEndian>(1)?;
            c.write_u32::<LittleEndian>(self.last_page_id)?;
            c.write_u64::<LittleEndian>(self.last_page_end_address)?;
            c.write_u64::<LittleEndian>(self.second_header_address)?;
            c.write_u32::<LittleEndian>(self.gap_amount)?;
            c.write_u32::<LittleEndian>(self.page_amount)?;
            c.write_u32::<LittleEndian>(0x20)?;
            c.write_u32::<LittleEndian>(0x80)?;
            c.write_u32::<LittleEndian>(0x40)?;
            c.write_u32::<LittleEndian>(self.page_map_id)?;
            c.write_u64::<LittleEndian>(self.page_map_address)?;
            c.write_u32::<LittleEndian>(self.section_map_id)?;
            c.write_u32::<LittleEndian>(self.page_array_size)?;
            c.write_u32::<LittleEndian>(self.gap_array_size)?;
        }
        let crc = crc32(0, &out);
        out[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        Ok(out)
    }

    /// Check the stored CRC against the unmasked block it was read from.
    pub fn verify_crc(&self, plain: &[u8]) -> Result<()> {
        let mut copy = [0u8; METADATA_SIZE];
        copy.copy_from_slice(&plain[..METADATA_SIZE]);
        copy[CRC_OFFSET..].fill(0);
        let actual = crc32(0, &copy);
        if actual != self.crc {
            return Err(DwgError::ChecksumMismatch {
                expected: self.crc,
                actual,
            });
        }
        Ok(())
    }
}

/// The 0x100-byte preamble.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedFileHeader {
    pub version: DwgVersion,
    pub maintenance_version: u8,
    pub preview_address: u32,
    pub app_version: u8,
    pub app_maintenance_version: u8,
    pub code_page: u16,
    pub security_flags: u32,
    pub summary_address: u32,
    pub vba_address: u32,
    pub metadata: FileMetadata,
}

impl PagedFileHeader {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            version,
            maintenance_version: 0,
            preview_address: 0,
            app_version: version.app_version(),
            app_maintenance_version: 0,
            code_page: 30,
            security_flags: 0,
            summary_address: 0,
            vba_address: 0,
            metadata: FileMetadata::default(),
        }
    }

    /// Parse the preamble; the metadata CRC is checked when `verify_crc` is set.
    pub fn parse(data: &[u8], verify_crc: bool) -> Result<Self> {
        if data.len() < PREAMBLE_SIZE {
            return Err(DwgError::InvalidHeader(format!(
                "file of {} bytes is too short for the paged preamble",
                data.len()
            )));
        }
        let version = DwgVersion::from_tag(&data[..6])?;
        let mut c = Cursor::new(data);
        c.set_position(0x0B);
        let maintenance_version = c.read_u8()?;
        c.read_u8()?;
        let preview_address = c.read_u32::<LittleEndian>()?;
        let app_version = c.read_u8()?;
        let app_maintenance_version = c.read_u8()?;
        let code_page = c.read_u16::<LittleEndian>()?;
        c.set_position(0x18);
        let security_flags = c.read_u32::<LittleEndian>()?;
        c.read_u32::<LittleEndian>()?;
        let summary_address = c.read_u32::<LittleEndian>()?;
        let vba_address = c.read_u32::<LittleEndian>()?;

        let mut plain = [0u8; METADATA_SIZE];
        plain.copy_from_slice(&data[METADATA_OFFSET..METADATA_OFFSET + METADATA_SIZE]);
        apply_magic_sequence(&mut plain);
        let metadata = FileMetadata::parse(&plain)?;
        if verify_crc {
            metadata.verify_crc(&plain)?;
        }

        Ok(Self {
            version,
            maintenance_version,
            preview_address,
            app_version,
            app_maintenance_version,
            code_page,
            security_flags,
            summary_address,
            vba_address,
            metadata,
        })
    }

    pub fn to_bytes(&self) -> Result<[u8; PREAMBLE_SIZE]> {
        let mut out = [0u8; PREAMBLE_SIZE];
        out[..6].copy_from_slice(self.version.tag().as_bytes());
        {
            let mut c = Cursor::new(&mut out[..]);
            c.set_position(0x0B);
            c.write_u8(self.maintenance_version)?;
            c.write_u8(3)?;
            c.write_u32::<LittleEndian>(self.preview_address)?;
            c.write_u8(self.app_version)?;
            c.write_u8(self.app_maintenance_version)?;
            c.write_u16::<LittleEndian>(self.code_page)?;
            c.set_position(0x18);
            c.write_u32::<LittleEndian>(self.security_flags)?;
            c.write_u32::<LittleEndian>(0)?;
            c.write_u32::<LittleEndian>(self.summary_address)?;
            c.write_u32::<LittleEndian>(self.vba_address)?;
            c.write_u32::<LittleEndian>(0x80)?;
        }
        let mut metadata = self.metadata.to_plain_bytes()?;
        apply_magic_sequence(&mut metadata);
        out[METADATA_OFFSET..METADATA_OFFSET + METADATA_SIZE].copy_from_slice(&metadata);
        // The tail of the block is the rest of the mask over zero bytes.
        let tail = METADATA_OFFSET + METADATA_SIZE;
        out[tail..].copy_from_slice(&MAGIC_SEQUENCE[METADATA_SIZE..METADATA_SIZE + PREAMBLE_SIZE - tail]);
        Ok(out)
    }
}
