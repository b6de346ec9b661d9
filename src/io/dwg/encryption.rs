//! Masking of paged-layout headers.
//!
//! Two XOR schemes are used by R2004+ files:
//!
//! 1. The 0x6C-byte file metadata block at 0x80 is XORed with a fixed
//!    256-byte sequence produced by a linear congruential generator.
//! 2. Each 32-byte page header is XORed field by field with
//!    `0x4164536B ^ page_offset`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use once_cell::sync::Lazy;
use std::io::Cursor;

use super::checksum::page_checksum;
use super::constants::paged::PAGE_HEADER_MASK;
use crate::error::Result;

/// Size of an encoded page header.
pub const PAGE_HEADER_SIZE: usize = 32;

/// XOR sequence for the file metadata block.
pub static MAGIC_SEQUENCE: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut seed: u32 = 1;
    let mut sequence = [0u8; 256];
    for b in sequence.iter_mut() {
        seed = seed.wrapping_mul(0x343FD).wrapping_add(0x269EC3);
        *b = (seed >> 16) as u8;
    }
    sequence
});

/// XOR `data` in place with the magic sequence.
pub fn apply_magic_sequence(data: &mut [u8]) {
    for (b, m) in data.iter_mut().zip(MAGIC_SEQUENCE.iter()) {
        *b ^= m;
    }
}

/// Header that starts every page of the paged layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageHeader {
    /// Page kind: data, page map or section map.
    pub page_type: u32,
    /// Section this page belongs to (0 for system pages).
    pub section_number: u32,
    /// Stored payload size in bytes.
    pub compressed_size: u32,
    /// Payload size after decompression.
    pub decompressed_size: u32,
    /// Offset of this page's data within its logical section.
    pub start_offset: u32,
    /// Checksum of the header with this field zeroed, seeded with `data_checksum`.
    pub header_checksum: u32,
    /// Checksum of the stored payload.
    pub data_checksum: u32,
    /// 1 = stored raw, 2 = compressed.
    pub compression: u32,
}

impl PageHeader {
    fn fields(&self) -> [u32; 8] {
        [
            self.page_type,
            self.section_number,
            self.compressed_size,
            self.decompressed_size,
            self.start_offset,
            self.header_checksum,
            self.data_checksum,
            self.compression,
        ]
    }

    fn to_plain_bytes(self) -> Result<[u8; PAGE_HEADER_SIZE]> {
        let mut out = [0u8; PAGE_HEADER_SIZE];
        let mut cursor = Cursor::new(&mut out[..]);
        for field in self.fields() {
            cursor.write_u32::<LittleEndian>(field)?;
        }
        Ok(out)
    }

    /// Fill in both checksums for `payload`.
    pub fn seal(&mut self, payload: &[u8]) -> Result<()> {
        self.data_checksum = page_checksum(0, payload);
        self.header_checksum = 0;
        let plain = self.to_plain_bytes()?;
        self.header_checksum = page_checksum(self.data_checksum, &plain);
        Ok(())
    }

    /// Whether the stored checksums match this header and `payload`.
    pub fn verify(&self, payload: &[u8]) -> Result<bool> {
        let mut expected = *self;
        expected.seal(payload)?;
        Ok(expected.data_checksum == self.data_checksum
            && expected.header_checksum == self.header_checksum)
    }

    /// Encode and mask for a page that starts at `page_offset`.
    pub fn encrypt(&self, page_offset: u64) -> Result<[u8; PAGE_HEADER_SIZE]> {
        let mask = PAGE_HEADER_MASK ^ page_offset as u32;
        let mut out = [0u8; PAGE_HEADER_SIZE];
        let mut cursor = Cursor::new(&mut out[..]);
        for field in self.fields() {
            cursor.write_u32::<LittleEndian>(field ^ mask)?;
        }
        Ok(out)
    }

    /// Unmask and decode a header read from `page_offset`.
    pub fn decrypt(data: &[u8], page_offset: u64) -> Result<Self> {
        let mask = PAGE_HEADER_MASK ^ page_offset as u32;
        let mut cursor = Cursor::new(data);
        let mut next = || -> Result<u32> { Ok(cursor.read_u32::<LittleEndian>()? ^ mask) };
        Ok(Self {
            page_type: next()?,
            section_number: next()?,
            compressed_size: next()?,
            decompressed_size: next()?,
            start_offset: next()?,
            header_checksum: next()?,
            data_checksum: next()?,
            compression: next()?,
        })
    }
}
