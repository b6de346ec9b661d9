//! File header of the pre-2004 layout (R13, R14, R2000).
//!
//! ```text
//! 0x00  version tag (6 bytes)
//! 0x06  5 zero bytes, maintenance version, 0x01
//! 0x0D  RL preview address
//! 0x11  RC app version, RC app maintenance version
//! 0x13  RS code page
//! 0x15  RL record count, then the locator records
//!       RS CRC over everything before it, end sentinel
//! ```
//!
//! The CRC is seeded with 0 and XORed with a constant that depends on the
//! record count.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use super::section_locator::SectionLocatorRecord;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::{flat, sentinels};
use crate::io::dwg::crc::crc8;
use crate::types::DwgVersion;

/// Decoded pre-2004 file header.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatFileHeader {
    pub version: DwgVersion,
    pub maintenance_version: u8,
    pub preview_address: u32,
    pub app_version: u8,
    pub app_maintenance_version: u8,
    pub code_page: u16,
    pub records: Vec<SectionLocatorRecord>,
    /// CRC as stored in the file.
    pub crc: u16,
}

impl FlatFileHeader {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            version,
            maintenance_version: 0,
            preview_address: 0,
            app_version: version.app_version(),
            app_maintenance_version: 0,
            code_page: 30,
            records: Vec::new(),
            crc: 0,
        }
    }

    /// Bytes occupied by a header with `record_count` records.
    pub fn encoded_size(record_count: usize) -> usize {
        flat::RECORDS_OFFSET + record_count * flat::RECORD_SIZE + 2 + 16
    }

    pub fn size(&self) -> usize {
        Self::encoded_size(self.records.len())
    }

    /// Parse the header at the start of `data`.
    ///
    /// Checks the end sentinel; the CRC is checked by [`FlatFileHeader::verify_crc`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < flat::RECORDS_OFFSET {
            return Err(DwgError::InvalidHeader(format!(
                "file of {} bytes is too short for a file header",
                data.len()
            )));
        }
        let version = DwgVersion::from_tag(&data[..6])?;

        let mut cursor = Cursor::new(data);
        cursor.set_position(0x0B);
        let maintenance_version = cursor.read_u8()?;
        cursor.read_u8()?;
        let preview_address = cursor.read_u32::<LittleEndian>()?;
        let app_version = cursor.read_u8()?;
        let app_maintenance_version = cursor.read_u8()?;
        let code_page = cursor.read_u16::<LittleEndian>()?;
        let count = cursor.read_u32::<LittleEndian>()? as usize;

        let needed = Self::encoded_size(count);
        if needed > data.len() {
            return Err(DwgError::InvalidHeader(format!(
                "{count} section records do not fit a file of {} bytes",
                data.len()
            )));
        }
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            records.push(SectionLocatorRecord::read_from(&mut cursor)?);
        }
        let crc = cursor.read_u16::<LittleEndian>()?;

        let sentinel_start = cursor.position() as usize;
        if data[sentinel_start..sentinel_start + 16] != sentinels::FILE_HEADER_END {
            return Err(DwgError::InvalidSentinel("file header end".into()));
        }

        Ok(Self {
            version,
            maintenance_version,
            preview_address,
            app_version,
            app_maintenance_version,
            code_page,
            records,
            crc,
        })
    }

    /// Compare the stored CRC with the bytes it covers.
    pub fn verify_crc(&self, data: &[u8]) -> Result<()> {
        let covered = flat::RECORDS_OFFSET + self.records.len() * flat::RECORD_SIZE;
        let bytes = data.get(..covered).ok_or(DwgError::OutOfBounds {
            position: covered as u64 * 8,
            size: data.len() as u64,
        })?;
        let actual = Self::crc(bytes);
        if actual != self.crc {
            return Err(DwgError::ChecksumMismatch {
                expected: self.crc as u32,
                actual: actual as u32,
            });
        }
        Ok(())
    }

    /// CRC of the bytes before the CRC field, which include the record count.
    fn crc(bytes: &[u8]) -> u16 {
        let count = bytes
            .get(flat::RECORD_COUNT_OFFSET..flat::RECORDS_OFFSET)
            .map_or(0, |c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as usize);
        crc8(0, bytes) ^ flat::crc_mask(count)
    }

    /// Locator record with the given number.
    pub fn record(&self, number: u8) -> Option<&SectionLocatorRecord> {
        self.records.iter().find(|r| r.number == number)
    }

    /// Serialize, computing the CRC.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(self.version.tag().as_bytes());
        out.extend_from_slice(&[0u8; 5]);
        out.write_u8(self.maintenance_version)?;
        out.write_u8(1)?;
        out.write_u32::<LittleEndian>(self.preview_address)?;
        out.write_u8(self.app_version)?;
        out.write_u8(self.app_maintenance_version)?;
        out.write_u16::<LittleEndian>(self.code_page)?;
        out.write_u32::<LittleEndian>(self.records.len() as u32)?;
        for record in &self.records {
            record.write_to(&mut out)?;
        }
        let crc = Self::crc(&out);
        out.write_u16::<LittleEndian>(crc)?;
        out.extend_from_slice(&sentinels::FILE_HEADER_END);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatFileHeader {
        let mut header = FlatFileHeader::new(DwgVersion::AC1015);
        header.maintenance_version = 6;
        header.records = vec![
            SectionLocatorRecord::new(0, 0x3A, 0x100),
            SectionLocatorRecord::new(1, 0x13A, 0x40),
            SectionLocatorRecord::new(2, 0x400, 0x20),
        ];
        header
    }

    #[test]
    fn test_layout_offsets() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(&bytes[..6], b"AC1015");
        assert_eq!(bytes[0x0B], 6);
        assert_eq!(bytes[0x0C], 1);
        assert_eq!(bytes[0x11], DwgVersion::AC1015.app_version());
        assert_eq!(u16::from_le_bytes([bytes[0x13], bytes[0x14]]), 30);
        assert_eq!(bytes[0x15], 3);
        assert_eq!(bytes.len(), FlatFileHeader::encoded_size(3));
        assert_eq!(&bytes[bytes.len() - 16..], &sentinels::FILE_HEADER_END);
    }

    #[test]
    fn test_parse_written_header() {
        let bytes = sample().to_bytes().unwrap();
        let parsed = FlatFileHeader::parse(&bytes).unwrap();
        parsed.verify_crc(&bytes).unwrap();
        assert_eq!(parsed.records, sample().records);
        assert_eq!(parsed.record(1).map(|r| r.seeker), Some(0x13A));
        assert_eq!(parsed.code_page, 30);
    }

    #[test]
    fn test_crc_detects_corruption() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0x1A] ^= 0xFF;
        let parsed = FlatFileHeader::parse(&bytes).unwrap();
        assert!(matches!(
            parsed.verify_crc(&bytes),
            Err(DwgError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_crc_is_keyed_by_record_count() {
        let mut header = sample();
        let bytes = header.to_bytes().unwrap();
        let covered = flat::RECORDS_OFFSET + 3 * flat::RECORD_SIZE;
        let stored = u16::from_le_bytes([bytes[covered], bytes[covered + 1]]);
        assert_eq!(stored, crc8(0, &bytes[..covered]) ^ 0xA598);

        header.records.push(SectionLocatorRecord::new(3, 0, 0));
        header.records.push(SectionLocatorRecord::new(4, 0x500, 4));
        header.records.push(SectionLocatorRecord::new(5, 0x3A, 0x35));
        let bytes = header.to_bytes().unwrap();
        let covered = flat::RECORDS_OFFSET + 6 * flat::RECORD_SIZE;
        let stored = u16::from_le_bytes([bytes[covered], bytes[covered + 1]]);
        assert_eq!(stored, crc8(0, &bytes[..covered]) ^ 0x8461);
        FlatFileHeader::parse(&bytes).unwrap().verify_crc(&bytes).unwrap();
    }

    #[test]
    fn test_truncated_header() {
        let bytes = sample().to_bytes().unwrap();
        assert!(FlatFileHeader::parse(&bytes[..0x20]).is_err());
        assert!(FlatFileHeader::parse(b"AC10").is_err());
    }

    #[test]
    fn test_bad_sentinel() {
        let mut bytes = sample().to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        assert!(matches!(
            FlatFileHeader::parse(&bytes),
            Err(DwgError::InvalidSentinel(_))
        ));
    }
}
