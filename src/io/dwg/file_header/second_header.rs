//! Repeated file header written after the object map of pre-2004 files.
//!
//! ```text
//! start sentinel
//! RL   size
//! BL   address of the start sentinel
//! 6 RC version tag, 5 RC zero, 4 B zero
//! 6 RC 0F 14 64 78 01 06
//! 6 x  RC number, BL seeker, BL size
//! BS   handle count, per handle RC size, RC index, big-endian value bytes
//! RS   CRC from the size field on, seeded 0xC0C1, after byte alignment
//! RL 0, RL 0
//! end sentinel
//! ```

use byteorder::{LittleEndian, WriteBytesExt};

use super::section_locator::SectionLocatorRecord;
use crate::error::{DwgError, Result};
use crate::header::{HeaderValue, HeaderVariables};
use crate::io::dwg::constants::{flat, sentinels};
use crate::io::dwg::crc::{crc8, SECTION_SEED};
use crate::io::dwg::reader::stream_reader::DwgStreamReader;
use crate::io::dwg::writer::stream_writer::DwgStreamWriter;
use crate::types::DwgVersion;

const FIXED: [u8; 6] = [0x0F, 0x14, 0x64, 0x78, 0x01, 0x06];

/// Header variables repeated in the handle list, by index.
pub const SEED_VARIABLES: [&str; 14] = [
    "HANDSEED",
    "BLOCK_CONTROL_OBJECT",
    "LAYER_CONTROL_OBJECT",
    "STYLE_CONTROL_OBJECT",
    "LINETYPE_CONTROL_OBJECT",
    "VIEW_CONTROL_OBJECT",
    "UCS_CONTROL_OBJECT",
    "VPORT_CONTROL_OBJECT",
    "APPID_CONTROL_OBJECT",
    "DIMSTYLE_CONTROL_OBJECT",
    "VP_ENT_HDR_CONTROL_OBJECT",
    "DICTIONARY_NAMED_OBJECTS",
    "DICTIONARY_ACAD_MLINESTYLE",
    "DICTIONARY_ACAD_GROUP",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondFileHeader {
    pub version: DwgVersion,
    /// File offset of the start sentinel.
    pub address: u32,
    pub records: Vec<SectionLocatorRecord>,
    /// `(index, value)` pairs; the index names a [`SEED_VARIABLES`] entry.
    pub handles: Vec<(u8, u64)>,
}

impl SecondFileHeader {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            version,
            address: 0,
            records: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Handle list for `header`; HANDSEED is raised to `handle_seed`.
    pub fn seed_handles(header: &HeaderVariables, handle_seed: u64) -> Vec<(u8, u64)> {
        SEED_VARIABLES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let value = match header.get(name) {
                    Some(HeaderValue::LongLong(seed)) => *seed,
                    Some(HeaderValue::Handle(reference)) => reference.absolute().value(),
                    _ => 0,
                };
                let value = if index == 0 { value.max(handle_seed) } else { value };
                (index as u8, value)
            })
            .collect()
    }

    /// Value stored for the header variable `name`.
    pub fn handle(&self, name: &str) -> Option<u64> {
        let index = SEED_VARIABLES.iter().position(|n| *n == name)? as u8;
        self.handles.iter().find(|(i, _)| *i == index).map(|(_, v)| *v)
    }

    /// Offset of the first start sentinel at or after `from`.
    pub fn find(data: &[u8], from: usize) -> Option<usize> {
        data.get(from..)?
            .windows(16)
            .position(|w| w == sentinels::SECOND_HEADER_START)
            .map(|p| from + p)
    }

    /// Parse the structure starting at the start sentinel.
    pub fn parse(data: &[u8], version: DwgVersion) -> Result<Self> {
        if data.get(..16) != Some(&sentinels::SECOND_HEADER_START[..]) {
            return Err(DwgError::InvalidSentinel("second file header start".into()));
        }
        let mut r = DwgStreamReader::new(data, version);
        r.set_position(16)?;
        let _size = r.read_raw_long()?;
        let address = r.read_bit_long()? as u32;
        let tag = r.read_bytes(6)?;
        if DwgVersion::from_tag(&tag)? != version {
            return Err(DwgError::Parse(format!(
                "second file header is tagged {}",
                String::from_utf8_lossy(&tag)
            )));
        }
        r.read_bytes(5)?;
        r.read_bits(4)?;
        let fixed = r.read_bytes(6)?;
        if fixed[3] != FIXED[3] || fixed[5] != FIXED[5] {
            r.read_byte()?;
        }

        let mut records = Vec::with_capacity(flat::MAX_RECORD_COUNT);
        for _ in 0..flat::MAX_RECORD_COUNT {
            let number = r.read_byte()?;
            let seeker = r.read_bit_long()? as u32;
            let size = r.read_bit_long()? as u32;
            records.push(SectionLocatorRecord::new(number, seeker, size));
        }

        let count = r.read_bit_short()?;
        let mut handles = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let size = r.read_byte()?;
            let index = r.read_byte()?;
            if size > 8 {
                return Err(DwgError::Parse(format!("handle {index} of {size} bytes")));
            }
            let value = r
                .read_bytes(size as usize)?
                .into_iter()
                .fold(0u64, |acc, b| (acc << 8) | b as u64);
            handles.push((index, value));
        }

        let crc_at = r.position_in_bits().div_ceil(8) as usize;
        r.set_position(crc_at)?;
        let stored = r.read_raw_ushort()?;
        let actual = crc8(SECTION_SEED, &data[16..crc_at]);
        if stored != actual {
            return Err(DwgError::ChecksumMismatch {
                expected: stored as u32,
                actual: actual as u32,
            });
        }
        r.read_raw_long()?;
        r.read_raw_long()?;
        if r.read_sentinel()? != sentinels::SECOND_HEADER_END {
            return Err(DwgError::InvalidSentinel("second file header end".into()));
        }

        Ok(Self {
            version,
            address,
            records,
            handles,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = DwgStreamWriter::new(self.version);
        w.write_sentinel(&sentinels::SECOND_HEADER_START);
        w.write_raw_long(0);
        w.write_bit_long(self.address as i32);
        w.write_bytes(self.version.tag().as_bytes());
        w.write_bytes(&[0; 5]);
        w.write_bits(0, 4);
        w.write_bytes(&FIXED);
        for number in 0..flat::MAX_RECORD_COUNT as u8 {
            let record = self
                .records
                .iter()
                .find(|r| r.number == number)
                .copied()
                .unwrap_or(SectionLocatorRecord::new(number, 0, 0));
            w.write_byte(record.number);
            w.write_bit_long(record.seeker as i32);
            w.write_bit_long(record.size as i32);
        }
        w.write_bit_short(self.handles.len() as i16);
        for (index, value) in &self.handles {
            let bytes = value.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            w.write_byte((8 - skip) as u8);
            w.write_byte(*index);
            w.write_bytes(&bytes[skip..]);
        }

        let mut out = w.into_bytes();
        let size = u32::try_from(out.len() - 16 + 10)
            .map_err(|_| DwgError::Encode("second file header is too large".into()))?;
        out[16..20].copy_from_slice(&size.to_le_bytes());
        let crc = crc8(SECTION_SEED, &out[16..]);
        out.write_u16::<LittleEndian>(crc)?;
        out.write_u32::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(0)?;
        out.extend_from_slice(&sentinels::SECOND_HEADER_END);
        Ok(out)
    }
}
