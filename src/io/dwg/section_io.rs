//! Sentinel-framed sections.
//!
//! The header variables and class table are wrapped the same way in every
//! revision:
//!
//! ```text
//! start sentinel | RL size | [RL 0] | size bytes | RS CRC | end sentinel
//! ```
//!
//! The extra RL is present for R2010 from maintenance release 4 and for every
//! revision after R2013. The CRC covers the size fields and the data.

use byteorder::{ByteOrder, LittleEndian};

use super::constants::sentinels;
use super::crc::{crc8, SECTION_SEED};
use crate::error::{DwgError, Result};
use crate::types::DwgVersion;

const SENTINEL_SIZE: usize = 16;

/// Whether a framed section carries the extra size word.
pub fn has_extra_size(version: DwgVersion, maintenance_version: u8) -> bool {
    (version >= DwgVersion::AC1024 && maintenance_version > 3) || version > DwgVersion::AC1027
}

/// Version context shared by the framed section readers and writers.
#[derive(Debug, Clone, Copy)]
pub struct SectionIO {
    pub version: DwgVersion,
    pub maintenance_version: u8,
}

impl SectionIO {
    pub fn new(version: DwgVersion, maintenance_version: u8) -> Self {
        Self {
            version,
            maintenance_version,
        }
    }

    fn prefix_size(&self) -> usize {
        if has_extra_size(self.version, self.maintenance_version) {
            8
        } else {
            4
        }
    }

    /// Unwrap the section `name` from `data` and return its body.
    pub fn read_framed<'a>(&self, name: &str, data: &'a [u8], verify_crc: bool) -> Result<&'a [u8]> {
        let (start, end) = sentinels::pair(name)
            .ok_or_else(|| DwgError::Parse(format!("{name} is not a framed section")))?;
        let truncated = |needed: usize| DwgError::OutOfBounds {
            position: needed as u64 * 8,
            size: data.len() as u64,
        };

        if data.get(..SENTINEL_SIZE).ok_or_else(|| truncated(SENTINEL_SIZE))? != start {
            return Err(DwgError::InvalidSentinel(format!("{name} start")));
        }
        let body_start = SENTINEL_SIZE + self.prefix_size();
        if data.len() < body_start {
            return Err(truncated(body_start));
        }
        let size = LittleEndian::read_u32(&data[SENTINEL_SIZE..]) as usize;
        let body_end = body_start
            .checked_add(size)
            .filter(|&e| e + 2 + SENTINEL_SIZE <= data.len())
            .ok_or_else(|| truncated(body_start.saturating_add(size) + 2 + SENTINEL_SIZE))?;

        let stored = LittleEndian::read_u16(&data[body_end..]);
        if verify_crc {
            let actual = crc8(SECTION_SEED, &data[SENTINEL_SIZE..body_end]);
            if actual != stored {
                return Err(DwgError::ChecksumMismatch {
                    expected: stored as u32,
                    actual: actual as u32,
                });
            }
        }
        if &data[body_end + 2..body_end + 2 + SENTINEL_SIZE] != end {
            return Err(DwgError::InvalidSentinel(format!("{name} end")));
        }
        Ok(&data[body_start..body_end])
    }

    /// Wrap `body` as the section `name`.
    pub fn write_framed(&self, name: &str, body: &[u8]) -> Result<Vec<u8>> {
        let (start, end) = sentinels::pair(name)
            .ok_or_else(|| DwgError::Encode(format!("{name} is not a framed section")))?;
        let size = u32::try_from(body.len())
            .map_err(|_| DwgError::Encode(format!("{name} of {} bytes", body.len())))?;

        let mut out = Vec::with_capacity(body.len() + 2 * SENTINEL_SIZE + 10);
        out.extend_from_slice(start);
        out.extend_from_slice(&size.to_le_bytes());
        if self.prefix_size() == 8 {
            out.extend_from_slice(&0u32.to_le_bytes());
        }
        out.extend_from_slice(body);
        let crc = crc8(SECTION_SEED, &out[SENTINEL_SIZE..]);
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(end);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::constants::section_names;

    #[test]
    fn test_extra_size_rule() {
        assert!(!has_extra_size(DwgVersion::AC1015, 9));
        assert!(!has_extra_size(DwgVersion::AC1024, 3));
        assert!(has_extra_size(DwgVersion::AC1024, 4));
        assert!(has_extra_size(DwgVersion::AC1027, 8));
        assert!(!has_extra_size(DwgVersion::AC1021, 8));
        assert!(has_extra_size(DwgVersion::AC1032, 0));
    }

    #[test]
    fn test_framed_roundtrip() {
        for (version, maintenance) in [(DwgVersion::AC1015, 0), (DwgVersion::AC1032, 0)] {
            let io = SectionIO::new(version, maintenance);
            let framed = io.write_framed(section_names::CLASSES, b"class data").unwrap();
            assert_eq!(&framed[..16], &sentinels::CLASSES_START);
            let body = io.read_framed(section_names::CLASSES, &framed, true).unwrap();
            assert_eq!(body, b"class data");
        }
    }

    #[test]
    fn test_crc_mismatch() {
        let io = SectionIO::new(DwgVersion::AC1018, 0);
        let mut framed = io.write_framed(section_names::HEADER, &[1, 2, 3, 4]).unwrap();
        framed[21] ^= 0x80;
        assert!(matches!(
            io.read_framed(section_names::HEADER, &framed, true),
            Err(DwgError::ChecksumMismatch { .. })
        ));
        assert!(io.read_framed(section_names::HEADER, &framed, false).is_ok());
    }

    #[test]
    fn test_wrong_sentinel() {
        let io = SectionIO::new(DwgVersion::AC1018, 0);
        let framed = io.write_framed(section_names::HEADER, &[9; 8]).unwrap();
        assert!(matches!(
            io.read_framed(section_names::CLASSES, &framed, true),
            Err(DwgError::InvalidSentinel(_))
        ));
    }

    #[test]
    fn test_size_past_end() {
        let io = SectionIO::new(DwgVersion::AC1015, 0);
        let mut framed = io.write_framed(section_names::HEADER, &[0; 4]).unwrap();
        framed[16] = 0xFF;
        assert!(matches!(
            io.read_framed(section_names::HEADER, &framed, true),
            Err(DwgError::OutOfBounds { .. })
        ));
    }
}
