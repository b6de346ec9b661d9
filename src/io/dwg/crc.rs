//! Checksums used by the pre-2004 sections and the paged file header.
//!
//! - The DWG "CRC-8" is a 16-bit CRC (reflected polynomial 0xA001) used for
//!   the file header, header/classes sections, object records and object
//!   map chunks. Sections seed it with 0xC0C1.
//! - CRC-32 (reflected 0xEDB88320) protects the paged-layout metadata block.

/// Seed used for every section-level CRC-8.
pub const SECTION_SEED: u16 = 0xC0C1;

const fn build_crc8_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn build_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC8_TABLE: [u16; 256] = build_crc8_table();
static CRC32_TABLE: [u32; 256] = build_crc32_table();

/// DWG CRC-8 (16-bit result) over `data`, continuing from `seed`.
pub fn crc8(seed: u16, data: &[u8]) -> u16 {
    data.iter().fold(seed, |crc, &byte| {
        (crc >> 8) ^ CRC8_TABLE[(byte ^ crc as u8) as usize]
    })
}

/// CRC-32 over `data`, continuing from `seed`.
pub fn crc32(seed: u32, data: &[u8]) -> u32 {
    !data.iter().fold(!seed, |crc, &byte| {
        (crc >> 8) ^ CRC32_TABLE[((crc as u8) ^ byte) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_table_matches_dwg() {
        assert_eq!(CRC8_TABLE[0], 0x0000);
        assert_eq!(CRC8_TABLE[1], 0xC0C1);
        assert_eq!(CRC8_TABLE[2], 0xC181);
        assert_eq!(CRC8_TABLE[255], 0x4040);
    }

    #[test]
    fn test_crc8_empty_returns_seed() {
        assert_eq!(crc8(SECTION_SEED, &[]), SECTION_SEED);
    }

    #[test]
    fn test_crc8_known_value() {
        // CRC-16/ARC check value.
        assert_eq!(crc8(0, b"123456789"), 0xBB3D);
    }

    #[test]
    fn test_crc8_is_incremental() {
        let whole = crc8(SECTION_SEED, b"object map chunk");
        let split = crc8(crc8(SECTION_SEED, b"object "), b"map chunk");
        assert_eq!(whole, split);
    }

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32(0, b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(0, &[]), 0);
    }
}
