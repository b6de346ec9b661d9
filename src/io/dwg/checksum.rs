//! Page checksum of the paged (R2004+) layout.
//!
//! An Adler-32 style running sum with modulus 0xFFF1, folded every 0x15B0
//! bytes. Page headers carry two of these: one over the stored payload
//! (seed 0) and one over the header itself, seeded with the first.

const MODULUS: u32 = 0xFFF1;
const CHUNK: usize = 0x15B0;

/// Page checksum of `data`, continuing from `seed`.
pub fn page_checksum(seed: u32, data: &[u8]) -> u32 {
    let mut sum1 = seed & 0xFFFF;
    let mut sum2 = seed >> 16;
    for chunk in data.chunks(CHUNK) {
        for &byte in chunk {
            sum1 += byte as u32;
            sum2 += sum1;
        }
        sum1 %= MODULUS;
        sum2 %= MODULUS;
    }
    (sum2 << 16) | (sum1 & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keeps_seed() {
        assert_eq!(page_checksum(0, &[]), 0);
        assert_eq!(page_checksum(0x0002_0001, &[]), 0x0002_0001);
    }

    #[test]
    fn test_small_input() {
        // sum1 = 1 + 2 + 3 = 6, sum2 = 1 + 3 + 6 = 10
        assert_eq!(page_checksum(0, &[1, 2, 3]), (10 << 16) | 6);
    }

    #[test]
    fn test_large_input_stays_reduced() {
        let data = vec![0xFFu8; CHUNK * 3 + 17];
        let sum = page_checksum(0, &data);
        assert!(sum & 0xFFFF < MODULUS);
        assert!(sum >> 16 < MODULUS);
    }

    #[test]
    fn test_detects_single_byte_change() {
        let mut data = vec![0x5Au8; 512];
        let before = page_checksum(0, &data);
        data[100] ^= 0x01;
        assert_ne!(before, page_checksum(0, &data));
    }
}
