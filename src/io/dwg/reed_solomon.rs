//! Reed-Solomon (255,239) code protecting page header blocks.
//!
//! Systematic code over GF(256) built from x^8 + x^6 + x^5 + x^3 + 1, with
//! generator roots alpha^1 ..= alpha^16. A block on disk holds the 239 data
//! bytes followed by the 16 parity bytes. Up to 8 byte errors per block are
//! corrected.

use crate::error::{DwgError, Result};

/// Bytes per encoded block.
pub const BLOCK_SIZE: usize = 255;
/// Data bytes per block.
pub const DATA_SIZE: usize = 239;
/// Parity bytes per block.
pub const PARITY_SIZE: usize = BLOCK_SIZE - DATA_SIZE;
/// Largest number of byte errors a block can recover from.
pub const MAX_CORRECTABLE: usize = PARITY_SIZE / 2;

const FIELD_POLY: u16 = 0x169;

struct Field {
    exp: [u8; 512],
    log: [u8; 256],
}

const fn build_field() -> Field {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= FIELD_POLY;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    Field { exp, log }
}

static GF: Field = build_field();

#[inline]
fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        GF.exp[GF.log[a as usize] as usize + GF.log[b as usize] as usize]
    }
}

#[inline]
fn div(a: u8, b: u8) -> u8 {
    if a == 0 {
        0
    } else {
        GF.exp[(GF.log[a as usize] as usize + 255 - GF.log[b as usize] as usize) % 255]
    }
}

/// alpha^power
#[inline]
fn alpha(power: usize) -> u8 {
    GF.exp[power % 255]
}

const fn build_generator() -> [u8; PARITY_SIZE + 1] {
    let field = build_field();
    let mut g = [0u8; PARITY_SIZE + 1];
    g[0] = 1;
    let mut degree = 0;
    let mut root = 1;
    while root <= PARITY_SIZE {
        let r = field.exp[root];
        // g(x) *= (x + r)
        let mut j = degree + 1;
        while j > 0 {
            let scaled = if g[j] == 0 {
                0
            } else {
                field.exp[field.log[g[j] as usize] as usize + field.log[r as usize] as usize]
            };
            g[j] = g[j - 1] ^ scaled;
            j -= 1;
        }
        g[0] = field.exp[field.log[g[0] as usize] as usize + field.log[r as usize] as usize];
        degree += 1;
        root += 1;
    }
    g
}

static GENERATOR: [u8; PARITY_SIZE + 1] = build_generator();

/// Codeword coefficient for a byte index of the on-disk block.
#[cfg(test)]
fn to_codeword_index(block_index: usize) -> usize {
    if block_index < DATA_SIZE {
        block_index + PARITY_SIZE
    } else {
        block_index - DATA_SIZE
    }
}

#[inline]
fn to_block_index(codeword_index: usize) -> usize {
    if codeword_index < PARITY_SIZE {
        codeword_index + DATA_SIZE
    } else {
        codeword_index - PARITY_SIZE
    }
}

/// Compute the 16 parity bytes for `data` (at most 239 bytes, zero padded).
pub fn parity(data: &[u8]) -> [u8; PARITY_SIZE] {
    let mut reg = [0u8; PARITY_SIZE];
    for i in (0..DATA_SIZE).rev() {
        let byte = data.get(i).copied().unwrap_or(0);
        let feedback = byte ^ reg[PARITY_SIZE - 1];
        for j in (1..PARITY_SIZE).rev() {
            reg[j] = reg[j - 1] ^ mul(feedback, GENERATOR[j]);
        }
        reg[0] = mul(feedback, GENERATOR[0]);
    }
    reg
}

/// Encode `data` (at most 239 bytes) into a full 255-byte block.
pub fn encode(data: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    if data.len() > DATA_SIZE {
        return Err(DwgError::Encode(format!(
            "Reed-Solomon block holds {} data bytes, got {}",
            DATA_SIZE,
            data.len()
        )));
    }
    let mut block = [0u8; BLOCK_SIZE];
    block[..data.len()].copy_from_slice(data);
    block[DATA_SIZE..].copy_from_slice(&parity(data));
    Ok(block)
}

/// Evaluate the block as a codeword polynomial at `x`.
fn eval_block(block: &[u8], x: u8) -> u8 {
    // Highest degree coefficient is the last data byte.
    let mut acc = 0u8;
    for cw in (0..BLOCK_SIZE).rev() {
        acc = mul(acc, x) ^ block[to_block_index(cw)];
    }
    acc
}

fn eval_poly(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &c| mul(acc, x) ^ c)
}

fn syndromes(block: &[u8]) -> [u8; PARITY_SIZE] {
    let mut s = [0u8; PARITY_SIZE];
    for (j, slot) in s.iter_mut().enumerate() {
        *slot = eval_block(block, alpha(j + 1));
    }
    s
}

/// Berlekamp-Massey. Returns the error locator and its degree.
fn error_locator(s: &[u8; PARITY_SIZE]) -> ([u8; PARITY_SIZE + 1], usize) {
    let mut c = [0u8; PARITY_SIZE + 1];
    let mut b = [0u8; PARITY_SIZE + 1];
    c[0] = 1;
    b[0] = 1;
    let mut len = 0usize;
    let mut shift = 1usize;
    let mut last_discrepancy = 1u8;

    for n in 0..PARITY_SIZE {
        let mut d = s[n];
        for i in 1..=len {
            d ^= mul(c[i], s[n - i]);
        }
        if d == 0 {
            shift += 1;
            continue;
        }
        let coef = div(d, last_discrepancy);
        let previous = c;
        for k in 0..(PARITY_SIZE + 1).saturating_sub(shift) {
            c[k + shift] ^= mul(coef, b[k]);
        }
        if 2 * len <= n {
            len = n + 1 - len;
            b = previous;
            last_discrepancy = d;
            shift = 1;
        } else {
            shift += 1;
        }
    }
    (c, len)
}

/// Verify and repair a 255-byte block in place.
///
/// Returns the number of corrected bytes. `offset` is the block's file
/// position and is only used for the error.
pub fn decode(block: &mut [u8], offset: u64) -> Result<usize> {
    if block.len() != BLOCK_SIZE {
        return Err(DwgError::Parse(format!(
            "Reed-Solomon block must be {} bytes, got {}",
            BLOCK_SIZE,
            block.len()
        )));
    }
    let uncorrectable = || DwgError::Uncorrectable { offset };

    let s = syndromes(block);
    if s.iter().all(|&v| v == 0) {
        return Ok(0);
    }

    let (locator, degree) = error_locator(&s);
    if degree > MAX_CORRECTABLE {
        return Err(uncorrectable());
    }

    // Omega(x) = S(x) * Lambda(x) mod x^16
    let mut omega = [0u8; PARITY_SIZE];
    for i in 0..PARITY_SIZE {
        for j in 0..=i {
            omega[i] ^= mul(s[j], locator[i - j]);
        }
    }

    // Chien search over every codeword position.
    let mut positions = Vec::with_capacity(degree);
    for pos in 0..BLOCK_SIZE {
        if eval_poly(&locator, alpha(255 - pos)) == 0 {
            positions.push(pos);
        }
    }
    if positions.len() != degree {
        return Err(uncorrectable());
    }

    // Forney, applied to a copy so a failed repair leaves the input untouched.
    let mut repaired = [0u8; BLOCK_SIZE];
    repaired.copy_from_slice(block);
    for &pos in &positions {
        let x_inv = 255 - pos;
        let numerator = eval_poly(&omega, alpha(x_inv));
        let mut denominator = 0u8;
        for i in (1..=PARITY_SIZE).step_by(2) {
            denominator ^= mul(locator[i], alpha(x_inv * (i - 1)));
        }
        if denominator == 0 {
            return Err(uncorrectable());
        }
        repaired[to_block_index(pos)] ^= div(numerator, denominator);
    }

    if syndromes(&repaired).iter().any(|&v| v != 0) {
        return Err(uncorrectable());
    }
    block.copy_from_slice(&repaired);
    Ok(positions.len())
}

/// Whether a block passes its parity check without correction.
pub fn is_clean(block: &[u8]) -> bool {
    block.len() == BLOCK_SIZE && syndromes(block).iter().all(|&v| v == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> Vec<u8> {
        (0..DATA_SIZE).map(|i| ((i * 7 + 3) & 0xFF) as u8).collect()
    }

    #[test]
    fn test_field_tables() {
        assert_eq!(GF.exp[0], 1);
        assert_eq!(GF.exp[8], (FIELD_POLY & 0xFF) as u8);
        for a in 1..=255u16 {
            assert_eq!(div(mul(a as u8, 0x53), 0x53), a as u8);
        }
    }

    #[test]
    fn test_generator_is_monic() {
        assert_eq!(GENERATOR[PARITY_SIZE], 1);
        assert_eq!(&GENERATOR[..4], &[106, 227, 99, 31]);
    }

    #[test]
    fn test_index_mapping() {
        for i in 0..BLOCK_SIZE {
            assert_eq!(to_block_index(to_codeword_index(i)), i);
        }
    }

    #[test]
    fn test_zero_data_has_zero_parity() {
        assert_eq!(parity(&[0u8; DATA_SIZE]), [0u8; PARITY_SIZE]);
    }

    #[test]
    fn test_clean_block() {
        let mut block = encode(&sample_data()).unwrap();
        assert!(is_clean(&block));
        assert_eq!(decode(&mut block, 0).unwrap(), 0);
    }

    #[test]
    fn test_short_data_is_zero_padded() {
        let block = encode(b"page header").unwrap();
        assert_eq!(&block[..11], b"page header");
        assert!(block[11..DATA_SIZE].iter().all(|&b| b == 0));
        assert!(is_clean(&block));
    }

    #[test]
    fn test_corrects_up_to_eight_errors() {
        let original = encode(&sample_data()).unwrap();
        let mut block = original;
        for pos in [0, 30, 60, 90, 120, 150, 238, 254] {
            block[pos] ^= 0x5A;
        }
        assert_eq!(decode(&mut block, 0x100).unwrap(), 8);
        assert_eq!(block, original);
    }

    #[test]
    fn test_corrects_parity_errors() {
        let original = encode(&sample_data()).unwrap();
        let mut block = original;
        block[DATA_SIZE] ^= 0x01;
        block[BLOCK_SIZE - 1] ^= 0xFF;
        assert_eq!(decode(&mut block, 0).unwrap(), 2);
        assert_eq!(block, original);
    }

    #[test]
    fn test_too_many_errors_are_uncorrectable() {
        let original = encode(&sample_data()).unwrap();
        for count in [9usize, 12, 20] {
            let mut block = original;
            for pos in (0..count * 11).step_by(11) {
                block[pos] ^= 0xA5;
            }
            match decode(&mut block, 0x300) {
                Err(DwgError::Uncorrectable { offset }) => assert_eq!(offset, 0x300),
                other => panic!("expected uncorrectable, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(decode(&mut [0u8; 100], 0).is_err());
        assert!(encode(&[0u8; 240]).is_err());
    }
}
