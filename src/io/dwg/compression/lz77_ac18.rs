//! LZ77 variant used by the paged (R2004+) section layout.
//!
//! A compressed stream is a run of literal bytes followed by a sequence of
//! back-references, each of which may carry a short literal run of its own.
//!
//! | opcode      | length                    | distance                               |
//! |-------------|---------------------------|----------------------------------------|
//! | `0x40..`    | `(op >> 4) - 1`           | `((op >> 2) & 3 \| next << 2) + 1`     |
//! | `0x20..0x3F`| `(op & 0x1F) + 2`         | two-byte offset + 1                    |
//! | `0x10..0x1F`| `(op & 7) + 2`            | `(op & 8) << 11` + two-byte + 0x4000   |
//! | `0x11`      | end of stream             |                                        |
//!
//! A zero length field is extended by the following bytes (each zero adds
//! 0xFF, the first non-zero byte ends the run). The two low bits of the
//! offset byte give a literal count of 1-3; a zero count means the next
//! byte is either an opcode or, below 0x10, an extended literal length.

use super::{Compressor, Decompressor};
use crate::error::{DwgError, Result};

const END_OF_STREAM: u8 = 0x11;
const SHORT_MAX_LENGTH: usize = 14;
const SHORT_MAX_DISTANCE: usize = 0x400;
const MEDIUM_MAX_DISTANCE: usize = 0x4000;
const LONG_MAX_DISTANCE: usize = 0xBFFF;
const HASH_BITS: usize = 15;
/// Match search starts here so the stream always opens with a literal run
/// of at least four bytes.
const FIRST_MATCH_POSITION: usize = 4;

/// Decompressor for paged section data.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz77Ac18Decompressor;

/// Compressor for paged section data.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz77Ac18Compressor;

struct Source<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    fn next(&mut self) -> Result<u8> {
        let byte = self.data.get(self.pos).copied().ok_or_else(|| {
            DwgError::Decompression(format!("unexpected end of input at byte {}", self.pos))
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Next opcode, or `None` when the input ends on an opcode boundary.
    fn next_opcode(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(count).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let run = &self.data[self.pos..end];
                self.pos = end;
                Ok(run)
            }
            None => Err(DwgError::Decompression(format!(
                "literal run of {} bytes overruns input at byte {}",
                count, self.pos
            ))),
        }
    }

    /// Sum of an extension run: zero bytes add 0xFF, the first non-zero byte ends it.
    fn extension(&mut self) -> Result<usize> {
        let mut total = 0usize;
        loop {
            match self.next()? {
                0 => total += 0xFF,
                last => return Ok(total + last as usize),
            }
        }
    }

    fn literal_count(&mut self, code: u8) -> Result<usize> {
        let low = (code & 0x0F) as usize;
        let count = if low == 0 { self.extension()? + 0x0F } else { low };
        Ok(count + 3)
    }

    fn compressed_bytes(&mut self, opcode: u8, valid_bits: u8) -> Result<usize> {
        let low = (opcode & valid_bits) as usize;
        let count = if low == 0 {
            self.extension()? + valid_bits as usize
        } else {
            low
        };
        Ok(count + 2)
    }

    /// Returns (offset, literal count).
    fn two_byte_offset(&mut self) -> Result<(usize, usize)> {
        let first = self.next()?;
        let second = self.next()?;
        let offset = ((first >> 2) as usize) | ((second as usize) << 6);
        Ok((offset, (first & 3) as usize))
    }
}

impl Decompressor for Lz77Ac18Decompressor {
    fn decompress(&self, source: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
        let limit = decompressed_size + 3;
        let mut src = Source { data: source, pos: 0 };
        let mut out: Vec<u8> = Vec::with_capacity(limit);

        let mut opcode = src.next_opcode();
        if let Some(code) = opcode.filter(|c| c & 0xF0 == 0) {
            let count = src.literal_count(code)?;
            out.extend_from_slice(src.take(count)?);
            opcode = src.next_opcode();
        }

        while let Some(op) = opcode {
            if op == END_OF_STREAM {
                break;
            }
            let (length, distance, literals) = match op {
                0x40..=0xFF => {
                    let next = src.next()? as usize;
                    let distance = (((op >> 2) & 3) as usize | (next << 2)) + 1;
                    (((op >> 4) - 1) as usize, distance, (op & 3) as usize)
                }
                0x20..=0x3F => {
                    let length = src.compressed_bytes(op, 0x1F)?;
                    let (offset, literals) = src.two_byte_offset()?;
                    (length, offset + 1, literals)
                }
                0x10..=0x1F => {
                    let length = src.compressed_bytes(op, 0x07)?;
                    let (offset, literals) = src.two_byte_offset()?;
                    let distance = (((op & 8) as usize) << 11) + offset + 0x4000;
                    (length, distance, literals)
                }
                _ => {
                    return Err(DwgError::Decompression(format!(
                        "unexpected literal opcode {:#04X} at byte {}",
                        op,
                        src.pos - 1
                    )))
                }
            };

            if distance > out.len() {
                return Err(DwgError::Decompression(format!(
                    "back-reference distance {} exceeds {} decoded bytes",
                    distance,
                    out.len()
                )));
            }
            if out.len() + length > limit {
                return Err(DwgError::Decompression(format!(
                    "output exceeds declared size {}",
                    decompressed_size
                )));
            }
            let start = out.len() - distance;
            for i in 0..length {
                let byte = out[start + i];
                out.push(byte);
            }

            if literals > 0 {
                out.extend_from_slice(src.take(literals)?);
                opcode = src.next_opcode();
            } else {
                opcode = src.next_opcode();
                if let Some(code) = opcode.filter(|c| c & 0xF0 == 0) {
                    let count = src.literal_count(code)?;
                    out.extend_from_slice(src.take(count)?);
                    opcode = src.next_opcode();
                }
            }
            if out.len() > limit {
                return Err(DwgError::Decompression(format!(
                    "output exceeds declared size {}",
                    decompressed_size
                )));
            }
        }

        if out.len() < decompressed_size {
            return Err(DwgError::Decompression(format!(
                "stream ended after {} of {} bytes",
                out.len(),
                decompressed_size
            )));
        }
        out.truncate(decompressed_size);
        Ok(out)
    }
}

struct Encoder {
    dest: Vec<u8>,
    /// Index of the byte whose low two bits hold the literal count that
    /// follows the most recent back-reference.
    literal_slot: Option<usize>,
}

impl Encoder {
    fn extension(&mut self, mut remaining: usize) {
        while remaining > 0xFF {
            self.dest.push(0);
            remaining -= 0xFF;
        }
        self.dest.push(remaining as u8);
    }

    fn literal_length(&mut self, length: usize) {
        if length <= 0x0F + 3 {
            self.dest.push((length - 3) as u8);
        } else {
            self.dest.push(0);
            self.extension(length - 0x0F - 3);
        }
    }

    fn literals(&mut self, run: &[u8]) {
        if run.is_empty() {
            return;
        }
        match self.literal_slot {
            Some(slot) if run.len() <= 3 => self.dest[slot] |= run.len() as u8,
            _ => self.literal_length(run.len()),
        }
        self.dest.extend_from_slice(run);
    }

    fn two_byte_offset(&mut self, value: usize) {
        self.literal_slot = Some(self.dest.len());
        self.dest.push(((value & 0x3F) << 2) as u8);
        self.dest.push((value >> 6) as u8);
    }

    fn back_reference(&mut self, length: usize, distance: usize) {
        if length <= SHORT_MAX_LENGTH && distance <= SHORT_MAX_DISTANCE {
            let value = distance - 1;
            self.literal_slot = Some(self.dest.len());
            self.dest.push((((length + 1) << 4) | ((value & 3) << 2)) as u8);
            self.dest.push((value >> 2) as u8);
        } else if distance <= MEDIUM_MAX_DISTANCE {
            if length <= 0x1F + 2 {
                self.dest.push(0x20 | (length - 2) as u8);
            } else {
                self.dest.push(0x20);
                self.extension(length - 0x1F - 2);
            }
            self.two_byte_offset(distance - 1);
        } else {
            let far = distance - 0x4000;
            let high = if far & 0x4000 != 0 { 0x08 } else { 0x00 };
            if length <= 0x07 + 2 {
                self.dest.push(0x10 | high | (length - 2) as u8);
            } else {
                self.dest.push(0x10 | high);
                self.extension(length - 0x07 - 2);
            }
            self.two_byte_offset(far & 0x3FFF);
        }
    }
}

fn hash_at(data: &[u8], pos: usize) -> usize {
    let value =
        ((data[pos] as usize) << 10) ^ ((data[pos + 1] as usize) << 5) ^ data[pos + 2] as usize;
    value & ((1 << HASH_BITS) - 1)
}

impl Compressor for Lz77Ac18Compressor {
    fn compress(&self, source: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = Encoder {
            dest: Vec::with_capacity(source.len() / 2 + 16),
            literal_slot: None,
        };
        if source.is_empty() {
            encoder.dest.extend_from_slice(&[END_OF_STREAM, 0, 0]);
            return Ok(encoder.dest);
        }

        // Streams must open with four literals; short inputs are padded and
        // the decompressor trims the excess.
        let padded;
        let data: &[u8] = if source.len() < FIRST_MATCH_POSITION {
            let mut buf = source.to_vec();
            buf.resize(FIRST_MATCH_POSITION, 0);
            padded = buf;
            &padded
        } else {
            source
        };
        let len = data.len();

        let mut table = vec![usize::MAX; 1 << HASH_BITS];
        for pos in 0..FIRST_MATCH_POSITION.min(len.saturating_sub(2)) {
            table[hash_at(data, pos)] = pos;
        }

        let mut literal_start = 0;
        let mut pos = FIRST_MATCH_POSITION;
        while pos + 3 <= len {
            let bucket = hash_at(data, pos);
            let candidate = table[bucket];
            table[bucket] = pos;

            let mut length = 0;
            let mut distance = 0;
            if candidate != usize::MAX && pos - candidate <= LONG_MAX_DISTANCE {
                distance = pos - candidate;
                while pos + length < len && data[candidate + length] == data[pos + length] {
                    length += 1;
                }
                // Far references cannot encode a length of three.
                if length < 3 || (distance > MEDIUM_MAX_DISTANCE && length < 4) {
                    length = 0;
                }
            }

            if length == 0 {
                pos += 1;
                continue;
            }

            encoder.literals(&data[literal_start..pos]);
            encoder.back_reference(length, distance);
            for covered in pos + 1..(pos + length).min(len - 2) {
                table[hash_at(data, covered)] = covered;
            }
            pos += length;
            literal_start = pos;
        }

        encoder.literals(&data[literal_start..]);
        encoder.dest.extend_from_slice(&[END_OF_STREAM, 0, 0]);
        Ok(encoder.dest)
    }
}
