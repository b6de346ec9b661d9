//! Bit cursor and primitive decoder.
//!
//! `DwgStreamReader` walks a borrowed byte buffer bit by bit (MSB first
//! within each byte, little-endian across multi-byte values) and decodes the
//! DWG primitive vocabulary on top of it: B, BB, 3B, BS, BL, BLL, BD, DD, RC,
//! RS, RL, RD, MC, MS, H, TV, BT, BE, CMC, ENC, OT.
//!
//! Every read is bounds-checked against the buffer; running off the end is
//! [`DwgError::OutOfBounds`]. Values that do not fit their declared width
//! are [`DwgError::Overflow`].

use encoding_rs::Encoding;

use crate::error::{DwgError, Result};
use crate::types::{Color, DwgVersion, HandleRef, Vector2, Vector3};

/// Entity color as decoded from an ENC field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EntityColor {
    pub color: Color,
    /// Raw transparency value, when the 0x2000 flag is set.
    pub transparency: Option<u32>,
    /// A color-book handle follows in the handle stream.
    pub has_book_color: bool,
}

/// Bit cursor over an immutable buffer.
#[derive(Debug, Clone)]
pub struct DwgStreamReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u8,
    version: DwgVersion,
    encoding: &'static Encoding,
}

impl<'a> DwgStreamReader<'a> {
    pub fn new(data: &'a [u8], version: DwgVersion) -> Self {
        Self {
            data,
            byte: 0,
            bit: 0,
            version,
            encoding: encoding_rs::WINDOWS_1252,
        }
    }

    /// Use the code page of the drawing for pre-2007 text.
    pub fn with_code_page(mut self, code_page: u16) -> Self {
        self.encoding = encoding_for_code_page(code_page);
        self
    }

    pub fn version(&self) -> DwgVersion {
        self.version
    }

    /// Size of the underlying buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position_in_bits(&self) -> u64 {
        self.byte as u64 * 8 + self.bit as u64
    }

    /// Byte offset of the cursor (the partially consumed byte counts).
    pub fn position(&self) -> usize {
        self.byte
    }

    pub fn set_position_in_bits(&mut self, position: u64) -> Result<()> {
        if position > self.data.len() as u64 * 8 {
            return Err(self.out_of_bounds(position));
        }
        self.byte = (position >> 3) as usize;
        self.bit = (position & 7) as u8;
        Ok(())
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        self.set_position_in_bits(position as u64 * 8)
    }

    /// Bits left between the cursor and the end of the buffer.
    pub fn remaining_bits(&self) -> u64 {
        (self.data.len() as u64 * 8).saturating_sub(self.position_in_bits())
    }

    fn out_of_bounds(&self, position: u64) -> DwgError {
        DwgError::OutOfBounds {
            position,
            size: self.data.len() as u64,
        }
    }

    fn ensure(&self, bits: u64) -> Result<()> {
        let end = self.position_in_bits() + bits;
        if end > self.data.len() as u64 * 8 {
            return Err(self.out_of_bounds(end));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Bits and raw bytes
    // ---------------------------------------------------------------

    /// B: a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let value = (self.data[self.byte] >> (7 - self.bit)) & 1;
        self.bit += 1;
        if self.bit == 8 {
            self.bit = 0;
            self.byte += 1;
        }
        Ok(value == 1)
    }

    /// BB: two bits.
    pub fn read_2bits(&mut self) -> Result<u8> {
        Ok(self.read_bits(2)? as u8)
    }

    /// 3B: up to three bits, stopping at the first zero (R2010+ MTEXT/ATTRIB flags).
    pub fn read_3bits(&mut self) -> Result<u8> {
        let mut value = 0u8;
        for _ in 0..3 {
            if !self.read_bit()? {
                break;
            }
            value = (value << 1) | 1;
        }
        Ok(value)
    }

    /// N bits (N <= 64) as an unsigned integer, most significant first.
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        if count > 64 {
            return Err(DwgError::Overflow(format!("cannot read {count} bits into u64")));
        }
        self.ensure(count as u64)?;
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// RC: one raw byte at the current bit offset.
    pub fn read_byte(&mut self) -> Result<u8> {
        self.ensure(8)?;
        let value = if self.bit == 0 {
            self.data[self.byte]
        } else {
            let high = self.data[self.byte] << self.bit;
            let low = self.data[self.byte + 1] >> (8 - self.bit);
            high | low
        };
        self.byte += 1;
        Ok(value)
    }

    /// A run of raw bytes; byte-aligned cursors copy directly.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        self.ensure(length as u64 * 8)?;
        if self.bit == 0 {
            let bytes = self.data[self.byte..self.byte + length].to_vec();
            self.byte += length;
            return Ok(bytes);
        }
        (0..length).map(|_| self.read_byte()).collect()
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N as u64 * 8)?;
        let mut arr = [0u8; N];
        for b in arr.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(arr)
    }

    /// RS
    pub fn read_raw_short(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_raw_ushort(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// RL
    pub fn read_raw_long(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_raw_ulong(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// RD
    pub fn read_raw_double(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// 2RD
    pub fn read_2raw_double(&mut self) -> Result<Vector2> {
        Ok(Vector2::new(self.read_raw_double()?, self.read_raw_double()?))
    }

    /// 3RD
    pub fn read_3raw_double(&mut self) -> Result<Vector3> {
        Ok(Vector3::new(
            self.read_raw_double()?,
            self.read_raw_double()?,
            self.read_raw_double()?,
        ))
    }

    pub fn read_sentinel(&mut self) -> Result<[u8; 16]> {
        self.read_array()
    }

    // ---------------------------------------------------------------
    // Selector-prefixed numbers
    // ---------------------------------------------------------------

    /// BS: 00 = RS follows, 01 = RC follows, 10 = 0, 11 = 256.
    pub fn read_bit_short(&mut self) -> Result<i16> {
        match self.read_2bits()? {
            0 => self.read_raw_short(),
            1 => Ok(self.read_byte()? as i16),
            2 => Ok(0),
            _ => Ok(256),
        }
    }

    /// BL: 00 = RL follows, 01 = RC follows, 10 = 0, 11 is invalid.
    pub fn read_bit_long(&mut self) -> Result<i32> {
        match self.read_2bits()? {
            0 => self.read_raw_long(),
            1 => Ok(self.read_byte()? as i32),
            2 => Ok(0),
            _ => Err(DwgError::Parse("bit long selector 11 is not defined".into())),
        }
    }

    /// BLL: 3-bit byte count, then that many little-endian bytes.
    pub fn read_bit_long_long(&mut self) -> Result<u64> {
        let size = self.read_bits(3)? as usize;
        let mut value = 0u64;
        for i in 0..size {
            value |= (self.read_byte()? as u64) << (i * 8);
        }
        Ok(value)
    }

    /// BD: 00 = RD follows, 01 = 1.0, 10 = 0.0, 11 = 4-byte float follows.
    pub fn read_bit_double(&mut self) -> Result<f64> {
        match self.read_2bits()? {
            0 => self.read_raw_double(),
            1 => Ok(1.0),
            2 => Ok(0.0),
            _ => Ok(f32::from_le_bytes(self.read_array()?) as f64),
        }
    }

    /// DD: a double stored relative to `default`.
    ///
    /// 00 = default, 01 = 4 bytes replace the low bytes of the default,
    /// 10 = 6 bytes replace bytes 4,5 then 0..3, 11 = RD follows.
    pub fn read_bit_double_with_default(&mut self, default: f64) -> Result<f64> {
        let mut arr = default.to_le_bytes();
        match self.read_2bits()? {
            0 => Ok(default),
            1 => {
                for b in arr.iter_mut().take(4) {
                    *b = self.read_byte()?;
                }
                Ok(f64::from_le_bytes(arr))
            }
            2 => {
                arr[4] = self.read_byte()?;
                arr[5] = self.read_byte()?;
                for b in arr.iter_mut().take(4) {
                    *b = self.read_byte()?;
                }
                Ok(f64::from_le_bytes(arr))
            }
            _ => self.read_raw_double(),
        }
    }

    /// 2BD
    pub fn read_2bit_double(&mut self) -> Result<Vector2> {
        Ok(Vector2::new(self.read_bit_double()?, self.read_bit_double()?))
    }

    /// 3BD
    pub fn read_3bit_double(&mut self) -> Result<Vector3> {
        Ok(Vector3::new(
            self.read_bit_double()?,
            self.read_bit_double()?,
            self.read_bit_double()?,
        ))
    }

    /// 2DD
    pub fn read_2bit_double_with_default(&mut self, default: Vector2) -> Result<Vector2> {
        Ok(Vector2::new(
            self.read_bit_double_with_default(default.x)?,
            self.read_bit_double_with_default(default.y)?,
        ))
    }

    /// BT: R2000+ stores a leading bit meaning "zero thickness".
    pub fn read_bit_thickness(&mut self) -> Result<f64> {
        if self.version >= DwgVersion::AC1015 && self.read_bit()? {
            return Ok(0.0);
        }
        self.read_bit_double()
    }

    /// BE: R2000+ stores a leading bit meaning "extrusion is +Z".
    pub fn read_bit_extrusion(&mut self) -> Result<Vector3> {
        if self.version >= DwgVersion::AC1015 && self.read_bit()? {
            return Ok(Vector3::UNIT_Z);
        }
        self.read_3bit_double()
    }

    // ---------------------------------------------------------------
    // Modular numbers
    // ---------------------------------------------------------------

    /// MC: 7 bits per byte, high bit continues.
    pub fn read_modular_char(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            let payload = (byte & 0x7F) as u64;
            if shift >= 64 || (shift > 57 && payload >> (64 - shift) != 0) {
                return Err(DwgError::Overflow("modular char exceeds 64 bits".into()));
            }
            value |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Signed MC: the final byte carries 6 payload bits and the sign in 0x40.
    pub fn read_signed_modular_char(&mut self) -> Result<i64> {
        let overflow = || DwgError::Overflow("signed modular char exceeds 64 bits".into());
        let mut magnitude = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            let last = byte & 0x80 == 0;
            let payload = (if last { byte & 0x3F } else { byte & 0x7F }) as u64;
            if shift >= 64 || (shift > 57 && payload >> (64 - shift) != 0) {
                return Err(overflow());
            }
            magnitude |= payload << shift;
            if last {
                return if byte & 0x40 != 0 {
                    // 2^63 is the magnitude of i64::MIN
                    if magnitude > 1 << 63 {
                        Err(overflow())
                    } else {
                        Ok((magnitude as i64).wrapping_neg())
                    }
                } else {
                    i64::try_from(magnitude).map_err(|_| overflow())
                };
            }
            shift += 7;
        }
    }

    /// MS: little-endian 16-bit words with 15 payload bits, high bit continues.
    pub fn read_modular_short(&mut self) -> Result<u32> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let word = self.read_raw_ushort()?;
            value |= ((word & 0x7FFF) as u64) << shift;
            if value > u32::MAX as u64 {
                return Err(DwgError::Overflow("modular short exceeds 32 bits".into()));
            }
            if word & 0x8000 == 0 {
                return Ok(value as u32);
            }
            shift += 15;
            if shift >= 32 {
                return Err(DwgError::Overflow("modular short exceeds 32 bits".into()));
            }
        }
    }

    // ---------------------------------------------------------------
    // Handles, text, colors, type ids
    // ---------------------------------------------------------------

    /// H: `|CODE (4 bits)|SIZE (4 bits)|VALUE (SIZE bytes, big-endian)|`.
    pub fn read_handle(&mut self) -> Result<HandleRef> {
        let form = self.read_byte()?;
        let code = form >> 4;
        let size = form & 0x0F;
        if size > 8 {
            return Err(DwgError::Overflow(format!("handle with {size} value bytes")));
        }
        let mut value = 0u64;
        for _ in 0..size {
            value = (value << 8) | self.read_byte()? as u64;
        }
        Ok(HandleRef { code, size, value })
    }

    /// TV: BS length, then codepage bytes (pre-2007) or UTF-16LE units (2007+).
    pub fn read_variable_text(&mut self) -> Result<String> {
        let length = self.read_bit_short()? as u16 as usize;
        if length == 0 {
            return Ok(String::new());
        }
        let text = if self.version.is_unicode() {
            let bytes = self.read_bytes(length * 2)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        } else {
            let bytes = self.read_bytes(length)?;
            let (text, _, _) = self.encoding.decode(&bytes);
            text.into_owned()
        };
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// CMC: index color (pre-2004) or index + packed true color + name flags.
    pub fn read_cm_color(&mut self) -> Result<Color> {
        let index = self.read_bit_short()?;
        if self.version < DwgVersion::AC1018 {
            return Ok(Color::from_index(index));
        }
        let true_color = self.read_bit_long()? as u32;
        let names = self.read_byte()?;
        if names & 1 != 0 {
            self.read_variable_text()?;
        }
        if names & 2 != 0 {
            self.read_variable_text()?;
        }
        Ok(Color::from_true_color(true_color, index))
    }

    /// ENC: entity color with optional true color, transparency and book flags (R2004+).
    pub fn read_en_color(&mut self) -> Result<EntityColor> {
        let raw = self.read_bit_short()? as u16;
        if self.version < DwgVersion::AC1018 {
            return Ok(EntityColor {
                color: Color::from_index(raw as i16),
                ..Default::default()
            });
        }
        let index = (raw & 0x0FFF) as i16;
        let mut result = EntityColor {
            color: Color::from_index(index),
            transparency: None,
            has_book_color: raw & 0x4000 != 0,
        };
        if raw & 0x8000 != 0 {
            let true_color = self.read_bit_long()? as u32;
            result.color = Color::from_true_color(true_color, index);
        }
        if raw & 0x2000 != 0 {
            result.transparency = Some(self.read_bit_long()? as u32);
        }
        Ok(result)
    }

    /// Object type: BS before R2010, OT (2-bit selector + byte/short) after.
    pub fn read_object_type(&mut self) -> Result<u16> {
        if self.version < DwgVersion::AC1024 {
            return Ok(self.read_bit_short()? as u16);
        }
        match self.read_2bits()? {
            0 => Ok(self.read_byte()? as u16),
            1 => Ok(0x1F0 + self.read_byte()? as u16),
            _ => Ok(self.read_raw_ushort()?),
        }
    }

    /// Locate the R2007+ string stream that ends just before `end_bit`.
    ///
    /// The last bit before `end_bit` says whether string data exists. If it
    /// does, a 16-bit size (with an optional high word when bit 15 is set)
    /// sits immediately before that flag and the string data before the
    /// size. Returns the bit position where string data starts, or `None`.
    pub fn locate_string_stream(&mut self, end_bit: u64) -> Result<Option<u64>> {
        let flag_pos = end_bit
            .checked_sub(1)
            .ok_or_else(|| DwgError::Parse("object too small for string stream flag".into()))?;
        self.set_position_in_bits(flag_pos)?;
        if !self.read_bit()? {
            return Ok(None);
        }
        let mut size_pos = flag_pos
            .checked_sub(16)
            .ok_or_else(|| self.out_of_bounds(0))?;
        self.set_position_in_bits(size_pos)?;
        let mut size = self.read_raw_ushort()? as u64;
        if size & 0x8000 != 0 {
            size_pos = size_pos.checked_sub(16).ok_or_else(|| self.out_of_bounds(0))?;
            self.set_position_in_bits(size_pos)?;
            let hi = self.read_raw_ushort()? as u64;
            size = (size & 0x7FFF) | (hi << 15);
        }
        let start = size_pos
            .checked_sub(size)
            .ok_or_else(|| DwgError::Parse(format!("string stream of {size} bits overruns object")))?;
        self.set_position_in_bits(start)?;
        Ok(Some(start))
    }
}

/// Map a drawing code page number to a text encoding.
pub(crate) fn encoding_for_code_page(code_page: u16) -> &'static Encoding {
    match code_page {
        3 => encoding_rs::ISO_8859_2,
        4 => encoding_rs::ISO_8859_3,
        5 => encoding_rs::ISO_8859_4,
        6 => encoding_rs::ISO_8859_5,
        7 => encoding_rs::ISO_8859_6,
        8 => encoding_rs::ISO_8859_7,
        9 => encoding_rs::ISO_8859_8,
        10 | 33 => encoding_rs::WINDOWS_1254,
        22 | 38 => encoding_rs::SHIFT_JIS,
        23 => encoding_rs::MACINTOSH,
        24 | 41 => encoding_rs::BIG5,
        25 | 40 => encoding_rs::EUC_KR,
        27 => encoding_rs::IBM866,
        28 => encoding_rs::WINDOWS_1250,
        29 => encoding_rs::WINDOWS_1251,
        31 | 39 => encoding_rs::GBK,
        32 => encoding_rs::WINDOWS_1253,
        34 => encoding_rs::WINDOWS_1255,
        35 => encoding_rs::WINDOWS_1256,
        36 => encoding_rs::WINDOWS_1257,
        37 => encoding_rs::WINDOWS_874,
        44 => encoding_rs::WINDOWS_1258,
        _ => encoding_rs::WINDOWS_1252,
    }
}
