//! Bit cursor and primitive encoder.
//!
//! `DwgStreamWriter` is the write-side twin of
//! [`DwgStreamReader`](crate::io::dwg::reader::DwgStreamReader): it appends
//! bits MSB-first to a growable buffer and encodes every primitive the
//! reader decodes, choosing the most compact selector for each value.

use encoding_rs::Encoding;

use crate::error::{DwgError, Result};
use crate::io::dwg::reader::stream_reader::{encoding_for_code_page, EntityColor};
use crate::types::{Color, DwgVersion, HandleRef, Vector2, Vector3};

/// Growable bit buffer with a write cursor at its end.
#[derive(Debug, Clone)]
pub struct DwgStreamWriter {
    buffer: Vec<u8>,
    bit_len: u64,
    version: DwgVersion,
    encoding: &'static Encoding,
}

impl DwgStreamWriter {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            buffer: Vec::new(),
            bit_len: 0,
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

    pub fn position_in_bits(&self) -> u64 {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Written bytes; the last byte is zero-padded.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    // ---------------------------------------------------------------
    // Bits and raw bytes
    // ---------------------------------------------------------------

    pub fn write_bit(&mut self, value: bool) {
        let offset = (self.bit_len & 7) as u8;
        if offset == 0 {
            self.buffer.push(0);
        }
        if value {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    pub fn write_2bits(&mut self, value: u8) {
        self.write_bits(value as u64, 2);
    }

    /// The low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u32) {
        for i in (0..count.min(64)).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    pub fn write_byte(&mut self, value: u8) {
        if self.bit_len & 7 == 0 {
            self.buffer.push(value);
            self.bit_len += 8;
        } else {
            self.write_bits(value as u64, 8);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_len & 7 == 0 {
            self.buffer.extend_from_slice(bytes);
            self.bit_len += bytes.len() as u64 * 8;
        } else {
            for &b in bytes {
                self.write_byte(b);
            }
        }
    }

    pub fn write_raw_short(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_raw_ushort(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_raw_long(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_raw_ulong(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_raw_double(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_2raw_double(&mut self, value: Vector2) {
        self.write_raw_double(value.x);
        self.write_raw_double(value.y);
    }

    pub fn write_3raw_double(&mut self, value: Vector3) {
        self.write_raw_double(value.x);
        self.write_raw_double(value.y);
        self.write_raw_double(value.z);
    }

    pub fn write_sentinel(&mut self, sentinel: &[u8; 16]) {
        self.write_bytes(sentinel);
    }

    /// Overwrite `count` bits starting at `position` with the low bits of `value`.
    pub fn patch_bits(&mut self, position: u64, value: u64, count: u32) -> Result<()> {
        if position + count as u64 > self.bit_len {
            return Err(DwgError::OutOfBounds {
                position: position + count as u64,
                size: self.buffer.len() as u64,
            });
        }
        for i in 0..count as u64 {
            let bit = (value >> (count as u64 - 1 - i)) & 1 == 1;
            let at = position + i;
            let mask = 0x80u8 >> (at & 7);
            let byte = &mut self.buffer[(at >> 3) as usize];
            if bit {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
        Ok(())
    }

    /// Overwrite an RL previously written at `position`.
    pub fn patch_raw_long(&mut self, position: u64, value: i32) -> Result<()> {
        for (i, b) in value.to_le_bytes().into_iter().enumerate() {
            self.patch_bits(position + i as u64 * 8, b as u64, 8)?;
        }
        Ok(())
    }

    /// Append every bit written to `other`.
    pub fn append(&mut self, other: &DwgStreamWriter) {
        let full = (other.bit_len / 8) as usize;
        self.write_bytes(&other.buffer[..full]);
        let rest = (other.bit_len & 7) as u32;
        if rest > 0 {
            self.write_bits((other.buffer[full] >> (8 - rest)) as u64, rest);
        }
    }

    // ---------------------------------------------------------------
    // Selector-prefixed numbers
    // ---------------------------------------------------------------

    /// BS
    pub fn write_bit_short(&mut self, value: i16) {
        match value {
            0 => self.write_2bits(0b10),
            256 => self.write_2bits(0b11),
            1..=255 => {
                self.write_2bits(0b01);
                self.write_byte(value as u8);
            }
            _ => {
                self.write_2bits(0b00);
                self.write_raw_short(value);
            }
        }
    }

    /// BL
    pub fn write_bit_long(&mut self, value: i32) {
        match value {
            0 => self.write_2bits(0b10),
            1..=255 => {
                self.write_2bits(0b01);
                self.write_byte(value as u8);
            }
            _ => {
                self.write_2bits(0b00);
                self.write_raw_long(value);
            }
        }
    }

    /// BLL: at most seven value bytes fit the 3-bit count.
    pub fn write_bit_long_long(&mut self, value: u64) -> Result<()> {
        let size = crate::types::handle::byte_count(value);
        if size > 7 {
            return Err(DwgError::Overflow(format!(
                "{value:#X} needs {size} bytes, bit long long holds 7"
            )));
        }
        self.write_bits(size as u64, 3);
        for i in 0..size {
            self.write_byte((value >> (i * 8)) as u8);
        }
        Ok(())
    }

    /// BD; -0.0 and NaN payloads keep their exact bits.
    pub fn write_bit_double(&mut self, value: f64) {
        if value.to_bits() == 0.0f64.to_bits() {
            self.write_2bits(0b10);
        } else if value.to_bits() == 1.0f64.to_bits() {
            self.write_2bits(0b01);
        } else {
            self.write_2bits(0b00);
            self.write_raw_double(value);
        }
    }

    /// DD: store only the bytes that differ from `default`.
    pub fn write_bit_double_with_default(&mut self, default: f64, value: f64) {
        if default.to_bits() == value.to_bits() {
            self.write_2bits(0b00);
            return;
        }
        let d = default.to_le_bytes();
        let v = value.to_le_bytes();
        if d[4..] == v[4..] {
            self.write_2bits(0b01);
            self.write_bytes(&v[..4]);
        } else if d[6..] == v[6..] {
            self.write_2bits(0b10);
            self.write_byte(v[4]);
            self.write_byte(v[5]);
            self.write_bytes(&v[..4]);
        } else {
            self.write_2bits(0b11);
            self.write_raw_double(value);
        }
    }

    pub fn write_2bit_double(&mut self, value: Vector2) {
        self.write_bit_double(value.x);
        self.write_bit_double(value.y);
    }

    pub fn write_3bit_double(&mut self, value: Vector3) {
        self.write_bit_double(value.x);
        self.write_bit_double(value.y);
        self.write_bit_double(value.z);
    }

    pub fn write_2bit_double_with_default(&mut self, default: Vector2, value: Vector2) {
        self.write_bit_double_with_default(default.x, value.x);
        self.write_bit_double_with_default(default.y, value.y);
    }

    /// BT
    pub fn write_bit_thickness(&mut self, value: f64) {
        if self.version >= DwgVersion::AC1015 {
            let zero = value.to_bits() == 0.0f64.to_bits();
            self.write_bit(zero);
            if zero {
                return;
            }
        }
        self.write_bit_double(value);
    }

    /// BE
    pub fn write_bit_extrusion(&mut self, value: Vector3) {
        if self.version >= DwgVersion::AC1015 {
            let unit_z = value.x.to_bits() == 0
                && value.y.to_bits() == 0
                && value.z.to_bits() == 1.0f64.to_bits();
            self.write_bit(unit_z);
            if unit_z {
                return;
            }
        }
        self.write_3bit_double(value);
    }

    // ---------------------------------------------------------------
    // Modular numbers
    // ---------------------------------------------------------------

    /// MC
    pub fn write_modular_char(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.write_byte((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
        self.write_byte(value as u8);
    }

    /// Signed MC
    pub fn write_signed_modular_char(&mut self, value: i64) {
        let negative = value < 0;
        let mut magnitude = value.unsigned_abs();
        while magnitude >= 0x40 {
            self.write_byte((magnitude & 0x7F) as u8 | 0x80);
            magnitude >>= 7;
        }
        let last = magnitude as u8;
        self.write_byte(if negative { last | 0x40 } else { last });
    }

    /// MS
    pub fn write_modular_short(&mut self, mut value: u32) {
        while value >= 0x8000 {
            self.write_raw_ushort((value & 0x7FFF) as u16 | 0x8000);
            value >>= 15;
        }
        self.write_raw_ushort(value as u16);
    }

    // ---------------------------------------------------------------
    // Handles, text, colors, type ids
    // ---------------------------------------------------------------

    /// H: code and byte count, then the value big-endian.
    pub fn write_handle(&mut self, handle: HandleRef) {
        let size = crate::types::handle::byte_count(handle.value);
        self.write_byte((handle.code << 4) | size);
        for i in (0..size).rev() {
            self.write_byte((handle.value >> (i * 8)) as u8);
        }
    }

    /// TV
    pub fn write_variable_text(&mut self, value: &str) -> Result<()> {
        if self.version.is_unicode() {
            let units: Vec<u16> = value.encode_utf16().collect();
            self.write_text_length(units.len())?;
            for unit in units {
                self.write_raw_ushort(unit);
            }
        } else {
            let (bytes, _, _) = self.encoding.encode(value);
            let bytes = bytes.into_owned();
            self.write_text_length(bytes.len())?;
            self.write_bytes(&bytes);
        }
        Ok(())
    }

    fn write_text_length(&mut self, length: usize) -> Result<()> {
        let length = u16::try_from(length)
            .map_err(|_| DwgError::Overflow(format!("text of {length} units")))?;
        self.write_bit_short(length as i16);
        Ok(())
    }

    /// CMC
    pub fn write_cm_color(&mut self, color: Color) {
        if self.version < DwgVersion::AC1018 {
            self.write_bit_short(color.index());
            return;
        }
        let index = match color {
            Color::Rgb { .. } => 0,
            other => other.index(),
        };
        self.write_bit_short(index);
        self.write_bit_long(color.to_true_color() as i32);
        self.write_byte(0);
    }

    /// ENC
    pub fn write_en_color(&mut self, color: &EntityColor) {
        if self.version < DwgVersion::AC1018 {
            self.write_bit_short(color.color.index());
            return;
        }
        let mut raw: u16 = match color.color {
            Color::Rgb { .. } => 0x8000,
            other => other.index() as u16,
        };
        if color.transparency.is_some() {
            raw |= 0x2000;
        }
        if color.has_book_color {
            raw |= 0x4000;
        }
        self.write_bit_short(raw as i16);
        if let Color::Rgb { .. } = color.color {
            self.write_bit_long(color.color.to_true_color() as i32);
        }
        if let Some(transparency) = color.transparency {
            self.write_bit_long(transparency as i32);
        }
    }

    /// Object type as BS, or OT from R2010.
    pub fn write_object_type(&mut self, value: u16) {
        if self.version < DwgVersion::AC1024 {
            self.write_bit_short(value as i16);
            return;
        }
        if value <= 0xFF {
            self.write_2bits(0);
            self.write_byte(value as u8);
        } else if (0x1F0..=0x2EF).contains(&value) {
            self.write_2bits(1);
            self.write_byte((value - 0x1F0) as u8);
        } else {
            self.write_2bits(2);
            self.write_raw_ushort(value);
        }
    }

    /// Append an R2007+ string stream followed by its size words and presence flag.
    pub fn write_string_stream(&mut self, text: &DwgStreamWriter) {
        if text.is_empty() {
            self.write_bit(false);
            return;
        }
        self.append(text);
        let size = text.position_in_bits();
        if size >= 0x8000 {
            self.write_raw_ushort((size >> 15) as u16);
            self.write_raw_ushort((size & 0x7FFF) as u16 | 0x8000);
        } else {
            self.write_raw_ushort(size as u16);
        }
        self.write_bit(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::reader::stream_reader::DwgStreamReader;

    fn writer() -> DwgStreamWriter {
        DwgStreamWriter::new(DwgVersion::AC1015)
    }

    #[test]
    fn test_write_bits_msb_first() {
        let mut w = writer();
        w.write_bit(true);
        w.write_bit(false);
        w.write_bit(true);
        w.write_bit(true);
        assert_eq!(w.bytes(), &[0xB0]);
        assert_eq!(w.position_in_bits(), 4);
    }

    #[test]
    fn test_bit_short_boundaries() {
        let mut w = writer();
        w.write_bit_short(0);
        assert_eq!(w.position_in_bits(), 2);

        let mut w = writer();
        w.write_bit_short(256);
        assert_eq!(w.position_in_bits(), 2);
        assert_eq!(w.bytes(), &[0xC0]);

        let mut w = writer();
        w.write_bit_short(255);
        assert_eq!(w.position_in_bits(), 10);

        let mut w = writer();
        w.write_bit_short(257);
        assert_eq!(w.position_in_bits(), 18);
    }

    #[test]
    fn test_bit_double_literals() {
        let mut w = writer();
        w.write_bit_double(0.0);
        w.write_bit_double(1.0);
        assert_eq!(w.position_in_bits(), 4);
        w.write_bit_double(-0.0);
        assert_eq!(w.position_in_bits(), 4 + 66);

        let bytes = w.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1015);
        assert_eq!(r.read_bit_double().unwrap(), 0.0);
        assert_eq!(r.read_bit_double().unwrap(), 1.0);
        assert!(r.read_bit_double().unwrap().is_sign_negative());
    }

    #[test]
    fn test_default_double_selectors() {
        let mut w = writer();
        w.write_bit_double_with_default(5.0, 5.0);
        assert_eq!(w.position_in_bits(), 2);
        w.write_bit_double_with_default(1.0, 1.0000001);
        w.write_bit_double_with_default(1.0, -300.0);
        let bytes = w.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1015);
        assert_eq!(r.read_bit_double_with_default(5.0).unwrap(), 5.0);
        assert_eq!(r.read_bit_double_with_default(1.0).unwrap(), 1.0000001);
        assert_eq!(r.read_bit_double_with_default(1.0).unwrap(), -300.0);
    }

    #[test]
    fn test_bit_long_long_overflow() {
        let mut w = writer();
        assert!(w.write_bit_long_long(0x00FF_FFFF_FFFF_FFFF).is_ok());
        assert!(matches!(
            w.write_bit_long_long(u64::MAX),
            Err(DwgError::Overflow(_))
        ));
    }

    #[test]
    fn test_patch_raw_long_unaligned() {
        let mut w = writer();
        w.write_bit(true);
        let at = w.position_in_bits();
        w.write_raw_long(0);
        w.write_bit(true);
        w.patch_raw_long(at, 0x1234_5678).unwrap();
        let bytes = w.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1015);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_raw_long().unwrap(), 0x1234_5678);
        assert!(r.read_bit().unwrap());
    }

    #[test]
    fn test_patch_past_end_fails() {
        let mut w = writer();
        w.write_byte(0);
        assert!(w.patch_bits(4, 0xFF, 8).is_err());
    }

    #[test]
    fn test_append_unaligned() {
        let mut inner = writer();
        inner.write_bits(0b101, 3);
        inner.write_byte(0xCD);
        let mut outer = writer();
        outer.write_bit(true);
        outer.append(&inner);
        assert_eq!(outer.position_in_bits(), 12);
        let bytes = outer.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1015);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.read_byte().unwrap(), 0xCD);
    }

    #[test]
    fn test_handle_encoding() {
        let mut w = writer();
        w.write_handle(HandleRef::new(5, 0x0102));
        w.write_handle(HandleRef::new(4, 0));
        assert_eq!(w.bytes(), &[0x52, 0x01, 0x02, 0x40]);
    }

    #[test]
    fn test_signed_modular_char_encoding() {
        let mut w = writer();
        w.write_signed_modular_char(-5);
        w.write_signed_modular_char(-129);
        assert_eq!(w.bytes(), &[0x45, 0x81, 0x41]);
    }

    #[test]
    fn test_string_stream_is_locatable() {
        let version = DwgVersion::AC1021;
        let mut text = DwgStreamWriter::new(version);
        text.write_variable_text("layer-0").unwrap();

        let mut main = DwgStreamWriter::new(version);
        main.write_bit_long(77);
        main.write_string_stream(&text);
        let end = main.position_in_bits();

        let bytes = main.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, version);
        assert_eq!(r.read_bit_long().unwrap(), 77);
        let start = r.locate_string_stream(end).unwrap();
        assert_eq!(start, Some(10));
        assert_eq!(r.read_variable_text().unwrap(), "layer-0");
    }

    #[test]
    fn test_empty_string_stream_flag() {
        let mut main = DwgStreamWriter::new(DwgVersion::AC1024);
        main.write_string_stream(&DwgStreamWriter::new(DwgVersion::AC1024));
        let end = main.position_in_bits();
        let bytes = main.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1024);
        assert_eq!(r.locate_string_stream(end).unwrap(), None);
    }
}
