//! DWG Header section reader.
//!
//! The body of `AcDb:Header` is a fixed sequence of variables whose layout
//! depends on the revision; [`header_layout`](crate::io::dwg::header_layout)
//! names each position. From R2007 the body starts with an RL giving the end
//! of the main data in bits: text values live in the string stream that ends
//! there and handle values in the handle stream that starts there.

use super::merged_reader::TextSource;
use super::stream_reader::DwgStreamReader;
use crate::error::Result;
use crate::header::{HeaderValue, HeaderVariables};
use crate::io::dwg::header_layout::{fields_for, VariableKind};
use crate::types::{DwgVersion, Handle, ObjectRef};

/// Reader for the unwrapped `AcDb:Header` body.
pub struct DwgHeaderReader<'a> {
    data: &'a [u8],
    version: DwgVersion,
    code_page: u16,
}

impl<'a> DwgHeaderReader<'a> {
    pub fn new(data: &'a [u8], version: DwgVersion, code_page: u16) -> Self {
        Self {
            data,
            version,
            code_page,
        }
    }

    pub fn read(&self) -> Result<HeaderVariables> {
        let mut main = DwgStreamReader::new(self.data, self.version).with_code_page(self.code_page);
        let mut handles = main.clone();
        let mut text = TextSource::for_section(&mut main)?;
        let split_handles = self.version.is_unicode();
        if split_handles {
            let end_bit = handles.read_raw_long()? as u32 as u64;
            handles.set_position_in_bits(end_bit)?;
        }

        let mut header = HeaderVariables::new();
        for field in fields_for(self.version) {
            if let Some((gate, expected)) = field.requires {
                if header.get(gate).and_then(HeaderValue::as_i32) != Some(expected as i32) {
                    continue;
                }
            }
            let value = match field.kind {
                VariableKind::Bit => HeaderValue::Bool(main.read_bit()?),
                VariableKind::BitShort => HeaderValue::Short(main.read_bit_short()?),
                VariableKind::RawChar => HeaderValue::Short(main.read_byte()? as i16),
                VariableKind::BitLong => HeaderValue::Long(main.read_bit_long()?),
                VariableKind::BitLongLong => HeaderValue::LongLong(main.read_bit_long_long()?),
                VariableKind::BitDouble => HeaderValue::Double(main.read_bit_double()?),
                VariableKind::Point2 => HeaderValue::Point2(main.read_2raw_double()?),
                VariableKind::Point3 => HeaderValue::Point3(main.read_3bit_double()?),
                VariableKind::Text => HeaderValue::Text(text.read(&mut main)?),
                VariableKind::Handle => {
                    let raw = if split_handles {
                        handles.read_handle()?
                    } else {
                        main.read_handle()?
                    };
                    HeaderValue::Handle(ObjectRef::from_raw(raw, Handle::NULL))
                }
                VariableKind::HandleSeed => HeaderValue::LongLong(main.read_handle()?.value),
                VariableKind::Color => HeaderValue::Color(main.read_cm_color()?),
                VariableKind::Time => HeaderValue::Time {
                    days: main.read_bit_long()?,
                    milliseconds: main.read_bit_long()?,
                },
            };
            header.set(field.name, value);
        }
        Ok(header)
    }
}
