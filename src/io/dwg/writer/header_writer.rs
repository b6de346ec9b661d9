//! DWG Header section writer.
//!
//! The exact mirror of the header reader: walks the positional layout of the
//! target revision and writes each variable, falling back to its default
//! when the document does not carry it.

use super::merged_writer::MergedWriter;
use crate::error::{DwgError, Result};
use crate::header::{HeaderValue, HeaderVariables};
use crate::io::dwg::header_layout::{fields_for, HeaderField, VariableKind};
use crate::types::{DwgVersion, Handle, HandleRef};

/// Writer for the `AcDb:Header` body; framing is added by the caller.
pub struct DwgHeaderWriter {
    version: DwgVersion,
    code_page: u16,
    handle_seed: u64,
}

impl DwgHeaderWriter {
    pub fn new(version: DwgVersion, code_page: u16) -> Self {
        Self {
            version,
            code_page,
            handle_seed: 0,
        }
    }

    /// Lowest HANDSEED to write; a larger stored value is kept.
    pub fn with_handle_seed(mut self, seed: u64) -> Self {
        self.handle_seed = seed;
        self
    }

    pub fn write(&self, header: &HeaderVariables) -> Result<Vec<u8>> {
        let mut w = MergedWriter::for_section(self.version, self.code_page);
        let split_handles = w.text.is_some();

        let mut written = HeaderVariables::new();
        for field in fields_for(self.version) {
            if let Some((gate, expected)) = field.requires {
                if written.get(gate).and_then(HeaderValue::as_i32) != Some(expected as i32) {
                    continue;
                }
            }
            let value = self.value_for(field, header);
            match (field.kind, &value) {
                (VariableKind::Bit, HeaderValue::Bool(v)) => w.main.write_bit(*v),
                (VariableKind::BitShort, HeaderValue::Short(v)) => w.main.write_bit_short(*v),
                (VariableKind::RawChar, HeaderValue::Short(v)) => w.main.write_byte(*v as u8),
                (VariableKind::BitLong, HeaderValue::Long(v)) => w.main.write_bit_long(*v),
                (VariableKind::BitLongLong, HeaderValue::LongLong(v)) => {
                    w.main.write_bit_long_long(*v)?
                }
                (VariableKind::BitDouble, HeaderValue::Double(v)) => w.main.write_bit_double(*v),
                (VariableKind::Point2, HeaderValue::Point2(v)) => w.main.write_2raw_double(*v),
                (VariableKind::Point3, HeaderValue::Point3(v)) => w.main.write_3bit_double(*v),
                (VariableKind::Text, HeaderValue::Text(v)) => w.write_text(v)?,
                (VariableKind::Handle, HeaderValue::Handle(r)) => {
                    let raw = r.encode_for(Handle::NULL);
                    if split_handles {
                        w.handles.write_handle(raw);
                    } else {
                        w.main.write_handle(raw);
                    }
                }
                (VariableKind::HandleSeed, HeaderValue::LongLong(v)) => {
                    w.main.write_handle(HandleRef::new(0, *v))
                }
                (VariableKind::Color, HeaderValue::Color(c)) => w.main.write_cm_color(*c),
                (VariableKind::Time, HeaderValue::Time { days, milliseconds }) => {
                    w.main.write_bit_long(*days);
                    w.main.write_bit_long(*milliseconds);
                }
                (_, other) => {
                    return Err(DwgError::Encode(format!(
                        "header variable {} cannot hold {other:?}",
                        field.name
                    )))
                }
            }
            written.set(field.name, value);
        }
        w.finish_section()
    }

    fn value_for(&self, field: &HeaderField, header: &HeaderVariables) -> HeaderValue {
        let value = header
            .get(field.name)
            .and_then(|v| field.coerce(v))
            .unwrap_or_else(|| field.default_value());
        match (field.kind, value) {
            (VariableKind::HandleSeed, HeaderValue::LongLong(seed)) => {
                HeaderValue::LongLong(seed.max(self.handle_seed))
            }
            (_, value) => value,
        }
    }
}
