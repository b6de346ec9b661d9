//! Writers for the streams of one object record.

use super::stream_writer::DwgStreamWriter;
use crate::error::{DwgError, Result};
use crate::types::{DwgVersion, Handle, ObjectRef};

/// Main, text and handle writers of one record.
///
/// Text goes to a separate stream from R2007 and inline before.
#[derive(Debug, Clone)]
pub struct MergedWriter {
    pub main: DwgStreamWriter,
    pub text: Option<DwgStreamWriter>,
    pub handles: DwgStreamWriter,
    /// Handle of the object being written, base for relative references
    pub owner: Handle,
}

impl MergedWriter {
    pub fn new(version: DwgVersion, code_page: u16, owner: Handle) -> Self {
        let writer = || DwgStreamWriter::new(version).with_code_page(code_page);
        Self {
            main: writer(),
            text: version.is_unicode().then(writer),
            handles: writer(),
            owner,
        }
    }

    /// Writer for a section body; reserves the R2007+ end-of-data RL.
    pub fn for_section(version: DwgVersion, code_page: u16) -> Self {
        let mut writer = Self::new(version, code_page, Handle::NULL);
        if writer.text.is_some() {
            writer.main.write_raw_long(0);
        }
        writer
    }

    /// Close a section body started with [`MergedWriter::for_section`].
    ///
    /// From R2007 the handle stream follows the end of the main data.
    pub fn finish_section(mut self) -> Result<Vec<u8>> {
        if self.text.is_none() {
            return Ok(self.main.into_bytes());
        }
        let end_bit = self.finish_main();
        let end_bit = i32::try_from(end_bit)
            .map_err(|_| DwgError::Encode("section exceeds 2^31 bits".into()))?;
        self.main.patch_raw_long(0, end_bit)?;
        let MergedWriter { mut main, handles, .. } = self;
        main.append(&handles);
        Ok(main.into_bytes())
    }

    pub fn write_text(&mut self, value: &str) -> Result<()> {
        match self.text.as_mut() {
            Some(text) => text.write_variable_text(value),
            None => self.main.write_variable_text(value),
        }
    }

    pub fn write_ref(&mut self, reference: &ObjectRef) {
        self.handles.write_handle(reference.encode_for(self.owner));
    }

    pub fn write_refs<'r>(&mut self, references: impl IntoIterator<Item = &'r ObjectRef>) {
        for reference in references {
            self.write_ref(reference);
        }
    }

    /// Close the main data: append the string stream when there is one.
    ///
    /// Returns the end of the main data in bits, where the handle stream starts.
    pub fn finish_main(&mut self) -> u64 {
        if let Some(text) = self.text.as_ref() {
            self.main.write_string_stream(text);
        }
        self.main.position_in_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::reader::merged_reader::{MergedReader, TextSource};
    use crate::io::dwg::reader::stream_reader::DwgStreamReader;

    #[test]
    fn test_inline_text_before_r2007() {
        let mut w = MergedWriter::new(DwgVersion::AC1015, 30, Handle::new(1));
        assert!(w.text.is_none());
        w.write_text("abc").unwrap();
        let end = w.finish_main();
        assert_eq!(end, w.main.position_in_bits());
        let bytes = w.main.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1015);
        assert_eq!(r.read_variable_text().unwrap(), "abc");
    }

    #[test]
    fn test_string_stream_is_located() {
        let mut w = MergedWriter::new(DwgVersion::AC1021, 30, Handle::new(1));
        w.main.write_bit_short(42);
        w.write_text("Straße").unwrap();
        let end = w.finish_main();
        let bytes = w.main.into_bytes();

        let mut main = DwgStreamReader::new(&bytes, DwgVersion::AC1021);
        let mut text = main.clone();
        let start = text.locate_string_stream(end).unwrap();
        assert!(start.is_some());
        let mut reader = MergedReader::new(
            main.clone(),
            TextSource::Stream(text),
            DwgStreamReader::new(&[], DwgVersion::AC1021),
            Handle::new(1),
        );
        assert_eq!(main.read_bit_short().unwrap(), 42);
        assert_eq!(reader.read_text().unwrap(), "Straße");
    }

    #[test]
    fn test_refs_are_relative_to_owner() {
        let mut w = MergedWriter::new(DwgVersion::AC1018, 30, Handle::new(0x20));
        let owner_ref = ObjectRef::from_raw(crate::types::HandleRef::new(6, 0), Handle::new(0x40));
        w.write_ref(&owner_ref);
        let bytes = w.handles.into_bytes();
        let mut r = DwgStreamReader::new(&bytes, DwgVersion::AC1018);
        let raw = r.read_handle().unwrap();
        assert_eq!(raw.code, 0xA);
        assert_eq!(raw.absolute(Handle::new(0x20)), Handle::new(0x41));
    }
}
