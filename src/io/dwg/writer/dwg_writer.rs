//! DWG file writer, the top-level encoder.
//!
//! Ties the section writers (header, classes, objects, object map, preview)
//! to the file assembler of the target revision.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use super::classes_writer::DwgClassesWriter;
use super::file_header_writer::{FileHeaderWriter, FlatFileWriter, PagedFileWriter};
use super::handle_writer::DwgHandleWriter;
use super::header_writer::DwgHeaderWriter;
use super::object_writer::DwgObjectWriter;
use super::preview_writer::DwgPreviewWriter;
use crate::document::{DwgDocument, RawSection};
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::paged::MAX_PAGE_SIZE;
use crate::io::dwg::constants::section_names;
use crate::io::dwg::file_header::SecondFileHeader;
use crate::io::dwg::section_io::SectionIO;
use crate::types::DwgVersion;

/// Configuration options for the DWG writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwgWriterConfiguration {
    /// Compress the data pages of R2004+ files.
    ///
    /// Default: `true`.
    pub compress: bool,

    /// Largest decompressed payload per data page.
    ///
    /// Default: `0x7400`.
    pub max_page_size: usize,

    /// Code page written to the file header; pre-R2007 text is encoded with it.
    ///
    /// Default: `30` (ANSI_1252).
    pub code_page: u16,

    /// Maintenance release number written to the file header.
    ///
    /// Default: `0`.
    pub maintenance_version: u8,
}

impl Default for DwgWriterConfiguration {
    fn default() -> Self {
        Self {
            compress: true,
            max_page_size: MAX_PAGE_SIZE,
            code_page: 30,
            maintenance_version: 0,
        }
    }
}

/// DWG file writer.
///
/// # Usage
/// ```no_run
/// use dwgcodec::document::DwgDocument;
/// use dwgcodec::io::dwg::writer::{DwgWriter, DwgWriterConfiguration};
/// use dwgcodec::types::DwgVersion;
///
/// let doc = DwgDocument::new(DwgVersion::AC1018);
/// let bytes = DwgWriter::new(DwgWriterConfiguration::default()).write(&doc).unwrap();
/// std::fs::write("output.dwg", &bytes).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DwgWriter {
    config: DwgWriterConfiguration,
}

impl DwgWriter {
    pub fn new(config: DwgWriterConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DwgWriterConfiguration {
        &self.config
    }

    /// Encode `doc` at its revision and return the complete file.
    pub fn write(&self, doc: &DwgDocument) -> Result<Vec<u8>> {
        self.write_as(doc, doc.version())
    }

    /// Encode `doc` at `version`, which may differ from the document's own.
    ///
    /// Raw objects and retained sections read at another revision are left out.
    pub fn write_as(&self, doc: &DwgDocument, version: DwgVersion) -> Result<Vec<u8>> {
        let config = &self.config;
        let sio = SectionIO::new(version, config.maintenance_version);

        let retained: &[RawSection] = if version == doc.source_version() {
            doc.retained_sections()
        } else {
            if !doc.retained_sections().is_empty() {
                debug!(
                    sections = doc.retained_sections().len(),
                    source = %doc.source_version(),
                    "retained sections dropped"
                );
            }
            &[]
        };
        let next_handle = doc
            .objects()
            .iter()
            .map(|o| o.handle.value())
            .max()
            .map_or(1, |last| last + 1);

        let mut file: Box<dyn FileHeaderWriter> = if version.is_paged() {
            Box::new(PagedFileWriter::new(
                version,
                config.code_page,
                config.maintenance_version,
                config.compress,
                config.max_page_size,
            )?)
        } else {
            let record_count = retained
                .iter()
                .filter_map(|s| section_names::locator_number(&s.name))
                .map(|n| n as usize + 1)
                .max()
                .unwrap_or(0);
            Box::new(
                FlatFileWriter::new(version, config.code_page, config.maintenance_version)
                    .with_record_count(record_count)
                    .with_seed_handles(SecondFileHeader::seed_handles(doc.header(), next_handle)),
            )
        };

        // Pre-2004 files place the auxiliary header and the preview first.
        let (leading, trailing): (Vec<&RawSection>, Vec<&RawSection>) = retained
            .iter()
            .partition(|s| !version.is_paged() && s.name == section_names::AUX_HEADER);
        for section in leading {
            file.add_section(&section.name, section.data.clone())?;
        }
        if !version.is_paged() {
            add_preview(file.as_mut(), doc)?;
        }

        let header = DwgHeaderWriter::new(version, config.code_page)
            .with_handle_seed(next_handle)
            .write(doc.header())?;
        file.add_section(
            section_names::HEADER,
            sio.write_framed(section_names::HEADER, &header)?,
        )?;

        let classes = DwgClassesWriter::new(version, config.code_page).write(doc.classes())?;
        file.add_section(
            section_names::CLASSES,
            sio.write_framed(section_names::CLASSES, &classes)?,
        )?;

        let (objects, mut map) =
            DwgObjectWriter::new(version, config.code_page).write(doc.objects())?;
        let base = i64::try_from(file.objects_offset())
            .map_err(|_| DwgError::Encode("objects start beyond the offset range".into()))?;
        for (_, offset) in map.iter_mut() {
            *offset += base;
        }
        let object_count = map.len();
        let object_bytes = objects.len();
        file.add_section(section_names::OBJECTS, objects)?;

        let handles = DwgHandleWriter::new(version).write(&map)?;
        file.add_section(section_names::HANDLES, handles)?;

        if version.is_paged() {
            add_preview(file.as_mut(), doc)?;
        }
        for section in trailing {
            file.add_section(&section.name, section.data.clone())?;
        }

        let bytes = file.write_file()?;
        info!(
            %version,
            objects = object_count,
            object_bytes,
            bytes = bytes.len(),
            "DWG written"
        );
        Ok(bytes)
    }

    /// Encode `doc` into `writer`.
    pub fn write_to<W: Write>(&self, doc: &DwgDocument, mut writer: W) -> Result<()> {
        writer.write_all(&self.write(doc)?)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode `doc` into a new file at `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, doc: &DwgDocument, path: P) -> Result<()> {
        self.write_to(doc, BufWriter::new(File::create(path)?))
    }
}

fn add_preview(file: &mut dyn FileHeaderWriter, doc: &DwgDocument) -> Result<()> {
    let preview = DwgPreviewWriter::new(file.objects_offset()).write(doc.preview())?;
    file.add_section(section_names::PREVIEW, preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::file_header::{DwgFileHeader, FlatFileHeader};
    use crate::preview::{DwgPreview, PreviewType};
    use crate::io::dwg::reader::dwg_reader::DwgReader;
    use crate::objects::{DwgObject, Layer, ObjectData};
    use crate::types::{Handle, ObjectRef};

    fn layer_document(version: DwgVersion) -> DwgDocument {
        let mut doc = DwgDocument::new(version);
        doc.add_object(DwgObject::new_object(
            0x33,
            Handle::new(0x10),
            ObjectRef::NULL,
            ObjectData::Layer(Layer::new("0")),
        ));
        doc
    }

    #[test]
    fn test_default_configuration() {
        let config = DwgWriterConfiguration::default();
        assert!(config.compress);
        assert_eq!(config.max_page_size, 0x7400);
        assert_eq!(config.code_page, 30);
        assert_eq!(config.maintenance_version, 0);
    }

    #[test]
    fn test_file_header_matches_configuration() {
        let config = DwgWriterConfiguration {
            maintenance_version: 4,
            code_page: 29,
            ..Default::default()
        };
        for version in [DwgVersion::AC1015, DwgVersion::AC1024] {
            let bytes = DwgWriter::new(config).write(&layer_document(version)).unwrap();
            let header = DwgFileHeader::parse(&bytes, true).unwrap();
            assert_eq!(header.version(), version);
            assert_eq!(header.maintenance_version(), 4);
            assert_eq!(header.code_page(), 29);
        }
    }

    #[test]
    fn test_flat_map_offsets_are_absolute() {
        let bytes = DwgWriter::default()
            .write(&layer_document(DwgVersion::AC1014))
            .unwrap();
        let doc = DwgReader::from_bytes(bytes).read().unwrap();
        let layer = doc.get_by_handle(0x10).unwrap();
        assert!(layer.address > 0x60);
        assert!(doc.notifications().is_empty());
    }

    #[test]
    fn test_uncompressed_small_pages() {
        let config = DwgWriterConfiguration {
            compress: false,
            max_page_size: 0x40,
            ..Default::default()
        };
        let bytes = DwgWriter::new(config)
            .write(&layer_document(DwgVersion::AC1027))
            .unwrap();
        let doc = DwgReader::from_bytes(bytes).read().unwrap();
        assert!(matches!(
            doc.get_by_handle(0x10).map(|o| &o.data),
            Some(ObjectData::Layer(layer)) if layer.name == "0"
        ));
    }

    #[test]
    fn test_write_as_other_revision() {
        let doc = layer_document(DwgVersion::AC1015);
        let bytes = DwgWriter::default().write_as(&doc, DwgVersion::AC1018).unwrap();
        assert_eq!(doc.version(), DwgVersion::AC1015);

        let read = DwgReader::from_bytes(bytes).read().unwrap();
        assert_eq!(read.version(), DwgVersion::AC1018);
        assert!(matches!(
            read.get_by_handle(0x10).map(|o| &o.data),
            Some(ObjectData::Layer(layer)) if layer.name == "0"
        ));
    }

    #[test]
    fn test_flat_preview_precedes_header() {
        let mut doc = layer_document(DwgVersion::AC1015);
        doc.set_preview(Some(DwgPreview::new(PreviewType::Png, Vec::new(), vec![0x89; 16])));
        let bytes = DwgWriter::default().write(&doc).unwrap();
        let DwgFileHeader::Flat(header) = DwgFileHeader::parse(&bytes, true).unwrap() else {
            panic!("expected a pre-2004 file");
        };
        let header_start = header.record(0).unwrap().seeker;
        assert_eq!(header.preview_address, FlatFileHeader::encoded_size(3) as u32);
        assert!(header.preview_address < header_start);
        assert_eq!(header.records.len(), 3);
    }

    #[test]
    fn test_write_to_stream() {
        let doc = layer_document(DwgVersion::AC1018);
        let mut out = Vec::new();
        DwgWriter::default().write_to(&doc, &mut out).unwrap();
        assert_eq!(out, DwgWriter::default().write(&doc).unwrap());
    }
}
