//! DWG reader, the entry point for decoding a whole file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dwgcodec::io::dwg::reader::DwgReader;
//!
//! let doc = DwgReader::from_file("sample.dwg")?.read()?;
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::classes_reader::DwgClassesReader;
use super::context::DecodeContext;
use super::handle_reader::DwgHandleReader;
use super::header_reader::DwgHeaderReader;
use super::object_reader::DwgObjectReader;
use super::preview_reader::DwgPreviewReader;
use super::section_reader::SectionFramer;
use crate::classes::ClassTable;
use crate::document::{DwgDocument, RawSection};
use crate::error::{DwgError, Result};
use crate::header::HeaderVariables;
use crate::io::dwg::constants::section_names;
use crate::io::dwg::file_header::{DwgFileHeader, FlatFileHeader, SecondFileHeader};
use crate::io::dwg::section_io::SectionIO;
use crate::notification::NotificationType;
use crate::preview::DwgPreview;

/// Configuration options for the DWG reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwgReaderConfiguration {
    /// When `true`, a corrupt header variables or class section is reported
    /// as a notification and decoding continues without it. The object map
    /// and the objects section are required either way.
    ///
    /// Default: `true`.
    pub failsafe: bool,

    /// When `true`, CRCs and page checksums are verified.
    ///
    /// Default: `true`.
    pub verify_crc: bool,
}

impl Default for DwgReaderConfiguration {
    fn default() -> Self {
        Self {
            failsafe: true,
            verify_crc: true,
        }
    }
}

/// DWG file reader, produces a [`DwgDocument`].
///
/// The read pipeline is:
///
/// 1. Parse the file header for the revision's layout.
/// 2. Build the section framer (page map and section map from R2004).
/// 3. Read the header variables and the class table.
/// 4. Read the object map, then every object it lists.
/// 5. Read the preview and keep the sections not decoded as raw bytes.
/// 6. Assemble the document and resolve handle references.
#[derive(Debug, Clone)]
pub struct DwgReader {
    data: Vec<u8>,
    config: DwgReaderConfiguration,
}

impl DwgReader {
    /// Open a DWG file by path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    /// Read the whole of `reader` into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            config: DwgReaderConfiguration::default(),
        }
    }

    /// Set configuration options.
    pub fn with_config(mut self, config: DwgReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DwgReaderConfiguration {
        &self.config
    }

    /// Decode the file.
    pub fn read(&self) -> Result<DwgDocument> {
        read_document(&self.data, &self.config)
    }
}

/// Decode `data` as a DWG file.
pub(crate) fn read_document(data: &[u8], config: &DwgReaderConfiguration) -> Result<DwgDocument> {
    let file_header = DwgFileHeader::parse(data, config.verify_crc)?;
    let version = file_header.version();
    let maintenance_version = file_header.maintenance_version();
    let code_page = file_header.code_page();
    info!(%version, maintenance_version, code_page, bytes = data.len(), "reading DWG");

    let mut ctx = DecodeContext::new(version, maintenance_version, code_page, config.verify_crc);
    ctx.section = "file header";
    if let DwgFileHeader::Flat(header) = &file_header {
        if config.verify_crc {
            if let Err(e) = header.verify_crc(data) {
                policy_failure(&mut ctx, config, e.in_section("file header"))?;
            }
        }
    }

    let framer = SectionFramer::new(data, &file_header, &mut ctx)?;
    for name in section_names::MANDATORY {
        if !framer.has_section(name) {
            return Err(DwgError::MissingSection(name.to_string()));
        }
    }

    let header = read_header(&framer, &mut ctx, config)?;
    let classes = read_classes(&framer, &mut ctx, config)?;

    ctx.section = section_names::HANDLES;
    let handles = framer.section(section_names::HANDLES, &mut ctx)?;
    let entries = DwgHandleReader::new(&handles, version, config.verify_crc)
        .read()
        .map_err(|e| e.in_section(section_names::HANDLES))?;
    debug!(entries = entries.len(), "object map");

    ctx.section = section_names::OBJECTS;
    let objects_data = framer.section(section_names::OBJECTS, &mut ctx)?;
    let objects = DwgObjectReader::new(&objects_data, &entries, &classes).read(&mut ctx)?;

    let preview = read_preview(data, &file_header, &framer, &mut ctx);
    let retained = read_retained(&framer, &mut ctx);
    let second_header = match &file_header {
        DwgFileHeader::Flat(header) => read_second_header(data, header, &mut ctx),
        DwgFileHeader::Paged(_) => None,
    };

    let notifications = ctx.into_notifications();
    let mut document = DwgDocument::from_decoded(
        version,
        maintenance_version,
        code_page,
        header,
        classes,
        objects,
        notifications,
    );
    document.set_preview(preview);
    for section in retained {
        document.retain_section(section.name, section.data);
    }
    if let Some(second_header) = second_header {
        document.set_second_header(second_header);
    }
    info!(
        objects = document.len(),
        dangling = document.dangling_references(),
        notifications = document.notifications().len(),
        "DWG read"
    );
    Ok(document)
}

/// Apply the failsafe policy to a failure in an optional section.
fn policy_failure(
    ctx: &mut DecodeContext,
    config: &DwgReaderConfiguration,
    error: DwgError,
) -> Result<()> {
    if config.failsafe {
        ctx.notify(NotificationType::Integrity, error.to_string());
        Ok(())
    } else {
        Err(error)
    }
}

fn read_header(
    framer: &SectionFramer<'_>,
    ctx: &mut DecodeContext,
    config: &DwgReaderConfiguration,
) -> Result<HeaderVariables> {
    ctx.section = section_names::HEADER;
    let result = read_framed(framer, ctx, section_names::HEADER, |body, ctx| {
        DwgHeaderReader::new(body, ctx.version(), ctx.code_page).read()
    });
    match result {
        Ok(header) => Ok(header),
        Err(e) => {
            policy_failure(ctx, config, e.in_section(section_names::HEADER))?;
            Ok(HeaderVariables::new())
        }
    }
}

fn read_classes(
    framer: &SectionFramer<'_>,
    ctx: &mut DecodeContext,
    config: &DwgReaderConfiguration,
) -> Result<ClassTable> {
    ctx.section = section_names::CLASSES;
    if !framer.has_section(section_names::CLASSES) {
        ctx.notify(NotificationType::Notice, "file has no class section");
        return Ok(ClassTable::new());
    }
    let result = read_framed(framer, ctx, section_names::CLASSES, |body, ctx| {
        DwgClassesReader::new(body, ctx.version(), ctx.code_page).read()
    });
    match result {
        Ok(classes) => {
            debug!(classes = classes.len(), "class table");
            Ok(classes)
        }
        Err(e) => {
            policy_failure(ctx, config, e.in_section(section_names::CLASSES))?;
            Ok(ClassTable::new())
        }
    }
}

/// Thumbnail, if the file has one. A damaged preview is reported and dropped.
fn read_preview(
    data: &[u8],
    file_header: &DwgFileHeader,
    framer: &SectionFramer<'_>,
    ctx: &mut DecodeContext,
) -> Option<DwgPreview> {
    ctx.section = section_names::PREVIEW;
    let result = match file_header {
        DwgFileHeader::Flat(header) => {
            let address = header.preview_address as usize;
            if address == 0 {
                return None;
            }
            match data.get(address..) {
                Some(bytes) => DwgPreviewReader::new(bytes).read(),
                None => Err(DwgError::OutOfBounds {
                    position: address as u64 * 8,
                    size: data.len() as u64,
                }),
            }
        }
        DwgFileHeader::Paged(_) => {
            if !framer.has_section(section_names::PREVIEW) {
                return None;
            }
            framer
                .section(section_names::PREVIEW, ctx)
                .and_then(|bytes| DwgPreviewReader::new(&bytes).read())
        }
    };
    match result {
        Ok(preview) if preview.is_empty() && preview.raw_header.is_empty() => None,
        Ok(preview) => {
            debug!(code = ?preview.code, bytes = preview.raw_image.len(), "preview");
            Some(preview)
        }
        Err(e) => {
            let e = e.in_section(section_names::PREVIEW);
            ctx.notify(NotificationType::Warning, e.to_string());
            None
        }
    }
}

/// Sections the reader does not decode, as stored.
fn read_retained(framer: &SectionFramer<'_>, ctx: &mut DecodeContext) -> Vec<RawSection> {
    ctx.section = "uninterpreted section";
    let mut retained = Vec::new();
    for name in framer.names() {
        if section_names::DECODED.contains(&name) {
            continue;
        }
        match framer.section(name, ctx) {
            Ok(data) => {
                debug!(section = name, bytes = data.len(), "section kept as stored");
                retained.push(RawSection {
                    name: name.to_string(),
                    data: data.into_owned(),
                });
            }
            Err(e) => ctx.notify(NotificationType::Warning, e.in_section(name).to_string()),
        }
    }
    retained
}

/// Repeated header after the object map of a pre-2004 file.
fn read_second_header(
    data: &[u8],
    header: &FlatFileHeader,
    ctx: &mut DecodeContext,
) -> Option<SecondFileHeader> {
    ctx.section = "second file header";
    let from = header
        .record(2)
        .map_or(0, |r| (r.seeker as usize).saturating_add(r.size as usize));
    let start = SecondFileHeader::find(data, from)?;
    match SecondFileHeader::parse(&data[start..], header.version) {
        Ok(second) => Some(second),
        Err(e) => {
            let e = e.in_section("second file header");
            ctx.notify(NotificationType::Warning, e.to_string());
            None
        }
    }
}

/// Unwrap the sentinel-framed section `name` and decode its body.
fn read_framed<T>(
    framer: &SectionFramer<'_>,
    ctx: &mut DecodeContext,
    name: &str,
    decode: impl FnOnce(&[u8], &DecodeContext) -> Result<T>,
) -> Result<T> {
    let section = framer.section(name, ctx)?;
    let io = SectionIO::new(ctx.version(), ctx.maintenance_version);
    let body = io.read_framed(name, &section, ctx.verify_crc)?;
    decode(body, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dwg::writer::dwg_writer::{DwgWriter, DwgWriterConfiguration};
    use crate::objects::{DwgObject, Line, ObjectData};
    use crate::types::{DwgVersion, Handle, ObjectRef, Vector3};

    fn document(version: DwgVersion) -> DwgDocument {
        let mut doc = DwgDocument::new(version);
        doc.add_object(DwgObject::new_entity(
            0x13,
            Handle::new(0x20),
            ObjectRef::soft_pointer(Handle::new(0x1F)),
            Handle::new(0x10),
            ObjectData::Line(Line::from_points(
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(4.0, 3.0, 0.0),
            )),
        ));
        doc
    }

    fn header_section_offset(bytes: &[u8]) -> usize {
        match DwgFileHeader::parse(bytes, false).unwrap() {
            DwgFileHeader::Flat(h) => h.record(0).unwrap().seeker as usize,
            DwgFileHeader::Paged(_) => unreachable!("flat file expected"),
        }
    }

    fn encode(doc: &DwgDocument) -> Vec<u8> {
        DwgWriter::new(DwgWriterConfiguration::default())
            .write(doc)
            .unwrap()
    }

    #[test]
    fn test_default_configuration() {
        let config = DwgReaderConfiguration::default();
        assert!(config.failsafe);
        assert!(config.verify_crc);
    }

    #[test]
    fn test_reads_every_revision() {
        for version in DwgVersion::ALL {
            let bytes = encode(&document(version));
            let doc = DwgReader::from_bytes(bytes).read().unwrap();
            assert_eq!(doc.source_version(), version);
            assert_eq!(doc.len(), 1, "{version}");
            let line = doc.get_by_handle(0x20).unwrap();
            assert!(matches!(line.data, ObjectData::Line(_)), "{version}");
        }
    }

    #[test]
    fn test_from_reader() {
        let bytes = encode(&document(DwgVersion::AC1015));
        let doc = DwgReader::from_reader(std::io::Cursor::new(bytes))
            .unwrap()
            .read()
            .unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_corrupt_header_is_failsafe() {
        let mut bytes = encode(&document(DwgVersion::AC1015));
        // Damage the start sentinel of the header section.
        let header = header_section_offset(&bytes);
        bytes[header] ^= 0xFF;

        let doc = DwgReader::from_bytes(bytes.clone()).read().unwrap();
        assert!(doc.notifications().has_type(NotificationType::Integrity));
        assert!(doc.header().is_empty());
        assert_eq!(doc.len(), 1);

        let strict = DwgReaderConfiguration {
            failsafe: false,
            ..Default::default()
        };
        let err = DwgReader::from_bytes(bytes).with_config(strict).read().unwrap_err();
        assert!(matches!(err, DwgError::CorruptSection { .. }));
    }

    #[test]
    fn test_damaged_preview_is_dropped() {
        let mut doc = document(DwgVersion::AC1015);
        doc.set_preview(Some(DwgPreview::new(
            crate::preview::PreviewType::Bmp,
            vec![0; 80],
            vec![0x42; 64],
        )));
        let mut bytes = encode(&doc);
        let preview = match DwgFileHeader::parse(&bytes, false).unwrap() {
            DwgFileHeader::Flat(h) => h.preview_address as usize,
            DwgFileHeader::Paged(_) => unreachable!("flat file expected"),
        };
        bytes[preview] ^= 0xFF;

        let read = DwgReader::from_bytes(bytes).read().unwrap();
        assert!(read.preview().is_none());
        assert!(read.notifications().has_type(NotificationType::Warning));
        assert_eq!(read.len(), 1);
    }

    #[test]
    fn test_unknown_version_is_critical() {
        let mut bytes = encode(&document(DwgVersion::AC1015));
        bytes[..6].copy_from_slice(b"AC1006");
        assert!(matches!(
            DwgReader::from_bytes(bytes).read(),
            Err(DwgError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_truncated_file_is_critical() {
        let bytes = encode(&document(DwgVersion::AC1018));
        assert!(DwgReader::from_bytes(&bytes[..0x180]).read().is_err());
    }
}
