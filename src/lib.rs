//! # dwgcodec
//!
//! A pure Rust codec for the DWG binary CAD format.
//!
//! ## Features
//!
//! - Bit-level primitive codec (BB, BS, BL, BLL, BD, DD, MC, MS, handles, text)
//! - Pre-2004 section layout and the paged R2004+ layout
//! - Page compression and Reed-Solomon protection of page headers
//! - Object graph decoding with per-object isolation of failures
//! - Preview image and uninterpreted sections carried through a rewrite
//! - Handle resolution into navigable, non-owning links
//! - Revisions R13 (AC1012) through R2018 (AC1032)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let bytes = std::fs::read("sample.dwg")?;
//! let doc = dwgcodec::decode(&bytes)?;
//!
//! for object in doc.objects() {
//!     println!("{} {}", object.handle, object.name());
//! }
//! for note in doc.notifications().iter() {
//!     println!("{note}");
//! }
//!
//! let out = dwgcodec::encode(&doc, dwgcodec::DwgVersion::AC1018)?;
//! # Ok::<(), dwgcodec::DwgError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`io::dwg::reader::SectionFramer`] turns the file into one buffer per
//!   logical section
//! - [`io::dwg::reader::DwgObjectReader`] decodes the object records listed
//!   by the object map
//! - [`DwgDocument`] owns every object; [`ObjectRef`] links are resolved
//!   against its handle index
//! - Non-fatal problems end up in the document's [`NotificationCollection`]
//!   and are also emitted as `tracing` events

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classes;
pub mod document;
pub mod error;
pub mod header;
pub mod io;
pub mod notification;
pub mod objects;
pub mod preview;
pub mod resolver;
pub mod types;

pub use classes::{ClassTable, DxfClass};
pub use document::{DwgDocument, RawSection};
pub use error::{DecodeError, DwgError, EncodeError, Result, Severity};
pub use header::{HeaderValue, HeaderVariables};
pub use io::dwg::{DwgReader, DwgReaderConfiguration, DwgWriter, DwgWriterConfiguration};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use objects::{DwgObject, EntityHeader, ObjectData, Supertype};
pub use preview::{DwgPreview, PreviewType};
pub use types::{Color, DwgVersion, Handle, ObjectRef, Vector2, Vector3};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decode a DWG file with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<DwgDocument> {
    decode_with(bytes, &DwgReaderConfiguration::default())
}

/// Decode a DWG file.
pub fn decode_with(bytes: &[u8], config: &DwgReaderConfiguration) -> Result<DwgDocument> {
    io::dwg::reader::dwg_reader::read_document(bytes, config)
}

/// Encode a document at `target` with the default configuration.
pub fn encode(document: &DwgDocument, target: DwgVersion) -> Result<Vec<u8>> {
    encode_with(document, target, &DwgWriterConfiguration::default())
}

/// Encode a document at `target`.
///
/// Objects kept as raw bytes are written only when `target` is the revision
/// they were read from.
pub fn encode_with(
    document: &DwgDocument,
    target: DwgVersion,
    config: &DwgWriterConfiguration,
) -> Result<Vec<u8>> {
    DwgWriter::new(*config).write_as(document, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_empty_document_round_trip() {
        for version in DwgVersion::ALL {
            let bytes = encode(&DwgDocument::new(version), version).unwrap();
            let doc = decode(&bytes).unwrap();
            assert_eq!(doc.version(), version);
            assert!(doc.is_empty());
            assert!(doc.notifications().is_empty(), "{version}");
        }
    }

    #[test]
    fn test_encode_at_another_revision_leaves_document_alone() {
        let doc = DwgDocument::new(DwgVersion::AC1015);
        let bytes = encode(&doc, DwgVersion::AC1018).unwrap();
        assert_eq!(decode(&bytes).unwrap().version(), DwgVersion::AC1018);
        assert_eq!(doc.version(), DwgVersion::AC1015);
    }
}
