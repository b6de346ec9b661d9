//! DWG bit-level stream readers and section readers.
//!
//! ## Stream readers
//! - [`stream_reader`]: bit cursor and primitive decoding
//! - [`merged_reader`]: main, string and handle streams of one object
//!
//! ## Section readers
//! - [`section_reader`]: logical section buffers from either layout
//! - [`header_reader`]: `AcDb:Header` (header variables)
//! - [`classes_reader`]: `AcDb:Classes` (class table)
//! - [`handle_reader`]: `AcDb:Handles` (object map)
//! - [`object_reader`]: `AcDb:AcDbObjects` (object records)
//! - [`preview_reader`]: `AcDb:Preview` (thumbnail)
//!
//! [`dwg_reader`] runs the whole pipeline.

pub mod merged_reader;
pub mod stream_reader;

pub mod classes_reader;
pub mod context;
pub mod dwg_reader;
pub mod handle_reader;
pub mod header_reader;
pub mod object_reader;
pub mod preview_reader;
pub mod section_reader;

pub use classes_reader::DwgClassesReader;
pub use context::DecodeContext;
pub use dwg_reader::{DwgReader, DwgReaderConfiguration};
pub use handle_reader::{DwgHandleReader, ObjectMapEntry};
pub use header_reader::DwgHeaderReader;
pub use merged_reader::MergedReader;
pub use object_reader::DwgObjectReader;
pub use preview_reader::DwgPreviewReader;
pub use section_reader::SectionFramer;
pub use stream_reader::DwgStreamReader;
