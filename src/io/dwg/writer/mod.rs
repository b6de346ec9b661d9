//! DWG writer modules.
//!
//! - [`stream_writer`]: bit cursor and primitive encoding
//! - [`merged_writer`]: main, string and handle streams of one object
//! - [`header_writer`]: header section writer
//! - [`classes_writer`]: classes section writer
//! - [`object_writer`]: object records
//! - [`handle_writer`]: object map section writer
//! - [`preview_writer`]: thumbnail section writer
//! - [`file_header_writer`]: file assembly for both layouts
//! - [`dwg_writer`]: the whole pipeline

pub mod classes_writer;
pub mod dwg_writer;
pub mod file_header_writer;
pub mod handle_writer;
pub mod header_writer;
pub mod merged_writer;
pub mod object_writer;
pub mod preview_writer;
pub mod stream_writer;

pub use classes_writer::DwgClassesWriter;
pub use dwg_writer::{DwgWriter, DwgWriterConfiguration};
pub use file_header_writer::{FileHeaderWriter, FlatFileWriter, PagedFileWriter};
pub use handle_writer::DwgHandleWriter;
pub use header_writer::DwgHeaderWriter;
pub use merged_writer::MergedWriter;
pub use object_writer::DwgObjectWriter;
pub use preview_writer::DwgPreviewWriter;
pub use stream_writer::DwgStreamWriter;
