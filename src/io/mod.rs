//! I/O for the DWG binary format

pub mod dwg;

pub use dwg::{DwgReader, DwgReaderConfiguration, DwgWriter, DwgWriterConfiguration};
