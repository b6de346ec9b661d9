//! DWG binary format support.
//!
//! # Module Structure
//!
//! - [`constants`]: sentinels, section names, layout magic numbers
//! - [`crc`]: the 16-bit section CRC and the CRC-32 of the paged metadata
//! - [`checksum`]: page checksum of the paged layout
//! - [`encryption`]: metadata and page header masking
//! - [`compression`]: page compression codec
//! - [`reed_solomon`]: RS(255,239) protection of page headers
//! - [`page`]: one page on disk (RS block, masked header, payload)
//! - [`file_header`]: file headers, page map and section map
//! - [`header_layout`]: positional table of the header variables
//! - [`section_io`]: sentinel-framed header and class sections
//! - [`object_type`]: built-in object type codes
//! - [`reader`] / [`writer`]: bit streams, section codecs and the file pipelines

pub mod checksum;
pub mod compression;
pub mod constants;
pub mod crc;
pub mod encryption;
pub mod file_header;
pub mod header_layout;
pub mod object_type;
pub mod page;
pub mod reader;
pub mod reed_solomon;
pub mod section_io;
pub mod writer;

pub use compression::{Compressor, Decompressor};
pub use file_header::{
    DwgFileHeader, FlatFileHeader, PagedFileHeader, SecondFileHeader, SectionDescriptor,
};
pub use object_type::DwgObjectType;
pub use reader::{DwgReader, DwgReaderConfiguration};
pub use section_io::SectionIO;
pub use writer::{DwgWriter, DwgWriterConfiguration};
