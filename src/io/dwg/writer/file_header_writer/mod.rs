//! File assembly: places the encoded sections and writes the file header.
//!
//! - [`FlatFileWriter`]: R13 to R2000, sections laid out one after another
//! - [`PagedFileWriter`]: R2004+, sections split into checksummed pages

mod flat;
mod paged;

pub use flat::FlatFileWriter;
pub use paged::PagedFileWriter;

use crate::error::Result;

/// Assembles section data into a complete DWG file.
pub trait FileHeaderWriter {
    /// Address of the next section's first byte as the object map and the
    /// preview directory record it.
    ///
    /// Pre-2004 files use absolute file offsets; paged files count from the
    /// section start, so this is 0 there.
    fn objects_offset(&self) -> u64;

    /// Add the section `name`. Sections are laid out in the order added.
    fn add_section(&mut self, name: &str, data: Vec<u8>) -> Result<()>;

    /// Write the file header and return the complete file.
    fn write_file(self: Box<Self>) -> Result<Vec<u8>>;
}
