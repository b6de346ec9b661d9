//! Section locator record of the pre-2004 file header.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::Result;

/// File offset and size of one section in pre-2004 drawings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionLocatorRecord {
    /// Section number (0 header, 1 classes, 2 object map, ...)
    pub number: u8,
    /// Byte offset into the file
    pub seeker: u32,
    /// Size of the section in bytes
    pub size: u32,
}

impl SectionLocatorRecord {
    pub fn new(number: u8, seeker: u32, size: u32) -> Self {
        Self {
            number,
            seeker,
            size,
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            number: reader.read_u8()?,
            seeker: reader.read_u32::<LittleEndian>()?,
            size: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.number)?;
        writer.write_u32::<LittleEndian>(self.seeker)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }

    /// Byte range of the section, if it lies within a file of `file_len` bytes.
    pub fn range(&self, file_len: usize) -> Option<std::ops::Range<usize>> {
        let start = self.seeker as usize;
        let end = start.checked_add(self.size as usize)?;
        (end <= file_len).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_record_layout() {
        let rec = SectionLocatorRecord::new(2, 0x1234, 0x56);
        let mut bytes = Vec::new();
        rec.write_to(&mut bytes).unwrap();
        assert_eq!(bytes, vec![2, 0x34, 0x12, 0, 0, 0x56, 0, 0, 0]);
        let back = SectionLocatorRecord::read_from(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_range_bounds() {
        let rec = SectionLocatorRecord::new(0, 0x20, 0x10);
        assert_eq!(rec.range(0x30), Some(0x20..0x30));
        assert_eq!(rec.range(0x2F), None);
        assert_eq!(SectionLocatorRecord::new(0, u32::MAX, u32::MAX).range(10), None);
    }
}
