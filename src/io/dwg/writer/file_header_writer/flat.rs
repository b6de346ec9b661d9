//! Pre-2004 file layout.
//!
//! ```text
//! FILE HEADER (3 to 6 locator records)
//! AcDb:AuxHeader     (record 5, when kept)
//! AcDb:Preview       (address at 0x0D)
//! AcDb:Header        (record 0)
//! AcDb:Classes       (record 1)
//! object records     (no record, offsets in the map are absolute)
//! AcDb:Handles       (record 2)
//! AcDb:ObjFreeSpace  (record 3, when kept)
//! AcDb:Template      (record 4, when kept)
//! second file header
//! ```

use tracing::debug;

use super::FileHeaderWriter;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::{flat, section_names};
use crate::io::dwg::file_header::{FlatFileHeader, SecondFileHeader, SectionLocatorRecord};
use crate::types::DwgVersion;

pub struct FlatFileWriter {
    header: FlatFileHeader,
    record_count: usize,
    /// Handle list of the second file header
    seed_handles: Vec<(u8, u64)>,
    /// File contents after the file header
    body: Vec<u8>,
}

impl FlatFileWriter {
    pub fn new(version: DwgVersion, code_page: u16, maintenance_version: u8) -> Self {
        let mut header = FlatFileHeader::new(version);
        header.code_page = code_page;
        header.maintenance_version = maintenance_version;
        Self {
            header,
            record_count: flat::MIN_RECORD_COUNT,
            seed_handles: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Number of locator records, clamped to 3..=6. Set before adding sections.
    pub fn with_record_count(mut self, count: usize) -> Self {
        self.record_count = count.clamp(flat::MIN_RECORD_COUNT, flat::MAX_RECORD_COUNT);
        self
    }

    pub fn with_seed_handles(mut self, handles: Vec<(u8, u64)>) -> Self {
        self.seed_handles = handles;
        self
    }

    fn position(&self) -> u64 {
        (FlatFileHeader::encoded_size(self.record_count) + self.body.len()) as u64
    }
}

impl FileHeaderWriter for FlatFileWriter {
    fn objects_offset(&self) -> u64 {
        self.position()
    }

    fn add_section(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let seeker = u32::try_from(self.position())
            .map_err(|_| DwgError::Encode(format!("{name} starts beyond 4 GiB")))?;
        let size = u32::try_from(data.len())
            .map_err(|_| DwgError::Encode(format!("{name} of {} bytes", data.len())))?;
        if name == section_names::PREVIEW {
            self.header.preview_address = seeker;
        } else if let Some(number) = section_names::locator_number(name) {
            if number as usize >= self.record_count {
                return Err(DwgError::Encode(format!(
                    "{name} needs record {number} of a {}-record header",
                    self.record_count
                )));
            }
            self.header
                .records
                .push(SectionLocatorRecord::new(number, seeker, size));
        }
        debug!(section = name, seeker, size, "section placed");
        self.body.extend_from_slice(&data);
        Ok(())
    }

    fn write_file(mut self: Box<Self>) -> Result<Vec<u8>> {
        for number in 0..flat::MIN_RECORD_COUNT as u8 {
            if self.header.record(number).is_none() {
                return Err(DwgError::Encode(format!("locator record {number} is missing")));
            }
        }
        for number in flat::MIN_RECORD_COUNT as u8..self.record_count as u8 {
            if self.header.record(number).is_none() {
                self.header.records.push(SectionLocatorRecord::new(number, 0, 0));
            }
        }
        self.header.records.sort_by_key(|r| r.number);

        let address = u32::try_from(self.position())
            .map_err(|_| DwgError::Encode("second file header starts beyond 4 GiB".into()))?;
        let second = SecondFileHeader {
            version: self.header.version,
            address,
            records: self.header.records.clone(),
            handles: std::mem::take(&mut self.seed_handles),
        };
        self.body.extend_from_slice(&second.to_bytes()?);

        let mut out = self.header.to_bytes()?;
        out.append(&mut self.body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(writer: &mut FlatFileWriter) {
        writer.add_section(section_names::HEADER, vec![1; 10]).unwrap();
        writer.add_section(section_names::CLASSES, vec![2; 6]).unwrap();
        writer.add_section(section_names::OBJECTS, vec![3; 4]).unwrap();
        writer.add_section(section_names::HANDLES, vec![4; 4]).unwrap();
    }

    #[test]
    fn test_sections_follow_header() {
        let mut writer = Box::new(FlatFileWriter::new(DwgVersion::AC1014, 30, 0));
        let start = FlatFileHeader::encoded_size(3) as u64;
        assert_eq!(writer.objects_offset(), start);
        writer.add_section(section_names::HEADER, vec![1; 10]).unwrap();
        writer.add_section(section_names::CLASSES, vec![2; 6]).unwrap();
        assert_eq!(writer.objects_offset(), start + 16);
        writer.add_section(section_names::OBJECTS, vec![3; 4]).unwrap();
        writer.add_section(section_names::HANDLES, vec![4; 4]).unwrap();

        let file = writer.write_file().unwrap();
        let header = FlatFileHeader::parse(&file).unwrap();
        header.verify_crc(&file).unwrap();
        assert_eq!(header.records.len(), 3);
        let handles = header.record(2).unwrap();
        assert_eq!(handles.seeker as u64, start + 20);
        assert_eq!(&file[handles.range(file.len()).unwrap()], &[4; 4]);
    }

    #[test]
    fn test_second_header_follows_last_section() {
        let handles = vec![(0, 0x31), (2, 0x02)];
        let mut writer = Box::new(
            FlatFileWriter::new(DwgVersion::AC1015, 30, 0).with_seed_handles(handles.clone()),
        );
        minimal(&mut writer);
        let end = writer.objects_offset() as usize;
        let file = writer.write_file().unwrap();

        assert_eq!(SecondFileHeader::find(&file, 0), Some(end));
        let second = SecondFileHeader::parse(&file[end..], DwgVersion::AC1015).unwrap();
        assert_eq!(second.address as usize, end);
        assert_eq!(second.handles, handles);
        let header = FlatFileHeader::parse(&file).unwrap();
        assert_eq!(&second.records[..3], &header.records[..]);
    }

    #[test]
    fn test_kept_sections_extend_the_records() {
        let mut writer =
            Box::new(FlatFileWriter::new(DwgVersion::AC1015, 30, 0).with_record_count(6));
        let start = FlatFileHeader::encoded_size(6) as u64;
        writer.add_section(section_names::AUX_HEADER, vec![5; 8]).unwrap();
        writer.add_section(section_names::PREVIEW, vec![6; 3]).unwrap();
        minimal(&mut writer);

        let file = writer.write_file().unwrap();
        let header = FlatFileHeader::parse(&file).unwrap();
        header.verify_crc(&file).unwrap();
        assert_eq!(header.records.len(), 6);
        assert_eq!(header.record(5).map(|r| (r.seeker, r.size)), Some((start as u32, 8)));
        assert_eq!(header.preview_address as u64, start + 8);
        assert_eq!(header.record(3).map(|r| r.size), Some(0));
        assert_eq!(header.record(0).map(|r| r.seeker as u64), Some(start + 11));
    }

    #[test]
    fn test_record_beyond_count_is_rejected() {
        let mut writer = FlatFileWriter::new(DwgVersion::AC1015, 30, 0).with_record_count(4);
        assert!(writer.add_section(section_names::AUX_HEADER, vec![0; 4]).is_err());
        assert!(writer.add_section(section_names::TEMPLATE, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_missing_section() {
        let mut writer = Box::new(FlatFileWriter::new(DwgVersion::AC1015, 30, 0));
        writer.add_section(section_names::HEADER, vec![0; 4]).unwrap();
        assert!(writer.write_file().is_err());
    }
}
