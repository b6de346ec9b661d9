//! DWG Classes section writer.

use super::merged_writer::MergedWriter;
use crate::classes::{ClassTable, DxfClass};
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::FIRST_CLASS_NUMBER;
use crate::types::DwgVersion;

/// Writer for the `AcDb:Classes` body; framing is added by the caller.
pub struct DwgClassesWriter {
    version: DwgVersion,
    code_page: u16,
}

impl DwgClassesWriter {
    pub fn new(version: DwgVersion, code_page: u16) -> Self {
        Self { version, code_page }
    }

    pub fn write(&self, classes: &ClassTable) -> Result<Vec<u8>> {
        let mut w = MergedWriter::for_section(self.version, self.code_page);
        if self.version.is_paged() {
            let max = classes.max_class_number();
            let dense = usize::from(max) + 1 - usize::from(FIRST_CLASS_NUMBER);
            if dense != classes.len() {
                return Err(DwgError::Encode(format!(
                    "class numbers must run from 500 to {max} without gaps"
                )));
            }
            w.main.write_bit_short(max as i16);
            w.main.write_byte(0);
            w.main.write_byte(0);
            w.main.write_bit(true);
        }
        for class in classes.iter() {
            self.write_class(&mut w, class)?;
        }
        w.finish_section()
    }

    fn write_class(&self, w: &mut MergedWriter, class: &DxfClass) -> Result<()> {
        w.main.write_bit_short(class.class_number as i16);
        w.main.write_bit_short(class.proxy_flags.bits() as i16);
        w.write_text(&class.application_name)?;
        w.write_text(&class.cpp_class_name)?;
        w.write_text(&class.dxf_name)?;
        w.main.write_bit(class.was_zombie);
        w.main.write_bit_short(class.item_class_id as i16);
        if self.version.is_paged() {
            w.main.write_bit_long(class.instance_count);
            w.main.write_bit_long(class.dwg_version);
            w.main.write_bit_long(class.maintenance_version);
            w.main.write_bit_long(0);
            w.main.write_bit_long(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_rejected_from_r2004() {
        let mut table = ClassTable::new();
        table.add(DxfClass::new(502, "SCALE", false));
        assert!(DwgClassesWriter::new(DwgVersion::AC1018, 30).write(&table).is_err());
        assert!(DwgClassesWriter::new(DwgVersion::AC1015, 30).write(&table).is_ok());
    }
}
