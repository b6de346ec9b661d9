//! DWG Classes section reader.
//!
//! Reads the class definitions of `AcDb:Classes`, which map the type codes
//! from 500 up to DXF class names.

use super::merged_reader::TextSource;
use super::stream_reader::DwgStreamReader;
use crate::classes::{ClassTable, DxfClass, ProxyFlags};
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::FIRST_CLASS_NUMBER;
use crate::types::DwgVersion;

/// Reader for the unwrapped `AcDb:Classes` body.
pub struct DwgClassesReader<'a> {
    data: &'a [u8],
    version: DwgVersion,
    code_page: u16,
}

impl<'a> DwgClassesReader<'a> {
    pub fn new(data: &'a [u8], version: DwgVersion, code_page: u16) -> Self {
        Self {
            data,
            version,
            code_page,
        }
    }

    pub fn read(&self) -> Result<ClassTable> {
        let mut main = DwgStreamReader::new(self.data, self.version).with_code_page(self.code_page);
        let mut text = TextSource::for_section(&mut main)?;
        let mut classes = ClassTable::new();

        if self.version.is_paged() {
            // BS max class number, RC 0, RC 0, B true
            let max = main.read_bit_short()? as u16;
            main.read_byte()?;
            main.read_byte()?;
            main.read_bit()?;
            let count = max.saturating_add(1).saturating_sub(FIRST_CLASS_NUMBER);
            for _ in 0..count {
                if main.remaining_bits() < 8 {
                    return Err(DwgError::Parse(format!(
                        "class table ends before class {max}"
                    )));
                }
                classes.add(self.read_class(&mut main, &mut text)?);
            }
        } else {
            // No count before R2004: entries run to the end of the body.
            while main.remaining_bits() >= 8 {
                classes.add(self.read_class(&mut main, &mut text)?);
            }
        }
        Ok(classes)
    }

    fn read_class(
        &self,
        main: &mut DwgStreamReader<'a>,
        text: &mut TextSource<'a>,
    ) -> Result<DxfClass> {
        let class_number = main.read_bit_short()? as u16;
        let proxy_flags = ProxyFlags::from_bits_retain(main.read_bit_short()? as u16);
        let application_name = text.read(main)?;
        let cpp_class_name = text.read(main)?;
        let dxf_name = text.read(main)?;
        let was_zombie = main.read_bit()?;
        let item_class_id = main.read_bit_short()? as u16;

        let mut class = DxfClass {
            class_number,
            proxy_flags,
            application_name,
            cpp_class_name,
            dxf_name,
            was_zombie,
            item_class_id,
            instance_count: 0,
            dwg_version: 0,
            maintenance_version: 0,
        };
        if self.version.is_paged() {
            class.instance_count = main.read_bit_long()?;
            class.dwg_version = main.read_bit_long()?;
            class.maintenance_version = main.read_bit_long()?;
            main.read_bit_long()?;
            main.read_bit_long()?;
        }
        Ok(class)
    }
}
