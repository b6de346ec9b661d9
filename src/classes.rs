//! Class table
//!
//! Type codes from 500 up are not fixed by the format; the drawing's class
//! table says which DXF class each one denotes and whether its instances
//! are entities.

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::io::dwg::constants::FIRST_CLASS_NUMBER;
use crate::io::dwg::object_type::{PROXY_ENTITY, PROXY_OBJECT};

bitflags! {
    /// Operations allowed on proxies of a class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProxyFlags: u16 {
        const ERASE_ALLOWED = 0x0001;
        const TRANSFORM_ALLOWED = 0x0002;
        const COLOR_CHANGE_ALLOWED = 0x0004;
        const LAYER_CHANGE_ALLOWED = 0x0008;
        const LINETYPE_CHANGE_ALLOWED = 0x0010;
        const LINETYPE_SCALE_CHANGE_ALLOWED = 0x0020;
        const VISIBILITY_CHANGE_ALLOWED = 0x0040;
        const CLONING_ALLOWED = 0x0080;
        const LINEWEIGHT_CHANGE_ALLOWED = 0x0100;
        const PLOT_STYLE_NAME_CHANGE_ALLOWED = 0x0200;
        const DISABLES_PROXY_WARNING_DIALOG = 0x0400;
        const R13_FORMAT_PROXY = 0x8000;
    }
}

/// One class table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DxfClass {
    /// Type code of the class's instances (500 or higher)
    pub class_number: u16,
    /// Stored bit for bit; unknown bits are kept
    pub proxy_flags: ProxyFlags,
    pub application_name: String,
    pub cpp_class_name: String,
    pub dxf_name: String,
    pub was_zombie: bool,
    /// 0x1F2 for entity classes, 0x1F3 for object classes
    pub item_class_id: u16,
    /// Instances in the drawing (R2004+)
    pub instance_count: i32,
    /// R2004+
    pub dwg_version: i32,
    /// R2004+
    pub maintenance_version: i32,
}

impl DxfClass {
    pub fn new(class_number: u16, dxf_name: impl Into<String>, is_entity: bool) -> Self {
        Self {
            class_number,
            proxy_flags: ProxyFlags::empty(),
            application_name: "ObjectDBX Classes".to_string(),
            cpp_class_name: String::new(),
            dxf_name: dxf_name.into(),
            was_zombie: false,
            item_class_id: if is_entity { PROXY_ENTITY } else { PROXY_OBJECT },
            instance_count: 0,
            dwg_version: 0,
            maintenance_version: 0,
        }
    }

    pub fn is_entity(&self) -> bool {
        self.item_class_id == PROXY_ENTITY
    }
}

/// Class table of a drawing, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassTable {
    classes: IndexMap<u16, DxfClass>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, replacing any entry with the same number.
    pub fn add(&mut self, class: DxfClass) {
        self.classes.insert(class.class_number, class);
    }

    /// Entry for an object type code.
    ///
    /// Falls back to the position `type_code - 500` when no entry carries
    /// that number.
    pub fn by_type(&self, type_code: u16) -> Option<&DxfClass> {
        self.classes.get(&type_code).or_else(|| {
            type_code
                .checked_sub(FIRST_CLASS_NUMBER)
                .and_then(|index| self.classes.get_index(index as usize))
                .map(|(_, class)| class)
        })
    }

    pub fn by_dxf_name(&self, dxf_name: &str) -> Option<&DxfClass> {
        self.classes.values().find(|c| c.dxf_name == dxf_name)
    }

    /// Largest class number, or 499 when empty.
    pub fn max_class_number(&self) -> u16 {
        self.classes
            .keys()
            .copied()
            .max()
            .unwrap_or(FIRST_CLASS_NUMBER - 1)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DxfClass> {
        self.classes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_type() {
        let mut table = ClassTable::new();
        table.add(DxfClass::new(500, "ACDBDICTIONARYWDFLT", false));
        table.add(DxfClass::new(501, "WIPEOUT", true));
        assert_eq!(table.by_type(501).unwrap().dxf_name, "WIPEOUT");
        assert!(table.by_type(501).unwrap().is_entity());
        assert!(table.by_type(502).is_none());
        assert_eq!(table.by_dxf_name("ACDBDICTIONARYWDFLT").unwrap().class_number, 500);
        assert_eq!(table.max_class_number(), 501);
    }

    #[test]
    fn test_lookup_falls_back_to_position() {
        let mut table = ClassTable::new();
        table.add(DxfClass::new(7, "SCALE", false));
        assert_eq!(table.by_type(500).unwrap().dxf_name, "SCALE");
        assert!(table.by_type(12).is_none());
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut table = ClassTable::new();
        table.add(DxfClass::new(500, "A", false));
        table.add(DxfClass::new(501, "B", false));
        table.add(DxfClass::new(500, "C", true));
        let names: Vec<_> = table.iter().map(|c| c.dxf_name.as_str()).collect();
        assert_eq!(names, vec!["C", "B"]);
    }

    #[test]
    fn test_proxy_flags_keep_unknown_bits() {
        let flags = ProxyFlags::from_bits_retain(0x1801);
        assert!(flags.contains(ProxyFlags::ERASE_ALLOWED));
        assert_eq!(flags.bits(), 0x1801);
    }
}
