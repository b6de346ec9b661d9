//! Symbol table objects: controls, block headers and layers

use bitflags::bitflags;

use crate::types::{Color, ObjectRef, Vector3};

/// External reference bits shared by table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XrefInfo {
    /// Entry was referenced by the last regeneration (flag 64, before R2007)
    pub referenced: bool,
    /// Index of the external reference the entry comes from
    pub xref_index: i16,
    /// Entry depends on an external reference
    pub dependent: bool,
}

/// Block table control object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockControl {
    /// Block headers, excluding model and paper space
    pub entries: Vec<ObjectRef>,
    pub model_space: ObjectRef,
    pub paper_space: ObjectRef,
}

/// Layer table control object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerControl {
    pub entries: Vec<ObjectRef>,
}

/// Block table record.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeader {
    pub name: String,
    pub xref: XrefInfo,
    pub anonymous: bool,
    pub has_attributes: bool,
    pub is_xref: bool,
    pub is_overlay: bool,
    /// External reference is loaded (R2000+)
    pub loaded: bool,
    pub base_point: Vector3,
    pub xref_path: String,
    /// R2000+
    pub description: String,
    /// Preview image bytes (R2000+)
    pub preview: Vec<u8>,
    /// Insertion units (R2007+)
    pub units: i16,
    /// R2007+
    pub explodable: bool,
    /// R2007+
    pub scaling: u8,
    pub xref_block: ObjectRef,
    /// BLOCK entity opening the definition
    pub block_entity: ObjectRef,
    /// Owned entities; only the first and last are stored before R2004
    pub entities: Vec<ObjectRef>,
    /// ENDBLK entity closing the definition
    pub end_block: ObjectRef,
    /// INSERT entities referencing this block (R2000+)
    pub inserts: Vec<ObjectRef>,
    /// Associated layout (R2000+)
    pub layout: ObjectRef,
}

impl BlockHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xref: XrefInfo::default(),
            anonymous: false,
            has_attributes: false,
            is_xref: false,
            is_overlay: false,
            loaded: false,
            base_point: Vector3::ZERO,
            xref_path: String::new(),
            description: String::new(),
            preview: Vec::new(),
            units: 0,
            explodable: true,
            scaling: 0,
            xref_block: ObjectRef::NULL,
            block_entity: ObjectRef::NULL,
            entities: Vec::new(),
            end_block: ObjectRef::NULL,
            inserts: Vec::new(),
            layout: ObjectRef::NULL,
        }
    }

    /// Whether owned entity handles are stored (never for external references).
    pub fn stores_entities(&self) -> bool {
        !self.is_xref && !self.is_overlay
    }

    pub(crate) fn references_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
        visit(&mut self.xref_block);
        visit(&mut self.block_entity);
        self.entities.iter_mut().for_each(&mut *visit);
        visit(&mut self.end_block);
        self.inserts.iter_mut().for_each(&mut *visit);
        visit(&mut self.layout);
    }
}

bitflags! {
    /// Layer state bits as packed in the R2000+ flag word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LayerFlags: u16 {
        const FROZEN = 0x01;
        const OFF = 0x02;
        const FROZEN_IN_NEW_VIEWPORTS = 0x04;
        const LOCKED = 0x08;
        const PLOTTABLE = 0x10;
    }
}

/// Layer table record.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub xref: XrefInfo,
    pub flags: LayerFlags,
    /// Lineweight index (R2000+)
    pub lineweight: u8,
    pub color: Color,
    pub xref_block: ObjectRef,
    /// R2000+
    pub plotstyle: ObjectRef,
    /// R2007+
    pub material: ObjectRef,
    pub linetype: ObjectRef,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xref: XrefInfo::default(),
            flags: LayerFlags::empty(),
            lineweight: 0,
            color: Color::Index(7),
            xref_block: ObjectRef::NULL,
            plotstyle: ObjectRef::NULL,
            material: ObjectRef::NULL,
            linetype: ObjectRef::NULL,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.flags.contains(LayerFlags::FROZEN)
    }

    pub fn is_off(&self) -> bool {
        self.flags.contains(LayerFlags::OFF)
    }

    /// Flag word as written from R2000: state bits plus the lineweight in bits 5..=9.
    pub fn packed_flags(&self) -> i16 {
        (self.flags.bits() | ((self.lineweight as u16 & 0x1F) << 5)) as i16
    }

    /// Inverse of [`Layer::packed_flags`].
    pub fn unpack_flags(&mut self, value: i16) {
        let value = value as u16;
        self.flags = LayerFlags::from_bits_truncate(value);
        self.lineweight = ((value & 0x3E0) >> 5) as u8;
    }

    pub(crate) fn references_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
        visit(&mut self.xref_block);
        visit(&mut self.plotstyle);
        visit(&mut self.material);
        visit(&mut self.linetype);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_flag_packing() {
        let mut layer = Layer::new("WALLS");
        layer.flags = LayerFlags::OFF | LayerFlags::PLOTTABLE;
        layer.lineweight = 13;
        let packed = layer.packed_flags();
        assert_eq!(packed, 0x12 | (13 << 5));

        let mut copy = Layer::new("WALLS");
        copy.unpack_flags(packed);
        assert_eq!(copy.flags, layer.flags);
        assert_eq!(copy.lineweight, 13);
        assert!(copy.is_off());
        assert!(!copy.is_frozen());
    }

    #[test]
    fn test_xref_blocks_store_no_entities() {
        let mut header = BlockHeader::new("*Model_Space");
        assert!(header.stores_entities());
        header.is_overlay = true;
        assert!(!header.stores_entities());
    }
}
