//! Decoded drawing objects
//!
//! A drawing is a flat list of [`DwgObject`] records. Each record carries the
//! fields every object shares (handle, owner, reactors, extension dictionary,
//! extended data) and, for graphical objects, an [`EntityHeader`]. The
//! type-specific payload lives in [`ObjectData`], a closed set of variants
//! plus two raw variants for content the codec does not interpret.
//!
//! Objects never point at each other directly: every relation is an
//! [`ObjectRef`] resolved against the document's object array.

mod dictionary;
mod entities;
mod tables;

pub use dictionary::{Dictionary, DictionaryEntry, DictionaryVariable, DictionaryWithDefault, Scale};
pub use entities::{
    Arc, Block, Circle, Ellipse, Insert, Line, LwPolyline, LwPolylineFlags, LwVertex, Point, Ray,
    Text, XLine,
};
pub use tables::{BlockControl, BlockHeader, Layer, LayerControl, LayerFlags, XrefInfo};

use crate::io::dwg::reader::stream_reader::EntityColor;
use crate::types::{DwgVersion, Handle, ObjectRef};

/// Broad kind of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Supertype {
    /// Graphical object with an entity header
    Entity,
    /// Non-graphical object
    Object,
    /// Could not be classified or failed to decode
    Unknown,
}

/// One extended-data (EED) record attached to an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedData {
    /// Registered application (APPID) the data belongs to
    pub application: ObjectRef,
    /// Raw record bytes
    pub data: Vec<u8>,
}

/// Display properties shared by every entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHeader {
    /// Owner mode: 0 = owner handle stored, 1 = paper space, 2 = model space
    pub mode: u8,
    /// Proxy graphics bytes, if present
    pub graphics: Option<Vec<u8>>,
    pub color: EntityColor,
    /// Color book handle (R2004+, when the color says so)
    pub color_book: Option<ObjectRef>,
    pub linetype_scale: f64,
    /// 0 = ByLayer, 1 = ByBlock, 2 = Continuous, 3 = handle follows
    pub linetype_flags: u8,
    /// 0 = ByLayer, 1 = ByBlock, 2 = Default, 3 = handle follows
    pub plotstyle_flags: u8,
    /// 0 = ByLayer, 1 = ByBlock, 2 = Global, 3 = handle follows
    pub material_flags: u8,
    pub shadow_flags: u8,
    /// 0 = visible, 1 = invisible
    pub invisibility: i16,
    pub lineweight: u8,
    pub layer: ObjectRef,
    pub linetype: Option<ObjectRef>,
    pub plotstyle: Option<ObjectRef>,
    pub material: Option<ObjectRef>,
    /// Full, face and edge visual styles (R2010+)
    pub visual_styles: [Option<ObjectRef>; 3],
    /// Previous and next entity in the owner's chain (pre-R2004, absent when linked implicitly)
    pub links: Option<(ObjectRef, ObjectRef)>,
}

impl EntityHeader {
    /// Header for an entity on `layer`, owned through the owner handle.
    pub fn on_layer(layer: Handle) -> Self {
        Self {
            mode: 0,
            graphics: None,
            color: EntityColor::default(),
            color_book: None,
            linetype_scale: 1.0,
            linetype_flags: 0,
            plotstyle_flags: 0,
            material_flags: 0,
            shadow_flags: 0,
            invisibility: 0,
            lineweight: 0x1D,
            layer: ObjectRef::hard_pointer(layer),
            linetype: None,
            plotstyle: None,
            material: None,
            visual_styles: [None; 3],
            links: None,
        }
    }
}

/// Bytes of an object the codec keeps but does not interpret.
///
/// Everything after the type code is preserved, so an object can be written
/// back unchanged at the revision it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObject {
    /// Revision the bytes were encoded for
    pub version: DwgVersion,
    /// DXF class name, when the type came from the class table
    pub class_name: Option<String>,
    /// Record body starting at the type code, without size prefix or CRC
    pub bytes: Vec<u8>,
    /// Handle stream size in bits (R2010+)
    pub handle_stream_bits: u64,
}

/// Type-specific payload of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Text(Text),
    Block(Block),
    EndBlock,
    SeqEnd,
    Insert(Insert),
    Arc(Arc),
    Circle(Circle),
    Line(Line),
    Point(Point),
    Ellipse(Ellipse),
    Ray(Ray),
    XLine(XLine),
    LwPolyline(LwPolyline),
    Dictionary(Dictionary),
    DictionaryWithDefault(DictionaryWithDefault),
    DictionaryVariable(DictionaryVariable),
    Scale(Scale),
    BlockControl(BlockControl),
    BlockHeader(BlockHeader),
    LayerControl(LayerControl),
    Layer(Layer),
    /// Entity kept as raw bytes
    UnknownEntity(RawObject),
    /// Non-graphical object kept as raw bytes
    UnknownObject(RawObject),
}

impl ObjectData {
    /// DXF name of the payload kind.
    pub fn name(&self) -> &str {
        match self {
            ObjectData::Text(_) => "TEXT",
            ObjectData::Block(_) => "BLOCK",
            ObjectData::EndBlock => "ENDBLK",
            ObjectData::SeqEnd => "SEQEND",
            ObjectData::Insert(_) => "INSERT",
            ObjectData::Arc(_) => "ARC",
            ObjectData::Circle(_) => "CIRCLE",
            ObjectData::Line(_) => "LINE",
            ObjectData::Point(_) => "POINT",
            ObjectData::Ellipse(_) => "ELLIPSE",
            ObjectData::Ray(_) => "RAY",
            ObjectData::XLine(_) => "XLINE",
            ObjectData::LwPolyline(_) => "LWPOLYLINE",
            ObjectData::Dictionary(_) => "DICTIONARY",
            ObjectData::DictionaryWithDefault(_) => "ACDBDICTIONARYWDFLT",
            ObjectData::DictionaryVariable(_) => "DICTIONARYVAR",
            ObjectData::Scale(_) => "SCALE",
            ObjectData::BlockControl(_) => "BLOCK_CONTROL",
            ObjectData::BlockHeader(_) => "BLOCK_RECORD",
            ObjectData::LayerControl(_) => "LAYER_CONTROL",
            ObjectData::Layer(_) => "LAYER",
            ObjectData::UnknownEntity(raw) | ObjectData::UnknownObject(raw) => {
                raw.class_name.as_deref().unwrap_or("UNKNOWN")
            }
        }
    }

    /// Whether the payload is a graphical entity.
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            ObjectData::Text(_)
                | ObjectData::Block(_)
                | ObjectData::EndBlock
                | ObjectData::SeqEnd
                | ObjectData::Insert(_)
                | ObjectData::Arc(_)
                | ObjectData::Circle(_)
                | ObjectData::Line(_)
                | ObjectData::Point(_)
                | ObjectData::Ellipse(_)
                | ObjectData::Ray(_)
                | ObjectData::XLine(_)
                | ObjectData::LwPolyline(_)
                | ObjectData::UnknownEntity(_)
        )
    }

    /// The raw bytes of an uninterpreted object.
    pub fn raw(&self) -> Option<&RawObject> {
        match self {
            ObjectData::UnknownEntity(raw) | ObjectData::UnknownObject(raw) => Some(raw),
            _ => None,
        }
    }

    /// Visit every handle reference held by the payload.
    pub(crate) fn references_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
        match self {
            ObjectData::Text(text) => visit(&mut text.style),
            ObjectData::Insert(insert) => {
                visit(&mut insert.block_header);
                insert.attributes.iter_mut().for_each(&mut *visit);
                if let Some(seqend) = insert.seqend.as_mut() {
                    visit(seqend);
                }
            }
            ObjectData::Dictionary(dict) => dict.entries.iter_mut().for_each(|e| visit(&mut e.item)),
            ObjectData::DictionaryWithDefault(dict) => {
                dict.dictionary
                    .entries
                    .iter_mut()
                    .for_each(|e| visit(&mut e.item));
                visit(&mut dict.default_entry);
            }
            ObjectData::BlockControl(control) => {
                control.entries.iter_mut().for_each(&mut *visit);
                visit(&mut control.model_space);
                visit(&mut control.paper_space);
            }
            ObjectData::LayerControl(control) => control.entries.iter_mut().for_each(visit),
            ObjectData::BlockHeader(header) => header.references_mut(visit),
            ObjectData::Layer(layer) => layer.references_mut(visit),
            _ => {}
        }
    }
}

/// One object of a drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct DwgObject {
    /// Type code: a built-in code, or 500 + class index
    pub type_code: u16,
    pub supertype: Supertype,
    pub handle: Handle,
    /// Byte offset of the record within its stream (file for pre-R2004, objects section after)
    pub address: u64,
    /// Record size in bytes, as declared by its MS prefix
    pub size: u32,
    /// End of main data in bits, relative to the record start after the size prefix
    pub bit_size: u64,
    pub owner: ObjectRef,
    pub reactors: Vec<ObjectRef>,
    pub xdictionary: Option<ObjectRef>,
    pub eed: Vec<ExtendedData>,
    /// Present on entities
    pub entity: Option<EntityHeader>,
    pub data: ObjectData,
}

impl DwgObject {
    /// New non-graphical object with the given payload.
    pub fn new_object(type_code: u16, handle: Handle, owner: ObjectRef, data: ObjectData) -> Self {
        Self {
            type_code,
            supertype: Supertype::Object,
            handle,
            address: 0,
            size: 0,
            bit_size: 0,
            owner,
            reactors: Vec::new(),
            xdictionary: None,
            eed: Vec::new(),
            entity: None,
            data,
        }
    }

    /// New entity on the given layer.
    pub fn new_entity(
        type_code: u16,
        handle: Handle,
        owner: ObjectRef,
        layer: Handle,
        data: ObjectData,
    ) -> Self {
        Self {
            supertype: Supertype::Entity,
            entity: Some(EntityHeader::on_layer(layer)),
            ..Self::new_object(type_code, handle, owner, data)
        }
    }

    pub fn is_entity(&self) -> bool {
        self.supertype == Supertype::Entity
    }

    /// DXF name of the object kind.
    pub fn name(&self) -> &str {
        self.data.name()
    }

    /// Visit every handle reference of the object, common fields first.
    pub(crate) fn references_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
        visit(&mut self.owner);
        self.reactors.iter_mut().for_each(&mut *visit);
        if let Some(xdic) = self.xdictionary.as_mut() {
            visit(xdic);
        }
        for eed in &mut self.eed {
            visit(&mut eed.application);
        }
        if let Some(entity) = self.entity.as_mut() {
            visit(&mut entity.layer);
            for slot in [
                &mut entity.color_book,
                &mut entity.linetype,
                &mut entity.plotstyle,
                &mut entity.material,
            ] {
                if let Some(r) = slot.as_mut() {
                    visit(r);
                }
            }
            for r in entity.visual_styles.iter_mut().flatten() {
                visit(r);
            }
            if let Some((prev, next)) = entity.links.as_mut() {
                visit(prev);
                visit(next);
            }
        }
        self.data.references_mut(visit);
    }
}
