//! Shared test utilities for the dwgcodec integration tests.
//!
//! Builds small but complete drawings (table controls, model space, layers,
//! a handful of entities and dictionaries) and locates records inside the
//! encoded bytes so tests can damage them on purpose.

#![allow(dead_code)]

use dwgcodec::classes::DxfClass;
use dwgcodec::io::dwg::{DwgFileHeader, DwgObjectType};
use dwgcodec::objects::{
    BlockControl, BlockHeader, Circle, Dictionary, DictionaryVariable, Insert, Layer,
    LayerControl, Line, LwPolyline, LwPolylineFlags, LwVertex, Scale, Text,
};
use dwgcodec::{
    DwgDocument, DwgObject, DwgVersion, Handle, HeaderValue, HeaderVariables, ObjectData, ObjectRef,
    Vector2, Vector3,
};

// ===========================================================================
// Handles of the sample drawing
// ===========================================================================

pub const NAMED_OBJECTS: u64 = 0x0C;
pub const BLOCK_CONTROL: u64 = 0x01;
pub const LAYER_CONTROL: u64 = 0x02;
pub const MODEL_SPACE: u64 = 0x1F;
pub const LAYER_0: u64 = 0x10;
pub const LAYER_WALLS: u64 = 0x11;
pub const LINE: u64 = 0x20;
pub const CIRCLE: u64 = 0x21;
pub const TEXT: u64 = 0x22;
pub const POLYLINE: u64 = 0x23;
pub const INSERT: u64 = 0x24;
pub const SCALE: u64 = 0x30;
pub const VARIABLE: u64 = 0x31;

/// Type code of the SCALE class in the sample drawing.
pub const SCALE_CLASS: u16 = 500;
/// Type code of the DICTIONARYVAR class in the sample drawing.
pub const VARIABLE_CLASS: u16 = 501;

fn code(kind: DwgObjectType) -> u16 {
    kind as u16
}

fn hard_owner(handle: u64) -> ObjectRef {
    ObjectRef::hard_owner(Handle::new(handle))
}

fn hard_pointer(handle: u64) -> ObjectRef {
    ObjectRef::hard_pointer(Handle::new(handle))
}

fn soft_pointer(handle: u64) -> ObjectRef {
    ObjectRef::soft_pointer(Handle::new(handle))
}

// ===========================================================================
// Builders
// ===========================================================================

/// Incrementally assembles a drawing.
pub struct DrawingBuilder {
    doc: DwgDocument,
}

impl DrawingBuilder {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            doc: DwgDocument::new(version),
        }
    }

    pub fn object(mut self, object: DwgObject) -> Self {
        self.doc.add_object(object);
        self
    }

    /// Entity owned by model space on the given layer.
    pub fn entity(self, kind: DwgObjectType, handle: u64, layer: u64, data: ObjectData) -> Self {
        self.object(DwgObject::new_entity(
            code(kind),
            Handle::new(handle),
            soft_pointer(MODEL_SPACE),
            Handle::new(layer),
            data,
        ))
    }

    pub fn build(mut self) -> DwgDocument {
        self.doc.resolve_references();
        self.doc
    }
}

/// The sample drawing used across the integration tests.
pub fn sample_drawing(version: DwgVersion) -> DwgDocument {
    let entities: Vec<ObjectRef> = [LINE, CIRCLE, TEXT, POLYLINE, INSERT]
        .iter()
        .map(|&h| hard_owner(h))
        .collect();

    let mut model_space = BlockHeader::new("*Model_Space");
    model_space.entities = entities;

    let mut walls = Layer::new("Walls");
    walls.color = dwgcodec::Color::from_index(3);

    let mut named = Dictionary::new();
    named.insert("ACAD_SCALELIST", soft_pointer(SCALE));
    named.insert("CANNOSCALE", soft_pointer(VARIABLE));

    let mut polyline = LwPolyline::default();
    polyline.vertices = vec![LwVertex::new(0.0, 0.0), LwVertex::new(10.0, 0.0), {
        let mut v = LwVertex::new(10.0, 5.0);
        v.bulge = 0.5;
        v
    }];
    polyline.flags = LwPolylineFlags::HAS_BULGES;

    let insert = Insert {
        insertion: Vector3::new(20.0, 20.0, 0.0),
        scale: Vector3::new(2.0, 2.0, 2.0),
        block_header: soft_pointer(MODEL_SPACE),
        ..Default::default()
    };

    let mut doc = DrawingBuilder::new(version)
        .object(DwgObject::new_object(
            code(DwgObjectType::BlockControl),
            Handle::new(BLOCK_CONTROL),
            ObjectRef::NULL,
            ObjectData::BlockControl(BlockControl {
                entries: Vec::new(),
                model_space: soft_pointer(MODEL_SPACE),
                paper_space: ObjectRef::NULL,
            }),
        ))
        .object(DwgObject::new_object(
            code(DwgObjectType::LayerControl),
            Handle::new(LAYER_CONTROL),
            ObjectRef::NULL,
            ObjectData::LayerControl(LayerControl {
                entries: vec![soft_pointer(LAYER_0), soft_pointer(LAYER_WALLS)],
            }),
        ))
        .object(DwgObject::new_object(
            code(DwgObjectType::Dictionary),
            Handle::new(NAMED_OBJECTS),
            ObjectRef::NULL,
            ObjectData::Dictionary(named),
        ))
        .object(DwgObject::new_object(
            code(DwgObjectType::Layer),
            Handle::new(LAYER_0),
            soft_pointer(LAYER_CONTROL),
            ObjectData::Layer(Layer::new("0")),
        ))
        .object(DwgObject::new_object(
            code(DwgObjectType::Layer),
            Handle::new(LAYER_WALLS),
            soft_pointer(LAYER_CONTROL),
            ObjectData::Layer(walls),
        ))
        .object(DwgObject::new_object(
            code(DwgObjectType::BlockHeader),
            Handle::new(MODEL_SPACE),
            soft_pointer(BLOCK_CONTROL),
            ObjectData::BlockHeader(model_space),
        ))
        .entity(
            DwgObjectType::Line,
            LINE,
            LAYER_WALLS,
            ObjectData::Line(Line::from_points(
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(100.0, 50.0, 0.0),
            )),
        )
        .entity(
            DwgObjectType::Circle,
            CIRCLE,
            LAYER_0,
            ObjectData::Circle(Circle {
                center: Vector3::new(5.0, 5.0, 0.0),
                radius: 2.5,
                ..Default::default()
            }),
        )
        .entity(
            DwgObjectType::Text,
            TEXT,
            LAYER_0,
            ObjectData::Text(Text::new("Ground floor", Vector2::new(1.0, 2.0), 0.25)),
        )
        .entity(
            DwgObjectType::LwPolyline,
            POLYLINE,
            LAYER_WALLS,
            ObjectData::LwPolyline(polyline),
        )
        .entity(DwgObjectType::Insert, INSERT, LAYER_0, ObjectData::Insert(insert))
        .object(DwgObject::new_object(
            SCALE_CLASS,
            Handle::new(SCALE),
            soft_pointer(NAMED_OBJECTS),
            ObjectData::Scale(Scale::new("1:2", 1.0, 2.0)),
        ))
        .object(DwgObject::new_object(
            VARIABLE_CLASS,
            Handle::new(VARIABLE),
            soft_pointer(NAMED_OBJECTS),
            ObjectData::DictionaryVariable(DictionaryVariable {
                schema: 0,
                value: "1:2".into(),
            }),
        ))
        .build();

    let header = doc.header_mut();
    *header = HeaderVariables::standard();
    header.set("CLAYER", HeaderValue::Handle(hard_pointer(LAYER_WALLS)));
    doc.resolve_references();

    let classes = doc.classes_mut();
    classes.add(DxfClass::new(SCALE_CLASS, "SCALE", false));
    classes.add(DxfClass::new(VARIABLE_CLASS, "DICTIONARYVAR", false));
    doc
}

/// Number of objects in [`sample_drawing`].
pub const SAMPLE_OBJECTS: usize = 13;

// ===========================================================================
// Locating bytes in encoded files
// ===========================================================================

/// Byte range of a pre-2004 locator record's section.
pub fn flat_section_range(bytes: &[u8], number: u8) -> std::ops::Range<usize> {
    match DwgFileHeader::parse(bytes, false).expect("file header") {
        DwgFileHeader::Flat(header) => header
            .record(number)
            .and_then(|r| r.range(bytes.len()))
            .expect("section record"),
        DwgFileHeader::Paged(_) => panic!("expected a pre-2004 file"),
    }
}

/// Offset of the first page of a paged file.
pub const FIRST_PAGE: usize = 0x100;

/// Flip every bit of `count` bytes starting at `start`, stepping by `step`.
pub fn damage(bytes: &mut [u8], start: usize, count: usize, step: usize) {
    for i in 0..count {
        bytes[start + i * step] ^= 0xFF;
    }
}
