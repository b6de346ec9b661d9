//! Object reader for the `AcDb:AcDbObjects` section.
//!
//! Records are visited in file order, as listed by the object map. Each
//! record is confined to the window its MS size prefix declares, so a record
//! that fails or decodes to the wrong length never shifts the next one: the
//! map offset of the next record is where decoding resumes.
//!
//! Types the reader does not know are kept as raw bytes, together with the
//! common fields that could be read, so they survive a rewrite at the same
//! revision.

mod common;
mod read_entities;
mod read_objects;

use ahash::AHashMap;
use once_cell::sync::Lazy;
use tracing::{debug, trace};

use self::common::{read_common, CommonData};
use super::context::DecodeContext;
use super::handle_reader::ObjectMapEntry;
use super::merged_reader::{MergedReader, TextSource};
use super::stream_reader::DwgStreamReader;
use crate::classes::ClassTable;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::paged::OBJECTS_MARKER;
use crate::io::dwg::constants::FIRST_CLASS_NUMBER;
use crate::io::dwg::crc::{crc8, SECTION_SEED};
use crate::io::dwg::object_type::{is_builtin_entity, DwgObjectType};
use crate::notification::NotificationType;
use crate::objects::{DwgObject, ObjectData, RawObject, Supertype};
use crate::types::{Handle, ObjectRef, VersionFlags};

/// Classes decoded field by field although their type code is dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariableClass {
    DictionaryVariable,
    DictionaryWithDefault,
    Scale,
}

static VARIABLE_CLASSES: Lazy<AHashMap<&'static str, VariableClass>> = Lazy::new(|| {
    AHashMap::from_iter([
        ("DICTIONARYVAR", VariableClass::DictionaryVariable),
        ("ACDBDICTIONARYWDFLT", VariableClass::DictionaryWithDefault),
        ("SCALE", VariableClass::Scale),
    ])
});

/// How a type code is decoded.
#[derive(Debug, Clone)]
enum ObjectKind {
    Builtin(DwgObjectType),
    Variable(VariableClass),
    Raw {
        is_entity: bool,
        class_name: Option<String>,
    },
}

impl ObjectKind {
    fn is_entity(&self) -> bool {
        match self {
            ObjectKind::Builtin(kind) => is_builtin_entity(kind.code()).unwrap_or(false),
            ObjectKind::Variable(_) => false,
            ObjectKind::Raw { is_entity, .. } => *is_entity,
        }
    }
}

/// Size prefix and extent of one record.
#[derive(Debug, Clone, Copy)]
struct RecordFrame {
    /// Offset of the MS size prefix
    offset: usize,
    /// Body size in bytes, from the type code to the CRC
    size: u32,
    /// Handle stream size in bits (R2010+)
    handle_bits: u64,
    /// Offset of the first body byte
    body_start: usize,
}

impl RecordFrame {
    fn body_end(&self) -> usize {
        self.body_start + self.size as usize
    }
}

/// Reads every record listed in the object map.
pub struct DwgObjectReader<'a> {
    data: &'a [u8],
    entries: &'a [ObjectMapEntry],
    classes: &'a ClassTable,
}

impl<'a> DwgObjectReader<'a> {
    /// `data` is the objects section for paged files and the whole file
    /// before R2004, matching how the map offsets are expressed.
    pub fn new(data: &'a [u8], entries: &'a [ObjectMapEntry], classes: &'a ClassTable) -> Self {
        Self {
            data,
            entries,
            classes,
        }
    }

    /// Decode all records in file order.
    pub fn read(&self, ctx: &mut DecodeContext) -> Result<Vec<DwgObject>> {
        if ctx.flags.r2004_plus {
            self.check_marker(ctx);
        }

        let mut order: Vec<&ObjectMapEntry> = self.entries.iter().collect();
        order.sort_by_key(|&&(_, offset)| offset);

        let mut objects = Vec::with_capacity(order.len());
        for &(handle, offset) in order {
            let index = objects.len();
            let offset = match usize::try_from(offset) {
                Ok(o) if o < self.data.len() => o,
                _ => {
                    ctx.notify(
                        NotificationType::Recoverable,
                        format!("object {handle:#X} mapped outside the section at {offset:#X}"),
                    );
                    continue;
                }
            };
            objects.push(self.read_record(index, Handle::new(handle), offset, ctx));
        }
        debug!(objects = objects.len(), "objects read");
        Ok(objects)
    }

    fn check_marker(&self, ctx: &mut DecodeContext) {
        let marker = self
            .data
            .get(..4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        if marker != Some(OBJECTS_MARKER) {
            ctx.notify(
                NotificationType::Warning,
                format!("objects section starts with {marker:X?}, expected {OBJECTS_MARKER:#X}"),
            );
        }
    }

    /// Decode one record; failures fall back to a raw object.
    fn read_record(
        &self,
        index: usize,
        map_handle: Handle,
        offset: usize,
        ctx: &mut DecodeContext,
    ) -> DwgObject {
        let frame = match self.frame_at(offset, ctx) {
            Ok(frame) => frame,
            Err(source) => {
                let err = object_error(index, map_handle, offset, source);
                ctx.notify(NotificationType::Recoverable, err.to_string());
                return failed_object(map_handle, offset, ctx, None, Vec::new(), 0);
            }
        };
        let data = self.data;
        let body = &data[frame.body_start..frame.body_end()];

        match self.decode_body(body, &frame, map_handle, ctx) {
            Ok(object) => object,
            Err(source) => {
                let err = object_error(index, map_handle, offset, source);
                ctx.notify(NotificationType::Recoverable, err.to_string());
                let code = DwgStreamReader::new(body, ctx.version())
                    .read_object_type()
                    .unwrap_or(0);
                let mut object = failed_object(
                    map_handle,
                    offset,
                    ctx,
                    Some(code),
                    body.to_vec(),
                    frame.handle_bits,
                );
                object.size = frame.size;
                object
            }
        }
    }

    /// Parse the size prefix and verify the trailing CRC.
    fn frame_at(&self, offset: usize, ctx: &mut DecodeContext) -> Result<RecordFrame> {
        let mut prefix = DwgStreamReader::new(self.data, ctx.version());
        prefix.set_position(offset)?;
        let size = prefix.read_modular_short()?;
        let handle_bits = if ctx.flags.r2010_plus {
            prefix.read_modular_char()?
        } else {
            0
        };
        let frame = RecordFrame {
            offset,
            size,
            handle_bits,
            body_start: prefix.position(),
        };

        let end = frame.body_end();
        let stored = self.data.get(end..end + 2).ok_or(DwgError::OutOfBounds {
            position: (end as u64 + 2) * 8,
            size: self.data.len() as u64,
        })?;
        if handle_bits > u64::from(size) * 8 {
            return Err(DwgError::Parse(format!(
                "handle stream of {handle_bits} bits in a {size}-byte record"
            )));
        }

        if ctx.verify_crc {
            let stored = u16::from_le_bytes([stored[0], stored[1]]);
            let actual = crc8(SECTION_SEED, &self.data[offset..end]);
            if stored != actual {
                ctx.notify(
                    NotificationType::Warning,
                    format!("record at {offset:#X}: CRC {actual:#06X}, stored {stored:#06X}"),
                );
            }
        }
        Ok(frame)
    }

    fn classify(&self, code: u16, ctx: &mut DecodeContext) -> ObjectKind {
        if let Some(kind) = DwgObjectType::from_code(code) {
            return ObjectKind::Builtin(kind);
        }
        if code < FIRST_CLASS_NUMBER {
            ctx.notify(NotificationType::Notice, format!("type {code:#X} kept as raw data"));
            return ObjectKind::Raw {
                is_entity: is_builtin_entity(code).unwrap_or(false),
                class_name: None,
            };
        }
        match self.classes.by_type(code) {
            Some(class) => match VARIABLE_CLASSES.get(class.dxf_name.as_str()) {
                Some(&variable) => ObjectKind::Variable(variable),
                None => {
                    ctx.notify(
                        NotificationType::Notice,
                        format!("class {} kept as raw data", class.dxf_name),
                    );
                    ObjectKind::Raw {
                        is_entity: class.is_entity(),
                        class_name: Some(class.dxf_name.clone()),
                    }
                }
            },
            None => {
                ctx.notify(
                    NotificationType::Notice,
                    format!("type {code} has no class table entry; kept as an object"),
                );
                ObjectKind::Raw {
                    is_entity: false,
                    class_name: None,
                }
            }
        }
    }

    fn decode_body(
        &self,
        body: &'a [u8],
        frame: &RecordFrame,
        map_handle: Handle,
        ctx: &mut DecodeContext,
    ) -> Result<DwgObject> {
        let flags = ctx.flags;
        let mut main = DwgStreamReader::new(body, flags.version).with_code_page(ctx.code_page);
        let type_code = main.read_object_type()?;

        let mut end_bit = if flags.r2010_plus {
            Some(u64::from(frame.size) * 8 - frame.handle_bits)
        } else if flags.r2000_plus {
            Some(main.read_raw_long()? as u32 as u64)
        } else {
            None
        };

        // The string stream ends where the handle stream starts.
        let mut main_end = end_bit;
        let text = match end_bit {
            Some(end) if flags.r2007_plus => {
                let mut strings = main.clone();
                match strings.locate_string_stream(end)? {
                    Some(start) => {
                        main_end = Some(start);
                        TextSource::Stream(strings)
                    }
                    None => {
                        main_end = Some(end - 1);
                        TextSource::Absent
                    }
                }
            }
            _ => TextSource::Inline,
        };

        let kind = self.classify(type_code, ctx);
        let is_entity = kind.is_entity();
        let handles = main.clone();
        let mut r = MergedReader::new(main, text, handles, Handle::NULL);
        let common = read_common(&mut r, &flags, is_entity, &mut end_bit)?;
        if main_end.is_none() {
            main_end = end_bit;
        }

        if common.handle != map_handle {
            ctx.notify(
                NotificationType::Warning,
                format!(
                    "record at {:#X} has handle {:#X}, mapped as {map_handle:#X}",
                    frame.offset, common.handle
                ),
            );
        }

        let data = match &kind {
            ObjectKind::Builtin(builtin) => read_builtin(*builtin, &mut r, &flags)?,
            ObjectKind::Variable(variable) => read_variable(*variable, &mut r, &flags)?,
            ObjectKind::Raw {
                is_entity,
                class_name,
            } => {
                let raw = RawObject {
                    version: flags.version,
                    class_name: class_name.clone(),
                    bytes: body.to_vec(),
                    handle_stream_bits: frame.handle_bits,
                };
                if *is_entity {
                    ObjectData::UnknownEntity(raw)
                } else {
                    ObjectData::UnknownObject(raw)
                }
            }
        };

        if !matches!(kind, ObjectKind::Raw { .. }) {
            if let Some(expected) = main_end {
                let consumed = r.main.position_in_bits();
                if consumed != expected {
                    ctx.notify(
                        NotificationType::Recoverable,
                        format!(
                            "{} {:#X}: main data ends at bit {consumed}, declared {expected}",
                            data.name(),
                            common.handle
                        ),
                    );
                }
            }
        }
        trace!(handle = %common.handle, kind = data.name(), offset = frame.offset, "object");

        Ok(build_object(type_code, common, frame, end_bit.unwrap_or(0), is_entity, data))
    }
}

fn read_builtin(
    kind: DwgObjectType,
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
) -> Result<ObjectData> {
    use DwgObjectType as T;
    Ok(match kind {
        T::Text => ObjectData::Text(read_entities::read_text(r, flags)?),
        T::Block => ObjectData::Block(read_entities::read_block(r)?),
        T::EndBlock => ObjectData::EndBlock,
        T::SeqEnd => ObjectData::SeqEnd,
        T::Insert => ObjectData::Insert(read_entities::read_insert(r, flags)?),
        T::Arc => ObjectData::Arc(read_entities::read_arc(r)?),
        T::Circle => ObjectData::Circle(read_entities::read_circle(r)?),
        T::Line => ObjectData::Line(read_entities::read_line(r, flags)?),
        T::Point => ObjectData::Point(read_entities::read_point(r)?),
        T::Ellipse => ObjectData::Ellipse(read_entities::read_ellipse(r)?),
        T::Ray => ObjectData::Ray(read_entities::read_ray(r)?),
        T::XLine => ObjectData::XLine(read_entities::read_xline(r)?),
        T::LwPolyline => ObjectData::LwPolyline(read_entities::read_lwpolyline(r, flags)?),
        T::Dictionary => ObjectData::Dictionary(read_objects::read_dictionary(r, flags)?),
        T::BlockControl => ObjectData::BlockControl(read_objects::read_block_control(r)?),
        T::BlockHeader => ObjectData::BlockHeader(read_objects::read_block_header(r, flags)?),
        T::LayerControl => ObjectData::LayerControl(read_objects::read_layer_control(r)?),
        T::Layer => ObjectData::Layer(read_objects::read_layer(r, flags)?),
    })
}

fn read_variable(
    kind: VariableClass,
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
) -> Result<ObjectData> {
    Ok(match kind {
        VariableClass::DictionaryVariable => {
            ObjectData::DictionaryVariable(read_objects::read_dictionary_variable(r)?)
        }
        VariableClass::DictionaryWithDefault => ObjectData::DictionaryWithDefault(
            read_objects::read_dictionary_with_default(r, flags)?,
        ),
        VariableClass::Scale => ObjectData::Scale(read_objects::read_scale(r)?),
    })
}

fn build_object(
    type_code: u16,
    common: CommonData,
    frame: &RecordFrame,
    bit_size: u64,
    is_entity: bool,
    data: ObjectData,
) -> DwgObject {
    DwgObject {
        type_code,
        supertype: if is_entity {
            Supertype::Entity
        } else {
            Supertype::Object
        },
        handle: common.handle,
        address: frame.offset as u64,
        size: frame.size,
        bit_size,
        owner: common.owner,
        reactors: common.reactors,
        xdictionary: common.xdictionary,
        eed: common.eed,
        entity: common.entity,
        data,
    }
}

fn object_error(index: usize, handle: Handle, offset: usize, source: DwgError) -> DwgError {
    DwgError::Object {
        index,
        handle: handle.value(),
        offset: offset as u64,
        source: Box::new(source),
    }
}

/// Placeholder for a record that could not be decoded, keyed by its map handle.
fn failed_object(
    handle: Handle,
    offset: usize,
    ctx: &DecodeContext,
    type_code: Option<u16>,
    bytes: Vec<u8>,
    handle_stream_bits: u64,
) -> DwgObject {
    let code = type_code.unwrap_or(0);
    let raw = RawObject {
        version: ctx.version(),
        class_name: None,
        bytes,
        handle_stream_bits,
    };
    let data = if is_builtin_entity(code) == Some(true) {
        ObjectData::UnknownEntity(raw)
    } else {
        ObjectData::UnknownObject(raw)
    };
    DwgObject {
        supertype: Supertype::Unknown,
        address: offset as u64,
        ..DwgObject::new_object(code, handle, ObjectRef::NULL, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::DxfClass;
    use crate::io::dwg::writer::object_writer::DwgObjectWriter;
    use crate::objects::{Dictionary, DictionaryVariable, Layer, Line};
    use crate::types::{DwgVersion, Vector3};

    fn sample_objects() -> Vec<DwgObject> {
        let layer = DwgObject::new_object(
            0x33,
            Handle::new(0x10),
            ObjectRef::soft_pointer(Handle::new(0x2)),
            ObjectData::Layer(Layer::new("0")),
        );
        let line = DwgObject::new_entity(
            0x13,
            Handle::new(0x20),
            ObjectRef::soft_pointer(Handle::new(0x1F)),
            Handle::new(0x10),
            ObjectData::Line(Line::from_points(
                Vector3::new(1.0, 2.0, 0.0),
                Vector3::new(4.0, 6.0, 0.0),
            )),
        );
        vec![layer, line]
    }

    fn decode(
        version: DwgVersion,
        objects: &[DwgObject],
        classes: &ClassTable,
    ) -> (Vec<DwgObject>, DecodeContext) {
        let (data, map) = DwgObjectWriter::new(version, 30).write(objects).unwrap();
        let mut ctx = DecodeContext::new(version, 0, 30, true);
        let decoded = DwgObjectReader::new(&data, &map, classes)
            .read(&mut ctx)
            .unwrap();
        (decoded, ctx)
    }

    #[test]
    fn test_read_known_objects_each_revision() {
        for version in DwgVersion::ALL {
            let (decoded, ctx) = decode(version, &sample_objects(), &ClassTable::new());
            assert_eq!(decoded.len(), 2, "{version}");
            assert!(
                !ctx.notifications().has_type(NotificationType::Recoverable),
                "{version}: {:?}",
                ctx.notifications()
            );
            assert_eq!(decoded[0].name(), "LAYER");
            assert_eq!(decoded[1].handle, Handle::new(0x20));
            assert!(decoded[1].is_entity());
        }
    }

    #[test]
    fn test_variable_class_by_name() {
        let mut classes = ClassTable::new();
        classes.add(DxfClass::new(500, "DICTIONARYVAR", false));
        let var = DwgObject::new_object(
            500,
            Handle::new(0x40),
            ObjectRef::hard_owner(Handle::new(0x3F)),
            ObjectData::DictionaryVariable(DictionaryVariable {
                schema: 0,
                value: "2".into(),
            }),
        );
        let (decoded, _) = decode(DwgVersion::AC1018, &[var], &classes);
        assert!(matches!(
            &decoded[0].data,
            ObjectData::DictionaryVariable(v) if v.value == "2"
        ));
    }

    #[test]
    fn test_unknown_class_is_kept_raw() {
        let mut classes = ClassTable::new();
        classes.add(DxfClass::new(500, "DICTIONARYVAR", false));
        let var = DwgObject::new_object(
            500,
            Handle::new(0x40),
            ObjectRef::hard_owner(Handle::new(0x3F)),
            ObjectData::DictionaryVariable(DictionaryVariable::default()),
        );
        let (data, map) = DwgObjectWriter::new(DwgVersion::AC1015, 30)
            .write(&[var])
            .unwrap();

        let mut renamed = ClassTable::new();
        renamed.add(DxfClass::new(500, "WIPEOUTVARIABLES", false));
        let mut ctx = DecodeContext::new(DwgVersion::AC1015, 0, 30, true);
        let decoded = DwgObjectReader::new(&data, &map, &renamed)
            .read(&mut ctx)
            .unwrap();
        assert_eq!(decoded[0].name(), "WIPEOUTVARIABLES");
        assert_eq!(decoded[0].handle, Handle::new(0x40));
        assert_eq!(decoded[0].owner.absolute(), Handle::new(0x3F));
        assert!(ctx.notifications().has_type(NotificationType::Notice));
    }

    #[test]
    fn test_missing_class_defaults_to_object() {
        let var = DwgObject::new_object(
            501,
            Handle::new(0x41),
            ObjectRef::NULL,
            ObjectData::Dictionary(Dictionary::new()),
        );
        let (decoded, _) = decode(DwgVersion::AC1024, &[var], &ClassTable::new());
        assert!(matches!(decoded[0].data, ObjectData::UnknownObject(_)));
    }

    #[test]
    fn test_offset_outside_section_is_skipped() {
        let objects = sample_objects();
        let (data, mut map) = DwgObjectWriter::new(DwgVersion::AC1015, 30)
            .write(&objects)
            .unwrap();
        map.push((0x99, data.len() as i64 + 100));
        let mut ctx = DecodeContext::new(DwgVersion::AC1015, 0, 30, true);
        let decoded = DwgObjectReader::new(&data, &map, &ClassTable::new())
            .read(&mut ctx)
            .unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(ctx.notifications().has_type(NotificationType::Recoverable));
    }

    #[test]
    fn test_corrupt_record_does_not_affect_next() {
        let objects = sample_objects();
        let (mut data, map) = DwgObjectWriter::new(DwgVersion::AC1018, 30)
            .write(&objects)
            .unwrap();
        // Damage the body of the layer, leaving its size prefix intact.
        let (_, layer_offset) = map[0];
        let start = layer_offset as usize + 2;
        for byte in &mut data[start..start + 6] {
            *byte = 0xFF;
        }
        let mut ctx = DecodeContext::new(DwgVersion::AC1018, 0, 30, true);
        let decoded = DwgObjectReader::new(&data, &map, &ClassTable::new())
            .read(&mut ctx)
            .unwrap();
        assert_eq!(decoded.len(), 2);
        match &decoded[1].data {
            ObjectData::Line(line) => assert_eq!(line.end, Vector3::new(4.0, 6.0, 0.0)),
            other => panic!("expected a line, got {other:?}"),
        }
        assert!(ctx.notifications().has_type(NotificationType::Warning));
    }

    #[test]
    fn test_missing_marker_is_reported() {
        let (mut data, map) = DwgObjectWriter::new(DwgVersion::AC1018, 30)
            .write(&sample_objects())
            .unwrap();
        data[0] = 0;
        let mut ctx = DecodeContext::new(DwgVersion::AC1018, 0, 30, true);
        DwgObjectReader::new(&data, &map, &ClassTable::new())
            .read(&mut ctx)
            .unwrap();
        assert!(ctx
            .notifications()
            .iter()
            .any(|n| n.message.contains("objects section starts")));
    }
}
