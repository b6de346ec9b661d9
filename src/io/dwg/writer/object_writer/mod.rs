//! Object writer for the `AcDb:AcDbObjects` section.
//!
//! Each object becomes one record: MS body size, the R2010+ MC handle
//! stream size, the body (type code, main data, string stream, handle
//! stream) and a CRC over everything from the size prefix on. The offset of
//! every record is collected for the object map.

mod common;
mod write_entities;
mod write_objects;

use tracing::{trace, warn};

use self::common::write_common;
use super::merged_writer::MergedWriter;
use super::stream_writer::DwgStreamWriter;
use crate::error::{DwgError, Result};
use crate::io::dwg::constants::paged::OBJECTS_MARKER;
use crate::io::dwg::crc::{crc8, SECTION_SEED};
use crate::io::dwg::reader::handle_reader::ObjectMapEntry;
use crate::objects::{DwgObject, ObjectData, RawObject};
use crate::types::{DwgVersion, VersionFlags};

/// Encodes objects into the body of the objects section.
#[derive(Debug, Clone)]
pub struct DwgObjectWriter {
    flags: VersionFlags,
    code_page: u16,
}

impl DwgObjectWriter {
    pub fn new(version: DwgVersion, code_page: u16) -> Self {
        Self {
            flags: VersionFlags::new(version),
            code_page,
        }
    }

    /// Encode `objects` in order.
    ///
    /// Returns the section bytes and the object map, sorted by handle, with
    /// offsets relative to the start of the returned bytes.
    pub fn write(&self, objects: &[DwgObject]) -> Result<(Vec<u8>, Vec<ObjectMapEntry>)> {
        let mut output = Vec::with_capacity(objects.len() * 64);
        if self.flags.r2004_plus {
            output.extend_from_slice(&OBJECTS_MARKER.to_le_bytes());
        }

        let mut map = Vec::with_capacity(objects.len());
        for object in objects {
            if object.handle.is_null() {
                return Err(DwgError::Encode(format!(
                    "{} object has no handle",
                    object.name()
                )));
            }
            let (body, handle_bits) = match object.data.raw() {
                Some(raw) => match self.raw_body(object, raw) {
                    Some(record) => record,
                    None => continue,
                },
                None => self.encode_body(object)?,
            };
            let offset = output.len();
            self.append_record(&mut output, &body, handle_bits)?;
            trace!(handle = %object.handle, kind = object.name(), offset, "object written");
            map.push((object.handle.value(), offset as i64));
        }

        map.sort_by_key(|&(handle, _)| handle);
        Ok((output, map))
    }

    /// Body of an object kept as raw bytes, if it can be written as is.
    fn raw_body(&self, object: &DwgObject, raw: &RawObject) -> Option<(Vec<u8>, u64)> {
        if raw.version != self.flags.version {
            warn!(
                handle = %object.handle,
                from = %raw.version,
                to = %self.flags.version,
                "raw object skipped: it cannot change revision"
            );
            return None;
        }
        if raw.bytes.is_empty() {
            warn!(handle = %object.handle, "raw object skipped: no bytes were recovered");
            return None;
        }
        Some((raw.bytes.clone(), raw.handle_stream_bits))
    }

    fn append_record(&self, output: &mut Vec<u8>, body: &[u8], handle_bits: u64) -> Result<()> {
        let size = u32::try_from(body.len())
            .map_err(|_| DwgError::Encode(format!("record of {} bytes", body.len())))?;
        let start = output.len();
        let mut prefix = DwgStreamWriter::new(self.flags.version);
        prefix.write_modular_short(size);
        if self.flags.r2010_plus {
            prefix.write_modular_char(handle_bits);
        }
        output.extend_from_slice(&prefix.into_bytes());
        output.extend_from_slice(body);
        let crc = crc8(SECTION_SEED, &output[start..]);
        output.extend_from_slice(&crc.to_le_bytes());
        Ok(())
    }

    /// Encode the body of a decoded object; returns it with its handle stream size in bits.
    fn encode_body(&self, object: &DwgObject) -> Result<(Vec<u8>, u64)> {
        let flags = &self.flags;
        let mut w = MergedWriter::new(flags.version, self.code_page, object.handle);
        w.main.write_object_type(object.type_code);

        let size_position = if flags.r2000_plus && !flags.r2010_plus {
            let position = w.main.position_in_bits();
            w.main.write_raw_long(0);
            Some(position)
        } else {
            None
        };

        let is_entity = object.data.is_entity();
        let r13_position = write_common(&mut w, flags, object, is_entity)?;
        self.write_payload(&mut w, &object.data)?;

        let end_bit = w.finish_main();
        if let Some(position) = size_position.or(r13_position) {
            let value = i32::try_from(end_bit).map_err(|_| {
                DwgError::Encode(format!("object {:#X} exceeds 2^31 bits", object.handle))
            })?;
            w.main.patch_raw_long(position, value)?;
        }

        let MergedWriter { mut main, handles, .. } = w;
        main.append(&handles);
        let bytes = main.into_bytes();
        let handle_bits = bytes.len() as u64 * 8 - end_bit;
        Ok((bytes, handle_bits))
    }

    fn write_payload(&self, w: &mut MergedWriter, data: &ObjectData) -> Result<()> {
        use self::write_entities as e;
        use self::write_objects as o;
        let flags = &self.flags;
        match data {
            ObjectData::Text(text) => e::write_text(w, flags, text)?,
            ObjectData::Block(block) => e::write_block(w, block)?,
            ObjectData::EndBlock | ObjectData::SeqEnd => {}
            ObjectData::Insert(insert) => e::write_insert(w, flags, insert)?,
            ObjectData::Arc(arc) => e::write_arc(w, arc),
            ObjectData::Circle(circle) => e::write_circle(w, circle),
            ObjectData::Line(line) => e::write_line(w, flags, line),
            ObjectData::Point(point) => e::write_point(w, point),
            ObjectData::Ellipse(ellipse) => e::write_ellipse(w, ellipse),
            ObjectData::Ray(ray) => e::write_ray(w, ray),
            ObjectData::XLine(xline) => e::write_xline(w, xline),
            ObjectData::LwPolyline(pl) => e::write_lwpolyline(w, flags, pl)?,
            ObjectData::Dictionary(dict) => o::write_dictionary(w, flags, dict)?,
            ObjectData::DictionaryWithDefault(dict) => {
                o::write_dictionary_with_default(w, flags, dict)?
            }
            ObjectData::DictionaryVariable(var) => o::write_dictionary_variable(w, var)?,
            ObjectData::Scale(scale) => o::write_scale(w, scale)?,
            ObjectData::BlockControl(control) => o::write_block_control(w, control)?,
            ObjectData::BlockHeader(header) => o::write_block_header(w, flags, header)?,
            ObjectData::LayerControl(control) => o::write_layer_control(w, control)?,
            ObjectData::Layer(layer) => o::write_layer(w, flags, layer)?,
            ObjectData::UnknownEntity(_) | ObjectData::UnknownObject(_) => {
                return Err(DwgError::Encode("raw objects are copied, not encoded".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ClassTable;
    use crate::io::dwg::reader::context::DecodeContext;
    use crate::io::dwg::reader::object_reader::DwgObjectReader;
    use crate::objects::{
        BlockControl, BlockHeader, Dictionary, ExtendedData, Insert, Layer, LayerFlags,
        LwPolyline, LwPolylineFlags, LwVertex, Text,
    };
    use crate::types::{Color, Handle, ObjectRef, Vector2, Vector3};

    fn round_trip(version: DwgVersion, objects: &[DwgObject]) -> Vec<DwgObject> {
        let (data, map) = DwgObjectWriter::new(version, 30).write(objects).unwrap();
        let mut ctx = DecodeContext::new(version, 0, 30, true);
        let decoded = DwgObjectReader::new(&data, &map, &ClassTable::new())
            .read(&mut ctx)
            .unwrap();
        assert!(
            ctx.notifications().is_empty(),
            "{version}: {:?}",
            ctx.notifications()
        );
        decoded
    }

    fn entity(handle: u64, data: ObjectData) -> DwgObject {
        let code = match &data {
            ObjectData::Text(_) => 0x01,
            ObjectData::EndBlock => 0x05,
            ObjectData::SeqEnd => 0x06,
            ObjectData::Insert(_) => 0x07,
            ObjectData::LwPolyline(_) => 0x4D,
            _ => 0x13,
        };
        DwgObject::new_entity(
            code,
            Handle::new(handle),
            ObjectRef::soft_pointer(Handle::new(0x1F)),
            Handle::new(0x10),
            data,
        )
    }

    #[test]
    fn test_null_handle_is_rejected() {
        let object = DwgObject::new_object(
            0x2A,
            Handle::NULL,
            ObjectRef::NULL,
            ObjectData::Dictionary(Dictionary::new()),
        );
        let err = DwgObjectWriter::new(DwgVersion::AC1015, 30)
            .write(&[object])
            .unwrap_err();
        assert!(matches!(err, DwgError::Encode(_)));
    }

    #[test]
    fn test_map_is_sorted_by_handle() {
        let objects = vec![
            entity(0x30, ObjectData::EndBlock),
            entity(0x21, ObjectData::SeqEnd),
        ];
        let (data, map) = DwgObjectWriter::new(DwgVersion::AC1018, 30)
            .write(&objects)
            .unwrap();
        assert_eq!(&data[..4], &OBJECTS_MARKER.to_le_bytes());
        assert_eq!(map[0].0, 0x21);
        assert!(map[0].1 > map[1].1);
    }

    #[test]
    fn test_entity_header_round_trip() {
        for version in DwgVersion::ALL {
            let mut text = entity(
                0x40,
                ObjectData::Text(Text::new("Hello", Vector2::new(3.0, 4.0), 2.5)),
            );
            text.reactors.push(ObjectRef::soft_pointer(Handle::new(0x41)));
            text.xdictionary = Some(ObjectRef::hard_owner(Handle::new(0x42)));
            text.eed.push(ExtendedData {
                application: ObjectRef::hard_pointer(Handle::new(0x12)),
                data: vec![0x00, 0x03, b'a', b'b', b'c'],
            });
            if let Some(header) = text.entity.as_mut() {
                header.linetype_scale = 2.0;
                header.invisibility = 1;
                if version >= DwgVersion::AC1015 {
                    header.lineweight = 25;
                    header.linetype_flags = 3;
                    header.linetype = Some(ObjectRef::hard_pointer(Handle::new(0x14)));
                }
            }

            let decoded = round_trip(version, &[text.clone()]);
            let got = &decoded[0];
            assert_eq!(got.reactors, text.reactors, "{version}");
            assert_eq!(got.xdictionary, text.xdictionary, "{version}");
            assert_eq!(got.eed, text.eed, "{version}");
            assert_eq!(got.entity, text.entity, "{version}");
            assert_eq!(got.data, text.data, "{version}");
        }
    }

    #[test]
    fn test_insert_and_polyline_round_trip() {
        let mut insert = Insert {
            insertion: Vector3::new(10.0, 20.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 3.0),
            rotation: 0.5,
            block_header: ObjectRef::soft_pointer(Handle::new(0x50)),
            ..Default::default()
        };
        insert.attributes = vec![
            ObjectRef::hard_owner(Handle::new(0x61)),
            ObjectRef::hard_owner(Handle::new(0x62)),
        ];
        insert.seqend = Some(ObjectRef::hard_owner(Handle::new(0x63)));

        let pl = LwPolyline {
            flags: LwPolylineFlags::HAS_BULGES | LwPolylineFlags::HAS_WIDTHS,
            vertices: vec![
                LwVertex {
                    bulge: 0.25,
                    start_width: 1.0,
                    ..LwVertex::new(0.0, 0.0)
                },
                LwVertex::new(5.0, 0.0),
                LwVertex::new(5.0, 5.0),
            ],
            ..Default::default()
        };

        for version in DwgVersion::ALL {
            let objects = vec![
                entity(0x60, ObjectData::Insert(insert.clone())),
                entity(0x70, ObjectData::LwPolyline(pl.clone())),
            ];
            let decoded = round_trip(version, &objects);
            assert_eq!(decoded[0].data, objects[0].data, "{version}");
            assert_eq!(decoded[1].data, objects[1].data, "{version}");
        }
    }

    #[test]
    fn test_table_objects_round_trip() {
        let mut block = BlockHeader::new("*Model_Space");
        block.block_entity = ObjectRef::soft_owner(Handle::new(0x81));
        block.entities = vec![ObjectRef::soft_owner(Handle::new(0x82))];
        block.end_block = ObjectRef::soft_owner(Handle::new(0x83));
        block.base_point = Vector3::new(1.0, 1.0, 0.0);

        let mut layer = Layer::new("WALLS");
        layer.flags = LayerFlags::LOCKED;
        layer.color = Color::Index(3);
        layer.linetype = ObjectRef::soft_pointer(Handle::new(0x14));

        let control = BlockControl {
            entries: vec![ObjectRef::soft_owner(Handle::new(0x80))],
            model_space: ObjectRef::soft_owner(Handle::new(0x80)),
            paper_space: ObjectRef::soft_owner(Handle::new(0x84)),
        };

        for version in DwgVersion::ALL {
            let objects = vec![
                DwgObject::new_object(
                    0x30,
                    Handle::new(0x1),
                    ObjectRef::NULL,
                    ObjectData::BlockControl(control.clone()),
                ),
                DwgObject::new_object(
                    0x31,
                    Handle::new(0x80),
                    ObjectRef::soft_pointer(Handle::new(0x1)),
                    ObjectData::BlockHeader(block.clone()),
                ),
                DwgObject::new_object(
                    0x33,
                    Handle::new(0x90),
                    ObjectRef::soft_pointer(Handle::new(0x2)),
                    ObjectData::Layer(layer.clone()),
                ),
            ];
            let decoded = round_trip(version, &objects);
            for (got, want) in decoded.iter().zip(&objects) {
                assert_eq!(got.data, want.data, "{version} {}", want.name());
                assert_eq!(got.owner, want.owner, "{version} {}", want.name());
            }
        }
    }

    #[test]
    fn test_raw_object_is_copied_at_same_revision() {
        let raw = RawObject {
            version: DwgVersion::AC1015,
            class_name: Some("ACAD_PROXY".into()),
            bytes: vec![0x40, 0x10, 0x00, 0x00],
            handle_stream_bits: 0,
        };
        let object = DwgObject::new_object(
            0x1F3,
            Handle::new(0x99),
            ObjectRef::NULL,
            ObjectData::UnknownObject(raw),
        );
        let same = DwgObjectWriter::new(DwgVersion::AC1015, 30)
            .write(std::slice::from_ref(&object))
            .unwrap();
        assert_eq!(same.1.len(), 1);
        let (data, _) = same;
        // MS size, then the bytes unchanged.
        assert_eq!(&data[2..6], &[0x40, 0x10, 0x00, 0x00]);

        let other = DwgObjectWriter::new(DwgVersion::AC1018, 30)
            .write(&[object])
            .unwrap();
        assert!(other.1.is_empty());
    }
}
