//! Encode/decode round trips of a complete drawing across revisions.

mod common;

use common::*;
use dwgcodec::classes::DxfClass;
use dwgcodec::io::dwg::header_layout::{fields_for, lookup};
use dwgcodec::objects::{Line, Scale};
use dwgcodec::io::dwg::constants::section_names;
use dwgcodec::io::dwg::{DwgFileHeader, SecondFileHeader};
use dwgcodec::{
    decode, encode, encode_with, DwgDocument, DwgObject, DwgPreview, DwgVersion,
    DwgWriterConfiguration, Handle, HeaderValue, NotificationType, ObjectData, ObjectRef,
    PreviewType, Vector3,
};

fn round_trip(doc: &DwgDocument) -> DwgDocument {
    let bytes = encode(doc, doc.version()).expect("encode");
    decode(&bytes).expect("decode")
}

fn data(doc: &DwgDocument, handle: u64) -> &ObjectData {
    &doc.get_by_handle(handle)
        .unwrap_or_else(|| panic!("object {handle:#X} missing"))
        .data
}

#[test]
fn test_sample_drawing_every_revision() {
    for version in DwgVersion::ALL {
        let original = sample_drawing(version);
        let doc = round_trip(&original);

        assert_eq!(doc.version(), version);
        assert_eq!(doc.len(), SAMPLE_OBJECTS, "{version}");
        assert_eq!(doc.dangling_references(), 0, "{version}");
        assert!(
            !doc.notifications().has_type(NotificationType::Integrity),
            "{version}: {:?}",
            doc.notifications().iter().collect::<Vec<_>>()
        );
        assert_eq!(doc.classes().len(), 2);

        for handle in [LINE, CIRCLE, POLYLINE, SCALE, VARIABLE] {
            assert_eq!(data(&doc, handle), data(&original, handle), "{version} {handle:#X}");
        }
    }
}

#[test]
fn test_objects_come_back_in_file_order() {
    let doc = round_trip(&sample_drawing(DwgVersion::AC1018));
    let handles: Vec<u64> = doc.objects().iter().map(|o| o.handle.value()).collect();
    let addresses: Vec<u64> = doc.objects().iter().map(|o| o.address).collect();
    assert!(addresses.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(handles[0], BLOCK_CONTROL);
    assert_eq!(*handles.last().unwrap(), VARIABLE);
}

#[test]
fn test_entity_links_resolve() {
    for version in [DwgVersion::AC1015, DwgVersion::AC1021, DwgVersion::AC1032] {
        let doc = round_trip(&sample_drawing(version));

        let line = doc.get_by_handle(LINE).unwrap();
        assert!(line.is_entity());
        let layer = doc.resolve(&line.entity.as_ref().unwrap().layer).unwrap();
        match &layer.data {
            ObjectData::Layer(layer) => {
                assert_eq!(layer.name, "Walls");
                assert_eq!(layer.color.index(), 3);
            }
            other => panic!("{version}: line layer resolved to {}", other.name()),
        }

        let Some(ObjectData::Insert(insert)) = doc.get_by_handle(INSERT).map(|o| &o.data) else {
            panic!("insert missing");
        };
        assert_eq!(insert.scale, Vector3::new(2.0, 2.0, 2.0));
        let block = doc.resolve(&insert.block_header).unwrap();
        assert!(matches!(&block.data, ObjectData::BlockHeader(b) if b.name == "*Model_Space"));
    }
}

#[test]
fn test_header_variables_survive() {
    for version in [DwgVersion::AC1012, DwgVersion::AC1018, DwgVersion::AC1027] {
        let original = sample_drawing(version);
        let doc = round_trip(&original);
        let stored = fields_for(version).filter(|f| f.requires.is_none()).count();
        assert_eq!(doc.header().len(), stored, "{version}");
        for (name, value) in original.header().iter() {
            if lookup(name, version).is_none() || value.as_handle().is_some() {
                continue;
            }
            assert_eq!(doc.header_variable(name), Some(value), "{version}: {name}");
        }
        assert_eq!(doc.header_variable("MENU").and_then(|v| v.as_str()), Some("acad"));
        let clayer = doc.header_variable("CLAYER").and_then(|v| v.as_handle()).unwrap();
        assert!(matches!(
            doc.resolve(clayer).map(|o| &o.data),
            Some(ObjectData::Layer(layer)) if layer.name == "Walls"
        ));
    }
}

#[test]
fn test_handle_seed_follows_the_last_object() {
    let original = sample_drawing(DwgVersion::AC1015);
    let last = original.objects().iter().map(|o| o.handle.value()).max().unwrap();
    let doc = round_trip(&original);
    assert_eq!(doc.header_variable("HANDSEED"), Some(&HeaderValue::LongLong(last + 1)));
    // Variables the layout does not know at the target are not written.
    let mut doc = doc;
    doc.header_mut().set("NOT_A_VARIABLE", HeaderValue::Short(1));
    assert!(round_trip(&doc).header_variable("NOT_A_VARIABLE").is_none());
}

#[test]
fn test_dictionary_entries_resolve() {
    let doc = round_trip(&sample_drawing(DwgVersion::AC1024));
    let ObjectData::Dictionary(named) = data(&doc, NAMED_OBJECTS) else {
        panic!("named object dictionary missing");
    };
    let scale = doc.resolve(named.get("ACAD_SCALELIST").unwrap()).unwrap();
    assert!(matches!(&scale.data, ObjectData::Scale(s) if s.name == "1:2"));
    let variable = doc.resolve(named.get("CANNOSCALE").unwrap()).unwrap();
    assert!(matches!(&variable.data, ObjectData::DictionaryVariable(v) if v.value == "1:2"));
}

#[test]
fn test_text_survives_both_encodings() {
    // Code page text before R2007, UTF-16 string stream after.
    for version in [DwgVersion::AC1018, DwgVersion::AC1027] {
        let doc = round_trip(&sample_drawing(version));
        let ObjectData::Text(text) = data(&doc, TEXT) else {
            panic!("text missing");
        };
        assert_eq!(text.value, "Ground floor");
        assert!((text.height - 0.25).abs() < 1e-12);
    }
}

#[test]
fn test_version_conversion() {
    let mut doc = round_trip(&sample_drawing(DwgVersion::AC1015));
    doc.set_version(DwgVersion::AC1032);
    let converted = round_trip(&doc);
    assert_eq!(converted.version(), DwgVersion::AC1032);
    assert_eq!(converted.len(), SAMPLE_OBJECTS);
    assert_eq!(data(&converted, LINE), data(&doc, LINE));
}

#[test]
fn test_encode_at_target_revision() {
    let doc = round_trip(&sample_drawing(DwgVersion::AC1015));
    let bytes = encode(&doc, DwgVersion::AC1018).unwrap();
    assert_eq!(doc.version(), DwgVersion::AC1015);

    let converted = decode(&bytes).unwrap();
    assert_eq!(converted.version(), DwgVersion::AC1018);
    assert_eq!(converted.len(), SAMPLE_OBJECTS);
    assert_eq!(converted.dangling_references(), 0);
    for handle in [LINE, CIRCLE, TEXT, POLYLINE, INSERT, SCALE] {
        assert_eq!(data(&converted, handle), data(&doc, handle), "{handle:#X}");
    }
}

#[test]
fn test_uncompressed_pages_decode_identically() {
    let doc = sample_drawing(DwgVersion::AC1018);
    let config = DwgWriterConfiguration {
        compress: false,
        max_page_size: 0x80,
        ..Default::default()
    };
    let plain = decode(&encode_with(&doc, doc.version(), &config).unwrap()).unwrap();
    let packed = round_trip(&doc);
    assert_eq!(plain.len(), packed.len());
    for (a, b) in plain.objects().iter().zip(packed.objects()) {
        assert_eq!(a.handle, b.handle);
        assert_eq!(a.data, b.data);
    }
}

fn placeholder_drawing(version: DwgVersion) -> DwgDocument {
    let mut doc = DwgDocument::new(version);
    doc.add_object(DwgObject::new_object(
        500,
        Handle::new(0x40),
        ObjectRef::NULL,
        ObjectData::Scale(Scale::new("1:4", 1.0, 4.0)),
    ));
    doc.add_object(DwgObject::new_entity(
        0x13,
        Handle::new(0x41),
        ObjectRef::NULL,
        Handle::new(0x40),
        ObjectData::Line(Line::from_points(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )),
    ));
    doc.classes_mut()
        .add(DxfClass::new(500, "ACDBPLACEHOLDER", false));
    doc
}

#[test]
fn test_unknown_class_is_kept_raw() {
    for version in [DwgVersion::AC1015, DwgVersion::AC1018, DwgVersion::AC1024] {
        let doc = round_trip(&placeholder_drawing(version));
        assert!(doc.notifications().has_type(NotificationType::Notice));
        let object = doc.get_by_handle(0x40).unwrap();
        let ObjectData::UnknownObject(raw) = &object.data else {
            panic!("{version}: expected raw data, got {}", object.name());
        };
        assert_eq!(raw.version, version);
        assert_eq!(raw.class_name.as_deref(), Some("ACDBPLACEHOLDER"));

        // Same revision: the record is written back byte for byte.
        let again = round_trip(&doc);
        let ObjectData::UnknownObject(raw_again) = &again.get_by_handle(0x40).unwrap().data else {
            panic!("raw object lost on rewrite");
        };
        assert_eq!(raw_again.bytes, raw.bytes);
        assert_eq!(again.get_by_handle(0x40).unwrap().size, object.size);
    }
}

#[test]
fn test_raw_objects_are_left_out_at_another_target() {
    let doc = round_trip(&placeholder_drawing(DwgVersion::AC1018));
    let converted = decode(&encode(&doc, DwgVersion::AC1015).unwrap()).unwrap();
    assert!(converted.get_by_handle(0x40).is_none());
    assert_eq!(converted.dangling_references(), 1);

    let same = decode(&encode(&doc, DwgVersion::AC1018).unwrap()).unwrap();
    assert!(same.get_by_handle(0x40).is_some());
    assert_eq!(same.dangling_references(), 0);
}

#[test]
fn test_raw_objects_do_not_change_revision() {
    let mut doc = round_trip(&placeholder_drawing(DwgVersion::AC1015));
    doc.set_version(DwgVersion::AC1027);
    let converted = round_trip(&doc);
    assert!(converted.get_by_handle(0x40).is_none());
    assert!(converted.get_by_handle(0x41).is_some());
    assert_eq!(converted.dangling_references(), 1);
}

fn thumbnail() -> DwgPreview {
    let image: Vec<u8> = (0..0x300u32).map(|i| (i * 7 % 251) as u8).collect();
    DwgPreview::new(PreviewType::Bmp, vec![0; 80], image)
}

#[test]
fn test_preview_survives_every_layout() {
    let versions = [DwgVersion::AC1012, DwgVersion::AC1015, DwgVersion::AC1018, DwgVersion::AC1032];
    for version in versions {
        let mut original = sample_drawing(version);
        original.set_preview(Some(thumbnail()));
        let doc = round_trip(&original);
        assert_eq!(doc.preview(), Some(&thumbnail()), "{version}");
        assert!(!doc.notifications().has_type(NotificationType::Warning), "{version}");
        assert_eq!(doc.len(), SAMPLE_OBJECTS);
    }
}

#[test]
fn test_preview_follows_a_revision_change() {
    let mut original = sample_drawing(DwgVersion::AC1015);
    original.set_preview(Some(thumbnail()));
    let doc = round_trip(&original);
    let converted = decode(&encode(&doc, DwgVersion::AC1024).unwrap()).unwrap();
    assert_eq!(converted.preview(), Some(&thumbnail()));
    let back = decode(&encode(&converted, DwgVersion::AC1014).unwrap()).unwrap();
    assert_eq!(back.preview(), Some(&thumbnail()));
}

#[test]
fn test_flat_preview_address_points_at_the_section() {
    let mut original = sample_drawing(DwgVersion::AC1015);
    original.set_preview(Some(thumbnail()));
    let bytes = encode(&original, DwgVersion::AC1015).unwrap();
    let DwgFileHeader::Flat(header) = DwgFileHeader::parse(&bytes, true).unwrap() else {
        panic!("expected a pre-2004 file");
    };
    let address = header.preview_address as usize;
    assert_eq!(bytes[address], 0x1F);
    // The directory's image entry holds an absolute address.
    let image_at = address + 16 + 4 + 1 + 9 + 1;
    let image = u32::from_le_bytes(bytes[image_at..image_at + 4].try_into().unwrap()) as usize;
    assert_eq!(&bytes[image..image + 4], &thumbnail().raw_image[..4]);
}

#[test]
fn test_kept_sections_survive_a_same_revision_rewrite() {
    let aux: Vec<u8> = (0..123u8).collect();
    let mut original = sample_drawing(DwgVersion::AC1015);
    original.retain_section(section_names::AUX_HEADER, aux.clone());
    original.retain_section(section_names::TEMPLATE, 1u32.to_le_bytes().to_vec());

    let doc = round_trip(&original);
    assert!(!doc.notifications().has_type(NotificationType::Warning));
    let bytes = encode(&doc, DwgVersion::AC1015).unwrap();
    let DwgFileHeader::Flat(header) = DwgFileHeader::parse(&bytes, true).unwrap() else {
        panic!("expected a pre-2004 file");
    };
    assert_eq!(header.records.len(), 6);
    assert_eq!(&bytes[flat_section_range(&bytes, 5)], &aux[..]);

    let again = decode(&bytes).unwrap();
    let names: Vec<_> = again.retained_sections().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, [section_names::TEMPLATE, section_names::AUX_HEADER]);
    assert_eq!(again.len(), SAMPLE_OBJECTS);
}

#[test]
fn test_kept_sections_are_dropped_at_another_revision() {
    let mut flat = sample_drawing(DwgVersion::AC1015);
    flat.retain_section(section_names::AUX_HEADER, vec![9; 40]);
    let converted = decode(&encode(&flat, DwgVersion::AC1014).unwrap()).unwrap();
    assert!(converted.retained_sections().is_empty());

    let mut paged = sample_drawing(DwgVersion::AC1018);
    paged.retain_section("AcDb:SummaryInfo", vec![3; 60]);
    let same = round_trip(&paged);
    assert_eq!(same.retained_sections().len(), 1);
    assert_eq!(same.retained_sections()[0].data, vec![3; 60]);
    let converted = decode(&encode(&same, DwgVersion::AC1024).unwrap()).unwrap();
    assert!(converted.retained_sections().is_empty());
}

#[test]
fn test_second_header_repeats_the_file_header() {
    let doc = round_trip(&sample_drawing(DwgVersion::AC1015));
    let second = doc.second_header().expect("second file header");
    let bytes = encode(&doc, DwgVersion::AC1015).unwrap();
    let DwgFileHeader::Flat(header) = DwgFileHeader::parse(&bytes, true).unwrap() else {
        panic!("expected a pre-2004 file");
    };
    assert_eq!(&second.records[..3], &header.records[..]);
    assert_eq!(SecondFileHeader::find(&bytes, 0), Some(second.address as usize));
    let seed = match doc.header_variable("HANDSEED") {
        Some(HeaderValue::LongLong(seed)) => *seed,
        other => panic!("HANDSEED is {other:?}"),
    };
    assert_eq!(second.handle("HANDSEED"), Some(seed));

    let paged = round_trip(&sample_drawing(DwgVersion::AC1018));
    assert!(paged.second_header().is_none());
}
