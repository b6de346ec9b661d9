//! Entity payload writers, one per reader in the object reader.

use super::common::to_count;
use crate::error::Result;
use crate::io::dwg::writer::merged_writer::MergedWriter;
use crate::objects::{
    Arc, Block, Circle, Ellipse, Insert, Line, LwPolyline, LwPolylineFlags, Point, Ray, Text,
    XLine,
};
use crate::types::{ObjectRef, Vector2, VersionFlags};

pub(super) fn write_line(w: &mut MergedWriter, flags: &VersionFlags, line: &Line) {
    if flags.r13_14_only {
        w.main.write_3bit_double(line.start);
        w.main.write_3bit_double(line.end);
    } else {
        let z_zero = line.start.z == 0.0 && line.end.z == 0.0;
        w.main.write_bit(z_zero);
        w.main.write_raw_double(line.start.x);
        w.main.write_bit_double_with_default(line.start.x, line.end.x);
        w.main.write_raw_double(line.start.y);
        w.main.write_bit_double_with_default(line.start.y, line.end.y);
        if !z_zero {
            w.main.write_raw_double(line.start.z);
            w.main.write_bit_double_with_default(line.start.z, line.end.z);
        }
    }
    w.main.write_bit_thickness(line.thickness);
    w.main.write_bit_extrusion(line.extrusion);
}

pub(super) fn write_circle(w: &mut MergedWriter, circle: &Circle) {
    w.main.write_3bit_double(circle.center);
    w.main.write_bit_double(circle.radius);
    w.main.write_bit_thickness(circle.thickness);
    w.main.write_bit_extrusion(circle.extrusion);
}

pub(super) fn write_arc(w: &mut MergedWriter, arc: &Arc) {
    write_circle(w, &arc.circle);
    w.main.write_bit_double(arc.start_angle);
    w.main.write_bit_double(arc.end_angle);
}

pub(super) fn write_point(w: &mut MergedWriter, point: &Point) {
    w.main.write_3bit_double(point.location);
    w.main.write_bit_thickness(point.thickness);
    w.main.write_bit_extrusion(point.extrusion);
    w.main.write_bit_double(point.x_axis_angle);
}

pub(super) fn write_ellipse(w: &mut MergedWriter, ellipse: &Ellipse) {
    w.main.write_3bit_double(ellipse.center);
    w.main.write_3bit_double(ellipse.major_axis);
    w.main.write_3bit_double(ellipse.extrusion);
    w.main.write_bit_double(ellipse.axis_ratio);
    w.main.write_bit_double(ellipse.start_parameter);
    w.main.write_bit_double(ellipse.end_parameter);
}

pub(super) fn write_ray(w: &mut MergedWriter, ray: &Ray) {
    w.main.write_3bit_double(ray.origin);
    w.main.write_3bit_double(ray.direction);
}

pub(super) fn write_xline(w: &mut MergedWriter, xline: &XLine) {
    w.main.write_3bit_double(xline.origin);
    w.main.write_3bit_double(xline.direction);
}

/// Bits of the R2000+ data flags byte; a set bit omits a default field.
fn text_data_flags(text: &Text) -> u8 {
    let mut data_flags = 0u8;
    for (bit, is_default) in [
        (0x01, text.elevation == 0.0),
        (0x02, text.alignment == text.insertion),
        (0x04, text.oblique_angle == 0.0),
        (0x08, text.rotation == 0.0),
        (0x10, text.width_factor == 1.0),
        (0x20, text.generation == 0),
        (0x40, text.horizontal_alignment == 0),
        (0x80, text.vertical_alignment == 0),
    ] {
        if is_default {
            data_flags |= bit;
        }
    }
    data_flags
}

pub(super) fn write_text(w: &mut MergedWriter, flags: &VersionFlags, text: &Text) -> Result<()> {
    if flags.r13_14_only {
        w.main.write_bit_double(text.elevation);
        w.main.write_2raw_double(text.insertion);
        w.main.write_2raw_double(text.alignment);
        w.main.write_3bit_double(text.extrusion);
        w.main.write_bit_double(text.thickness);
        w.main.write_bit_double(text.oblique_angle);
        w.main.write_bit_double(text.rotation);
        w.main.write_bit_double(text.height);
        w.main.write_bit_double(text.width_factor);
        w.write_text(&text.value)?;
        w.main.write_bit_short(text.generation);
        w.main.write_bit_short(text.horizontal_alignment);
        w.main.write_bit_short(text.vertical_alignment);
    } else {
        let data_flags = text_data_flags(text);
        w.main.write_byte(data_flags);
        if data_flags & 0x01 == 0 {
            w.main.write_raw_double(text.elevation);
        }
        w.main.write_2raw_double(text.insertion);
        if data_flags & 0x02 == 0 {
            w.main
                .write_bit_double_with_default(text.insertion.x, text.alignment.x);
            w.main
                .write_bit_double_with_default(text.insertion.y, text.alignment.y);
        }
        w.main.write_bit_extrusion(text.extrusion);
        w.main.write_bit_thickness(text.thickness);
        if data_flags & 0x04 == 0 {
            w.main.write_raw_double(text.oblique_angle);
        }
        if data_flags & 0x08 == 0 {
            w.main.write_raw_double(text.rotation);
        }
        w.main.write_raw_double(text.height);
        if data_flags & 0x10 == 0 {
            w.main.write_raw_double(text.width_factor);
        }
        w.write_text(&text.value)?;
        if data_flags & 0x20 == 0 {
            w.main.write_bit_short(text.generation);
        }
        if data_flags & 0x40 == 0 {
            w.main.write_bit_short(text.horizontal_alignment);
        }
        if data_flags & 0x80 == 0 {
            w.main.write_bit_short(text.vertical_alignment);
        }
    }
    w.write_ref(&text.style);
    Ok(())
}

pub(super) fn write_block(w: &mut MergedWriter, block: &Block) -> Result<()> {
    w.write_text(&block.name)
}

pub(super) fn write_insert(w: &mut MergedWriter, flags: &VersionFlags, insert: &Insert) -> Result<()> {
    w.main.write_3bit_double(insert.insertion);
    let scale = insert.scale;
    if flags.r2000_plus {
        let mut scale_flags = 0u8;
        if scale.x == 1.0 {
            scale_flags |= 0x01;
        }
        if scale.y == scale.x && scale.z == scale.x {
            scale_flags |= 0x02;
        }
        w.main.write_2bits(scale_flags);
        if scale_flags & 0x01 == 0 {
            w.main.write_raw_double(scale.x);
        }
        if scale_flags & 0x02 == 0 {
            w.main.write_bit_double_with_default(scale.x, scale.y);
            w.main.write_bit_double_with_default(scale.x, scale.z);
        }
    } else {
        w.main.write_3bit_double(scale);
    }

    w.main.write_bit_double(insert.rotation);
    w.main.write_bit_extrusion(insert.extrusion);
    let has_attributes = insert.has_attributes();
    w.main.write_bit(has_attributes);
    if flags.r2004_plus && has_attributes {
        w.main.write_bit_long(to_count(insert.attributes.len())?);
    }

    w.write_ref(&insert.block_header);
    if has_attributes {
        if flags.r2004_plus {
            w.write_refs(&insert.attributes);
        } else if let (Some(first), Some(last)) =
            (insert.attributes.first(), insert.attributes.last())
        {
            // First and last only; the chain between them is implicit.
            w.write_ref(first);
            w.write_ref(last);
        }
        w.write_ref(insert.seqend.as_ref().unwrap_or(&ObjectRef::NULL));
    }
    Ok(())
}

pub(super) fn write_lwpolyline(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    pl: &LwPolyline,
) -> Result<()> {
    w.main.write_bit_short(pl.flags.bits() as i16);
    if pl.flags.contains(LwPolylineFlags::HAS_CONSTANT_WIDTH) {
        w.main.write_bit_double(pl.constant_width);
    }
    if pl.flags.contains(LwPolylineFlags::HAS_ELEVATION) {
        w.main.write_bit_double(pl.elevation);
    }
    if pl.flags.contains(LwPolylineFlags::HAS_THICKNESS) {
        w.main.write_bit_double(pl.thickness);
    }
    if pl.flags.contains(LwPolylineFlags::HAS_EXTRUSION) {
        w.main.write_3bit_double(pl.extrusion);
    }

    let count = to_count(pl.vertices.len())?;
    let has_bulges = pl.flags.contains(LwPolylineFlags::HAS_BULGES);
    let has_ids = flags.r2010_plus && pl.flags.contains(LwPolylineFlags::HAS_VERTEX_IDS);
    let has_widths = pl.flags.contains(LwPolylineFlags::HAS_WIDTHS);
    w.main.write_bit_long(count);
    for present in [has_bulges, has_ids, has_widths] {
        if present {
            w.main.write_bit_long(count);
        }
    }

    let mut previous = Vector2::ZERO;
    for (i, vertex) in pl.vertices.iter().enumerate() {
        if flags.r13_14_only || i == 0 {
            w.main.write_2raw_double(vertex.location);
        } else {
            w.main
                .write_2bit_double_with_default(previous, vertex.location);
        }
        previous = vertex.location;
    }
    if has_bulges {
        for vertex in &pl.vertices {
            w.main.write_bit_double(vertex.bulge);
        }
    }
    if has_ids {
        for vertex in &pl.vertices {
            w.main.write_bit_long(vertex.id);
        }
    }
    if has_widths {
        for vertex in &pl.vertices {
            w.main.write_bit_double(vertex.start_width);
            w.main.write_bit_double(vertex.end_width);
        }
    }
    Ok(())
}
