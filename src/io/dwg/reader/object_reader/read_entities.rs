//! Entity payload readers.
//!
//! Each function reads the type-specific fields that follow the common
//! entity header, main stream first and then the entity's references.

use crate::error::{DwgError, Result};
use crate::io::dwg::reader::merged_reader::MergedReader;
use crate::objects::{
    Arc, Block, Circle, Ellipse, Insert, Line, LwPolyline, LwPolylineFlags, LwVertex, Point, Ray,
    Text, XLine,
};
use crate::types::{Vector2, Vector3, VersionFlags};

pub(super) fn read_line(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Line> {
    let mut line = Line::default();
    if flags.r13_14_only {
        line.start = r.main.read_3bit_double()?;
        line.end = r.main.read_3bit_double()?;
    } else {
        // Z is skipped when both endpoints lie in the XY plane.
        let z_zero = r.main.read_bit()?;
        line.start.x = r.main.read_raw_double()?;
        line.end.x = r.main.read_bit_double_with_default(line.start.x)?;
        line.start.y = r.main.read_raw_double()?;
        line.end.y = r.main.read_bit_double_with_default(line.start.y)?;
        if !z_zero {
            line.start.z = r.main.read_raw_double()?;
            line.end.z = r.main.read_bit_double_with_default(line.start.z)?;
        }
    }
    line.thickness = r.main.read_bit_thickness()?;
    line.extrusion = r.main.read_bit_extrusion()?;
    Ok(line)
}

pub(super) fn read_circle(r: &mut MergedReader<'_>) -> Result<Circle> {
    Ok(Circle {
        center: r.main.read_3bit_double()?,
        radius: r.main.read_bit_double()?,
        thickness: r.main.read_bit_thickness()?,
        extrusion: r.main.read_bit_extrusion()?,
    })
}

pub(super) fn read_arc(r: &mut MergedReader<'_>) -> Result<Arc> {
    let circle = read_circle(r)?;
    Ok(Arc {
        circle,
        start_angle: r.main.read_bit_double()?,
        end_angle: r.main.read_bit_double()?,
    })
}

pub(super) fn read_point(r: &mut MergedReader<'_>) -> Result<Point> {
    Ok(Point {
        location: r.main.read_3bit_double()?,
        thickness: r.main.read_bit_thickness()?,
        extrusion: r.main.read_bit_extrusion()?,
        x_axis_angle: r.main.read_bit_double()?,
    })
}

pub(super) fn read_ellipse(r: &mut MergedReader<'_>) -> Result<Ellipse> {
    Ok(Ellipse {
        center: r.main.read_3bit_double()?,
        major_axis: r.main.read_3bit_double()?,
        extrusion: r.main.read_3bit_double()?,
        axis_ratio: r.main.read_bit_double()?,
        start_parameter: r.main.read_bit_double()?,
        end_parameter: r.main.read_bit_double()?,
    })
}

pub(super) fn read_ray(r: &mut MergedReader<'_>) -> Result<Ray> {
    Ok(Ray {
        origin: r.main.read_3bit_double()?,
        direction: r.main.read_3bit_double()?,
    })
}

pub(super) fn read_xline(r: &mut MergedReader<'_>) -> Result<XLine> {
    Ok(XLine {
        origin: r.main.read_3bit_double()?,
        direction: r.main.read_3bit_double()?,
    })
}

pub(super) fn read_text(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Text> {
    let mut text = Text::default();
    if flags.r13_14_only {
        text.elevation = r.main.read_bit_double()?;
        text.insertion = r.main.read_2raw_double()?;
        text.alignment = r.main.read_2raw_double()?;
        text.extrusion = r.main.read_3bit_double()?;
        text.thickness = r.main.read_bit_double()?;
        text.oblique_angle = r.main.read_bit_double()?;
        text.rotation = r.main.read_bit_double()?;
        text.height = r.main.read_bit_double()?;
        text.width_factor = r.main.read_bit_double()?;
        text.value = r.read_text()?;
        text.generation = r.main.read_bit_short()?;
        text.horizontal_alignment = r.main.read_bit_short()?;
        text.vertical_alignment = r.main.read_bit_short()?;
    } else {
        // A set bit means the field holds its default and is not stored.
        let data_flags = r.main.read_byte()?;
        if data_flags & 0x01 == 0 {
            text.elevation = r.main.read_raw_double()?;
        }
        text.insertion = r.main.read_2raw_double()?;
        text.alignment = text.insertion;
        if data_flags & 0x02 == 0 {
            let x = r.main.read_bit_double_with_default(text.insertion.x)?;
            let y = r.main.read_bit_double_with_default(text.insertion.y)?;
            text.alignment = Vector2::new(x, y);
        }
        text.extrusion = r.main.read_bit_extrusion()?;
        text.thickness = r.main.read_bit_thickness()?;
        if data_flags & 0x04 == 0 {
            text.oblique_angle = r.main.read_raw_double()?;
        }
        if data_flags & 0x08 == 0 {
            text.rotation = r.main.read_raw_double()?;
        }
        text.height = r.main.read_raw_double()?;
        if data_flags & 0x10 == 0 {
            text.width_factor = r.main.read_raw_double()?;
        }
        text.value = r.read_text()?;
        if data_flags & 0x20 == 0 {
            text.generation = r.main.read_bit_short()?;
        }
        if data_flags & 0x40 == 0 {
            text.horizontal_alignment = r.main.read_bit_short()?;
        }
        if data_flags & 0x80 == 0 {
            text.vertical_alignment = r.main.read_bit_short()?;
        }
    }
    text.style = r.read_ref()?;
    Ok(text)
}

pub(super) fn read_block(r: &mut MergedReader<'_>) -> Result<Block> {
    Ok(Block {
        name: r.read_text()?,
    })
}

pub(super) fn read_insert(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Insert> {
    let mut insert = Insert {
        insertion: r.main.read_3bit_double()?,
        ..Default::default()
    };

    if flags.r2000_plus {
        let scale_flags = r.main.read_2bits()?;
        let x = if scale_flags & 0x01 != 0 {
            1.0
        } else {
            r.main.read_raw_double()?
        };
        insert.scale = if scale_flags & 0x02 != 0 {
            Vector3::new(x, x, x)
        } else {
            let y = r.main.read_bit_double_with_default(x)?;
            let z = r.main.read_bit_double_with_default(x)?;
            Vector3::new(x, y, z)
        };
    } else {
        insert.scale = r.main.read_3bit_double()?;
    }

    insert.rotation = r.main.read_bit_double()?;
    insert.extrusion = r.main.read_bit_extrusion()?;
    let has_attributes = r.main.read_bit()?;
    let owned_count = if flags.r2004_plus && has_attributes {
        let count = r.main.read_bit_long()?;
        if count < 0 || count as u64 > r.handles.remaining_bits() / 8 {
            return Err(DwgError::Parse(format!("insert claims {count} attributes")));
        }
        count as usize
    } else {
        0
    };

    insert.block_header = r.read_ref()?;
    if has_attributes {
        if flags.r2004_plus {
            insert.attributes = r.read_refs(owned_count)?;
        } else {
            // First and last attribute; the chain between them is implicit.
            let first = r.read_ref()?;
            let last = r.read_ref()?;
            insert.attributes = if first.absolute() == last.absolute() {
                vec![first]
            } else {
                vec![first, last]
            };
        }
        insert.seqend = Some(r.read_ref()?);
    }
    Ok(insert)
}

pub(super) fn read_lwpolyline(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<LwPolyline> {
    let mut pl = LwPolyline {
        flags: LwPolylineFlags::from_bits_retain(r.main.read_bit_short()? as u16),
        ..Default::default()
    };
    if pl.flags.contains(LwPolylineFlags::HAS_CONSTANT_WIDTH) {
        pl.constant_width = r.main.read_bit_double()?;
    }
    if pl.flags.contains(LwPolylineFlags::HAS_ELEVATION) {
        pl.elevation = r.main.read_bit_double()?;
    }
    if pl.flags.contains(LwPolylineFlags::HAS_THICKNESS) {
        pl.thickness = r.main.read_bit_double()?;
    }
    if pl.flags.contains(LwPolylineFlags::HAS_EXTRUSION) {
        pl.extrusion = r.main.read_3bit_double()?;
    }

    let remaining = r.main.remaining_bits();
    let mut count = |present: bool| -> Result<usize> {
        if !present {
            return Ok(0);
        }
        let n = r.main.read_bit_long()?;
        // Every counted item takes at least two bits.
        if n < 0 || n as u64 > remaining / 2 {
            return Err(DwgError::Parse(format!("polyline claims {n} items")));
        }
        Ok(n as usize)
    };
    let points = count(true)?;
    let bulges = count(pl.flags.contains(LwPolylineFlags::HAS_BULGES))?;
    let ids = count(flags.r2010_plus && pl.flags.contains(LwPolylineFlags::HAS_VERTEX_IDS))?;
    let widths = count(pl.flags.contains(LwPolylineFlags::HAS_WIDTHS))?;

    pl.vertices.reserve(points);
    let mut previous = Vector2::ZERO;
    for i in 0..points {
        let location = if flags.r13_14_only || i == 0 {
            r.main.read_2raw_double()?
        } else {
            r.main.read_2bit_double_with_default(previous)?
        };
        previous = location;
        pl.vertices.push(LwVertex {
            location,
            ..Default::default()
        });
    }

    for i in 0..bulges {
        let bulge = r.main.read_bit_double()?;
        if let Some(v) = pl.vertices.get_mut(i) {
            v.bulge = bulge;
        }
    }
    for i in 0..ids {
        let id = r.main.read_bit_long()?;
        if let Some(v) = pl.vertices.get_mut(i) {
            v.id = id;
        }
    }
    for i in 0..widths {
        let start = r.main.read_bit_double()?;
        let end = r.main.read_bit_double()?;
        if let Some(v) = pl.vertices.get_mut(i) {
            v.start_width = start;
            v.end_width = end;
        }
    }
    Ok(pl)
}
