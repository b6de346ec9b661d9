//! Graphical object payloads

use bitflags::bitflags;

use crate::types::{ObjectRef, Vector2, Vector3};

/// A line segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Vector3,
    pub end: Vector3,
    pub thickness: f64,
    pub extrusion: Vector3,
}

impl Line {
    pub fn from_points(start: Vector3, end: Vector3) -> Self {
        Line {
            start,
            end,
            ..Default::default()
        }
    }
}

impl Default for Line {
    fn default() -> Self {
        Line {
            start: Vector3::ZERO,
            end: Vector3::ZERO,
            thickness: 0.0,
            extrusion: Vector3::UNIT_Z,
        }
    }
}

/// A full circle.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Vector3,
    pub radius: f64,
    pub thickness: f64,
    pub extrusion: Vector3,
}

impl Default for Circle {
    fn default() -> Self {
        Circle {
            center: Vector3::ZERO,
            radius: 1.0,
            thickness: 0.0,
            extrusion: Vector3::UNIT_Z,
        }
    }
}

/// A circular arc; angles in radians, counterclockwise from start to end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arc {
    pub circle: Circle,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// A single point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub location: Vector3,
    pub thickness: f64,
    pub extrusion: Vector3,
    /// Angle of the X axis of the UCS in effect when the point was drawn
    pub x_axis_angle: f64,
}

impl Default for Point {
    fn default() -> Self {
        Point {
            location: Vector3::ZERO,
            thickness: 0.0,
            extrusion: Vector3::UNIT_Z,
            x_axis_angle: 0.0,
        }
    }
}

/// An ellipse or elliptical arc.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub center: Vector3,
    /// Endpoint of the major axis, relative to the center
    pub major_axis: Vector3,
    pub extrusion: Vector3,
    /// Minor to major axis ratio
    pub axis_ratio: f64,
    pub start_parameter: f64,
    pub end_parameter: f64,
}

impl Default for Ellipse {
    fn default() -> Self {
        Ellipse {
            center: Vector3::ZERO,
            major_axis: Vector3::new(1.0, 0.0, 0.0),
            extrusion: Vector3::UNIT_Z,
            axis_ratio: 1.0,
            start_parameter: 0.0,
            end_parameter: std::f64::consts::TAU,
        }
    }
}

/// A half-infinite line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

/// An infinite construction line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XLine {
    pub origin: Vector3,
    pub direction: Vector3,
}

/// Single-line text.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub insertion: Vector2,
    /// Second alignment point; equal to `insertion` for left-aligned text
    pub alignment: Vector2,
    pub elevation: f64,
    pub extrusion: Vector3,
    pub thickness: f64,
    pub oblique_angle: f64,
    pub rotation: f64,
    pub height: f64,
    pub width_factor: f64,
    /// Mirroring flags (2 = backwards, 4 = upside down)
    pub generation: i16,
    pub horizontal_alignment: i16,
    pub vertical_alignment: i16,
    /// Text style table entry
    pub style: ObjectRef,
}

impl Text {
    pub fn new(value: impl Into<String>, insertion: Vector2, height: f64) -> Self {
        Text {
            value: value.into(),
            insertion,
            alignment: insertion,
            height,
            ..Default::default()
        }
    }
}

impl Default for Text {
    fn default() -> Self {
        Text {
            value: String::new(),
            insertion: Vector2::ZERO,
            alignment: Vector2::ZERO,
            elevation: 0.0,
            extrusion: Vector3::UNIT_Z,
            thickness: 0.0,
            oblique_angle: 0.0,
            rotation: 0.0,
            height: 1.0,
            width_factor: 1.0,
            generation: 0,
            horizontal_alignment: 0,
            vertical_alignment: 0,
            style: ObjectRef::NULL,
        }
    }
}

/// Start of a block definition's entity list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub name: String,
}

/// A reference to a block definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub insertion: Vector3,
    pub scale: Vector3,
    pub rotation: f64,
    pub extrusion: Vector3,
    /// Block header being inserted
    pub block_header: ObjectRef,
    /// Attached attributes; only the first and last are stored before R2004
    pub attributes: Vec<ObjectRef>,
    /// End of the attribute sequence, present with attributes
    pub seqend: Option<ObjectRef>,
}

impl Insert {
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

impl Default for Insert {
    fn default() -> Self {
        Insert {
            insertion: Vector3::ZERO,
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: 0.0,
            extrusion: Vector3::UNIT_Z,
            block_header: ObjectRef::NULL,
            attributes: Vec::new(),
            seqend: None,
        }
    }
}

bitflags! {
    /// Lightweight polyline flags.
    ///
    /// The low bits announce which optional fields are stored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LwPolylineFlags: u16 {
        const HAS_EXTRUSION = 0x0001;
        const HAS_THICKNESS = 0x0002;
        const HAS_CONSTANT_WIDTH = 0x0004;
        const HAS_ELEVATION = 0x0008;
        const HAS_BULGES = 0x0010;
        const HAS_WIDTHS = 0x0020;
        const PLINEGEN = 0x0100;
        const CLOSED = 0x0200;
        const HAS_VERTEX_IDS = 0x0400;
    }
}

/// A vertex of a lightweight polyline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LwVertex {
    pub location: Vector2,
    /// tan(included angle / 4); 0 for a straight segment
    pub bulge: f64,
    pub start_width: f64,
    pub end_width: f64,
    /// Vertex identifier (R2010+)
    pub id: i32,
}

impl LwVertex {
    pub fn new(x: f64, y: f64) -> Self {
        LwVertex {
            location: Vector2::new(x, y),
            ..Default::default()
        }
    }
}

/// A 2D polyline with optional bulges and widths.
#[derive(Debug, Clone, PartialEq)]
pub struct LwPolyline {
    pub flags: LwPolylineFlags,
    pub constant_width: f64,
    pub elevation: f64,
    pub thickness: f64,
    pub extrusion: Vector3,
    pub vertices: Vec<LwVertex>,
}

impl LwPolyline {
    pub fn is_closed(&self) -> bool {
        self.flags.contains(LwPolylineFlags::CLOSED)
    }

    /// Flags with every presence bit needed by the current values set.
    pub fn storage_flags(&self, with_ids: bool) -> LwPolylineFlags {
        let mut flags = self.flags;
        if self.constant_width != 0.0 {
            flags.insert(LwPolylineFlags::HAS_CONSTANT_WIDTH);
        }
        if self.elevation != 0.0 {
            flags.insert(LwPolylineFlags::HAS_ELEVATION);
        }
        if self.thickness != 0.0 {
            flags.insert(LwPolylineFlags::HAS_THICKNESS);
        }
        if self.extrusion != Vector3::UNIT_Z {
            flags.insert(LwPolylineFlags::HAS_EXTRUSION);
        }
        if self.vertices.iter().any(|v| v.bulge != 0.0) {
            flags.insert(LwPolylineFlags::HAS_BULGES);
        }
        if self.vertices.iter().any(|v| v.start_width != 0.0 || v.end_width != 0.0) {
            flags.insert(LwPolylineFlags::HAS_WIDTHS);
        }
        if with_ids {
            if self.vertices.iter().any(|v| v.id != 0) {
                flags.insert(LwPolylineFlags::HAS_VERTEX_IDS);
            }
        } else {
            flags.remove(LwPolylineFlags::HAS_VERTEX_IDS);
        }
        flags
    }
}

impl Default for LwPolyline {
    fn default() -> Self {
        LwPolyline {
            flags: LwPolylineFlags::empty(),
            constant_width: 0.0,
            elevation: 0.0,
            thickness: 0.0,
            extrusion: Vector3::UNIT_Z,
            vertices: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_alignment_defaults_to_insertion() {
        let text = Text::new("A-101", Vector2::new(2.0, 3.0), 0.25);
        assert_eq!(text.alignment, text.insertion);
        assert_eq!(text.width_factor, 1.0);
    }

    #[test]
    fn test_lwpolyline_storage_flags() {
        let mut pl = LwPolyline {
            flags: LwPolylineFlags::CLOSED,
            ..Default::default()
        };
        pl.vertices.push(LwVertex::new(0.0, 0.0));
        pl.vertices.push(LwVertex {
            bulge: 0.5,
            id: 3,
            ..LwVertex::new(1.0, 0.0)
        });
        pl.elevation = 2.0;
        let flags = pl.storage_flags(false);
        assert!(flags.contains(LwPolylineFlags::CLOSED | LwPolylineFlags::HAS_BULGES));
        assert!(flags.contains(LwPolylineFlags::HAS_ELEVATION));
        assert!(!flags.contains(LwPolylineFlags::HAS_WIDTHS));
        assert!(!flags.contains(LwPolylineFlags::HAS_VERTEX_IDS));
        assert!(pl.storage_flags(true).contains(LwPolylineFlags::HAS_VERTEX_IDS));
    }

    #[test]
    fn test_insert_attributes() {
        let mut insert = Insert::default();
        assert!(!insert.has_attributes());
        insert.attributes.push(ObjectRef::NULL);
        assert!(insert.has_attributes());
    }
}
