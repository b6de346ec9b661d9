//! Fixed object type codes.
//!
//! Codes below 500 are built into the format. Codes from 500 up index the
//! class table of the drawing.

/// Built-in type codes that the object reader decodes field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DwgObjectType {
    Text = 0x01,
    Block = 0x04,
    EndBlock = 0x05,
    SeqEnd = 0x06,
    Insert = 0x07,
    Arc = 0x11,
    Circle = 0x12,
    Line = 0x13,
    Point = 0x1B,
    Ellipse = 0x23,
    Ray = 0x28,
    XLine = 0x29,
    Dictionary = 0x2A,
    BlockControl = 0x30,
    BlockHeader = 0x31,
    LayerControl = 0x32,
    Layer = 0x33,
    LwPolyline = 0x4D,
}

impl DwgObjectType {
    /// Map a raw code to a decodable kind.
    pub fn from_code(code: u16) -> Option<Self> {
        use DwgObjectType::*;
        Some(match code {
            0x01 => Text,
            0x04 => Block,
            0x05 => EndBlock,
            0x06 => SeqEnd,
            0x07 => Insert,
            0x11 => Arc,
            0x12 => Circle,
            0x13 => Line,
            0x1B => Point,
            0x23 => Ellipse,
            0x28 => Ray,
            0x29 => XLine,
            0x2A => Dictionary,
            0x30 => BlockControl,
            0x31 => BlockHeader,
            0x32 => LayerControl,
            0x33 => Layer,
            0x4D => LwPolyline,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Proxy entity type code.
pub const PROXY_ENTITY: u16 = 0x1F2;
/// Proxy object type code.
pub const PROXY_OBJECT: u16 = 0x1F3;

/// Whether a built-in code denotes a graphical entity.
///
/// Returns `None` for codes at or above the class range, whose kind comes
/// from the class table.
pub fn is_builtin_entity(code: u16) -> Option<bool> {
    match code {
        0x01..=0x29 => Some(true),
        0x2A => Some(false),
        0x2B..=0x2F => Some(true),
        0x30..=0x4C => Some(false),
        0x4D | 0x4E => Some(true),
        0x4F..=0x1F1 => Some(false),
        PROXY_ENTITY => Some(true),
        PROXY_OBJECT => Some(false),
        0 => Some(false),
        _ => None,
    }
}
