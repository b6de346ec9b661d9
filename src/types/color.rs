//! Drawing colors

/// A color as stored on entities and layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Use the layer's color (index 256)
    #[default]
    ByLayer,
    /// Use the enclosing block's color (index 0)
    ByBlock,
    /// Color index (1-255)
    Index(u8),
    /// True color
    Rgb { r: u8, g: u8, b: u8 },
}

const METHOD_BY_LAYER: u32 = 0xC0;
const METHOD_BY_BLOCK: u32 = 0xC1;
const METHOD_RGB: u32 = 0xC2;
const METHOD_INDEX: u32 = 0xC3;

impl Color {
    /// Color from an index value; negative indices (layer switched off) keep their magnitude.
    pub fn from_index(index: i16) -> Self {
        match index {
            0 => Color::ByBlock,
            256 => Color::ByLayer,
            1..=255 => Color::Index(index as u8),
            _ if index < 0 => Color::Index(index.unsigned_abs().min(255) as u8),
            _ => Color::Index(7),
        }
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Index value written where only indexed colors are possible.
    pub fn index(&self) -> i16 {
        match self {
            Color::ByBlock => 0,
            Color::ByLayer => 256,
            Color::Index(i) => *i as i16,
            Color::Rgb { .. } => 7,
        }
    }

    /// Packed true-color value: method byte in the top 8 bits, payload below.
    pub fn to_true_color(&self) -> u32 {
        match self {
            Color::ByLayer => METHOD_BY_LAYER << 24,
            Color::ByBlock => METHOD_BY_BLOCK << 24,
            Color::Index(i) => (METHOD_INDEX << 24) | *i as u32,
            Color::Rgb { r, g, b } => {
                (METHOD_RGB << 24) | (*r as u32) << 16 | (*g as u32) << 8 | *b as u32
            }
        }
    }

    /// Inverse of [`Color::to_true_color`]; unknown methods fall back to `index`.
    pub fn from_true_color(value: u32, index: i16) -> Self {
        match value >> 24 {
            METHOD_BY_LAYER => Color::ByLayer,
            METHOD_BY_BLOCK => Color::ByBlock,
            METHOD_INDEX => Color::from_index((value & 0xFF) as i16),
            METHOD_RGB => Color::Rgb {
                r: (value >> 16) as u8,
                g: (value >> 8) as u8,
                b: value as u8,
            },
            _ => Color::from_index(index),
        }
    }
}
