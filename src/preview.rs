//! Thumbnail image stored in the `AcDb:Preview` section.

/// Media type of the preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PreviewType {
    Unknown = 0,
    Bmp = 2,
    Wmf = 3,
    Png = 6,
}

impl PreviewType {
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Self::Bmp,
            3 => Self::Wmf,
            6 => Self::Png,
            _ => Self::Unknown,
        }
    }

    /// Entry code written in the preview directory.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Preview header and image bytes, kept as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwgPreview {
    pub code: PreviewType,
    /// Usually 80 zero bytes.
    pub raw_header: Vec<u8>,
    pub raw_image: Vec<u8>,
}

impl Default for DwgPreview {
    fn default() -> Self {
        Self {
            code: PreviewType::Unknown,
            raw_header: Vec::new(),
            raw_image: Vec::new(),
        }
    }
}

impl DwgPreview {
    pub fn new(code: PreviewType, raw_header: Vec<u8>, raw_image: Vec<u8>) -> Self {
        Self {
            code,
            raw_header,
            raw_image,
        }
    }

    /// `true` when there is no image data.
    pub fn is_empty(&self) -> bool {
        self.raw_image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_default() {
        let preview = DwgPreview::default();
        assert_eq!(preview.code, PreviewType::Unknown);
        assert!(preview.is_empty());
    }

    #[test]
    fn test_preview_type_codes() {
        for code in [2, 3, 6] {
            assert_eq!(PreviewType::from_code(code).code(), code);
        }
        assert_eq!(PreviewType::from_code(1), PreviewType::Unknown);
        assert_eq!(PreviewType::from_code(99).code(), 0);
    }
}
