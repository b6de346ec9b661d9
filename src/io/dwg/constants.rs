//! Sentinels, section names and magic numbers of the DWG layouts.

/// Names of the logical sections.
pub mod section_names {
    /// Header variables
    pub const HEADER: &str = "AcDb:Header";
    /// Class table
    pub const CLASSES: &str = "AcDb:Classes";
    /// Object map (handle to offset)
    pub const HANDLES: &str = "AcDb:Handles";
    /// Object records
    pub const OBJECTS: &str = "AcDb:AcDbObjects";
    /// Thumbnail image
    pub const PREVIEW: &str = "AcDb:Preview";
    /// Free space statistics (pre-2004 record 3)
    pub const OBJ_FREE_SPACE: &str = "AcDb:ObjFreeSpace";
    /// Measurement variable (pre-2004 record 4)
    pub const TEMPLATE: &str = "AcDb:Template";
    /// Auxiliary header (pre-2004 record 5)
    pub const AUX_HEADER: &str = "AcDb:AuxHeader";

    /// Sections every file must provide.
    pub const MANDATORY: [&str; 2] = [HANDLES, OBJECTS];

    /// Sections decoded into the document; every other section is kept raw.
    pub const DECODED: [&str; 5] = [HEADER, CLASSES, HANDLES, OBJECTS, PREVIEW];

    /// Record number of a section in the pre-2004 locator table.
    pub fn locator_number(name: &str) -> Option<u8> {
        match name {
            HEADER => Some(0),
            CLASSES => Some(1),
            HANDLES => Some(2),
            OBJ_FREE_SPACE => Some(3),
            TEMPLATE => Some(4),
            AUX_HEADER => Some(5),
            _ => None,
        }
    }

    /// Section stored under a pre-2004 locator record.
    pub fn locator_name(number: u8) -> Option<&'static str> {
        [HEADER, CLASSES, HANDLES, OBJ_FREE_SPACE, TEMPLATE, AUX_HEADER]
            .get(number as usize)
            .copied()
    }

    /// Fixed section id used in the paged section map.
    pub fn paged_section_id(name: &str) -> Option<u32> {
        match name {
            HEADER => Some(1),
            CLASSES => Some(2),
            HANDLES => Some(3),
            OBJECTS => Some(4),
            PREVIEW => Some(5),
            OBJ_FREE_SPACE => Some(6),
            TEMPLATE => Some(7),
            AUX_HEADER => Some(8),
            _ => None,
        }
    }

    /// First id handed to sections without a fixed one.
    pub const FIRST_FREE_SECTION_ID: u32 = 16;
}

/// 16-byte markers around sections.
pub mod sentinels {
    pub const HEADER_START: [u8; 16] = [
        0xCF, 0x7B, 0x1F, 0x23, 0xFD, 0xDE, 0x38, 0xA9, 0x5F, 0x7C, 0x68, 0xB8, 0x4E, 0x6D,
        0x33, 0x5F,
    ];
    pub const HEADER_END: [u8; 16] = [
        0x30, 0x84, 0xE0, 0xDC, 0x02, 0x21, 0xC7, 0x56, 0xA0, 0x83, 0x97, 0x47, 0xB1, 0x92,
        0xCC, 0xA0,
    ];
    pub const CLASSES_START: [u8; 16] = [
        0x8D, 0xA1, 0xC4, 0xB8, 0xC4, 0xA9, 0xF8, 0xC5, 0xC0, 0xDC, 0xF4, 0x5F, 0xE7, 0xCF,
        0xB6, 0x8A,
    ];
    pub const CLASSES_END: [u8; 16] = [
        0x72, 0x5E, 0x3B, 0x47, 0x3B, 0x56, 0x07, 0x3A, 0x3F, 0x23, 0x0B, 0xA0, 0x18, 0x30,
        0x49, 0x75,
    ];
    pub const PREVIEW_START: [u8; 16] = [
        0x1F, 0x25, 0x6D, 0x07, 0xD4, 0x36, 0x28, 0x28, 0x9D, 0x57, 0xCA, 0x3F, 0x9D, 0x44,
        0x10, 0x2B,
    ];
    pub const PREVIEW_END: [u8; 16] = [
        0xE0, 0xDA, 0x92, 0xF8, 0x2B, 0xC9, 0xD7, 0xD7, 0x62, 0xA8, 0x35, 0xC0, 0x62, 0xBB,
        0xEF, 0xD4,
    ];
    pub const SECOND_HEADER_START: [u8; 16] = [
        0xD4, 0x7B, 0x21, 0xCE, 0x28, 0x93, 0x9F, 0xBF, 0x53, 0x24, 0x40, 0x09, 0x12, 0x3C,
        0xAA, 0x01,
    ];
    pub const SECOND_HEADER_END: [u8; 16] = [
        0x2B, 0x84, 0xDE, 0x31, 0xD7, 0x6C, 0x60, 0x40, 0xAC, 0xDB, 0xBF, 0xF6, 0xED, 0xC3,
        0x55, 0xFE,
    ];
    /// Closes the pre-2004 file header.
    pub const FILE_HEADER_END: [u8; 16] = [
        0x95, 0xA0, 0x4E, 0x28, 0x99, 0x82, 0x1A, 0xE5, 0x5E, 0x41, 0xE0, 0x5F, 0x9D, 0x3A,
        0x4D, 0x00,
    ];

    /// Start and end markers of a sentinel-framed section.
    pub fn pair(section_name: &str) -> Option<(&'static [u8; 16], &'static [u8; 16])> {
        match section_name {
            super::section_names::HEADER => Some((&HEADER_START, &HEADER_END)),
            super::section_names::CLASSES => Some((&CLASSES_START, &CLASSES_END)),
            _ => None,
        }
    }
}

/// Pre-2004 layout.
pub mod flat {
    /// Offset of the code page field.
    pub const CODE_PAGE_OFFSET: usize = 0x13;
    /// Offset of the locator record count.
    pub const RECORD_COUNT_OFFSET: usize = 0x15;
    /// Offset of the first locator record.
    pub const RECORDS_OFFSET: usize = 0x19;
    /// Bytes per locator record (RC number, RL seeker, RL size).
    pub const RECORD_SIZE: usize = 9;
    /// Locator records always written: header, classes, object map.
    pub const MIN_RECORD_COUNT: usize = 3;
    /// Most locator records a file carries.
    pub const MAX_RECORD_COUNT: usize = 6;

    /// Value XORed into the file header CRC, by locator record count.
    pub fn crc_mask(record_count: usize) -> u16 {
        match record_count {
            3 => 0xA598,
            4 => 0x8101,
            5 => 0x3CC4,
            6 => 0x8461,
            _ => 0,
        }
    }
}

/// Paged (R2004+) layout.
pub mod paged {
    /// Bytes before the first page.
    pub const PREAMBLE_SIZE: usize = 0x100;
    /// Offset of the encrypted metadata block.
    pub const METADATA_OFFSET: usize = 0x80;
    /// Size of the encrypted metadata block.
    pub const METADATA_SIZE: usize = 0x6C;
    /// File id at the start of the metadata block.
    pub const FILE_ID: &[u8; 12] = b"AcFssFcAJMB\0";
    /// XOR mask for page headers, combined with the page offset.
    pub const PAGE_HEADER_MASK: u32 = 0x4164_536B;
    /// Largest decompressed payload per data page.
    pub const MAX_PAGE_SIZE: usize = 0x7400;
    /// Data page marker.
    pub const PAGE_TYPE_DATA: u32 = 0x4163_043B;
    /// Page map marker.
    pub const PAGE_TYPE_PAGE_MAP: u32 = 0x4163_0E3B;
    /// Section map marker.
    pub const PAGE_TYPE_SECTION_MAP: u32 = 0x4163_003B;
    /// Payload stored as-is.
    pub const COMPRESSION_NONE: u32 = 1;
    /// Payload compressed with the page codec.
    pub const COMPRESSION_LZ77: u32 = 2;
    /// Section names are stored in a fixed 64-byte field.
    pub const SECTION_NAME_SIZE: usize = 64;
    /// First value of the objects section.
    pub const OBJECTS_MARKER: u32 = 0x0DCA;
}

/// Object map (AcDb:Handles) chunking.
pub mod object_map {
    /// Largest chunk body, excluding the size and CRC fields.
    pub const MAX_CHUNK_SIZE: usize = 2032;
}

/// Type ids at and above this value index the class table.
pub const FIRST_CLASS_NUMBER: u16 = 500;
