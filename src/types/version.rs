//! DWG format revisions

use std::fmt;

use crate::error::{DwgError, Result};

/// On-disk format revision, identified by the 6-byte tag at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DwgVersion {
    /// R13
    AC1012,
    /// R14
    AC1014,
    /// R2000
    AC1015,
    /// R2004
    AC1018,
    /// R2007
    AC1021,
    /// R2010
    AC1024,
    /// R2013
    AC1027,
    /// R2018
    AC1032,
}

impl DwgVersion {
    pub const ALL: [DwgVersion; 8] = [
        DwgVersion::AC1012,
        DwgVersion::AC1014,
        DwgVersion::AC1015,
        DwgVersion::AC1018,
        DwgVersion::AC1021,
        DwgVersion::AC1024,
        DwgVersion::AC1027,
        DwgVersion::AC1032,
    ];

    /// Parse the 6-byte version tag.
    pub fn from_tag(tag: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(tag)
            .map_err(|_| DwgError::UnsupportedVersion(format!("{tag:02X?}")))?;
        Self::ALL
            .into_iter()
            .find(|v| v.tag() == text)
            .ok_or_else(|| DwgError::UnsupportedVersion(text.to_string()))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            DwgVersion::AC1012 => "AC1012",
            DwgVersion::AC1014 => "AC1014",
            DwgVersion::AC1015 => "AC1015",
            DwgVersion::AC1018 => "AC1018",
            DwgVersion::AC1021 => "AC1021",
            DwgVersion::AC1024 => "AC1024",
            DwgVersion::AC1027 => "AC1027",
            DwgVersion::AC1032 => "AC1032",
        }
    }

    /// Whether files of this revision use the paged section layout.
    pub fn is_paged(&self) -> bool {
        *self >= DwgVersion::AC1018
    }

    /// Whether text is stored as UTF-16 rather than codepage bytes.
    pub fn is_unicode(&self) -> bool {
        *self >= DwgVersion::AC1021
    }

    /// Application version byte written to the file header.
    pub fn app_version(&self) -> u8 {
        match self {
            DwgVersion::AC1012 => 0x13,
            DwgVersion::AC1014 => 0x15,
            DwgVersion::AC1015 => 0x17,
            DwgVersion::AC1018 => 0x19,
            DwgVersion::AC1021 => 0x1B,
            DwgVersion::AC1024 => 0x1D,
            DwgVersion::AC1027 => 0x1F,
            DwgVersion::AC1032 => 0x21,
        }
    }
}

impl fmt::Display for DwgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Version-conditional flags shared by every section reader and writer.
#[derive(Debug, Clone, Copy)]
pub struct VersionFlags {
    pub version: DwgVersion,
    /// R13-R14 only
    pub r13_14_only: bool,
    /// R2000+
    pub r2000_plus: bool,
    /// R2004+
    pub r2004_plus: bool,
    /// R2007+
    pub r2007_plus: bool,
    /// R2010+
    pub r2010_plus: bool,
    /// R2013+
    pub r2013_plus: bool,
}

impl VersionFlags {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            version,
            r13_14_only: version <= DwgVersion::AC1014,
            r2000_plus: version >= DwgVersion::AC1015,
            r2004_plus: version >= DwgVersion::AC1018,
            r2007_plus: version >= DwgVersion::AC1021,
            r2010_plus: version >= DwgVersion::AC1024,
            r2013_plus: version >= DwgVersion::AC1027,
        }
    }
}
