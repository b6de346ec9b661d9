//! Dictionaries and the small objects stored in them

use crate::types::ObjectRef;

/// A named entry of a dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    pub name: String,
    pub item: ObjectRef,
}

/// Dictionary object - maps names to owned or referenced objects
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    /// Duplicate record cloning flag (R2000+)
    pub cloning: i16,
    /// Entries are hard-owned (R2000+)
    pub hard_owner: u8,
    /// Unnamed byte stored by R14 only
    pub r14_flag: u8,
    pub entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            cloning: 1,
            hard_owner: 0,
            r14_flag: 0,
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, item: ObjectRef) {
        self.entries.push(DictionaryEntry {
            name: name.into(),
            item,
        });
    }

    /// Look up an entry by name (case-insensitive, as the format compares keys).
    pub fn get(&self, name: &str) -> Option<&ObjectRef> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| &e.item)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Dictionary that falls back to a default entry (ACDBDICTIONARYWDFLT).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DictionaryWithDefault {
    pub dictionary: Dictionary,
    pub default_entry: ObjectRef,
}

/// A named system variable stored as a dictionary entry (DICTIONARYVAR).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DictionaryVariable {
    pub schema: u8,
    pub value: String,
}

/// An annotation scale (SCALE).
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    /// Unnamed BS preceding the name; 0 in every known file
    pub unknown: i16,
    pub name: String,
    pub paper_units: f64,
    pub drawing_units: f64,
    pub is_unit_scale: bool,
}

impl Scale {
    pub fn new(name: impl Into<String>, paper_units: f64, drawing_units: f64) -> Self {
        Self {
            unknown: 0,
            name: name.into(),
            paper_units,
            drawing_units,
            is_unit_scale: paper_units == drawing_units,
        }
    }

    /// Paper units per drawing unit.
    pub fn factor(&self) -> f64 {
        if self.drawing_units == 0.0 {
            0.0
        } else {
            self.paper_units / self.drawing_units
        }
    }
}
