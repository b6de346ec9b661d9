//! Readers over the streams of one object record.
//!
//! From R2007 an object record holds up to three bit streams: the main data,
//! a string stream at the end of the main data, and the handle stream after
//! it. Earlier revisions keep text inline in the main stream.

use super::stream_reader::DwgStreamReader;
use crate::error::Result;
use crate::types::{Handle, HandleRef, ObjectRef};

/// Where text fields are read from.
#[derive(Debug, Clone)]
pub enum TextSource<'a> {
    /// Inline in the main stream (before R2007)
    Inline,
    /// Separate string stream
    Stream(DwgStreamReader<'a>),
    /// R2007+ record without string data; every text field is empty
    Absent,
}

impl<'a> TextSource<'a> {
    /// Text source of a section body.
    ///
    /// From R2007 section bodies start with an RL giving the end of the main
    /// data in bits; the string stream ends there.
    pub fn for_section(main: &mut DwgStreamReader<'a>) -> Result<Self> {
        if !main.version().is_unicode() {
            return Ok(TextSource::Inline);
        }
        let end_bit = main.read_raw_long()? as u32 as u64;
        let mut strings = main.clone();
        Ok(match strings.locate_string_stream(end_bit)? {
            Some(_) => TextSource::Stream(strings),
            None => TextSource::Absent,
        })
    }

    /// TV, from `main` when text is inline.
    pub fn read(&mut self, main: &mut DwgStreamReader<'a>) -> Result<String> {
        match self {
            TextSource::Inline => main.read_variable_text(),
            TextSource::Stream(reader) => reader.read_variable_text(),
            TextSource::Absent => Ok(String::new()),
        }
    }
}

/// Main, text and handle readers of one record.
#[derive(Debug, Clone)]
pub struct MergedReader<'a> {
    pub main: DwgStreamReader<'a>,
    pub text: TextSource<'a>,
    pub handles: DwgStreamReader<'a>,
    /// Handle of the object being read, base for relative references
    pub owner: Handle,
}

impl<'a> MergedReader<'a> {
    pub fn new(
        main: DwgStreamReader<'a>,
        text: TextSource<'a>,
        handles: DwgStreamReader<'a>,
        owner: Handle,
    ) -> Self {
        Self {
            main,
            text,
            handles,
            owner,
        }
    }

    /// TV from the stream that carries text for this revision.
    pub fn read_text(&mut self) -> Result<String> {
        self.text.read(&mut self.main)
    }

    /// Next handle reference from the handle stream.
    pub fn read_ref(&mut self) -> Result<ObjectRef> {
        let raw: HandleRef = self.handles.read_handle()?;
        Ok(ObjectRef::from_raw(raw, self.owner))
    }

    /// `count` handle references.
    pub fn read_refs(&mut self, count: usize) -> Result<Vec<ObjectRef>> {
        let mut refs = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            refs.push(self.read_ref()?);
        }
        Ok(refs)
    }
}
