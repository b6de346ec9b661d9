//! Common entity/object data readers.
//!
//! Every record starts with the same block of fields: handle, extended data,
//! then either the entity header (mode, reactors, display properties) or the
//! shorter non-entity header. Main-stream fields and handle-stream references
//! are consumed in step, so each reference is read right after the flag that
//! announces it.

use crate::error::{DwgError, Result};
use crate::io::dwg::reader::merged_reader::MergedReader;
use crate::objects::{EntityHeader, ExtendedData, XrefInfo};
use crate::types::{Handle, ObjectRef, VersionFlags};

/// Fields shared by every record.
#[derive(Debug, Clone)]
pub(super) struct CommonData {
    pub handle: Handle,
    pub owner: ObjectRef,
    pub reactors: Vec<ObjectRef>,
    pub xdictionary: Option<ObjectRef>,
    pub eed: Vec<ExtendedData>,
    pub entity: Option<EntityHeader>,
}

/// Read the common block of a record.
///
/// `end_bit` is the end of the main data when the revision stores it before
/// the handle (R2000+); R13/R14 store it inside the common block, and it is
/// filled in here. The handle stream is positioned once it is known.
pub(super) fn read_common(
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
    is_entity: bool,
    end_bit: &mut Option<u64>,
) -> Result<CommonData> {
    let handle = r.main.read_handle()?.absolute(Handle::NULL);
    r.owner = handle;
    let eed = read_extended_data(r)?;

    let graphics = if is_entity { read_graphics(r, flags)? } else { None };

    if flags.r13_14_only {
        let bits = r.main.read_raw_long()? as u32 as u64;
        *end_bit = Some(bits);
    }
    let end = end_bit.ok_or_else(|| DwgError::Parse("record has no end of main data".into()))?;
    r.handles.set_position_in_bits(end)?;

    if is_entity {
        read_entity_header(r, flags, handle, eed, graphics)
    } else {
        read_object_header(r, flags, handle, eed)
    }
}

fn read_extended_data(r: &mut MergedReader<'_>) -> Result<Vec<ExtendedData>> {
    let mut eed = Vec::new();
    loop {
        let size = r.main.read_bit_short()?;
        if size == 0 {
            break;
        }
        if size < 0 {
            return Err(DwgError::Parse(format!("extended data record of {size} bytes")));
        }
        let application = ObjectRef::from_raw(r.main.read_handle()?, r.owner);
        let data = r.main.read_bytes(size as usize)?;
        eed.push(ExtendedData { application, data });
    }
    Ok(eed)
}

fn read_graphics(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Option<Vec<u8>>> {
    if !r.main.read_bit()? {
        return Ok(None);
    }
    let size = if flags.r2010_plus {
        r.main.read_bit_long_long()?
    } else {
        r.main.read_raw_long()? as u32 as u64
    };
    if size > r.main.remaining_bits() / 8 {
        return Err(DwgError::Parse(format!("graphics of {size} bytes overrun the record")));
    }
    Ok(Some(r.main.read_bytes(size as usize)?))
}

fn read_reactors(r: &mut MergedReader<'_>) -> Result<Vec<ObjectRef>> {
    let count = r.main.read_bit_long()?;
    // Each reference takes at least one byte of the handle stream.
    if count < 0 || count as u64 > r.handles.remaining_bits() / 8 {
        return Err(DwgError::Parse(format!("record claims {count} reactors")));
    }
    r.read_refs(count as usize)
}

fn present(reference: ObjectRef) -> Option<ObjectRef> {
    (!reference.is_null()).then_some(reference)
}

fn read_object_header(
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
    handle: Handle,
    eed: Vec<ExtendedData>,
) -> Result<CommonData> {
    let owner = r.read_ref()?;
    let reactors = read_reactors(r)?;
    let xdic_missing = flags.r2004_plus && r.main.read_bit()?;
    if flags.r2013_plus {
        r.main.read_bit()?;
    }
    let xdictionary = if xdic_missing { None } else { present(r.read_ref()?) };

    Ok(CommonData {
        handle,
        owner,
        reactors,
        xdictionary,
        eed,
        entity: None,
    })
}

fn read_entity_header(
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
    handle: Handle,
    eed: Vec<ExtendedData>,
    graphics: Option<Vec<u8>>,
) -> Result<CommonData> {
    let mut header = EntityHeader::on_layer(Handle::NULL);
    header.graphics = graphics;

    header.mode = r.main.read_2bits()?;
    let owner = if header.mode == 0 { r.read_ref()? } else { ObjectRef::NULL };
    let reactors = read_reactors(r)?;

    let xdic_missing = flags.r2004_plus && r.main.read_bit()?;
    if flags.r2013_plus {
        r.main.read_bit()?;
    }
    let xdictionary = if xdic_missing { None } else { present(r.read_ref()?) };

    if flags.r13_14_only {
        let by_layer_linetype = r.main.read_bit()?;
        header.layer = r.read_ref()?;
        if !by_layer_linetype {
            header.linetype = Some(r.read_ref()?);
            header.linetype_flags = 3;
        }
    }

    if !flags.r2004_plus {
        let no_links = r.main.read_bit()?;
        if !no_links {
            let prev = r.read_ref()?;
            let next = r.read_ref()?;
            header.links = Some((prev, next));
        }
    }

    header.color = r.main.read_en_color()?;
    if flags.r2004_plus && header.color.has_book_color {
        header.color_book = Some(r.read_ref()?);
    }
    header.linetype_scale = r.main.read_bit_double()?;

    if flags.r2000_plus {
        header.layer = r.read_ref()?;
        header.linetype_flags = r.main.read_2bits()?;
        if header.linetype_flags == 3 {
            header.linetype = Some(r.read_ref()?);
        }
        header.plotstyle_flags = r.main.read_2bits()?;
        if header.plotstyle_flags == 3 {
            header.plotstyle = Some(r.read_ref()?);
        }
        if flags.r2007_plus {
            header.material_flags = r.main.read_2bits()?;
            if header.material_flags == 3 {
                header.material = Some(r.read_ref()?);
            }
            header.shadow_flags = r.main.read_byte()?;
        }
        if flags.r2010_plus {
            let present_bits = [r.main.read_bit()?, r.main.read_bit()?, r.main.read_bit()?];
            for (slot, has) in header.visual_styles.iter_mut().zip(present_bits) {
                if has {
                    *slot = Some(r.read_ref()?);
                }
            }
        }
    }

    header.invisibility = r.main.read_bit_short()?;
    if flags.r2000_plus {
        header.lineweight = r.main.read_byte()?;
    }

    Ok(CommonData {
        handle,
        owner,
        reactors,
        xdictionary,
        eed,
        entity: Some(header),
    })
}

/// Name and external reference bits of a table entry.
///
/// The xref block handle is the first reference of the entry.
pub(super) fn read_table_entry_name(
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
) -> Result<(String, XrefInfo)> {
    let name = r.read_text()?;
    let mut xref = XrefInfo::default();
    if flags.r2007_plus {
        let bits = r.main.read_bit_short()? as u16;
        xref.dependent = bits & 0x100 != 0;
        xref.xref_index = (bits & 0xFF) as i16;
    } else {
        xref.referenced = r.main.read_bit()?;
        xref.xref_index = r.main.read_bit_short()?.wrapping_sub(1);
        xref.dependent = r.main.read_bit()?;
    }
    Ok((name, xref))
}
