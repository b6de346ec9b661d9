//! Common entity/object data writers.
//!
//! The exact inverse of the reader side: handle and extended data in the
//! main stream, then the entity or object header with each reference
//! written to the handle stream right after the flag that announces it.

use crate::error::{DwgError, Result};
use crate::io::dwg::writer::merged_writer::MergedWriter;
use crate::objects::{DwgObject, EntityHeader, XrefInfo};
use crate::types::{HandleRef, ObjectRef, VersionFlags};

/// Write the common block of `object`.
///
/// Returns the position of the R13/R14 end-of-main-data RL, to be patched
/// once the main data is complete.
pub(super) fn write_common(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    object: &DwgObject,
    is_entity: bool,
) -> Result<Option<u64>> {
    w.main
        .write_handle(HandleRef::new(0, object.handle.value()));
    write_extended_data(w, object)?;

    let header = if is_entity {
        let header = object.entity.as_ref().ok_or_else(|| {
            DwgError::Encode(format!("entity {:#X} has no entity header", object.handle))
        })?;
        write_graphics(w, flags, header.graphics.as_deref())?;
        Some(header)
    } else {
        None
    };

    let end_bit_position = if flags.r13_14_only {
        let position = w.main.position_in_bits();
        w.main.write_raw_long(0);
        Some(position)
    } else {
        None
    };

    match header {
        Some(header) => write_entity_header(w, flags, object, header)?,
        None => write_object_header(w, flags, object)?,
    }
    Ok(end_bit_position)
}

fn write_extended_data(w: &mut MergedWriter, object: &DwgObject) -> Result<()> {
    for eed in &object.eed {
        let size = i16::try_from(eed.data.len())
            .ok()
            .filter(|&s| s > 0)
            .ok_or_else(|| {
                DwgError::Encode(format!("extended data record of {} bytes", eed.data.len()))
            })?;
        w.main.write_bit_short(size);
        w.main.write_handle(eed.application.encode_for(w.owner));
        w.main.write_bytes(&eed.data);
    }
    w.main.write_bit_short(0);
    Ok(())
}

fn write_graphics(w: &mut MergedWriter, flags: &VersionFlags, graphics: Option<&[u8]>) -> Result<()> {
    let Some(bytes) = graphics else {
        w.main.write_bit(false);
        return Ok(());
    };
    w.main.write_bit(true);
    if flags.r2010_plus {
        w.main.write_bit_long_long(bytes.len() as u64)?;
    } else {
        let size = i32::try_from(bytes.len())
            .map_err(|_| DwgError::Encode(format!("graphics of {} bytes", bytes.len())))?;
        w.main.write_raw_long(size);
    }
    w.main.write_bytes(bytes);
    Ok(())
}

fn write_reactors(w: &mut MergedWriter, reactors: &[ObjectRef]) -> Result<()> {
    w.main.write_bit_long(to_count(reactors.len())?);
    w.write_refs(reactors);
    Ok(())
}

fn write_xdictionary(w: &mut MergedWriter, flags: &VersionFlags, xdictionary: Option<&ObjectRef>) {
    if flags.r2004_plus {
        w.main.write_bit(xdictionary.is_none());
    }
    if flags.r2013_plus {
        // Binary data flag; never set by this writer.
        w.main.write_bit(false);
    }
    match xdictionary {
        Some(xdic) => w.write_ref(xdic),
        None if !flags.r2004_plus => w.write_ref(&ObjectRef::NULL),
        None => {}
    }
}

fn write_object_header(w: &mut MergedWriter, flags: &VersionFlags, object: &DwgObject) -> Result<()> {
    w.write_ref(&object.owner);
    write_reactors(w, &object.reactors)?;
    write_xdictionary(w, flags, object.xdictionary.as_ref());
    Ok(())
}

fn write_optional(w: &mut MergedWriter, reference: Option<&ObjectRef>) {
    w.write_ref(reference.unwrap_or(&ObjectRef::NULL));
}

fn write_entity_header(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    object: &DwgObject,
    header: &EntityHeader,
) -> Result<()> {
    w.main.write_2bits(header.mode);
    if header.mode == 0 {
        w.write_ref(&object.owner);
    }
    write_reactors(w, &object.reactors)?;
    write_xdictionary(w, flags, object.xdictionary.as_ref());

    if flags.r13_14_only {
        let explicit_linetype = header.linetype_flags == 3;
        w.main.write_bit(!explicit_linetype);
        w.write_ref(&header.layer);
        if explicit_linetype {
            write_optional(w, header.linetype.as_ref());
        }
    }

    if !flags.r2004_plus {
        w.main.write_bit(header.links.is_none());
        if let Some((prev, next)) = header.links.as_ref() {
            w.write_ref(prev);
            w.write_ref(next);
        }
    }

    w.main.write_en_color(&header.color);
    if flags.r2004_plus && header.color.has_book_color {
        write_optional(w, header.color_book.as_ref());
    }
    w.main.write_bit_double(header.linetype_scale);

    if flags.r2000_plus {
        w.write_ref(&header.layer);
        w.main.write_2bits(header.linetype_flags);
        if header.linetype_flags == 3 {
            write_optional(w, header.linetype.as_ref());
        }
        w.main.write_2bits(header.plotstyle_flags);
        if header.plotstyle_flags == 3 {
            write_optional(w, header.plotstyle.as_ref());
        }
        if flags.r2007_plus {
            w.main.write_2bits(header.material_flags);
            if header.material_flags == 3 {
                write_optional(w, header.material.as_ref());
            }
            w.main.write_byte(header.shadow_flags);
        }
        if flags.r2010_plus {
            for style in &header.visual_styles {
                w.main.write_bit(style.is_some());
            }
            for style in header.visual_styles.iter().flatten() {
                w.write_ref(style);
            }
        }
    }

    w.main.write_bit_short(header.invisibility);
    if flags.r2000_plus {
        w.main.write_byte(header.lineweight);
    }
    Ok(())
}

/// Inverse of the reader's table entry name: TV name, then the xref bits.
pub(super) fn write_table_entry_name(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    name: &str,
    xref: &XrefInfo,
) -> Result<()> {
    w.write_text(name)?;
    if flags.r2007_plus {
        let dependent = if xref.dependent { 0x100 } else { 0 };
        w.main
            .write_bit_short((dependent | (xref.xref_index as u16 & 0xFF)) as i16);
    } else {
        w.main.write_bit(xref.referenced);
        w.main.write_bit_short(xref.xref_index.wrapping_add(1));
        w.main.write_bit(xref.dependent);
    }
    Ok(())
}

/// A collection length as a BL.
pub(super) fn to_count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| DwgError::Encode(format!("{len} items exceed a BL count")))
}
