//! Non-graphical object readers: table controls, table entries,
//! dictionaries and the variable classes stored in them.

use super::common::read_table_entry_name;
use crate::error::{DwgError, Result};
use crate::io::dwg::reader::merged_reader::MergedReader;
use crate::objects::{
    BlockControl, BlockHeader, Dictionary, DictionaryEntry, DictionaryVariable,
    DictionaryWithDefault, Layer, LayerControl, LayerFlags, Scale,
};
use crate::types::{DwgVersion, ObjectRef, VersionFlags};

fn read_count(r: &mut MergedReader<'_>, what: &str) -> Result<usize> {
    let count = r.main.read_bit_long()?;
    // Each counted reference takes at least one byte of the handle stream.
    if count < 0 || count as u64 > r.handles.remaining_bits() / 8 {
        return Err(DwgError::Parse(format!("{what} claims {count} entries")));
    }
    Ok(count as usize)
}

/// First and last handle of an implicit chain, as stored before R2004.
fn read_chain_ends(r: &mut MergedReader<'_>) -> Result<Vec<ObjectRef>> {
    let first = r.read_ref()?;
    let last = r.read_ref()?;
    Ok(match (first.is_null(), last.is_null()) {
        (true, true) => Vec::new(),
        _ if first.absolute() == last.absolute() => vec![first],
        _ => vec![first, last],
    })
}

pub(super) fn read_block_control(r: &mut MergedReader<'_>) -> Result<BlockControl> {
    let count = read_count(r, "block control")?;
    Ok(BlockControl {
        entries: r.read_refs(count)?,
        model_space: r.read_ref()?,
        paper_space: r.read_ref()?,
    })
}

pub(super) fn read_layer_control(r: &mut MergedReader<'_>) -> Result<LayerControl> {
    let count = read_count(r, "layer control")?;
    Ok(LayerControl {
        entries: r.read_refs(count)?,
    })
}

pub(super) fn read_block_header(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<BlockHeader> {
    let (name, xref) = read_table_entry_name(r, flags)?;
    let mut header = BlockHeader::new(name);
    header.xref = xref;
    header.anonymous = r.main.read_bit()?;
    header.has_attributes = r.main.read_bit()?;
    header.is_xref = r.main.read_bit()?;
    header.is_overlay = r.main.read_bit()?;
    if flags.r2000_plus {
        header.loaded = r.main.read_bit()?;
    }
    let owned_count = if flags.r2004_plus && header.stores_entities() {
        read_count(r, "block header")?
    } else {
        0
    };
    header.base_point = r.main.read_3bit_double()?;
    header.xref_path = r.read_text()?;

    let mut insert_count = 0usize;
    if flags.r2000_plus {
        // One nonzero byte per INSERT, closed by a zero byte.
        while r.main.read_byte()? != 0 {
            insert_count += 1;
        }
        header.description = r.read_text()?;
        let preview_size = r.main.read_bit_long()?;
        if preview_size < 0 || preview_size as u64 > r.main.remaining_bits() / 8 {
            return Err(DwgError::Parse(format!("block preview of {preview_size} bytes")));
        }
        header.preview = r.main.read_bytes(preview_size as usize)?;
    }
    if flags.r2007_plus {
        header.units = r.main.read_bit_short()?;
        header.explodable = r.main.read_bit()?;
        header.scaling = r.main.read_byte()?;
    }

    header.xref_block = r.read_ref()?;
    header.block_entity = r.read_ref()?;
    if header.stores_entities() {
        header.entities = if flags.r2004_plus {
            r.read_refs(owned_count)?
        } else {
            read_chain_ends(r)?
        };
    }
    header.end_block = r.read_ref()?;
    if flags.r2000_plus {
        header.inserts = r.read_refs(insert_count)?;
        header.layout = r.read_ref()?;
    }
    Ok(header)
}

pub(super) fn read_layer(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Layer> {
    let (name, xref) = read_table_entry_name(r, flags)?;
    let mut layer = Layer::new(name);
    layer.xref = xref;
    if flags.r13_14_only {
        let mut bits = LayerFlags::empty();
        bits.set(LayerFlags::FROZEN, r.main.read_bit()?);
        bits.set(LayerFlags::OFF, !r.main.read_bit()?);
        bits.set(LayerFlags::FROZEN_IN_NEW_VIEWPORTS, r.main.read_bit()?);
        bits.set(LayerFlags::LOCKED, r.main.read_bit()?);
        layer.flags = bits;
    } else {
        layer.unpack_flags(r.main.read_bit_short()?);
    }
    layer.color = r.main.read_cm_color()?;

    layer.xref_block = r.read_ref()?;
    if flags.r2000_plus {
        layer.plotstyle = r.read_ref()?;
    }
    if flags.r2007_plus {
        layer.material = r.read_ref()?;
    }
    layer.linetype = r.read_ref()?;
    Ok(layer)
}

pub(super) fn read_dictionary(r: &mut MergedReader<'_>, flags: &VersionFlags) -> Result<Dictionary> {
    let count = read_count(r, "dictionary")?;
    let mut dict = Dictionary::new();
    if flags.version == DwgVersion::AC1014 {
        dict.r14_flag = r.main.read_byte()?;
    }
    if flags.r2000_plus {
        dict.cloning = r.main.read_bit_short()?;
        dict.hard_owner = r.main.read_byte()?;
    }
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        names.push(r.read_text()?);
    }
    dict.entries.reserve(count);
    for name in names {
        dict.entries.push(DictionaryEntry {
            name,
            item: r.read_ref()?,
        });
    }
    Ok(dict)
}

pub(super) fn read_dictionary_with_default(
    r: &mut MergedReader<'_>,
    flags: &VersionFlags,
) -> Result<DictionaryWithDefault> {
    let dictionary = read_dictionary(r, flags)?;
    Ok(DictionaryWithDefault {
        dictionary,
        default_entry: r.read_ref()?,
    })
}

pub(super) fn read_dictionary_variable(r: &mut MergedReader<'_>) -> Result<DictionaryVariable> {
    Ok(DictionaryVariable {
        schema: r.main.read_byte()?,
        value: r.read_text()?,
    })
}

pub(super) fn read_scale(r: &mut MergedReader<'_>) -> Result<Scale> {
    Ok(Scale {
        unknown: r.main.read_bit_short()?,
        name: r.read_text()?,
        paper_units: r.main.read_bit_double()?,
        drawing_units: r.main.read_bit_double()?,
        is_unit_scale: r.main.read_bit()?,
    })
}
