//! Table, dictionary and variable-class object writers.

use super::common::{to_count, write_table_entry_name};
use crate::error::Result;
use crate::io::dwg::writer::merged_writer::MergedWriter;
use crate::objects::{
    BlockControl, BlockHeader, Dictionary, DictionaryVariable, DictionaryWithDefault, Layer,
    LayerControl, LayerFlags, Scale,
};
use crate::types::{DwgVersion, ObjectRef, VersionFlags};

pub(super) fn write_block_control(w: &mut MergedWriter, control: &BlockControl) -> Result<()> {
    w.main.write_bit_long(to_count(control.entries.len())?);
    w.write_refs(&control.entries);
    w.write_ref(&control.model_space);
    w.write_ref(&control.paper_space);
    Ok(())
}

pub(super) fn write_layer_control(w: &mut MergedWriter, control: &LayerControl) -> Result<()> {
    w.main.write_bit_long(to_count(control.entries.len())?);
    w.write_refs(&control.entries);
    Ok(())
}

pub(super) fn write_block_header(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    header: &BlockHeader,
) -> Result<()> {
    write_table_entry_name(w, flags, &header.name, &header.xref)?;
    w.main.write_bit(header.anonymous);
    w.main.write_bit(header.has_attributes);
    w.main.write_bit(header.is_xref);
    w.main.write_bit(header.is_overlay);
    if flags.r2000_plus {
        w.main.write_bit(header.loaded);
    }
    if flags.r2004_plus && header.stores_entities() {
        w.main.write_bit_long(to_count(header.entities.len())?);
    }
    w.main.write_3bit_double(header.base_point);
    w.write_text(&header.xref_path)?;

    if flags.r2000_plus {
        for _ in &header.inserts {
            w.main.write_byte(1);
        }
        w.main.write_byte(0);
        w.write_text(&header.description)?;
        w.main.write_bit_long(to_count(header.preview.len())?);
        w.main.write_bytes(&header.preview);
    }
    if flags.r2007_plus {
        w.main.write_bit_short(header.units);
        w.main.write_bit(header.explodable);
        w.main.write_byte(header.scaling);
    }

    w.write_ref(&header.xref_block);
    w.write_ref(&header.block_entity);
    if header.stores_entities() {
        if flags.r2004_plus {
            w.write_refs(&header.entities);
        } else {
            let first = header.entities.first().unwrap_or(&ObjectRef::NULL);
            let last = header.entities.last().unwrap_or(&ObjectRef::NULL);
            w.write_ref(first);
            w.write_ref(last);
        }
    }
    w.write_ref(&header.end_block);
    if flags.r2000_plus {
        w.write_refs(&header.inserts);
        w.write_ref(&header.layout);
    }
    Ok(())
}

pub(super) fn write_layer(w: &mut MergedWriter, flags: &VersionFlags, layer: &Layer) -> Result<()> {
    write_table_entry_name(w, flags, &layer.name, &layer.xref)?;
    if flags.r13_14_only {
        w.main.write_bit(layer.flags.contains(LayerFlags::FROZEN));
        w.main.write_bit(!layer.flags.contains(LayerFlags::OFF));
        w.main
            .write_bit(layer.flags.contains(LayerFlags::FROZEN_IN_NEW_VIEWPORTS));
        w.main.write_bit(layer.flags.contains(LayerFlags::LOCKED));
    } else {
        w.main.write_bit_short(layer.packed_flags());
    }
    w.main.write_cm_color(layer.color);

    w.write_ref(&layer.xref_block);
    if flags.r2000_plus {
        w.write_ref(&layer.plotstyle);
    }
    if flags.r2007_plus {
        w.write_ref(&layer.material);
    }
    w.write_ref(&layer.linetype);
    Ok(())
}

pub(super) fn write_dictionary(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    dict: &Dictionary,
) -> Result<()> {
    w.main.write_bit_long(to_count(dict.entries.len())?);
    if flags.version == DwgVersion::AC1014 {
        w.main.write_byte(dict.r14_flag);
    }
    if flags.r2000_plus {
        w.main.write_bit_short(dict.cloning);
        w.main.write_byte(dict.hard_owner);
    }
    for entry in &dict.entries {
        w.write_text(&entry.name)?;
    }
    w.write_refs(dict.entries.iter().map(|e| &e.item));
    Ok(())
}

pub(super) fn write_dictionary_with_default(
    w: &mut MergedWriter,
    flags: &VersionFlags,
    dict: &DictionaryWithDefault,
) -> Result<()> {
    write_dictionary(w, flags, &dict.dictionary)?;
    w.write_ref(&dict.default_entry);
    Ok(())
}

pub(super) fn write_dictionary_variable(w: &mut MergedWriter, var: &DictionaryVariable) -> Result<()> {
    w.main.write_byte(var.schema);
    w.write_text(&var.value)
}

pub(super) fn write_scale(w: &mut MergedWriter, scale: &Scale) -> Result<()> {
    w.main.write_bit_short(scale.unknown);
    w.write_text(&scale.name)?;
    w.main.write_bit_double(scale.paper_units);
    w.main.write_bit_double(scale.drawing_units);
    w.main.write_bit(scale.is_unit_scale);
    Ok(())
}
