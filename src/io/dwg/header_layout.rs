//! Positional layout of the `AcDb:Header` body.
//!
//! The header section carries no names: every variable sits at a fixed
//! position whose presence depends on the revision. [`HEADER_FIELDS`] lists
//! them in file order with the stream type of each one, so the reader and
//! the writer walk the same table and map positions to names.

use crate::header::HeaderValue;
use crate::types::{Color, DwgVersion, Handle, ObjectRef, Vector2, Vector3};

/// Stream type of one header variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// B
    Bit,
    /// BS
    BitShort,
    /// RC, kept as a short
    RawChar,
    /// BL
    BitLong,
    /// BLL
    BitLongLong,
    /// BD
    BitDouble,
    /// 2RD
    Point2,
    /// 3BD
    Point3,
    /// TV
    Text,
    /// H, in the handle stream from R2007
    Handle,
    /// H holding the next free handle; always in the main stream
    HandleSeed,
    /// CMC
    Color,
    /// Two BL: days and milliseconds
    Time,
}

/// One positional header variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    pub kind: VariableKind,
    /// First revision carrying the variable
    pub since: DwgVersion,
    /// Last revision carrying the variable
    pub until: DwgVersion,
    /// Present only when the named short variable holds the value
    pub requires: Option<(&'static str, i16)>,
}

impl HeaderField {
    pub fn applies_to(&self, version: DwgVersion) -> bool {
        self.since <= version && version <= self.until
    }

    /// Value written when the document does not carry the variable.
    pub fn default_value(&self) -> HeaderValue {
        if let Some(value) = named_default(self.name) {
            return value;
        }
        match self.kind {
            VariableKind::Bit => HeaderValue::Bool(false),
            VariableKind::BitShort | VariableKind::RawChar => HeaderValue::Short(0),
            VariableKind::BitLong => HeaderValue::Long(0),
            VariableKind::BitLongLong | VariableKind::HandleSeed => HeaderValue::LongLong(0),
            VariableKind::BitDouble => HeaderValue::Double(0.0),
            VariableKind::Point2 => HeaderValue::Point2(Vector2::ZERO),
            VariableKind::Point3 => HeaderValue::Point3(Vector3::ZERO),
            VariableKind::Text => HeaderValue::Text(String::new()),
            VariableKind::Handle => HeaderValue::Handle(ObjectRef::hard_pointer(Handle::NULL)),
            VariableKind::Color => HeaderValue::Color(Color::ByLayer),
            VariableKind::Time => HeaderValue::Time {
                days: 0,
                milliseconds: 0,
            },
        }
    }

    /// `value` in the shape this field stores, or `None` when it cannot be.
    ///
    /// Integers widen or narrow between the short and long kinds when they fit.
    pub fn coerce(&self, value: &HeaderValue) -> Option<HeaderValue> {
        let coerced = match (self.kind, value) {
            (VariableKind::Bit, v) => HeaderValue::Bool(v.as_i32()? != 0),
            (VariableKind::BitShort, v) => HeaderValue::Short(i16::try_from(v.as_i32()?).ok()?),
            (VariableKind::RawChar, v) => {
                let byte = u8::try_from(v.as_i32()?).ok()?;
                HeaderValue::Short(byte as i16)
            }
            (VariableKind::BitLong, v) => HeaderValue::Long(v.as_i32()?),
            (VariableKind::BitLongLong | VariableKind::HandleSeed, HeaderValue::LongLong(v)) => {
                HeaderValue::LongLong(*v)
            }
            (VariableKind::BitDouble, v) => HeaderValue::Double(v.as_f64()?),
            (VariableKind::Point2, HeaderValue::Point2(_))
            | (VariableKind::Point3, HeaderValue::Point3(_))
            | (VariableKind::Text, HeaderValue::Text(_))
            | (VariableKind::Handle, HeaderValue::Handle(_))
            | (VariableKind::Color, HeaderValue::Color(_))
            | (VariableKind::Time, HeaderValue::Time { .. }) => value.clone(),
            _ => return None,
        };
        Some(coerced)
    }
}

fn named_default(name: &str) -> Option<HeaderValue> {
    use HeaderValue::{Bool, Color as C, Double, Long, Point2, Point3, Short, Text};
    let value = match name {
        "UNKNOWN_BD1" => Double(412_148_564_080.0),
        "UNKNOWN_BD2" | "UNKNOWN_BD3" | "UNKNOWN_BD4" => Double(1.0),
        "UNKNOWN_BL1" => Long(24),
        "UNKNOWN_TRAILER1" | "UNKNOWN_TRAILER2" | "UNKNOWN_TRAILER3" | "UNKNOWN_TRAILER4" => {
            Short(-1)
        }
        "REGENMODE" | "FILLMODE" | "LIMCHECK" | "PLIMCHECK" | "ATTREQ" | "ATTDIA" | "DIMASO"
        | "DIMSHO" | "WORLDVIEW" | "TILEMODE" | "DIMTIH" | "DIMTOH" => Bool(true),
        "DRAGMODE" | "ATTMODE" | "TSTACKALIGN" | "PROXYGRAPHICS" => Short(1),
        "TREEDEPTH" => Short(3020),
        "LUNITS" => Short(2),
        "LUPREC" | "DIMDEC" | "DIMTDEC" | "DIMADEC" => Short(4),
        "DIMALTD" | "DIMALTTD" | "DIMALTU" | "DIMLUNIT" => Short(2),
        "OSMODE" => Short(37),
        "SPLINESEGS" => Short(8),
        "SURFU" | "SURFV" | "SURFTYPE" | "SURFTAB1" | "SURFTAB2" | "SPLINETYPE" => Short(6),
        "SHADEDGE" => Short(3),
        "SHADEDIF" | "TSTACKSIZE" => Short(70),
        "MAXACTVP" => Short(64),
        "ISOLINES" => Short(4),
        "TEXTQLTY" => Short(50),
        "DIMDSEP" => Short(b'.' as i16),
        "DIMATFIT" | "DIMFIT" => Short(3),
        "DIMLWD" | "DIMLWE" => Short(-2),
        "DIMASSOC" => Short(2),
        "OBSCUREDCOLOR" | "INTERSECTIONCOLOR" => Short(257),
        "LTSCALE" | "CELTSCALE" | "CMLSCALE" | "DIMSCALE" | "DIMLFAC" | "DIMTFAC" | "PSVPSCALE"
        | "LOFTMAG1" | "LOFTMAG2" => Double(1.0),
        "TEXTSIZE" => Double(0.2),
        "TRACEWID" => Double(0.05),
        "SKETCHINC" => Double(0.1),
        "FILLETRAD" => Double(0.5),
        "CHAMFERA" | "CHAMFERB" | "CHAMFERC" => Double(0.5),
        "FACETRES" => Double(0.5),
        "DIMASZ" | "DIMEXE" | "DIMTXT" => Double(0.18),
        "DIMEXO" => Double(0.0625),
        "DIMDLI" => Double(0.38),
        "DIMCEN" | "DIMGAP" => Double(0.09),
        "DIMALTF" => Double(25.4),
        "DIMJOGANG" => Double(std::f64::consts::FRAC_PI_4),
        "STEPSPERSEC" => Double(2.0),
        "STEPSIZE" => Double(6.0),
        "3DDWFPREC" => Double(2.0),
        "LENSLENGTH" => Double(50.0),
        "PSOLHEIGHT" => Double(80.0),
        "PSOLWIDTH" => Double(5.0),
        "LOFTANG1" | "LOFTANG2" => Double(std::f64::consts::FRAC_PI_2),
        "LIMMAX" | "PLIMMAX" => Point2(Vector2::new(12.0, 9.0)),
        "UCSXDIR" | "PUCSXDIR" => Point3(Vector3::UNIT_X),
        "UCSYDIR" | "PUCSYDIR" => Point3(Vector3::UNIT_Y),
        "MENU" => Text("acad".into()),
        "DIMCLRD" | "DIMCLRE" | "DIMCLRT" | "DIMTFILLCLR" => C(Color::ByBlock),
        "FLAGS" => Long(0x2A1F),
        _ => return None,
    };
    Some(value)
}

const fn field(
    since: DwgVersion,
    until: DwgVersion,
    name: &'static str,
    kind: VariableKind,
) -> HeaderField {
    HeaderField {
        name,
        kind,
        since,
        until,
        requires: None,
    }
}

const fn all(name: &'static str, kind: VariableKind) -> HeaderField {
    field(R13, R2018, name, kind)
}

const fn since(version: DwgVersion, name: &'static str, kind: VariableKind) -> HeaderField {
    field(version, R2018, name, kind)
}

const fn r13_14(name: &'static str, kind: VariableKind) -> HeaderField {
    field(R13, R14, name, kind)
}

const R13: DwgVersion = DwgVersion::AC1012;
const R14: DwgVersion = DwgVersion::AC1014;
const R2000: DwgVersion = DwgVersion::AC1015;
const R2004: DwgVersion = DwgVersion::AC1018;
const R2007: DwgVersion = DwgVersion::AC1021;
const R2010: DwgVersion = DwgVersion::AC1024;
const R2013: DwgVersion = DwgVersion::AC1027;
const R2018: DwgVersion = DwgVersion::AC1032;

use VariableKind::{
    Bit as B, BitDouble as BD, BitLong as BL, BitLongLong as BLL, BitShort as BS, Color as CMC,
    Handle as H, HandleSeed as SEED, Point2 as RD2, Point3 as BD3, RawChar as RC, Text as TV,
    Time as TIME,
};

/// Every header variable in file order.
pub static HEADER_FIELDS: &[HeaderField] = &[
    since(R2013, "REQUIREDVERSIONS", BLL),
    all("UNKNOWN_BD1", BD),
    all("UNKNOWN_BD2", BD),
    all("UNKNOWN_BD3", BD),
    all("UNKNOWN_BD4", BD),
    all("UNKNOWN_TV1", TV),
    all("UNKNOWN_TV2", TV),
    all("UNKNOWN_TV3", TV),
    all("UNKNOWN_TV4", TV),
    all("UNKNOWN_BL1", BL),
    all("UNKNOWN_BL2", BL),
    r13_14("UNKNOWN_BS1", BS),
    field(R13, R2000, "CURRENT_VIEWPORT_ENTITY_HEADER", H),
    all("DIMASO", B),
    all("DIMSHO", B),
    r13_14("DIMSAV", B),
    all("PLINEGEN", B),
    all("ORTHOMODE", B),
    all("REGENMODE", B),
    all("FILLMODE", B),
    all("QTEXTMODE", B),
    all("PSLTSCALE", B),
    all("LIMCHECK", B),
    r13_14("BLIPMODE", B),
    since(R2004, "UNKNOWN_B1", B),
    all("USRTIMER", B),
    all("SKPOLY", B),
    all("ANGDIR", B),
    all("SPLFRAME", B),
    r13_14("ATTREQ", B),
    r13_14("ATTDIA", B),
    all("MIRRTEXT", B),
    all("WORLDVIEW", B),
    r13_14("WIREFRAME", B),
    all("TILEMODE", B),
    all("PLIMCHECK", B),
    all("VISRETAIN", B),
    r13_14("DELOBJ", B),
    all("DISPSILH", B),
    all("PELLIPSE", B),
    all("PROXYGRAPHICS", BS),
    r13_14("DRAGMODE", BS),
    all("TREEDEPTH", BS),
    all("LUNITS", BS),
    all("LUPREC", BS),
    all("AUNITS", BS),
    all("AUPREC", BS),
    r13_14("OSMODE", BS),
    all("ATTMODE", BS),
    r13_14("COORDS", BS),
    all("PDMODE", BS),
    r13_14("PICKSTYLE", BS),
    since(R2004, "UNKNOWN_BL3", BL),
    since(R2004, "UNKNOWN_BL4", BL),
    since(R2004, "UNKNOWN_BL5", BL),
    all("USERI1", BS),
    all("USERI2", BS),
    all("USERI3", BS),
    all("USERI4", BS),
    all("USERI5", BS),
    all("SPLINESEGS", BS),
    all("SURFU", BS),
    all("SURFV", BS),
    all("SURFTYPE", BS),
    all("SURFTAB1", BS),
    all("SURFTAB2", BS),
    all("SPLINETYPE", BS),
    all("SHADEDGE", BS),
    all("SHADEDIF", BS),
    all("UNITMODE", BS),
    all("MAXACTVP", BS),
    all("ISOLINES", BS),
    all("CMLJUST", BS),
    all("TEXTQLTY", BS),
    all("LTSCALE", BD),
    all("TEXTSIZE", BD),
    all("TRACEWID", BD),
    all("SKETCHINC", BD),
    all("FILLETRAD", BD),
    all("THICKNESS", BD),
    all("ANGBASE", BD),
    all("PDSIZE", BD),
    all("PLINEWID", BD),
    all("USERR1", BD),
    all("USERR2", BD),
    all("USERR3", BD),
    all("USERR4", BD),
    all("USERR5", BD),
    all("CHAMFERA", BD),
    all("CHAMFERB", BD),
    all("CHAMFERC", BD),
    all("CHAMFERD", BD),
    all("FACETRES", BD),
    all("CMLSCALE", BD),
    all("CELTSCALE", BD),
    all("MENU", TV),
    all("TDCREATE", TIME),
    all("TDUPDATE", TIME),
    since(R2004, "UNKNOWN_BL6", BL),
    since(R2004, "UNKNOWN_BL7", BL),
    since(R2004, "UNKNOWN_BL8", BL),
    all("TDINDWG", TIME),
    all("TDUSRTIMER", TIME),
    all("CECOLOR", CMC),
    all("HANDSEED", SEED),
    all("CLAYER", H),
    all("TEXTSTYLE", H),
    all("CELTYPE", H),
    since(R2007, "CMATERIAL", H),
    all("DIMSTYLE", H),
    all("CMLSTYLE", H),
    since(R2000, "PSVPSCALE", BD),
    all("PINSBASE", BD3),
    all("PEXTMIN", BD3),
    all("PEXTMAX", BD3),
    all("PLIMMIN", RD2),
    all("PLIMMAX", RD2),
    all("PELEVATION", BD),
    all("PUCSORG", BD3),
    all("PUCSXDIR", BD3),
    all("PUCSYDIR", BD3),
    all("PUCSNAME", H),
    since(R2000, "PUCSORTHOREF", H),
    since(R2000, "PUCSORTHOVIEW", BS),
    since(R2000, "PUCSBASE", H),
    since(R2000, "PUCSORGTOP", BD3),
    since(R2000, "PUCSORGBOTTOM", BD3),
    since(R2000, "PUCSORGLEFT", BD3),
    since(R2000, "PUCSORGRIGHT", BD3),
    since(R2000, "PUCSORGFRONT", BD3),
    since(R2000, "PUCSORGBACK", BD3),
    all("INSBASE", BD3),
    all("EXTMIN", BD3),
    all("EXTMAX", BD3),
    all("LIMMIN", RD2),
    all("LIMMAX", RD2),
    all("ELEVATION", BD),
    all("UCSORG", BD3),
    all("UCSXDIR", BD3),
    all("UCSYDIR", BD3),
    all("UCSNAME", H),
    since(R2000, "UCSORTHOREF", H),
    since(R2000, "UCSORTHOVIEW", BS),
    since(R2000, "UCSBASE", H),
    since(R2000, "UCSORGTOP", BD3),
    since(R2000, "UCSORGBOTTOM", BD3),
    since(R2000, "UCSORGLEFT", BD3),
    since(R2000, "UCSORGRIGHT", BD3),
    since(R2000, "UCSORGFRONT", BD3),
    since(R2000, "UCSORGBACK", BD3),
    since(R2000, "DIMPOST", TV),
    since(R2000, "DIMAPOST", TV),
    r13_14("DIMTOL", B),
    r13_14("DIMLIM", B),
    r13_14("DIMTIH", B),
    r13_14("DIMTOH", B),
    r13_14("DIMSE1", B),
    r13_14("DIMSE2", B),
    r13_14("DIMALT", B),
    r13_14("DIMTOFL", B),
    r13_14("DIMSAH", B),
    r13_14("DIMTIX", B),
    r13_14("DIMSOXD", B),
    r13_14("DIMALTD", RC),
    r13_14("DIMZIN", RC),
    r13_14("DIMSD1", B),
    r13_14("DIMSD2", B),
    r13_14("DIMTOLJ", RC),
    r13_14("DIMJUST", RC),
    r13_14("DIMFIT", RC),
    r13_14("DIMUPT", B),
    r13_14("DIMTZIN", RC),
    r13_14("DIMALTZ", RC),
    r13_14("DIMALTTZ", RC),
    r13_14("DIMTAD", RC),
    r13_14("DIMUNIT", BS),
    r13_14("DIMAUNIT", BS),
    r13_14("DIMDEC", BS),
    r13_14("DIMTDEC", BS),
    r13_14("DIMALTU", BS),
    r13_14("DIMALTTD", BS),
    r13_14("DIMTXSTY", H),
    all("DIMSCALE", BD),
    all("DIMASZ", BD),
    all("DIMEXO", BD),
    all("DIMDLI", BD),
    all("DIMEXE", BD),
    all("DIMRND", BD),
    all("DIMDLE", BD),
    all("DIMTP", BD),
    all("DIMTM", BD),
    since(R2007, "DIMFXL", BD),
    since(R2007, "DIMJOGANG", BD),
    since(R2007, "DIMTFILL", BS),
    since(R2007, "DIMTFILLCLR", CMC),
    since(R2000, "DIMTOL", B),
    since(R2000, "DIMLIM", B),
    since(R2000, "DIMTIH", B),
    since(R2000, "DIMTOH", B),
    since(R2000, "DIMSE1", B),
    since(R2000, "DIMSE2", B),
    since(R2000, "DIMTAD", BS),
    since(R2000, "DIMZIN", BS),
    since(R2000, "DIMAZIN", BS),
    since(R2007, "DIMARCSYM", BS),
    all("DIMTXT", BD),
    all("DIMCEN", BD),
    all("DIMTSZ", BD),
    all("DIMALTF", BD),
    all("DIMLFAC", BD),
    all("DIMTVP", BD),
    all("DIMTFAC", BD),
    all("DIMGAP", BD),
    r13_14("DIMPOST", TV),
    r13_14("DIMAPOST", TV),
    r13_14("DIMBLK", TV),
    r13_14("DIMBLK1", TV),
    r13_14("DIMBLK2", TV),
    since(R2000, "DIMALTRND", BD),
    since(R2000, "DIMALT", B),
    since(R2000, "DIMALTD", BS),
    since(R2000, "DIMTOFL", B),
    since(R2000, "DIMSAH", B),
    since(R2000, "DIMTIX", B),
    since(R2000, "DIMSOXD", B),
    all("DIMCLRD", CMC),
    all("DIMCLRE", CMC),
    all("DIMCLRT", CMC),
    since(R2000, "DIMADEC", BS),
    since(R2000, "DIMDEC", BS),
    since(R2000, "DIMTDEC", BS),
    since(R2000, "DIMALTU", BS),
    since(R2000, "DIMALTTD", BS),
    since(R2000, "DIMAUNIT", BS),
    since(R2000, "DIMFRAC", BS),
    since(R2000, "DIMLUNIT", BS),
    since(R2000, "DIMDSEP", BS),
    since(R2000, "DIMTMOVE", BS),
    since(R2000, "DIMJUST", BS),
    since(R2000, "DIMSD1", B),
    since(R2000, "DIMSD2", B),
    since(R2000, "DIMTOLJ", BS),
    since(R2000, "DIMTZIN", BS),
    since(R2000, "DIMALTZ", BS),
    since(R2000, "DIMALTTZ", BS),
    since(R2000, "DIMUPT", B),
    since(R2000, "DIMATFIT", BS),
    since(R2007, "DIMFXLON", B),
    since(R2010, "DIMTXTDIRECTION", B),
    since(R2010, "DIMALTMZF", BD),
    since(R2010, "DIMALTMZS", TV),
    since(R2010, "DIMMZF", BD),
    since(R2010, "DIMMZS", TV),
    since(R2000, "DIMTXSTY", H),
    since(R2000, "DIMLDRBLK", H),
    since(R2000, "DIMBLK", H),
    since(R2000, "DIMBLK1", H),
    since(R2000, "DIMBLK2", H),
    since(R2007, "DIMLTYPE", H),
    since(R2007, "DIMLTEX1", H),
    since(R2007, "DIMLTEX2", H),
    since(R2000, "DIMLWD", BS),
    since(R2000, "DIMLWE", BS),
    all("BLOCK_CONTROL_OBJECT", H),
    all("LAYER_CONTROL_OBJECT", H),
    all("STYLE_CONTROL_OBJECT", H),
    all("LINETYPE_CONTROL_OBJECT", H),
    all("VIEW_CONTROL_OBJECT", H),
    all("UCS_CONTROL_OBJECT", H),
    all("VPORT_CONTROL_OBJECT", H),
    all("APPID_CONTROL_OBJECT", H),
    all("DIMSTYLE_CONTROL_OBJECT", H),
    field(R13, R2000, "VP_ENT_HDR_CONTROL_OBJECT", H),
    all("DICTIONARY_ACAD_GROUP", H),
    all("DICTIONARY_ACAD_MLINESTYLE", H),
    all("DICTIONARY_NAMED_OBJECTS", H),
    since(R2000, "TSTACKALIGN", BS),
    since(R2000, "TSTACKSIZE", BS),
    since(R2000, "HYPERLINKBASE", TV),
    since(R2000, "STYLESHEET", TV),
    since(R2000, "DICTIONARY_LAYOUTS", H),
    since(R2000, "DICTIONARY_PLOTSETTINGS", H),
    since(R2000, "DICTIONARY_PLOTSTYLES", H),
    since(R2004, "DICTIONARY_MATERIALS", H),
    since(R2004, "DICTIONARY_COLORS", H),
    since(R2007, "DICTIONARY_VISUALSTYLE", H),
    since(R2013, "UNKNOWN_H1", H),
    since(R2000, "FLAGS", BL),
    since(R2000, "INSUNITS", BS),
    since(R2000, "CEPSNTYPE", BS),
    HeaderField {
        requires: Some(("CEPSNTYPE", 3)),
        ..since(R2000, "CPSNID", H)
    },
    since(R2000, "FINGERPRINTGUID", TV),
    since(R2000, "VERSIONGUID", TV),
    since(R2004, "SORTENTS", RC),
    since(R2004, "INDEXCTL", RC),
    since(R2004, "HIDETEXT", RC),
    since(R2004, "XCLIPFRAME", RC),
    since(R2004, "DIMASSOC", RC),
    since(R2004, "HALOGAP", RC),
    since(R2004, "OBSCUREDCOLOR", BS),
    since(R2004, "INTERSECTIONCOLOR", BS),
    since(R2004, "OBSCUREDLTYPE", RC),
    since(R2004, "INTERSECTIONDISPLAY", RC),
    since(R2004, "PROJECTNAME", TV),
    all("BLOCK_RECORD_PAPER_SPACE", H),
    all("BLOCK_RECORD_MODEL_SPACE", H),
    all("LTYPE_BYLAYER", H),
    all("LTYPE_BYBLOCK", H),
    all("LTYPE_CONTINUOUS", H),
    since(R2007, "CAMERADISPLAY", B),
    since(R2007, "UNKNOWN_BL9", BL),
    since(R2007, "UNKNOWN_BL10", BL),
    since(R2007, "UNKNOWN_BD5", BD),
    since(R2007, "STEPSPERSEC", BD),
    since(R2007, "STEPSIZE", BD),
    since(R2007, "3DDWFPREC", BD),
    since(R2007, "LENSLENGTH", BD),
    since(R2007, "CAMERAHEIGHT", BD),
    since(R2007, "SOLIDHIST", RC),
    since(R2007, "SHOWHIST", RC),
    since(R2007, "PSOLWIDTH", BD),
    since(R2007, "PSOLHEIGHT", BD),
    since(R2007, "LOFTANG1", BD),
    since(R2007, "LOFTANG2", BD),
    since(R2007, "LOFTMAG1", BD),
    since(R2007, "LOFTMAG2", BD),
    since(R2007, "LOFTPARAM", BS),
    since(R2007, "LOFTNORMALS", RC),
    since(R2007, "LATITUDE", BD),
    since(R2007, "LONGITUDE", BD),
    since(R2007, "NORTHDIRECTION", BD),
    since(R2007, "TIMEZONE", BL),
    since(R2007, "LIGHTGLYPHDISPLAY", RC),
    since(R2007, "TILEMODELIGHTSYNCH", RC),
    since(R2007, "DWFFRAME", RC),
    since(R2007, "DGNFRAME", RC),
    since(R2007, "UNKNOWN_B2", B),
    since(R2007, "INTERFERECOLOR", CMC),
    since(R2007, "INTERFEREOBJVS", H),
    since(R2007, "INTERFEREVPVS", H),
    since(R2007, "DRAGVS", H),
    since(R2007, "CSHADOW", RC),
    since(R2007, "SHADOWPLANELOCATION", BD),
    since(R14, "UNKNOWN_TRAILER1", BS),
    since(R14, "UNKNOWN_TRAILER2", BS),
    since(R14, "UNKNOWN_TRAILER3", BS),
    since(R14, "UNKNOWN_TRAILER4", BS),
];

/// The variables stored at `version`, in file order.
pub fn fields_for(version: DwgVersion) -> impl Iterator<Item = &'static HeaderField> {
    HEADER_FIELDS.iter().filter(move |f| f.applies_to(version))
}

/// Field carrying `name` at `version`.
pub fn lookup(name: &str, version: DwgVersion) -> Option<&'static HeaderField> {
    let name = name.strip_prefix('$').unwrap_or(name);
    fields_for(version).find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_per_revision() {
        for version in DwgVersion::ALL {
            let mut seen = HashSet::new();
            for field in fields_for(version) {
                assert!(seen.insert(field.name), "{version}: {} twice", field.name);
            }
        }
    }

    #[test]
    fn test_revision_dependent_variables() {
        assert!(lookup("DIMSAV", DwgVersion::AC1014).is_some());
        assert!(lookup("DIMSAV", DwgVersion::AC1015).is_none());
        assert_eq!(lookup("DIMBLK", DwgVersion::AC1012).map(|f| f.kind), Some(VariableKind::Text));
        assert_eq!(lookup("DIMBLK", DwgVersion::AC1015).map(|f| f.kind), Some(VariableKind::Handle));
        assert!(lookup("CMATERIAL", DwgVersion::AC1018).is_none());
        assert!(lookup("$CMATERIAL", DwgVersion::AC1021).is_some());
        assert!(lookup("VP_ENT_HDR_CONTROL_OBJECT", DwgVersion::AC1018).is_none());
        assert!(lookup("REQUIREDVERSIONS", DwgVersion::AC1027).is_some());
    }

    #[test]
    fn test_handseed_is_the_only_seed() {
        let seeds: Vec<_> = HEADER_FIELDS
            .iter()
            .filter(|f| f.kind == VariableKind::HandleSeed)
            .map(|f| f.name)
            .collect();
        assert_eq!(seeds, ["HANDSEED"]);
    }

    #[test]
    fn test_coercion() {
        let lunits = lookup("LUNITS", DwgVersion::AC1015).unwrap();
        assert_eq!(lunits.coerce(&HeaderValue::Long(2)), Some(HeaderValue::Short(2)));
        assert_eq!(lunits.coerce(&HeaderValue::Long(70_000)), None);
        assert_eq!(lunits.coerce(&HeaderValue::Text("2".into())), None);

        let ltscale = lookup("LTSCALE", DwgVersion::AC1015).unwrap();
        assert_eq!(ltscale.coerce(&HeaderValue::Short(3)), Some(HeaderValue::Double(3.0)));

        let dimtad = lookup("DIMTAD", DwgVersion::AC1014).unwrap();
        assert_eq!(dimtad.coerce(&HeaderValue::Short(300)), None);
        assert_eq!(dimtad.default_value(), HeaderValue::Short(0));
        assert_eq!(
            lookup("LIMMAX", DwgVersion::AC1032).unwrap().default_value(),
            HeaderValue::Point2(Vector2::new(12.0, 9.0))
        );
    }
}
