//! The decoded drawing

use tracing::warn;

use crate::classes::{ClassTable, DxfClass};
use crate::header::{HeaderValue, HeaderVariables};
use crate::io::dwg::file_header::SecondFileHeader;
use crate::notification::{NotificationCollection, NotificationType};
use crate::objects::DwgObject;
use crate::preview::DwgPreview;
use crate::resolver::HandleIndex;
use crate::types::{DwgVersion, ObjectRef};

/// Section the codec does not interpret, kept as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// A drawing: header variables, class table and the object array.
///
/// The object array is the only owner of objects. An object's index is its
/// identity within the document; [`ObjectRef`] links are indices into this
/// array, set by [`DwgDocument::resolve_references`].
#[derive(Debug, Clone)]
pub struct DwgDocument {
    version: DwgVersion,
    source_version: DwgVersion,
    /// Maintenance release number from the file header
    pub maintenance_version: u8,
    /// Drawing code page, used for pre-R2007 text
    pub code_page: u16,
    header: HeaderVariables,
    classes: ClassTable,
    objects: Vec<DwgObject>,
    index: HandleIndex,
    dangling: usize,
    notifications: NotificationCollection,
    preview: Option<DwgPreview>,
    retained: Vec<RawSection>,
    second_header: Option<SecondFileHeader>,
}

impl DwgDocument {
    /// Empty drawing of the given revision.
    pub fn new(version: DwgVersion) -> Self {
        Self {
            version,
            source_version: version,
            maintenance_version: 0,
            code_page: 30,
            header: HeaderVariables::new(),
            classes: ClassTable::new(),
            objects: Vec::new(),
            index: HandleIndex::default(),
            dangling: 0,
            notifications: NotificationCollection::new(),
            preview: None,
            retained: Vec::new(),
            second_header: None,
        }
    }

    /// Assemble a decoded drawing and resolve its references.
    pub(crate) fn from_decoded(
        source_version: DwgVersion,
        maintenance_version: u8,
        code_page: u16,
        header: HeaderVariables,
        classes: ClassTable,
        objects: Vec<DwgObject>,
        notifications: NotificationCollection,
    ) -> Self {
        let mut document = Self {
            version: source_version,
            source_version,
            maintenance_version,
            code_page,
            header,
            classes,
            objects,
            index: HandleIndex::default(),
            dangling: 0,
            notifications,
            preview: None,
            retained: Vec::new(),
            second_header: None,
        };
        document.resolve_references();
        document
    }

    /// Revision the document is normalized to.
    pub fn version(&self) -> DwgVersion {
        self.version
    }

    /// Revision the document was read from.
    pub fn source_version(&self) -> DwgVersion {
        self.source_version
    }

    /// Change the revision the document is normalized to.
    pub fn set_version(&mut self, version: DwgVersion) {
        self.version = version;
    }

    /// Append an object and return its index.
    ///
    /// The object's own handle is indexed immediately; its references are
    /// linked by the next [`DwgDocument::resolve_references`].
    pub fn add_object(&mut self, object: DwgObject) -> usize {
        let position = self.objects.len();
        if !self.index.insert(object.handle, position) && !object.handle.is_null() {
            self.notifications.notify(
                NotificationType::Warning,
                format!("Duplicate handle {} at object #{}", object.handle, position),
            );
        }
        self.objects.push(object);
        position
    }

    pub fn objects(&self) -> &[DwgObject] {
        &self.objects
    }

    /// Mutable access to the objects.
    ///
    /// Changing handles or references requires a call to
    /// [`DwgDocument::resolve_references`] afterwards.
    pub fn objects_mut(&mut self) -> &mut [DwgObject] {
        &mut self.objects
    }

    pub fn object(&self, index: usize) -> Option<&DwgObject> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object with the given absolute handle.
    pub fn get_by_handle(&self, handle: u64) -> Option<&DwgObject> {
        self.index.get(handle).and_then(|i| self.objects.get(i))
    }

    /// Target of a reference.
    ///
    /// Uses the resolved link when it still points at the right handle and
    /// falls back to a lookup by handle otherwise.
    pub fn resolve(&self, reference: &ObjectRef) -> Option<&DwgObject> {
        if reference.is_null() {
            return None;
        }
        let wanted = reference.absolute();
        reference
            .target()
            .and_then(|i| self.objects.get(i))
            .filter(|o| o.handle == wanted)
            .or_else(|| self.get_by_handle(wanted.value()))
    }

    pub fn header(&self) -> &HeaderVariables {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderVariables {
        &mut self.header
    }

    /// Header variable by name; a leading `$` is ignored.
    pub fn header_variable(&self, name: &str) -> Option<&HeaderValue> {
        self.header.get(name)
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassTable {
        &mut self.classes
    }

    /// Class table entry for a type code of 500 or more.
    pub fn class_by_type(&self, type_code: u16) -> Option<&DxfClass> {
        self.classes.by_type(type_code)
    }

    /// Thumbnail image, if the drawing has one.
    pub fn preview(&self) -> Option<&DwgPreview> {
        self.preview.as_ref()
    }

    pub fn set_preview(&mut self, preview: Option<DwgPreview>) {
        self.preview = preview;
    }

    /// Sections kept as stored bytes.
    ///
    /// They are written back only when encoding at [`DwgDocument::source_version`].
    pub fn retained_sections(&self) -> &[RawSection] {
        &self.retained
    }

    /// Keep `data` as the section `name`, replacing an earlier copy.
    pub fn retain_section(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.retained.iter_mut().find(|s| s.name == name) {
            Some(section) => section.data = data,
            None => self.retained.push(RawSection { name, data }),
        }
    }

    /// Repeated file header read from a pre-2004 file.
    ///
    /// Informational; the writer derives a new one from the sections it lays out.
    pub fn second_header(&self) -> Option<&SecondFileHeader> {
        self.second_header.as_ref()
    }

    pub(crate) fn set_second_header(&mut self, header: SecondFileHeader) {
        self.second_header = Some(header);
    }

    /// References left unresolved by the last resolution pass.
    pub fn dangling_references(&self) -> usize {
        self.dangling
    }

    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }

    /// Rebuild the handle index and link every reference.
    ///
    /// Returns the number of dangling references, which also replaces the
    /// document's count.
    pub fn resolve_references(&mut self) -> usize {
        self.index = HandleIndex::build(&self.objects);
        if self.index.duplicates() > 0 {
            self.notifications.notify(
                NotificationType::Warning,
                format!("{} objects share a handle with an earlier object", self.index.duplicates()),
            );
        }
        let dangling = self.index.resolve_all(&mut self.objects, &mut self.header);
        for (source, target) in &dangling {
            warn!(source = %source, target = %target, "dangling handle reference");
            self.notifications.notify(
                NotificationType::DanglingReference,
                format!("Object {source} refers to missing handle {target}"),
            );
        }
        self.dangling = dangling.len();
        self.dangling
    }
}

impl Default for DwgDocument {
    fn default() -> Self {
        Self::new(DwgVersion::AC1032)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Layer, Line, ObjectData};
    use crate::types::{Handle, Vector3};

    fn document() -> DwgDocument {
        let mut doc = DwgDocument::new(DwgVersion::AC1015);
        doc.add_object(DwgObject::new_object(
            0x33,
            Handle::new(0x10),
            ObjectRef::NULL,
            ObjectData::Layer(Layer::new("0")),
        ));
        doc.add_object(DwgObject::new_entity(
            0x13,
            Handle::new(0x20),
            ObjectRef::soft_pointer(Handle::new(0x1F)),
            Handle::new(0x10),
            ObjectData::Line(Line::from_points(Vector3::ZERO, Vector3::new(3.0, 4.0, 0.0))),
        ));
        doc
    }

    #[test]
    fn test_lookup_by_handle() {
        let doc = document();
        assert_eq!(doc.get_by_handle(0x20).map(|o| o.name()), Some("LINE"));
        assert!(doc.get_by_handle(0x21).is_none());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_resolve_references_counts_dangling() {
        let mut doc = document();
        assert_eq!(doc.resolve_references(), 1);
        assert_eq!(doc.dangling_references(), 1);
        assert!(doc.notifications().has_type(NotificationType::DanglingReference));

        let line = doc.object(1).unwrap();
        let layer_ref = line.entity.as_ref().unwrap().layer;
        assert_eq!(layer_ref.target(), Some(0));
        assert_eq!(doc.resolve(&layer_ref).map(|o| o.name()), Some("LAYER"));
        assert!(doc.resolve(&line.owner).is_none());
    }

    #[test]
    fn test_resolve_without_pass_falls_back_to_lookup() {
        let doc = document();
        let reference = ObjectRef::hard_pointer(Handle::new(0x10));
        assert_eq!(doc.resolve(&reference).map(|o| o.handle), Some(Handle::new(0x10)));
    }

    #[test]
    fn test_retained_section_is_replaced() {
        let mut doc = DwgDocument::new(DwgVersion::AC1015);
        doc.retain_section("AcDb:AuxHeader", vec![1, 2]);
        doc.retain_section("AcDb:Template", vec![3]);
        doc.retain_section("AcDb:AuxHeader", vec![4]);
        let sections: Vec<_> = doc
            .retained_sections()
            .iter()
            .map(|s| (s.name.as_str(), s.data.as_slice()))
            .collect();
        assert_eq!(sections, [("AcDb:AuxHeader", &[4][..]), ("AcDb:Template", &[3][..])]);
    }

    #[test]
    fn test_duplicate_handle_is_reported() {
        let mut doc = document();
        doc.add_object(DwgObject::new_object(
            0x33,
            Handle::new(0x10),
            ObjectRef::NULL,
            ObjectData::Layer(Layer::new("1")),
        ));
        assert!(doc.notifications().has_type(NotificationType::Warning));
        assert_eq!(doc.get_by_handle(0x10).map(|o| o.handle), Some(Handle::new(0x10)));
    }
}
