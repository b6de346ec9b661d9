//! Handle resolution
//!
//! After all objects are decoded, [`HandleIndex`] maps each absolute handle
//! to the object's position in the document array. Every [`ObjectRef`] is
//! then pointed at its target index, or left unresolved and counted as
//! dangling.

use std::collections::hash_map::Entry;

use ahash::AHashMap;

use crate::header::HeaderVariables;
use crate::objects::DwgObject;
use crate::types::{Handle, ObjectRef};

/// Hash index from absolute handle value to object index.
#[derive(Debug, Clone, Default)]
pub struct HandleIndex {
    map: AHashMap<u64, usize>,
    duplicates: usize,
}

impl HandleIndex {
    /// Index `objects`; when two objects share a handle the first one wins.
    pub fn build(objects: &[DwgObject]) -> Self {
        let mut index = Self {
            map: AHashMap::with_capacity(objects.len()),
            duplicates: 0,
        };
        for (position, object) in objects.iter().enumerate() {
            index.insert(object.handle, position);
        }
        index
    }

    /// Register one object; returns false if the handle was already taken.
    pub fn insert(&mut self, handle: Handle, position: usize) -> bool {
        if handle.is_null() {
            return false;
        }
        match self.map.entry(handle.value()) {
            Entry::Occupied(_) => {
                self.duplicates += 1;
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(position);
                true
            }
        }
    }

    pub fn get(&self, handle: u64) -> Option<usize> {
        self.map.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Objects skipped because their handle was already indexed.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Point `reference` at its target.
    ///
    /// Returns false when a non-null reference has no target; the link is
    /// then cleared rather than left pointing at a stale index.
    pub fn resolve(&self, reference: &mut ObjectRef) -> bool {
        if reference.is_null() {
            reference.set_target(None);
            return true;
        }
        let target = self.get(reference.absolute().value());
        reference.set_target(target);
        target.is_some()
    }

    /// Resolve every reference in the objects and header variables.
    ///
    /// Returns the handles that could not be resolved, in visit order.
    pub fn resolve_all(
        &self,
        objects: &mut [DwgObject],
        header: &mut HeaderVariables,
    ) -> Vec<(Handle, Handle)> {
        let mut dangling = Vec::new();
        for object in objects.iter_mut() {
            let source = object.handle;
            object.references_mut(&mut |reference| {
                if !self.resolve(reference) {
                    dangling.push((source, reference.absolute()));
                }
            });
        }
        for reference in header.handles_mut() {
            if !self.resolve(reference) {
                dangling.push((Handle::NULL, reference.absolute()));
            }
        }
        dangling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{DwgObject, Layer, Line, ObjectData};

    fn sample() -> Vec<DwgObject> {
        vec![
            DwgObject::new_object(
                0x33,
                Handle::new(0x10),
                ObjectRef::soft_owner(Handle::new(0x2)),
                ObjectData::Layer(Layer::new("0")),
            ),
            DwgObject::new_entity(
                0x13,
                Handle::new(0x20),
                ObjectRef::NULL,
                Handle::new(0x10),
                ObjectData::Line(Line::default()),
            ),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let index = HandleIndex::build(&sample());
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(0x20), Some(1));
        assert_eq!(index.get(0x30), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let index = HandleIndex::build(&sample());
        let mut reference = ObjectRef::hard_pointer(Handle::new(0x10));
        assert!(index.resolve(&mut reference));
        assert_eq!(reference.target(), Some(0));
        assert!(index.resolve(&mut reference));
        assert_eq!(reference.target(), Some(0));
    }

    #[test]
    fn test_missing_handle_is_never_resolved() {
        let index = HandleIndex::build(&sample());
        let mut reference = ObjectRef::hard_pointer(Handle::new(0x99));
        reference.set_target(Some(1));
        assert!(!index.resolve(&mut reference));
        assert_eq!(reference.target(), None);
    }

    #[test]
    fn test_resolve_all_reports_dangling() {
        let mut objects = sample();
        let mut header = HeaderVariables::new();
        let index = HandleIndex::build(&objects);
        let dangling = index.resolve_all(&mut objects, &mut header);
        // Only the layer's owner (0x2) is missing.
        assert_eq!(dangling, vec![(Handle::new(0x10), Handle::new(0x2))]);
        let line = &objects[1];
        assert_eq!(line.entity.as_ref().unwrap().layer.target(), Some(0));
    }

    #[test]
    fn test_duplicate_handles_keep_first() {
        let mut objects = sample();
        objects[1].handle = Handle::new(0x10);
        let index = HandleIndex::build(&objects);
        assert_eq!(index.get(0x10), Some(0));
        assert_eq!(index.duplicates(), 1);
    }
}
