//! Drawing-wide header variables
//!
//! The header section stores its variables by position; the reader names
//! them through [`crate::io::dwg::header_layout`]. The variables keep their
//! file order.

use indexmap::IndexMap;

use crate::types::{Color, ObjectRef, Vector2, Vector3};

/// Value of one header variable.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Short(i16),
    Long(i32),
    LongLong(u64),
    Double(f64),
    Point2(Vector2),
    Point3(Vector3),
    Text(String),
    Handle(ObjectRef),
    Color(Color),
    /// Julian day and milliseconds, or an elapsed span in the same units
    Time { days: i32, milliseconds: i32 },
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Double(v) => Some(*v),
            HeaderValue::Short(v) => Some(*v as f64),
            HeaderValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            HeaderValue::Short(v) => Some(*v as i32),
            HeaderValue::Long(v) => Some(*v),
            HeaderValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&ObjectRef> {
        match self {
            HeaderValue::Handle(v) => Some(v),
            _ => None,
        }
    }
}

/// Header variables keyed by name (`$` prefix omitted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderVariables {
    values: IndexMap<String, HeaderValue>,
}

impl HeaderVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables every new drawing starts with.
    pub fn standard() -> Self {
        let mut header = Self::new();
        header.set("INSBASE", HeaderValue::Point3(Vector3::ZERO));
        header.set("EXTMIN", HeaderValue::Point3(Vector3::ZERO));
        header.set("EXTMAX", HeaderValue::Point3(Vector3::ZERO));
        header.set("LIMMIN", HeaderValue::Point2(Vector2::ZERO));
        header.set("LIMMAX", HeaderValue::Point2(Vector2::new(12.0, 9.0)));
        header.set("ORTHOMODE", HeaderValue::Bool(false));
        header.set("LTSCALE", HeaderValue::Double(1.0));
        header.set("TEXTSIZE", HeaderValue::Double(0.2));
        header.set("LUNITS", HeaderValue::Short(2));
        header.set("INSUNITS", HeaderValue::Short(0));
        header.set("MENU", HeaderValue::Text("acad".into()));
        header
    }

    /// Set a variable, keeping its position when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: HeaderValue) {
        let name = name.into();
        let key = name.strip_prefix('$').map(str::to_string).unwrap_or(name);
        self.values.insert(key, value);
    }

    /// Look up a variable; a leading `$` is ignored.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.values.get(name.strip_prefix('$').unwrap_or(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.values.shift_remove(name.strip_prefix('$').unwrap_or(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn handles_mut(&mut self) -> impl Iterator<Item = &mut ObjectRef> {
        self.values.values_mut().filter_map(|v| match v {
            HeaderValue::Handle(r) => Some(r),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Handle;

    #[test]
    fn test_dollar_prefix_is_ignored() {
        let mut header = HeaderVariables::new();
        header.set("$LTSCALE", HeaderValue::Double(2.5));
        assert_eq!(header.get("LTSCALE").and_then(HeaderValue::as_f64), Some(2.5));
        assert_eq!(header.get("$LTSCALE").and_then(HeaderValue::as_f64), Some(2.5));
    }

    #[test]
    fn test_order_is_kept() {
        let mut header = HeaderVariables::standard();
        header.set("INSBASE", HeaderValue::Point3(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(header.iter().next().map(|(k, _)| k), Some("INSBASE"));
        header.remove("INSBASE");
        assert_eq!(header.iter().next().map(|(k, _)| k), Some("EXTMIN"));
    }

    #[test]
    fn test_typed_access() {
        let mut header = HeaderVariables::new();
        header.set("CLAYER", HeaderValue::Handle(ObjectRef::hard_pointer(Handle::new(0x10))));
        header.set("LUNITS", HeaderValue::Short(2));
        assert_eq!(header.get("LUNITS").and_then(HeaderValue::as_i32), Some(2));
        assert_eq!(
            header.get("CLAYER").and_then(HeaderValue::as_handle).map(|r| r.absolute()),
            Some(Handle::new(0x10))
        );
        assert_eq!(header.handles_mut().count(), 1);
    }
}
