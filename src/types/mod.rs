//! Core value types shared by the document model and the codec

pub mod color;
pub mod handle;
pub mod vector;
pub mod version;

pub use color::Color;
pub use handle::{Handle, HandleRef, ObjectRef, ReferenceType};
pub use vector::{Vector2, Vector3};
pub use version::{DwgVersion, VersionFlags};
