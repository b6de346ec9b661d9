//! Handles and object references
//!
//! Every object in a drawing is identified by a [`Handle`]. Objects refer to
//! each other through [`ObjectRef`], which keeps the reference exactly as it
//! was stored (code, byte count, value), the absolute handle it denotes, and,
//! once the document has been resolved, the index of the target object.

use std::fmt;

/// A unique identifier for drawing objects
///
/// Handle 0 is reserved and means "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(u64);

impl Handle {
    /// The null handle (0)
    pub const NULL: Handle = Handle(0);

    #[inline]
    pub const fn new(value: u64) -> Self {
        Handle(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl fmt::UpperHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// Reference code stored in the upper nibble of an encoded handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReferenceType {
    /// Plain handle, used for an object's own identity (code 0)
    Plain = 0,
    /// Soft ownership (code 2)
    SoftOwnership = 2,
    /// Hard ownership (code 3)
    HardOwnership = 3,
    /// Soft pointer (code 4)
    SoftPointer = 4,
    /// Hard pointer (code 5)
    HardPointer = 5,
    /// Referencing handle + 1 (code 6)
    NextHandle = 6,
    /// Referencing handle - 1 (code 8)
    PreviousHandle = 8,
    /// Referencing handle + value (code 0xA)
    PlusOffset = 0xA,
    /// Referencing handle - value (code 0xC)
    MinusOffset = 0xC,
}

impl ReferenceType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReferenceType::Plain),
            2 => Some(ReferenceType::SoftOwnership),
            3 => Some(ReferenceType::HardOwnership),
            4 => Some(ReferenceType::SoftPointer),
            5 => Some(ReferenceType::HardPointer),
            6 => Some(ReferenceType::NextHandle),
            8 => Some(ReferenceType::PreviousHandle),
            0xA => Some(ReferenceType::PlusOffset),
            0xC => Some(ReferenceType::MinusOffset),
            _ => None,
        }
    }

    /// Whether the stored value is the absolute handle.
    pub fn is_absolute(&self) -> bool {
        (*self as u8) <= 5
    }
}

/// A handle exactly as encoded: `|CODE (4 bits)|SIZE (4 bits)|VALUE (SIZE bytes, big-endian)|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandleRef {
    pub code: u8,
    pub size: u8,
    pub value: u64,
}

impl HandleRef {
    /// Build a descriptor with the smallest byte count that holds `value`.
    pub fn new(code: u8, value: u64) -> Self {
        Self {
            code,
            size: byte_count(value),
            value,
        }
    }

    /// The absolute handle this descriptor denotes when stored by `owner`.
    pub fn absolute(&self, owner: Handle) -> Handle {
        let base = owner.value();
        Handle::new(match self.code {
            6 => base.wrapping_add(1),
            8 => base.wrapping_sub(1),
            0xA => base.wrapping_add(self.value),
            0xC => base.wrapping_sub(self.value),
            _ => self.value,
        })
    }
}

/// Number of bytes needed to store `value` (0 for zero).
pub fn byte_count(value: u64) -> u8 {
    ((64 - value.leading_zeros() + 7) / 8) as u8
}

/// A non-owning reference from one object to another.
///
/// `target` is an index into the document's object array and is only set by
/// the handle resolver; it never keeps the referenced object alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectRef {
    raw: HandleRef,
    absolute: Handle,
    target: Option<usize>,
}

impl ObjectRef {
    /// The null reference.
    pub const NULL: ObjectRef = ObjectRef {
        raw: HandleRef {
            code: 0,
            size: 0,
            value: 0,
        },
        absolute: Handle::NULL,
        target: None,
    };

    /// Reference a handle with the given reference type, stored absolutely.
    pub fn new(kind: ReferenceType, handle: Handle) -> Self {
        Self {
            raw: HandleRef::new(kind as u8, handle.value()),
            absolute: handle,
            target: None,
        }
    }

    /// Wrap a descriptor read from the file by the object `owner`.
    pub fn from_raw(raw: HandleRef, owner: Handle) -> Self {
        Self {
            raw,
            absolute: raw.absolute(owner),
            target: None,
        }
    }

    pub fn soft_owner(handle: Handle) -> Self {
        Self::new(ReferenceType::SoftOwnership, handle)
    }

    pub fn hard_owner(handle: Handle) -> Self {
        Self::new(ReferenceType::HardOwnership, handle)
    }

    pub fn soft_pointer(handle: Handle) -> Self {
        Self::new(ReferenceType::SoftPointer, handle)
    }

    pub fn hard_pointer(handle: Handle) -> Self {
        Self::new(ReferenceType::HardPointer, handle)
    }

    /// The descriptor as it was stored.
    pub fn raw(&self) -> HandleRef {
        self.raw
    }

    pub fn code(&self) -> u8 {
        self.raw.code
    }

    /// The document-global handle value.
    pub fn absolute(&self) -> Handle {
        self.absolute
    }

    pub fn is_null(&self) -> bool {
        self.absolute.is_null()
    }

    /// Index of the referenced object, once resolved.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub(crate) fn set_target(&mut self, target: Option<usize>) {
        self.target = target;
    }

    /// Descriptor to write when this reference is stored by `owner`.
    ///
    /// Absolute codes are written as-is. Relative codes are re-derived from
    /// the absolute handle so the reference survives a change of owner
    /// handle; the stored code is kept when it still applies.
    pub fn encode_for(&self, owner: Handle) -> HandleRef {
        let code = self.raw.code;
        if code <= 5 {
            return HandleRef::new(code, self.absolute.value());
        }
        let target = self.absolute.value();
        let base = owner.value();
        let fits = match code {
            6 => target == base.wrapping_add(1),
            8 => target == base.wrapping_sub(1),
            0xA => target > base,
            0xC => target < base,
            _ => false,
        };
        let code = if fits {
            code
        } else if target == base.wrapping_add(1) {
            6
        } else if target == base.wrapping_sub(1) {
            8
        } else if target > base {
            0xA
        } else if target < base {
            0xC
        } else {
            return HandleRef::new(ReferenceType::SoftPointer as u8, target);
        };
        match code {
            6 | 8 => HandleRef {
                code,
                size: 0,
                value: 0,
            },
            0xA => HandleRef::new(code, target - base),
            _ => HandleRef::new(code, base - target),
        }
    }
}

/// Two references are equal when they have the same code and denote the
/// same handle; byte counts and resolution state are not compared.
impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.raw.code == other.raw.code && self.absolute == other.absolute
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.raw.code, self.absolute)
    }
}
