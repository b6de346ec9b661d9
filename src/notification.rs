//! Decode diagnostics.
//!
//! Problems that do not stop a decode (unknown classes, objects that ran
//! past their declared size, dangling handles, corrupt optional sections)
//! are collected as [`Notification`] items on the document. Each one is also
//! emitted as a `tracing` event so a subscriber sees it as it happens.
//!
//! After decoding, inspect [`crate::DwgDocument::notifications`].

use std::fmt;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// Known but unhandled content, kept as raw data.
    Notice,
    /// An object did not consume exactly its declared size.
    Recoverable,
    /// A handle reference has no target in the document.
    DanglingReference,
    /// A page, section or object failed a checksum or correction step.
    Integrity,
    /// Anything else worth reporting.
    Warning,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notice => write!(f, "Notice"),
            Self::Recoverable => write!(f, "Recoverable"),
            Self::DanglingReference => write!(f, "DanglingReference"),
            Self::Integrity => write!(f, "Integrity"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

/// A single notification produced while decoding or encoding.
#[derive(Debug, Clone)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.notification_type, self.message)
    }
}

/// Ordered set of notifications gathered during one operation.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a notification and forward it to `tracing`.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        let message = message.into();
        match notification_type {
            NotificationType::Notice => tracing::debug!(kind = %notification_type, "{message}"),
            _ => tracing::warn!(kind = %notification_type, "{message}"),
        }
        self.items.push(Notification::new(notification_type, message));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// All notifications of one type.
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.notification_type == nt).collect()
    }

    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Move every notification of `other` into this collection.
    pub fn append(&mut self, other: NotificationCollection) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.items
    }
}

impl IntoIterator for NotificationCollection {
    type Item = Notification;
    type IntoIter = std::vec::IntoIter<Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
