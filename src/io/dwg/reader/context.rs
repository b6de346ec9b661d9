//! State threaded through one decode call.

use tracing::{debug, warn};

use crate::notification::{NotificationCollection, NotificationType};
use crate::types::{DwgVersion, VersionFlags};

/// Per-decode context: revision, options and the notification sink.
#[derive(Debug)]
pub struct DecodeContext {
    pub flags: VersionFlags,
    pub maintenance_version: u8,
    pub code_page: u16,
    pub verify_crc: bool,
    /// Section being decoded, for diagnostics
    pub section: &'static str,
    notifications: NotificationCollection,
}

impl DecodeContext {
    pub fn new(version: DwgVersion, maintenance_version: u8, code_page: u16, verify_crc: bool) -> Self {
        Self {
            flags: VersionFlags::new(version),
            maintenance_version,
            code_page,
            verify_crc,
            section: "",
            notifications: NotificationCollection::new(),
        }
    }

    pub fn version(&self) -> DwgVersion {
        self.flags.version
    }

    /// Record a non-fatal condition and emit it as a tracing event.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        let message = message.into();
        match notification_type {
            NotificationType::Notice => debug!(section = self.section, "{message}"),
            _ => warn!(section = self.section, kind = %notification_type, "{message}"),
        }
        self.notifications.notify(notification_type, message);
    }

    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }

    pub fn into_notifications(self) -> NotificationCollection {
        self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_collects() {
        let mut ctx = DecodeContext::new(DwgVersion::AC1018, 0, 30, true);
        ctx.section = "AcDb:Header";
        ctx.notify(NotificationType::Notice, "unhandled class");
        ctx.notify(NotificationType::Integrity, "bad page");
        assert_eq!(ctx.notifications().len(), 2);
        assert!(ctx.flags.r2004_plus);
        let all = ctx.into_notifications();
        assert!(all.has_type(NotificationType::Integrity));
    }
}
