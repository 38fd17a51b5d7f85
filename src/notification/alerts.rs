//! Once-per-session desktop alert for the newest unread notification.

use std::sync::Arc;

use tracing::debug;

use crate::models::notification::Notification;
use crate::platform::{DesktopNotifier, KeyValueStore, PermissionState};

pub const SEEN_KEY_PREFIX: &str = "notif-seen-";

pub fn seen_key(id: &str) -> String {
    format!("{}{}", SEEN_KEY_PREFIX, id)
}

/// Newest unread entry by `created_at`; the earlier entry wins a tie.
pub fn newest_unread(items: &[Notification]) -> Option<&Notification> {
    items
        .iter()
        .filter(|n| !n.read)
        .fold(None, |best: Option<&Notification>, n| match best {
            Some(b) if b.created_at >= n.created_at => Some(b),
            _ => Some(n),
        })
}

#[derive(Clone)]
pub struct DesktopAlerts {
    notifier: Arc<dyn DesktopNotifier>,
    session: Arc<dyn KeyValueStore>,
}

impl DesktopAlerts {
    /// `session` must be cleared when the session ends; it only holds
    /// the seen markers.
    pub fn new(notifier: Arc<dyn DesktopNotifier>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { notifier, session }
    }

    /// Shows the newest unread item unless it was already shown this
    /// session. Returns the id that was shown.
    pub fn on_feed_loaded(&self, items: &[Notification]) -> Option<String> {
        if self.notifier.permission() != Some(PermissionState::Granted) {
            return None;
        }
        let newest = newest_unread(items)?;
        let key = seen_key(&newest.id);
        if self.session.get(&key).is_some() {
            return None;
        }

        if let Err(e) = self.notifier.show(&newest.title, &newest.message, &newest.id) {
            debug!(id = %newest.id, error = %e, "desktop notification failed");
            return None;
        }
        if let Err(e) = self.session.set(&key, "1") {
            debug!(id = %newest.id, error = %e, "failed to record shown notification");
        }
        Some(newest.id.clone())
    }
}
