use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    EventUpdate,
    EventReminder,
    Broadcast,
    #[serde(other)]
    Other,
}

/// A single feed entry as served by `/api/notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub r#type: NotificationType, // 'type' is a reserved keyword
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub is_broadcast: bool,
}

/// One page of the feed. `unread_count` covers the whole feed when the
/// backend sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: Option<u64>,
}

/// What the bell and the panel render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeedState {
    pub items: Vec<Notification>,
    pub unread_count: u64,
    pub is_loading: bool,
}

impl NotificationFeedState {
    pub fn local_unread(&self) -> u64 {
        self.items.iter().filter(|n| !n.read).count() as u64
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Badge text, capped at "99+".
    pub fn badge(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            n if n > 99 => Some("99+".to_string()),
            n => Some(n.to_string()),
        }
    }
}
