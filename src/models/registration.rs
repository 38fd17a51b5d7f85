use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Minimal view of an event attached to a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub event: Option<EventSummary>,
}

impl Registration {
    /// Registration key; falls back to the embedded event's id.
    pub fn key(&self) -> Option<&str> {
        if !self.event_id.is_empty() {
            return Some(&self.event_id);
        }
        self.event
            .as_ref()
            .and_then(|e| e.event_id.as_deref().or(e.id.as_deref()))
            .filter(|id| !id.is_empty())
    }
}

/// The registrations endpoint answers either a bare array or
/// `{"registrations": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RegistrationsBody {
    List(Vec<Registration>),
    Wrapped {
        #[serde(default)]
        registrations: Vec<Registration>,
    },
}

impl RegistrationsBody {
    pub(crate) fn into_vec(self) -> Vec<Registration> {
        match self {
            RegistrationsBody::List(v) => v,
            RegistrationsBody::Wrapped { registrations } => registrations,
        }
    }
}

/// Drops entries without a key and every repeat of an `event_id` after
/// its first occurrence. Order is preserved.
pub fn dedup_by_event_id(raw: Vec<Registration>) -> Vec<Registration> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|mut r| {
            let key = r.key()?.to_string();
            if !seen.insert(key.clone()) {
                return None;
            }
            r.event_id = key;
            Some(r)
        })
        .collect()
}
