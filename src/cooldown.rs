//! Timestamped opt-outs that suppress a prompt for a cooldown window.

use std::sync::Arc;
use std::time::Duration;

use crate::platform::{Clock, KeyValueStore};

pub const CAMPUS_DISMISS_KEY: &str = "campus-selector-dismissed";
pub const CAMPUS_DISMISS_COOLDOWN: Duration = Duration::from_secs(12 * 60 * 60);

pub const NOTIFICATION_PROMPT_DISMISS_KEY: &str = "browser-notif-prompt-dismissed";
pub const NOTIFICATION_PROMPT_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// When the user last opted out, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissalRecord {
    pub timestamp_ms: i64,
}

impl DismissalRecord {
    fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .map(|timestamp_ms| Self { timestamp_ms })
    }
}

/// A dismissal record under a fixed storage key plus its cooldown window.
#[derive(Clone)]
pub struct CooldownGate {
    key: &'static str,
    window: Duration,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl CooldownGate {
    pub fn new(
        key: &'static str,
        window: Duration,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            key,
            window,
            store,
            clock,
        }
    }

    /// The campus prompt's gate: 12 hours.
    pub fn campus(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(CAMPUS_DISMISS_KEY, CAMPUS_DISMISS_COOLDOWN, store, clock)
    }

    /// The browser-notification permission prompt's gate: 24 hours.
    pub fn notification_prompt(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            NOTIFICATION_PROMPT_DISMISS_KEY,
            NOTIFICATION_PROMPT_COOLDOWN,
            store,
            clock,
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Unparseable values count as no record.
    pub fn last_dismissal(&self) -> Option<DismissalRecord> {
        self.store
            .get(self.key)
            .as_deref()
            .and_then(DismissalRecord::parse)
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// A record more than one window in the future, or one so far off
    /// that the arithmetic overflows, counts as no record.
    pub fn is_dismissed_recently(&self) -> bool {
        let Some(record) = self.last_dismissal() else {
            return false;
        };
        let window = self.window_ms();
        match self.clock.now_ms().checked_sub(record.timestamp_ms) {
            Some(elapsed) => elapsed > -window && elapsed < window,
            None => false,
        }
    }

    /// End of the current cooldown in epoch milliseconds, if one is active.
    pub fn suppressed_until(&self) -> Option<i64> {
        if !self.is_dismissed_recently() {
            return None;
        }
        self.last_dismissal()?.timestamp_ms.checked_add(self.window_ms())
    }

    /// Overwrites any previous record with the current time. A storage
    /// failure only means the prompt may come back early.
    pub fn mark_dismissed(&self) -> DismissalRecord {
        let record = DismissalRecord {
            timestamp_ms: self.clock.now_ms(),
        };
        if let Err(e) = self.store.set(self.key, &record.timestamp_ms.to_string()) {
            tracing::warn!(key = self.key, error = %e, "failed to persist dismissal");
        }
        record
    }
}
