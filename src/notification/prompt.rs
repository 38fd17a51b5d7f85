//! Invitation to enable desktop notifications.

use std::sync::Arc;

use crate::cooldown::CooldownGate;
use crate::platform::{Clock, DesktopNotifier, KeyValueStore, PermissionState};

pub struct PermissionPrompt {
    notifier: Arc<dyn DesktopNotifier>,
    gate: CooldownGate,
}

impl PermissionPrompt {
    pub fn new(
        notifier: Arc<dyn DesktopNotifier>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifier,
            gate: CooldownGate::notification_prompt(store, clock),
        }
    }

    /// Only when notifications are supported, nothing was decided yet and
    /// the prompt was not dismissed in the last 24 hours.
    pub fn should_show(&self) -> bool {
        self.notifier.permission() == Some(PermissionState::Default)
            && !self.gate.is_dismissed_recently()
    }

    /// Asks the platform for permission. `None` when unsupported.
    pub async fn enable(&self) -> Option<PermissionState> {
        self.notifier.permission()?;
        let state = self.notifier.request_permission().await;
        tracing::info!(?state, "notification permission requested");
        state
    }

    pub fn dismiss(&self) {
        self.gate.mark_dismissed();
    }
}
