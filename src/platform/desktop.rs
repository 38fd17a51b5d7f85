use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Default,
    Granted,
    Denied,
}

/// Platform notification capability.
///
/// `permission` returns `None` when the platform has no notification
/// support at all.
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    fn permission(&self) -> Option<PermissionState>;

    async fn request_permission(&self) -> Option<PermissionState>;

    /// `tag` identifies the notification so the platform can replace
    /// rather than stack repeats.
    fn show(&self, title: &str, body: &str, tag: &str) -> anyhow::Result<()>;
}

/// Writes notifications to stdout. A terminal has no permission model, so
/// it always reports `Granted`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

#[async_trait]
impl DesktopNotifier for TerminalNotifier {
    fn permission(&self) -> Option<PermissionState> {
        Some(PermissionState::Granted)
    }

    async fn request_permission(&self) -> Option<PermissionState> {
        Some(PermissionState::Granted)
    }

    fn show(&self, title: &str, body: &str, tag: &str) -> anyhow::Result<()> {
        tracing::debug!(tag, "showing desktop notification");
        println!("[notification] {}\n   {}", title, body);
        Ok(())
    }
}
