pub mod alerts;
pub mod feed;
pub mod prompt;
pub mod store;

pub use alerts::DesktopAlerts;
pub use feed::{spawn_feed, FeedCommand, FeedHandle};
pub use prompt::PermissionPrompt;
pub use store::NotificationStore;
