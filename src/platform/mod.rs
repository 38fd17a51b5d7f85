//! Device capability seams: time, key/value storage, location, desktop
//! notifications. Each has an in-process implementation used by the CLI
//! and by tests.

pub mod clock;
pub mod desktop;
pub mod location;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use desktop::{DesktopNotifier, PermissionState, TerminalNotifier};
pub use location::{FixedLocation, LocationProvider, NoLocation, PositionOptions};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
