//! SOCIO client core: campus detection and the notification feed.
//!
//! Library crate shared by the `socio` binary and the integration tests in `tests/`.

pub mod api;
pub mod campus;
pub mod config;
pub mod cooldown;
pub mod errors;
pub mod geo;
pub mod identity;
pub mod models;
pub mod notification;
pub mod platform;
