pub mod campus;
pub mod notification;
pub mod registration;
pub mod user;
