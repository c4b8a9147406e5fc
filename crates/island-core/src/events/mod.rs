//! Notifications
//!
//! The outbound queue of game and lifecycle events, plus a JSONL logger for it.

pub mod logger;
pub mod notifications;

pub use logger::NotificationLogger;
pub use notifications::Notifications;
