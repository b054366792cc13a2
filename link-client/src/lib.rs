pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod notify;
pub mod persistence;

#[cfg(test)]
mod test_utils;

pub use config::ClientConfig;
pub use controller::{CachedLink, DragOutcome, Phase, ReorderController};
pub use error::ClientError;
pub use notify::{LogNotifier, Notification, Notifier};
pub use persistence::{HttpLinkPersistence, LinkPersistence};
