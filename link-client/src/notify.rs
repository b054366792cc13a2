use std::fmt;

use tracing::warn;
use uuid::Uuid;

/// A transient, user facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Saving a new order failed. The list is reloaded from the server.
    PersistenceFailed { message: String },
    /// Reloading the list after a failed save failed as well.
    ReconcileFailed { message: String },
    CreateFailed { message: String },
    EditFailed { link_id: Uuid, message: String },
    DeleteFailed { link_id: Uuid, message: String },
    /// The drop could not be applied; the list was left as it was.
    ReorderRejected,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::PersistenceFailed { .. } => {
                f.write_str("Couldn't save the new order, reloading your links")
            }
            Notification::ReconcileFailed { .. } => {
                f.write_str("Couldn't reload your links, refresh the page to see the saved order")
            }
            Notification::CreateFailed { .. } => f.write_str("Couldn't add the link"),
            Notification::EditFailed { .. } => f.write_str("Couldn't save your changes to the link"),
            Notification::DeleteFailed { .. } => f.write_str("Couldn't delete the link"),
            Notification::ReorderRejected => f.write_str("Something went wrong moving that link"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only logs. Used when there is no UI to show toasts in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        warn!(?notification, "{}", notification);
    }
}
