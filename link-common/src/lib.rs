pub mod link;
pub mod platform;
pub mod reorder;
pub mod store;

pub use link::{LinkEntity, LinkError, NewLink, PositionUpdate};
pub use platform::Platform;
pub use reorder::{Reorder, ReorderError};
pub use store::{PgLinkStore, StoreError};
