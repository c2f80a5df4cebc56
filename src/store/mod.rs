//! Permission-accumulation store keyed by username.

mod permissions;

pub use permissions::{PermissionStore, StoreError, UserRecord};
