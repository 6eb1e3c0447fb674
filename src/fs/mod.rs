pub mod locking;
pub mod store;

pub use store::{SessionStore, StoreError};
