pub mod constants;
pub mod credential;
pub mod snapshot;

pub use credential::{Credential, UserContext, UserCreateRequest, UserCreatedResponse};
pub use snapshot::{Cookie, OriginState, SessionSnapshot, StorageEntry};
