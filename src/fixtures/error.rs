use thiserror::Error;

use crate::browser::DriverError;
use crate::fs::StoreError;

/// Failures that abort fixture resolution and fail the requesting test.
///
/// Stale or missing caches are not errors; they only select the sign-in path.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("interactive sign-in as {email} did not reach the account page: {source}")]
    InteractiveLoginFailure {
        email: String,
        #[source]
        source: DriverError,
    },

    #[error("could not create a new user: {0}")]
    UserCreation(#[source] DriverError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}
