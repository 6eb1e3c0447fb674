//! Seams to the browser-automation layer and the application under test
//!
//! The crate never drives a browser itself. A test suite plugs in its driver
//! (contexts, pages, storage-state capture) and its page-object facade
//! through these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Credential, SessionSnapshot, UserCreateRequest, UserCreatedResponse};

#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("browser driver failed: {0}")]
    Driver(String),

    #[error("navigation to {page} failed: {reason}")]
    Navigation { page: String, reason: String },

    #[error("expected {expected} to be loaded: {reason}")]
    Expectation { expected: String, reason: String },

    #[error("api request failed: {0}")]
    Api(String),
}

/// An isolated browser context (its own cookies and storage).
///
/// Contexts are released with [`BrowserContext::close`]. When a test is
/// aborted and its session is dropped before that happens,
/// [`BrowserContext::release_on_drop`] is called instead and must free the
/// context without awaiting.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    type Page: Send;

    async fn new_page(&self) -> Result<Self::Page, DriverError>;

    /// Capture cookies and local storage of every origin visited so far.
    async fn storage_state(&self) -> Result<SessionSnapshot, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;

    /// Synchronous release for sessions dropped without `close`, e.g. when
    /// the fixture future is cancelled. Drivers whose contexts already free
    /// themselves on drop can keep the no-op default.
    fn release_on_drop(&self) {}
}

#[async_trait]
pub trait Browser: Send + Sync {
    type Context: BrowserContext;

    /// Create a new isolated context, optionally seeded from a snapshot.
    async fn new_context(
        &self,
        storage_state: Option<&SessionSnapshot>,
    ) -> Result<Self::Context, DriverError>;
}

/// Page of the contexts a browser creates.
pub type PageOf<B> = <<B as Browser>::Context as BrowserContext>::Page;

/// Page-object facade of the application under test, bound to one page.
#[async_trait]
pub trait Application: Send + Sized {
    type Page: Send;

    fn attach(page: Self::Page) -> Self;

    async fn open_home(&mut self) -> Result<(), DriverError>;

    /// Follow the header link from the current page to the shop.
    async fn open_shop(&mut self) -> Result<(), DriverError>;

    async fn open_sign_in(&mut self) -> Result<(), DriverError>;

    /// Fill and submit the sign-in form.
    async fn sign_in(&mut self, credential: &Credential) -> Result<(), DriverError>;

    /// Wait for the account details page that follows a successful sign-in.
    async fn expect_account_details_loaded(&mut self) -> Result<(), DriverError>;

    async fn create_new_user(
        &mut self,
        request: &UserCreateRequest,
    ) -> Result<UserCreatedResponse, DriverError>;

    /// Authenticate through the API and seed the page without the sign-in form.
    async fn headless_login(&mut self, credential: &Credential) -> Result<(), DriverError>;
}
