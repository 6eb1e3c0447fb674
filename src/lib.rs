//! Session-reuse fixtures for end-to-end UI tests.
//!
//! Tests ask [`fixtures::Fixtures`] for an authenticated application. The
//! cached browser session is reused while its bearer token is unexpired and
//! regenerated through the interactive sign-in flow otherwise.

pub mod browser;
pub mod commands;
pub mod config;
pub mod fixtures;
pub mod fs;
pub mod logging;
pub mod models;
pub mod token;

pub use browser::{Application, Browser, BrowserContext, DriverError};
pub use config::FixtureConfig;
pub use fixtures::{CacheState, FixtureError, Fixtures, SessionCacheController};
pub use fs::SessionStore;
pub use models::{Credential, SessionSnapshot};
