//! Test fixtures handing authenticated application sessions to test bodies
//!
//! Each `with_*` method acquires a browser session, passes the application
//! facade to the test body, and closes the session afterwards on every exit
//! path: normal return, fixture error, or a panicking body. A panic is
//! re-raised after teardown so the test still fails with its own message.

pub mod controller;
pub mod error;
pub mod factory;
pub mod new_user;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::browser::{Application, Browser, BrowserContext, PageOf};
use crate::config::FixtureConfig;
use crate::models::UserContext;

pub use controller::{CacheState, SessionCacheController, StaleReason};
pub use error::FixtureError;
pub use factory::{AppSession, ContextFactory};
pub use new_user::sign_up_new_user;

pub struct Fixtures<'b, B: Browser> {
    browser: &'b B,
    config: FixtureConfig,
}

impl<'b, B: Browser> Fixtures<'b, B> {
    pub fn new(browser: &'b B, config: FixtureConfig) -> Self {
        Self { browser, config }
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn factory(&self) -> ContextFactory<'b, B> {
        ContextFactory::new(self.browser)
    }

    pub fn controller(&self) -> SessionCacheController<'b, B> {
        SessionCacheController::from_config(self.browser, &self.config)
    }

    /// Unauthenticated app on a fresh context.
    pub async fn with_app<A, T, F>(&self, body: F) -> Result<T, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
        F: for<'s> FnOnce(&'s mut A) -> BoxFuture<'s, T>,
    {
        let mut session = self.factory().materialize_fresh::<A>().await?;
        let outcome = AssertUnwindSafe(body(session.app_mut()))
            .catch_unwind()
            .await;
        teardown(session, outcome).await
    }

    /// App signed in as the configured default user, reusing the cached
    /// session when its token is still valid.
    pub async fn with_logged_user<A, T, F>(&self, body: F) -> Result<T, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
        F: for<'s> FnOnce(&'s mut A) -> BoxFuture<'s, T>,
    {
        let mut session = self.controller().resolve::<A>().await?;
        let outcome = AssertUnwindSafe(body(session.app_mut()))
            .catch_unwind()
            .await;
        teardown(session, outcome).await
    }

    /// App logged in as a user created just for this test.
    pub async fn with_new_user<A, T, F>(&self, body: F) -> Result<T, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
        F: for<'s> FnOnce(&'s mut A, &'s UserContext) -> BoxFuture<'s, T>,
    {
        let mut session = self.factory().materialize_fresh::<A>().await?;
        let user =
            match sign_up_new_user(session.app_mut(), &self.config.new_user_password).await {
                Ok(user) => user,
                Err(err) => {
                    session.close_quietly().await;
                    return Err(err);
                }
            };

        let outcome = AssertUnwindSafe(body(session.app_mut(), &user))
            .catch_unwind()
            .await;
        teardown(session, outcome).await
    }
}

async fn teardown<C, A, T>(
    session: AppSession<C, A>,
    outcome: Result<T, Box<dyn Any + Send>>,
) -> Result<T, FixtureError>
where
    C: BrowserContext,
{
    let closed = session.close().await;
    match outcome {
        Ok(value) => {
            closed?;
            Ok(value)
        }
        Err(payload) => {
            if let Err(err) = closed {
                tracing::warn!(error = %err, "failed to close browser context after test panic");
            }
            panic::resume_unwind(payload)
        }
    }
}
