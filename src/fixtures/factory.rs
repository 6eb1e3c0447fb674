//! Materializes browser sessions bound to the application facade

use crate::browser::{Application, Browser, BrowserContext, DriverError, PageOf};
use crate::models::SessionSnapshot;

/// A browser context plus the application facade attached to its page.
///
/// The context is owned exclusively by whoever holds the session and must be
/// released with [`AppSession::close`]. A session dropped before that, such
/// as one belonging to a cancelled test, falls back to
/// [`BrowserContext::release_on_drop`].
pub struct AppSession<C: BrowserContext, A> {
    context: C,
    app: A,
    closed: bool,
}

impl<C: BrowserContext, A> AppSession<C, A> {
    pub fn new(context: C, app: A) -> Self {
        Self {
            context,
            app,
            closed: false,
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Release the underlying browser context.
    pub async fn close(mut self) -> Result<(), DriverError> {
        self.closed = true;
        let result = self.context.close().await;
        tracing::debug!(ok = result.is_ok(), "browser context closed");
        result
    }

    /// Close, logging instead of returning a failure. Used on paths that are
    /// already reporting a more relevant error.
    pub(crate) async fn close_quietly(self) {
        if let Err(err) = self.close().await {
            tracing::warn!(error = %err, "failed to close browser context");
        }
    }
}

impl<C: BrowserContext, A> Drop for AppSession<C, A> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("browser session dropped without being closed; releasing its context");
            self.context.release_on_drop();
        }
    }
}

/// Creates isolated sessions; every call allocates a new browser context.
pub struct ContextFactory<'b, B: Browser> {
    browser: &'b B,
}

impl<'b, B: Browser> ContextFactory<'b, B> {
    pub fn new(browser: &'b B) -> Self {
        Self { browser }
    }

    /// Unseeded session for the interactive sign-in path.
    pub async fn materialize_fresh<A>(&self) -> Result<AppSession<B::Context, A>, DriverError>
    where
        A: Application<Page = PageOf<B>>,
    {
        self.materialize(None).await
    }

    /// Session seeded with the cookies and storage of `snapshot`.
    ///
    /// The snapshot is only read; calling this twice yields two independent
    /// contexts.
    pub async fn materialize_from_snapshot<A>(
        &self,
        snapshot: &SessionSnapshot,
    ) -> Result<AppSession<B::Context, A>, DriverError>
    where
        A: Application<Page = PageOf<B>>,
    {
        self.materialize(Some(snapshot)).await
    }

    async fn materialize<A>(
        &self,
        seed: Option<&SessionSnapshot>,
    ) -> Result<AppSession<B::Context, A>, DriverError>
    where
        A: Application<Page = PageOf<B>>,
    {
        let context = self.browser.new_context(seed).await?;
        let page = match context.new_page().await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = context.close().await {
                    tracing::warn!(
                        error = %close_err,
                        "failed to close context after page creation error"
                    );
                }
                return Err(err);
            }
        };

        tracing::debug!(seeded = seed.is_some(), "browser session materialized");
        Ok(AppSession::new(context, A::attach(page)))
    }
}
