//! Session cache controller
//!
//! Decides once per fixture resolution whether the persisted snapshot can be
//! reused, and either seeds a new context from it or signs in interactively
//! and overwrites it.
//!
//! ```text
//! exists? ── no ──────────────────────────────▶ NoCache ───────────────┐
//!    │                                                                 ▼
//!   yes ─▶ load ─▶ token? ── absent ───────────▶ CacheStaleMustRefresh ─▶ sign in, save
//!                    │
//!                 present ─▶ expired? ── yes ──▶ CacheStaleMustRefresh
//!                                 │
//!                                no ───────────▶ CacheFreshUsable ─────▶ seed context
//! ```

use chrono::Utc;

use super::error::FixtureError;
use super::factory::{AppSession, ContextFactory};
use crate::browser::{Application, Browser, BrowserContext, DriverError, PageOf};
use crate::config::FixtureConfig;
use crate::fs::{SessionStore, StoreError};
use crate::models::{Credential, SessionSnapshot};
use crate::token::{extract_token, inspect, TokenStatus};

/// Why a persisted snapshot cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    TokenAbsent,
    Expired,
    MissingExpiry,
    Undecodable,
    CorruptSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    NoCache,
    CacheFreshUsable(SessionSnapshot),
    CacheStaleMustRefresh(StaleReason),
}

impl CacheState {
    pub fn is_usable(&self) -> bool {
        matches!(self, CacheState::CacheFreshUsable(_))
    }
}

pub struct SessionCacheController<'b, B: Browser> {
    factory: ContextFactory<'b, B>,
    store: SessionStore,
    credential: Credential,
}

impl<'b, B: Browser> SessionCacheController<'b, B> {
    pub fn new(browser: &'b B, store: SessionStore, credential: Credential) -> Self {
        Self {
            factory: ContextFactory::new(browser),
            store,
            credential,
        }
    }

    pub fn from_config(browser: &'b B, config: &FixtureConfig) -> Self {
        Self::new(browser, config.store(), config.default_user.clone())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn evaluate(&self) -> Result<CacheState, StoreError> {
        self.evaluate_at(Utc::now().timestamp())
    }

    /// Classify the persisted snapshot as of `now_secs`.
    ///
    /// Only read failures other than "missing" or "corrupt" are errors.
    pub fn evaluate_at(&self, now_secs: i64) -> Result<CacheState, StoreError> {
        if !self.store.exists() {
            return Ok(CacheState::NoCache);
        }

        let snapshot = match self.store.load() {
            Ok(snapshot) => snapshot,
            // Removed between the existence check and the read.
            Err(StoreError::NotFound(_)) => return Ok(CacheState::NoCache),
            Err(err @ StoreError::CorruptData { .. }) => {
                tracing::warn!(error = %err, "ignoring unreadable session snapshot");
                return Ok(CacheState::CacheStaleMustRefresh(StaleReason::CorruptSnapshot));
            }
            Err(err) => return Err(err),
        };

        let Some(token) = extract_token(&snapshot) else {
            return Ok(CacheState::CacheStaleMustRefresh(StaleReason::TokenAbsent));
        };

        let state = match inspect(&token, now_secs) {
            TokenStatus::Valid { .. } => CacheState::CacheFreshUsable(snapshot),
            TokenStatus::Expired { .. } => CacheState::CacheStaleMustRefresh(StaleReason::Expired),
            TokenStatus::MissingExpiry => {
                CacheState::CacheStaleMustRefresh(StaleReason::MissingExpiry)
            }
            TokenStatus::Undecodable { .. } => {
                CacheState::CacheStaleMustRefresh(StaleReason::Undecodable)
            }
        };
        Ok(state)
    }

    /// Produce an authenticated session, allocating only the context it needs.
    pub async fn resolve<A>(&self) -> Result<AppSession<B::Context, A>, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
    {
        match self.decide()? {
            CacheState::CacheFreshUsable(snapshot) => self.reuse(&snapshot).await,
            _ => {
                let session = self.factory.materialize_fresh().await?;
                self.sign_in_and_persist(session).await
            }
        }
    }

    /// Produce an authenticated session from an already-open base session.
    ///
    /// On the refresh path the base session is signed in and returned. When
    /// the cache is usable the base is closed first and replaced by a context
    /// seeded from the snapshot; the two are never open at the same time.
    pub async fn resolve_replacing<A>(
        &self,
        base: AppSession<B::Context, A>,
    ) -> Result<AppSession<B::Context, A>, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
    {
        let state = match self.decide() {
            Ok(state) => state,
            Err(err) => {
                base.close_quietly().await;
                return Err(err.into());
            }
        };

        match state {
            CacheState::CacheFreshUsable(snapshot) => {
                base.close().await?;
                self.reuse(&snapshot).await
            }
            _ => self.sign_in_and_persist(base).await,
        }
    }

    fn decide(&self) -> Result<CacheState, StoreError> {
        let state = self.evaluate()?;
        match &state {
            CacheState::NoCache => {
                tracing::info!(path = %self.store.path().display(), "no cached session; signing in")
            }
            CacheState::CacheStaleMustRefresh(reason) => tracing::info!(
                path = %self.store.path().display(),
                ?reason,
                "cached session is stale; signing in"
            ),
            CacheState::CacheFreshUsable(_) => {
                tracing::info!(path = %self.store.path().display(), "reusing cached session")
            }
        }
        Ok(state)
    }

    async fn reuse<A>(
        &self,
        snapshot: &SessionSnapshot,
    ) -> Result<AppSession<B::Context, A>, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
    {
        let mut session = self.factory.materialize_from_snapshot(snapshot).await?;

        match land_on_shop(session.app_mut()).await {
            Ok(()) => Ok(session),
            Err(err) => {
                session.close_quietly().await;
                Err(err.into())
            }
        }
    }

    async fn sign_in_and_persist<A>(
        &self,
        mut session: AppSession<B::Context, A>,
    ) -> Result<AppSession<B::Context, A>, FixtureError>
    where
        A: Application<Page = PageOf<B>>,
    {
        if let Err(source) = self.interactive_sign_in(session.app_mut()).await {
            session.close_quietly().await;
            return Err(FixtureError::InteractiveLoginFailure {
                email: self.credential.email.clone(),
                source,
            });
        }

        if let Err(err) = self.persist(&mut session).await {
            session.close_quietly().await;
            return Err(err);
        }

        Ok(session)
    }

    async fn interactive_sign_in<A: Application>(
        &self,
        app: &mut A,
    ) -> Result<(), DriverError> {
        app.open_sign_in().await?;
        app.sign_in(&self.credential).await?;
        app.expect_account_details_loaded().await
    }

    async fn persist<A>(&self, session: &mut AppSession<B::Context, A>) -> Result<(), FixtureError>
    where
        A: Application<Page = PageOf<B>>,
    {
        session.app_mut().open_shop().await?;
        let snapshot = session.context().storage_state().await?;
        self.store.save(&snapshot)?;
        Ok(())
    }
}

/// Confirm a seeded session is usable by walking home, then to the shop.
async fn land_on_shop<A: Application>(app: &mut A) -> Result<(), DriverError> {
    app.open_home().await?;
    app.open_shop().await
}
