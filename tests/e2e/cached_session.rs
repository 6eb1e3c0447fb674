//! Cached-session fixture: reuse vs. interactive sign-in

use authcache::fixtures::{CacheState, FixtureError, Fixtures, SessionCacheController, StaleReason};
use authcache::fs::StoreError;
use authcache::models::{Credential, OriginState, SessionSnapshot};
use authcache::token::{extract_token, is_expired};
use authcache::{logging, SessionStore};
use futures::{future, FutureExt};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tempfile::TempDir;

use super::helpers::*;

fn setup() -> (TempDir, FakeBrowser) {
    logging::init_for_tests();
    (tempfile::tempdir().unwrap(), FakeBrowser::new())
}

fn assert_signed_in_and_persisted(browser: &FakeBrowser, store: &SessionStore) {
    let log = browser.log();
    assert_eq!(log.sign_ins.len(), 1, "expected one interactive sign-in");
    assert_eq!(log.pages(), vec!["sign-in", "account", "shop"]);
    assert!(log.last_visit().unwrap().authenticated);

    let token = extract_token(&store.load().unwrap()).expect("persisted snapshot has a token");
    assert!(!is_expired(&token));
}

// =========================================================================
// Cache decisions
// =========================================================================

#[tokio::test]
async fn test_scenario_a_no_snapshot_signs_in_and_persists() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    let controller = SessionCacheController::from_config(&browser, &config);

    assert_eq!(controller.evaluate().unwrap(), CacheState::NoCache);

    let session = controller.resolve::<FakeApp>().await.unwrap();
    assert!(session.app().is_authenticated());
    session.close().await.unwrap();

    assert_signed_in_and_persisted(&browser, controller.store());
    let log = browser.log();
    assert_eq!(log.contexts_created, 1);
    assert_eq!(log.seeds, vec![None]);
    assert_eq!(log.open_contexts(), 0);
}

#[tokio::test]
async fn test_scenario_b_expired_token_is_refreshed() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    let stale = snapshot_expiring_in(-3600);
    config.store().save(&stale).unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::Expired)
    );

    let session = controller.resolve::<FakeApp>().await.unwrap();
    session.close().await.unwrap();

    assert_signed_in_and_persisted(&browser, controller.store());
    assert_ne!(stored_snapshot(&config.storage_state_path), stale);
}

#[tokio::test]
async fn test_scenario_c_valid_token_is_reused() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    let fresh = snapshot_expiring_in(3600);
    config.store().save(&fresh).unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert!(controller.evaluate().unwrap().is_usable());

    let session = controller.resolve::<FakeApp>().await.unwrap();
    assert!(session.app().is_authenticated());
    session.close().await.unwrap();

    let log = browser.log();
    assert!(log.sign_ins.is_empty());
    assert_eq!(log.seeds, vec![Some(fresh.clone())]);
    assert_eq!(log.pages(), vec!["home", "shop"]);
    assert!(log.visits.iter().all(|visit| visit.authenticated));
    assert_eq!(stored_snapshot(&config.storage_state_path), fresh);
}

#[tokio::test]
async fn test_scenario_d_empty_local_storage_is_refreshed() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    config
        .store()
        .save(&SessionSnapshot::default().with_origin(OriginState::new(APP_ORIGIN)))
        .unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::TokenAbsent)
    );

    controller.resolve::<FakeApp>().await.unwrap().close().await.unwrap();
    assert_signed_in_and_persisted(&browser, controller.store());
}

#[tokio::test]
async fn test_scenario_e_undecodable_token_is_refreshed() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    config
        .store()
        .save(&snapshot_with_token("Bearer abc.def.ghi"))
        .unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::Undecodable)
    );

    controller.resolve::<FakeApp>().await.unwrap().close().await.unwrap();
    assert_signed_in_and_persisted(&browser, controller.store());
}

#[tokio::test]
async fn test_empty_origins_are_refreshed() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    config.store().save(&SessionSnapshot::default()).unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::TokenAbsent)
    );

    controller.resolve::<FakeApp>().await.unwrap().close().await.unwrap();
    assert_signed_in_and_persisted(&browser, controller.store());
}

#[tokio::test]
async fn test_missing_exp_claim_is_refreshed() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    let header = "eyJhbGciOiJIUzI1NiJ9";
    let payload = "eyJzdWIiOiJ1c2VyLTEifQ"; // {"sub":"user-1"}
    config
        .store()
        .save(&snapshot_with_token(&format!("Bearer {header}.{payload}.sig")))
        .unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::MissingExpiry)
    );
}

#[tokio::test]
async fn test_corrupt_snapshot_is_refreshed_and_overwritten() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    std::fs::write(&config.storage_state_path, "{ truncated").unwrap();

    let controller = SessionCacheController::from_config(&browser, &config);
    assert_eq!(
        controller.evaluate().unwrap(),
        CacheState::CacheStaleMustRefresh(StaleReason::CorruptSnapshot)
    );

    controller.resolve::<FakeApp>().await.unwrap().close().await.unwrap();
    assert_signed_in_and_persisted(&browser, controller.store());
}

#[tokio::test]
async fn test_second_run_reuses_snapshot_from_first() {
    let (temp, browser) = setup();
    let fixtures = Fixtures::new(&browser, config_in(&temp));

    for _ in 0..2 {
        let authenticated = fixtures
            .with_logged_user(|app: &mut FakeApp| async move { app.is_authenticated() }.boxed())
            .await
            .unwrap();
        assert!(authenticated);
    }

    let log = browser.log();
    assert_eq!(log.sign_ins.len(), 1);
    assert_eq!(log.contexts_created, 2);
    assert!(log.seeds[0].is_none());
    assert!(log.seeds[1].is_some());
    assert_eq!(log.open_contexts(), 0);
}

#[tokio::test]
async fn test_keyed_cache_is_per_identity() {
    let (temp, browser) = setup();
    let mut config = config_in(&temp).with_storage_state_path(temp.path());
    config.key_by_identity = true;

    let controller = SessionCacheController::from_config(&browser, &config);
    controller.resolve::<FakeApp>().await.unwrap().close().await.unwrap();

    assert!(controller.store().exists());
    assert_ne!(
        controller.store().path(),
        temp.path().join("storage-state.json")
    );

    let qa = Credential::new("qa@test.com", "qa-password");
    let qa_config = config.clone().with_default_user(qa.clone());
    let qa_browser = FakeBrowser::with_behaviour(Behaviour {
        accepted: qa.clone(),
        ..Behaviour::default()
    });
    let qa_controller = SessionCacheController::from_config(&qa_browser, &qa_config);

    assert_eq!(qa_controller.credential(), &qa);
    assert_ne!(qa_controller.store().path(), controller.store().path());
    assert_eq!(qa_controller.evaluate().unwrap(), CacheState::NoCache);

    qa_controller
        .resolve::<FakeApp>()
        .await
        .unwrap()
        .close()
        .await
        .unwrap();

    assert_eq!(qa_browser.log().sign_ins, vec![qa]);
    assert!(controller.evaluate().unwrap().is_usable());
    assert!(qa_controller.evaluate().unwrap().is_usable());
}

// =========================================================================
// Failure paths
// =========================================================================

#[tokio::test]
async fn test_rejected_sign_in_is_fatal_and_releases_context() {
    logging::init_for_tests();
    let temp = tempfile::tempdir().unwrap();
    let browser = FakeBrowser::rejecting_sign_in();
    let config = config_in(&temp);

    let controller = SessionCacheController::from_config(&browser, &config);
    let err = match controller.resolve::<FakeApp>().await {
        Ok(_) => panic!("sign-in should have failed"),
        Err(err) => err,
    };

    assert!(matches!(err, FixtureError::InteractiveLoginFailure { .. }));
    let log = browser.log();
    assert_eq!(log.sign_ins.len(), 1, "sign-in must not be retried");
    assert_eq!(log.open_contexts(), 0);
    assert!(!config.store().exists());
}

#[tokio::test]
async fn test_persist_failure_propagates_and_releases_context() {
    let (temp, browser) = setup();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let config = config_in(&temp).with_storage_state_path(blocker.join("storage-state.json"));

    let controller = SessionCacheController::from_config(&browser, &config);
    let err = match controller.resolve::<FakeApp>().await {
        Ok(_) => panic!("persist should have failed"),
        Err(err) => err,
    };

    assert!(matches!(
        err,
        FixtureError::Store(StoreError::PersistFailure { .. })
    ));
    assert_eq!(browser.log().open_contexts(), 0);
}

#[tokio::test]
async fn test_panicking_body_still_closes_context() {
    let (temp, browser) = setup();
    config_in(&temp).store().save(&snapshot_expiring_in(3600)).unwrap();
    let fixtures = Fixtures::new(&browser, config_in(&temp));

    let outcome = AssertUnwindSafe(fixtures.with_logged_user(|app: &mut FakeApp| {
        async move {
            assert!(!app.is_authenticated(), "test body failed");
        }
        .boxed()
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    let log = browser.log();
    assert_eq!(log.contexts_created, 1);
    assert_eq!(log.open_contexts(), 0);
}

#[tokio::test]
async fn test_cancelled_test_still_releases_context() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    config.store().save(&snapshot_expiring_in(3600)).unwrap();
    let fixtures = Fixtures::new(&browser, config);

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        fixtures.with_logged_user(|_app: &mut FakeApp| future::pending::<()>().boxed()),
    )
    .await;

    assert!(outcome.is_err(), "body should still have been running");
    let log = browser.log();
    assert_eq!(log.contexts_created, 1);
    assert_eq!(log.contexts_released_on_drop, 1);
    assert_eq!(log.open_contexts(), 0);
}

#[tokio::test]
async fn test_completed_test_closes_without_drop_release() {
    let (temp, browser) = setup();
    let fixtures = Fixtures::new(&browser, config_in(&temp));

    fixtures
        .with_logged_user(|_app: &mut FakeApp| async move {}.boxed())
        .await
        .unwrap();

    let log = browser.log();
    assert_eq!(log.contexts_released_on_drop, 0);
    assert_eq!(log.open_contexts(), 0);
}

// =========================================================================
// Context replacement
// =========================================================================

#[tokio::test]
async fn test_replacing_closes_base_before_seeding() {
    let (temp, browser) = setup();
    let config = config_in(&temp);
    config.store().save(&snapshot_expiring_in(3600)).unwrap();
    let fixtures = Fixtures::new(&browser, config);

    let base = fixtures.factory().materialize_fresh::<FakeApp>().await.unwrap();
    let base_id = base.app().context_id();

    let session = fixtures.controller().resolve_replacing(base).await.unwrap();
    assert_ne!(session.app().context_id(), base_id);
    session.close().await.unwrap();

    let log = browser.log();
    assert_eq!(log.contexts_created, 2);
    assert_eq!(log.max_open, 1, "base and replacement were open together");
    assert_eq!(log.open_contexts(), 0);
    assert!(log.sign_ins.is_empty());
}

#[tokio::test]
async fn test_replacing_signs_in_on_base_when_stale() {
    let (temp, browser) = setup();
    let fixtures = Fixtures::new(&browser, config_in(&temp));

    let base = fixtures.factory().materialize_fresh::<FakeApp>().await.unwrap();
    let base_id = base.app().context_id();

    let session = fixtures.controller().resolve_replacing(base).await.unwrap();
    assert_eq!(session.app().context_id(), base_id);
    session.close().await.unwrap();

    let log = browser.log();
    assert_eq!(log.contexts_created, 1);
    assert_eq!(log.sign_ins.len(), 1);
}
