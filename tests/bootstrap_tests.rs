//! Integration tests for first-run bootstrap against real SQLite files.
//!
//! Covers idempotence, rollback on failure, the no-op branch, and concurrent
//! initializers racing on the same store.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use firstrun::db::{AccountRecord, Store};
use firstrun::entities::auth_accounts::AccountRole;
use firstrun::services::capabilities::{
    Clock, FixedClock, IdentityGenerator, PasswordHasher, RandomSaltGenerator, SaltGenerator,
    Sha256PasswordHasher, UuidIdentityGenerator,
};
use firstrun::services::diagnostics;
use firstrun::services::{BootstrapDefaults, BootstrapError, BootstrapResult, ensure_bootstrapped};
use sea_orm::ConnectionTrait;

const NOW: i64 = 1_767_225_600;

fn temp_db_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "firstrun-bootstrap-{label}-{}.db",
        uuid::Uuid::new_v4()
    ))
}

async fn open_store(label: &str) -> Store {
    Store::open(&temp_db_path(label))
        .await
        .expect("failed to open store")
}

fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn test_defaults(seed: BTreeMap<String, String>) -> BootstrapDefaults {
    BootstrapDefaults {
        admin_login_name: "admin".to_string(),
        admin_display_name: "超级管理员".to_string(),
        initial_credential: "correct horse".to_string(),
        seed_settings: seed,
        identity_generator: Arc::new(UuidIdentityGenerator),
        salt_generator: Arc::new(RandomSaltGenerator),
        password_hasher: Arc::new(Sha256PasswordHasher),
        clock: Arc::new(FixedClock(NOW)),
    }
}

fn brand_defaults() -> BootstrapDefaults {
    test_defaults(settings(&[
        ("brand_name", "创新意电竞"),
        ("store_name", "广州总店"),
    ]))
}

/// Hands out `admin-1`, `admin-2`, ...
struct SequenceIds(AtomicUsize);

impl IdentityGenerator for SequenceIds {
    fn generate(&self) -> anyhow::Result<String> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("admin-{n}"))
    }
}

struct OfflineHasher;

impl PasswordHasher for OfflineHasher {
    fn hash(&self, _salt: &str, _credential: &str) -> anyhow::Result<String> {
        anyhow::bail!("hashing backend offline")
    }
}

struct ExhaustedIds;

impl IdentityGenerator for ExhaustedIds {
    fn generate(&self) -> anyhow::Result<String> {
        anyhow::bail!("identity pool exhausted")
    }
}

struct NoEntropy;

impl SaltGenerator for NoEntropy {
    fn generate(&self) -> anyhow::Result<String> {
        anyhow::bail!("entropy source unavailable")
    }
}

struct BrokenClock;

impl Clock for BrokenClock {
    fn now(&self) -> anyhow::Result<i64> {
        anyhow::bail!("clock before epoch")
    }
}

#[tokio::test]
async fn fresh_store_is_seeded_with_admin_and_settings() {
    let store = open_store("literal").await;

    let result = ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();

    let BootstrapResult::Seeded {
        admin_id,
        login_name,
        settings,
        seeded_at,
    } = result
    else {
        panic!("expected Seeded, got {result:?}");
    };
    assert!(uuid::Uuid::parse_str(&admin_id).is_ok());
    assert_eq!(login_name, "admin");
    assert_eq!(settings, vec!["brand_name", "store_name"]);
    assert_eq!(seeded_at, NOW);

    assert_eq!(store.count_admins().await.unwrap(), 1);

    let admin = store
        .get_account_by_pick_name("admin")
        .await
        .unwrap()
        .expect("admin row missing");
    assert_eq!(admin.id, admin_id);
    assert_eq!(admin.role, "admin");
    assert_eq!(admin.identity, "admin");
    assert_eq!(admin.display_name, "超级管理员");
    assert!(admin.is_active);
    assert!(admin.equity.abs() < f64::EPSILON);
    assert_eq!(admin.created_at, NOW);
    assert_eq!(admin.updated_at, admin.created_at);
    assert_eq!(
        admin.pass_hash,
        Sha256PasswordHasher
            .hash(&admin.pass_salt, "correct horse")
            .unwrap()
    );

    let rows = store.settings().list().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].k, "brand_name");
    assert_eq!(rows[0].v, "创新意电竞");
    assert_eq!(rows[1].k, "store_name");
    assert_eq!(rows[1].v, "广州总店");
    assert!(rows.iter().all(|row| row.updated_at == NOW && row.updated_at != 0));
}

#[tokio::test]
async fn second_call_is_a_no_op() {
    let store = open_store("idempotent").await;
    let defaults = brand_defaults();

    let first = ensure_bootstrapped(&store, &defaults).await.unwrap();
    let settings_after_first = store.list_settings().await.unwrap();
    let second = ensure_bootstrapped(&store, &defaults).await.unwrap();

    assert!(first.was_seeded());
    assert_eq!(second, BootstrapResult::AlreadyInitialized { admin_count: 1 });
    assert_eq!(store.count_admins().await.unwrap(), 1);
    assert_eq!(store.list_settings().await.unwrap(), settings_after_first);
}

#[tokio::test]
async fn rerun_with_new_settings_leaves_existing_values() {
    let store = open_store("noop-settings").await;

    ensure_bootstrapped(&store, &test_defaults(settings(&[("brand_name", "A")])))
        .await
        .unwrap();

    let mut rerun = test_defaults(settings(&[("brand_name", "B"), ("store_name", "X")]));
    rerun.clock = Arc::new(FixedClock(NOW + 60));
    let result = ensure_bootstrapped(&store, &rerun).await.unwrap();

    assert!(!result.was_seeded());
    let brand = store.settings().get("brand_name").await.unwrap().unwrap();
    assert_eq!(brand.v, "A");
    assert_eq!(brand.updated_at, NOW);
    assert_eq!(store.get_setting("store_name").await.unwrap(), None);
}

#[tokio::test]
async fn existing_setting_is_overwritten_on_seed() {
    let store = open_store("upsert").await;
    store
        .settings()
        .upsert_setting("brand_name", "stale", NOW - 3600)
        .await
        .unwrap();

    ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();

    let rows = store.settings().list().await.unwrap();
    assert_eq!(rows.len(), 2);
    let brand = store.settings().get("brand_name").await.unwrap().unwrap();
    assert_eq!(brand.v, "创新意电竞");
    assert_eq!(brand.updated_at, NOW);
}

#[tokio::test]
async fn failed_settings_write_rolls_back_admin() {
    let store = open_store("atomic").await;
    store
        .conn
        .execute_unprepared(
            "CREATE TRIGGER reject_kv BEFORE INSERT ON kv \
             BEGIN SELECT RAISE(ABORT, 'kv writes rejected'); END;",
        )
        .await
        .unwrap();

    let err = ensure_bootstrapped(&store, &brand_defaults())
        .await
        .unwrap_err();

    assert!(err.is_retryable(), "unexpected error: {err}");
    assert_eq!(store.count_admins().await.unwrap(), 0);
    assert!(
        store
            .get_account_by_pick_name("admin")
            .await
            .unwrap()
            .is_none()
    );

    store
        .conn
        .execute_unprepared("DROP TRIGGER reject_kv")
        .await
        .unwrap();
    let retried = ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();
    assert!(retried.was_seeded());
    assert_eq!(store.count_admins().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_login_surfaces_constraint_violation() {
    let store = open_store("duplicate").await;
    store
        .accounts()
        .insert_account(AccountRecord {
            id: "staff-1".to_string(),
            pick_name: "admin".to_string(),
            pass_salt: "salt".to_string(),
            pass_hash: "hash".to_string(),
            role: AccountRole::Staff,
            identity: "staff".to_string(),
            display_name: "前台".to_string(),
            equity: 0.0,
            is_active: true,
            created_at: NOW,
            updated_at: NOW,
        })
        .await
        .unwrap();

    let err = ensure_bootstrapped(&store, &brand_defaults())
        .await
        .unwrap_err();

    assert!(
        matches!(err, BootstrapError::ConstraintViolation(_)),
        "unexpected error: {err}"
    );
    assert_eq!(store.count_admins().await.unwrap(), 0);
    assert!(store.list_settings().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_hasher_writes_nothing() {
    let store = open_store("hasher").await;
    let mut defaults = brand_defaults();
    defaults.password_hasher = Arc::new(OfflineHasher);

    let err = ensure_bootstrapped(&store, &defaults).await.unwrap_err();

    match &err {
        BootstrapError::Capability { capability, .. } => assert_eq!(*capability, "password_hasher"),
        other => panic!("expected capability error, got {other:?}"),
    }
    assert!(err.to_string().contains("hashing backend offline"));
    assert_eq!(store.count_admins().await.unwrap(), 0);
    assert!(store.list_settings().await.unwrap().is_empty());
}

#[tokio::test]
async fn injected_identity_is_used() {
    let store = open_store("identity").await;
    let mut defaults = brand_defaults();
    defaults.identity_generator = Arc::new(SequenceIds(AtomicUsize::new(0)));

    let result = ensure_bootstrapped(&store, &defaults).await.unwrap();

    assert!(matches!(
        result,
        BootstrapResult::Seeded { ref admin_id, .. } if admin_id == "admin-1"
    ));
    let admin = store
        .get_account_by_pick_name("admin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.id, "admin-1");
}

#[tokio::test]
async fn inactive_admin_still_counts_as_initialized() {
    let store = open_store("inactive").await;
    store
        .accounts()
        .insert_account(AccountRecord {
            id: "old-admin".to_string(),
            pick_name: "boss".to_string(),
            pass_salt: "salt".to_string(),
            pass_hash: "hash".to_string(),
            role: AccountRole::Admin,
            identity: "admin".to_string(),
            display_name: "Boss".to_string(),
            equity: 12.5,
            is_active: false,
            created_at: NOW,
            updated_at: NOW,
        })
        .await
        .unwrap();

    let result = ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();

    assert_eq!(result, BootstrapResult::AlreadyInitialized { admin_count: 1 });
    assert!(store.list_settings().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_credential_is_rejected_before_touching_the_store() {
    let store = open_store("empty-credential").await;
    let mut defaults = brand_defaults();
    defaults.initial_credential = String::new();

    let err = ensure_bootstrapped(&store, &defaults).await.unwrap_err();

    assert!(matches!(err, BootstrapError::InvalidDefaults(_)));
    assert_eq!(store.count_admins().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_bootstraps_seed_exactly_once() {
    let path = temp_db_path("race");
    let first = Store::open(&path).await.unwrap();
    let second = Store::open(&path).await.unwrap();
    let defaults = brand_defaults();

    let (a, b) = tokio::join!(
        ensure_bootstrapped(&first, &defaults),
        ensure_bootstrapped(&second, &defaults)
    );

    let outcomes = [a, b];
    let seeded = outcomes
        .iter()
        .filter(|r| matches!(r, Ok(BootstrapResult::Seeded { .. })))
        .count();
    assert_eq!(seeded, 1, "outcomes: {outcomes:?}");
    assert!(
        outcomes
            .iter()
            .any(|r| !matches!(r, Ok(BootstrapResult::Seeded { .. })))
    );

    assert_eq!(first.count_admins().await.unwrap(), 1);
    assert_eq!(second.list_settings().await.unwrap().len(), 2);
}

#[tokio::test]
async fn reopened_store_stays_initialized() {
    let path = temp_db_path("reopen");

    let store = Store::open(&path).await.unwrap();
    ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();
    let settings_before = store.list_settings().await.unwrap();
    store.close().await.unwrap();

    let store = Store::open(&path).await.unwrap();
    let result = ensure_bootstrapped(&store, &brand_defaults()).await.unwrap();

    assert_eq!(result, BootstrapResult::AlreadyInitialized { admin_count: 1 });
    assert_eq!(store.list_settings().await.unwrap(), settings_before);
}

#[tokio::test]
async fn each_failing_capability_is_named_and_writes_nothing() {
    let cases: [(&str, &str, fn(&mut BootstrapDefaults)); 3] = [
        ("identity_generator", "identity pool exhausted", |d| {
            d.identity_generator = Arc::new(ExhaustedIds);
        }),
        ("salt_generator", "entropy source unavailable", |d| {
            d.salt_generator = Arc::new(NoEntropy);
        }),
        ("clock", "clock before epoch", |d| d.clock = Arc::new(BrokenClock)),
    ];

    for (expected, cause, break_capability) in cases {
        let store = open_store(expected).await;
        let mut defaults = brand_defaults();
        break_capability(&mut defaults);

        let err = ensure_bootstrapped(&store, &defaults).await.unwrap_err();

        match &err {
            BootstrapError::Capability { capability, .. } => assert_eq!(*capability, expected),
            other => panic!("expected {expected} failure, got {other:?}"),
        }
        assert!(err.to_string().contains(cause), "{expected}: {err}");
        assert!(err.is_retryable());
        assert_eq!(store.count_admins().await.unwrap(), 0);
        assert!(store.list_settings().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn credential_is_trimmed_before_hashing() {
    let store = open_store("trimmed").await;
    let mut defaults = brand_defaults();
    defaults.initial_credential = "  pw \t".to_string();

    ensure_bootstrapped(&store, &defaults).await.unwrap();

    let admin = store
        .get_account_by_pick_name("admin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        admin.pass_hash,
        Sha256PasswordHasher.hash(&admin.pass_salt, "pw").unwrap()
    );

    let hasher = Sha256PasswordHasher;
    for attempt in ["pw", " pw ", "pw\n"] {
        assert!(
            diagnostics::verify_admin_credential(&store, &hasher, "admin", attempt)
                .await
                .unwrap(),
            "{attempt:?} should verify"
        );
    }
    assert!(
        !diagnostics::verify_admin_credential(&store, &hasher, "admin", "p w")
            .await
            .unwrap()
    );
}
