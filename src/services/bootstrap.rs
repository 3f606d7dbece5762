//! First-run seeding of the administrator account and default settings.
//!
//! [`ensure_bootstrapped`] counts admins and writes the seed inside a single
//! transaction. A store that already has an admin is left untouched, and a
//! failed attempt leaves the store exactly as it was, so callers may retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr, SqlErr, TransactionTrait};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::constants;
use crate::db::{AccountRecord, AccountRepository, SettingsRepository, Store};
use crate::entities::auth_accounts::AccountRole;
use crate::services::capabilities::{
    self, Clock, IdentityGenerator, PasswordHasher, RandomSaltGenerator, SaltGenerator,
    SystemClock, UuidIdentityGenerator,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from a bootstrap attempt. In every case the transaction has been
/// rolled back and nothing was written.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid bootstrap defaults: {0}")]
    InvalidDefaults(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{capability} failed: {source}")]
    Capability {
        capability: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl BootstrapError {
    fn capability(capability: &'static str, err: anyhow::Error) -> Self {
        Self::Capability {
            capability,
            source: err.into(),
        }
    }

    /// Whether the attempt reached the store. Only these are worth a recount.
    const fn is_store_error(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_) | Self::Database(_))
    }

    /// Invalid defaults will fail the same way again; everything else may not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidDefaults(_))
    }
}

impl From<DbErr> for BootstrapError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::ConstraintViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::ConstraintViolation(msg),
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Outcome of [`ensure_bootstrapped`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapResult {
    /// An admin already existed; nothing was written.
    AlreadyInitialized { admin_count: u64 },

    /// The admin account and seed settings were committed together.
    Seeded {
        admin_id: String,
        login_name: String,
        settings: Vec<String>,
        seeded_at: i64,
    },
}

impl BootstrapResult {
    #[must_use]
    pub const fn was_seeded(&self) -> bool {
        matches!(self, Self::Seeded { .. })
    }
}

/// What to seed and the capabilities used to build it.
#[derive(Clone)]
pub struct BootstrapDefaults {
    pub admin_login_name: String,
    pub admin_display_name: String,
    /// Where this comes from is the caller's policy
    pub initial_credential: String,
    pub seed_settings: BTreeMap<String, String>,
    pub identity_generator: Arc<dyn IdentityGenerator>,
    pub salt_generator: Arc<dyn SaltGenerator>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

impl BootstrapDefaults {
    /// Production capabilities with values from config.
    pub fn from_config(
        bootstrap: &BootstrapConfig,
        security: &SecurityConfig,
        initial_credential: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            admin_login_name: bootstrap.admin_login_name.trim().to_string(),
            admin_display_name: bootstrap.admin_display_name.trim().to_string(),
            initial_credential: initial_credential.into(),
            seed_settings: bootstrap.seed_settings.clone(),
            identity_generator: Arc::new(UuidIdentityGenerator),
            salt_generator: Arc::new(RandomSaltGenerator),
            password_hasher: capabilities::password_hasher_for(security)?,
            clock: Arc::new(SystemClock),
        })
    }

    fn validate(&self) -> Result<(), BootstrapError> {
        if self.admin_login_name.trim().is_empty() {
            return Err(BootstrapError::InvalidDefaults(
                "admin login name is empty".to_string(),
            ));
        }
        if self.admin_display_name.trim().is_empty() {
            return Err(BootstrapError::InvalidDefaults(
                "admin display name is empty".to_string(),
            ));
        }
        if self.initial_credential.trim().is_empty() {
            return Err(BootstrapError::InvalidDefaults(
                "initial credential is empty".to_string(),
            ));
        }
        if self.seed_settings.keys().any(|k| k.trim().is_empty()) {
            return Err(BootstrapError::InvalidDefaults(
                "seed setting key is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Seeds the admin account and default settings unless an admin exists.
///
/// The admin count and all writes share one transaction. When a write is
/// rejected, admins are counted again outside the failed transaction: a
/// concurrent caller that committed first turns the failure into
/// [`BootstrapResult::AlreadyInitialized`].
pub async fn ensure_bootstrapped(
    store: &Store,
    defaults: &BootstrapDefaults,
) -> Result<BootstrapResult, BootstrapError> {
    defaults.validate()?;

    match seed_in_transaction(&store.conn, defaults).await {
        Ok(result) => {
            match &result {
                BootstrapResult::Seeded {
                    admin_id, settings, ..
                } => info!(
                    admin_id = %admin_id,
                    settings = settings.len(),
                    "Store bootstrapped"
                ),
                BootstrapResult::AlreadyInitialized { admin_count } => {
                    debug!(admin_count, "Store already bootstrapped");
                }
            }
            Ok(result)
        }
        Err(err) if err.is_store_error() => {
            let recount = AccountRepository::new(&store.conn).count_admins().await;
            settle_failed_write(err, recount)
        }
        Err(err) => {
            warn!("Bootstrap failed and was rolled back: {err}");
            Err(err)
        }
    }
}

/// Decides a rolled-back write from a recount taken outside the transaction.
/// The write error is what surfaces unless another caller committed an admin.
fn settle_failed_write(
    err: BootstrapError,
    recount: Result<u64, DbErr>,
) -> Result<BootstrapResult, BootstrapError> {
    match recount {
        Ok(admin_count) if admin_count > 0 => {
            info!(
                admin_count,
                "Bootstrap lost to a concurrent initializer: {err}"
            );
            Ok(BootstrapResult::AlreadyInitialized { admin_count })
        }
        Ok(_) => {
            warn!("Bootstrap failed and was rolled back: {err}");
            Err(err)
        }
        Err(recount_err) => {
            warn!("Bootstrap failed and was rolled back: {err}");
            warn!("Recounting admins after the failure also failed: {recount_err}");
            Err(err)
        }
    }
}

async fn seed_in_transaction(
    conn: &DatabaseConnection,
    defaults: &BootstrapDefaults,
) -> Result<BootstrapResult, BootstrapError> {
    let txn = conn.begin().await?;

    match seed(&txn, defaults).await {
        Ok(result @ BootstrapResult::Seeded { .. }) => {
            txn.commit().await?;
            Ok(result)
        }
        Ok(result) => {
            txn.rollback().await?;
            Ok(result)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("Rollback after failed bootstrap also failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

async fn seed<C: sea_orm::ConnectionTrait>(
    conn: &C,
    defaults: &BootstrapDefaults,
) -> Result<BootstrapResult, BootstrapError> {
    let accounts = AccountRepository::new(conn);

    let admin_count = accounts.count_admins().await?;
    if admin_count > 0 {
        return Ok(BootstrapResult::AlreadyInitialized { admin_count });
    }

    let admin_id = defaults
        .identity_generator
        .generate()
        .map_err(|e| BootstrapError::capability("identity_generator", e))?;
    let salt = defaults
        .salt_generator
        .generate()
        .map_err(|e| BootstrapError::capability("salt_generator", e))?;
    let now = defaults
        .clock
        .now()
        .map_err(|e| BootstrapError::capability("clock", e))?;

    // Argon2 is CPU heavy, keep it off the async workers.
    // The application's login trims the password before hashing.
    let hasher = Arc::clone(&defaults.password_hasher);
    let hash_salt = salt.clone();
    let credential = defaults.initial_credential.trim().to_string();
    let pass_hash = tokio::task::spawn_blocking(move || hasher.hash(&hash_salt, &credential))
        .await
        .map_err(|e| {
            BootstrapError::capability(
                "password_hasher",
                anyhow::anyhow!("Password hashing task panicked: {e}"),
            )
        })?
        .map_err(|e| BootstrapError::capability("password_hasher", e))?;

    accounts
        .insert_account(AccountRecord {
            id: admin_id.clone(),
            pick_name: defaults.admin_login_name.trim().to_string(),
            pass_salt: salt,
            pass_hash,
            role: AccountRole::Admin,
            identity: constants::seed::ADMIN_IDENTITY.to_string(),
            display_name: defaults.admin_display_name.clone(),
            equity: 0.0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let settings = SettingsRepository::new(conn);
    for (key, value) in &defaults.seed_settings {
        settings.upsert_setting(key, value, now).await?;
    }

    Ok(BootstrapResult::Seeded {
        admin_id,
        login_name: defaults.admin_login_name.trim().to_string(),
        settings: defaults.seed_settings.keys().cloned().collect(),
        seeded_at: now,
    })
}
