//! Read-only inspection of a store: is bootstrap still required, which
//! settings exist, and does a login/credential pair match the seeded admin.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::constants;
use crate::db::{Store, StoreOptions};
use crate::services::capabilities::PasswordHasher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoreReport {
    /// No store file yet; first run will have to bootstrap.
    Missing { path: PathBuf },

    Present {
        path: PathBuf,
        admin_count: u64,
        settings: BTreeMap<String, String>,
    },
}

impl StoreReport {
    #[must_use]
    pub const fn bootstrap_required(&self) -> bool {
        match self {
            Self::Missing { .. } => true,
            Self::Present { admin_count, .. } => *admin_count == 0,
        }
    }
}

/// Inspects the store at `path` without creating, migrating or writing it.
pub async fn inspect(path: &Path, options: StoreOptions) -> Result<StoreReport> {
    if !Store::exists(path) {
        return Ok(StoreReport::Missing {
            path: path.to_path_buf(),
        });
    }

    let store = Store::open_read_only(path, options).await?;
    let report = inspect_store(&store).await;
    store.close().await?;
    report
}

/// A table the store does not have yet reads as empty.
pub async fn inspect_store(store: &Store) -> Result<StoreReport> {
    let admin_count = if store.has_table("auth_accounts").await? {
        store
            .count_admins()
            .await
            .context("Failed to count admin accounts")?
    } else {
        0
    };

    let settings = if store.has_table("kv").await? {
        store
            .list_settings()
            .await
            .context("Failed to read settings")?
    } else {
        BTreeMap::new()
    };

    Ok(StoreReport::Present {
        path: store.path().to_path_buf(),
        admin_count,
        settings,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandSettings {
    pub brand_name: String,
    pub store_name: String,
}

/// Brand and store names, with display fallbacks for stores that never set them.
pub async fn brand_settings(store: &Store) -> Result<BrandSettings> {
    let brand_name = store
        .get_setting(constants::seed::BRAND_NAME_KEY)
        .await
        .context("Failed to read brand_name")?
        .unwrap_or_else(|| constants::fallback::BRAND_NAME.to_string());

    let store_name = store
        .get_setting(constants::seed::STORE_NAME_KEY)
        .await
        .context("Failed to read store_name")?
        .unwrap_or_else(|| constants::fallback::STORE_NAME.to_string());

    Ok(BrandSettings {
        brand_name,
        store_name,
    })
}

/// True when `login` names an active admin whose stored hash matches
/// `credential`. Both are trimmed, as at bootstrap.
pub async fn verify_admin_credential(
    store: &Store,
    hasher: &dyn PasswordHasher,
    login: &str,
    credential: &str,
) -> Result<bool> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Ok(false);
    }

    let accounts = store
        .accounts()
        .find_active_admins(login.trim())
        .await
        .context("Failed to query admin account")?;

    for account in &accounts {
        if hasher.verify(&account.pass_salt, credential, &account.pass_hash)? {
            return Ok(true);
        }
    }

    Ok(false)
}
