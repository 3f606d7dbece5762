//! Verify command handler

use std::path::Path;

use crate::config::Config;
use crate::db::Store;
use crate::services::{capabilities, diagnostics};

pub async fn cmd_verify(
    config: &Config,
    db: Option<&Path>,
    login: &str,
    password: &str,
) -> anyhow::Result<()> {
    let path = super::resolve_db_path(config, db)?;
    if !Store::exists(&path) {
        anyhow::bail!("Store not found: {}", path.display());
    }

    let store = Store::open_read_only(&path, config.store_options()).await?;
    let hasher = capabilities::password_hasher_for(&config.security)?;
    let matched =
        diagnostics::verify_admin_credential(&store, hasher.as_ref(), login, password).await;
    store.close().await?;

    if matched? {
        println!("Credentials valid for admin '{login}'");
        Ok(())
    } else {
        anyhow::bail!("Credentials rejected for admin '{login}'")
    }
}
