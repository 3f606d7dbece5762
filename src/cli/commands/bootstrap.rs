//! Bootstrap command handler

use anyhow::Context;
use std::path::Path;

use crate::config::Config;
use crate::constants;
use crate::db::Store;
use crate::services::{BootstrapDefaults, BootstrapResult, ensure_bootstrapped};

pub async fn cmd_bootstrap(
    config: &Config,
    db: Option<&Path>,
    password: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let credential = password
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .or_else(|| Some(config.bootstrap.initial_password.trim()).filter(|p| !p.is_empty()))
        .with_context(|| {
            format!(
                "No initial admin password: pass --password, set {}, or set bootstrap.initial_password",
                constants::env::ADMIN_PASSWORD
            )
        })?;

    let path = super::resolve_db_path(config, db)?;
    let store = Store::open_with_options(&path, config.store_options()).await?;

    let defaults = BootstrapDefaults::from_config(&config.bootstrap, &config.security, credential)?;
    let outcome = ensure_bootstrapped(&store, &defaults).await;
    store.close().await?;
    let result = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        BootstrapResult::Seeded {
            admin_id,
            login_name,
            settings,
            ..
        } => {
            println!("Store bootstrapped: {}", path.display());
            println!("  Admin: {login_name} ({admin_id})");
            if !settings.is_empty() {
                println!("  Settings: {}", settings.join(", "));
            }
        }
        BootstrapResult::AlreadyInitialized { admin_count } => {
            println!("Store already initialized ({admin_count} admin account(s)), nothing to do.");
        }
    }

    Ok(())
}
