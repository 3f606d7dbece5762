//! Platform location of the application's store.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants;

/// `<data dir>/<app identifier>/smarticafe.db`, creating the directory.
pub fn default_database_path(app_identifier: &str) -> Result<PathBuf> {
    let base = dirs::data_dir().context("No platform data directory available")?;
    database_path_in(&base, app_identifier)
}

pub fn database_path_in(base: &Path, app_identifier: &str) -> Result<PathBuf> {
    let dir = base.join(app_identifier);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    Ok(dir.join(constants::store::DATABASE_FILE_NAME))
}
