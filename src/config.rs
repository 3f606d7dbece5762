use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::constants;
use crate::db::StoreOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub bootstrap: BootstrapConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Store file. Empty means `<platform data dir>/<app_identifier>/smarticafe.db`.
    pub database_path: String,

    /// Directory name under the platform data dir
    pub app_identifier: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 1)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Seconds a statement waits for a lock held by another process
    pub busy_timeout_seconds: u64,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            app_identifier: constants::store::APP_IDENTIFIER.to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 1,
            busy_timeout_seconds: constants::store::BUSY_TIMEOUT_SECS,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_login_name: String,

    pub admin_display_name: String,

    /// Initial admin credential. Prefer `--password` or `FIRSTRUN_ADMIN_PASSWORD`
    /// over keeping it in a file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub initial_password: String,

    /// Settings written once, together with the admin account
    pub seed_settings: BTreeMap<String, String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        let mut seed_settings = BTreeMap::new();
        seed_settings.insert(
            constants::seed::BRAND_NAME_KEY.to_string(),
            constants::seed::BRAND_NAME.to_string(),
        );
        seed_settings.insert(
            constants::seed::STORE_NAME_KEY.to_string(),
            constants::seed::STORE_NAME.to_string(),
        );

        Self {
            admin_login_name: constants::seed::ADMIN_LOGIN_NAME.to_string(),
            admin_display_name: constants::seed::ADMIN_DISPLAY_NAME.to_string(),
            initial_password: String::new(),
            seed_settings,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    /// Hex SHA-256 of `salt:password`, what the application's login checks
    #[default]
    Sha256,
    Argon2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub password_scheme: PasswordScheme,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            password_scheme: PasswordScheme::default(),
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("firstrun").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".firstrun").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` unless a file is already there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bootstrap.admin_login_name.trim().is_empty() {
            anyhow::bail!("bootstrap.admin_login_name cannot be empty");
        }

        if self.bootstrap.admin_display_name.trim().is_empty() {
            anyhow::bail!("bootstrap.admin_display_name cannot be empty");
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("general.max_db_connections must be > 0");
        }

        if self.general.database_path.is_empty() && self.general.app_identifier.trim().is_empty()
        {
            anyhow::bail!("general.app_identifier cannot be empty without general.database_path");
        }

        if self.security.password_scheme == PasswordScheme::Argon2 {
            argon2::Params::new(
                self.security.argon2_memory_cost_kib,
                self.security.argon2_time_cost,
                self.security.argon2_parallelism,
                None,
            )
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        }

        Ok(())
    }

    /// Resolved store location. An explicit path wins over the platform default.
    pub fn database_path(&self) -> Result<PathBuf> {
        let configured = self.general.database_path.trim();
        if configured.is_empty() {
            crate::paths::default_database_path(&self.general.app_identifier)
        } else {
            Ok(PathBuf::from(configured.trim_start_matches("sqlite:")))
        }
    }

    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            max_connections: self.general.max_db_connections,
            min_connections: self.general.min_db_connections,
            busy_timeout: Duration::from_secs(self.general.busy_timeout_seconds),
        }
    }
}
