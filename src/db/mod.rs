use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement,
    sqlx::sqlite::SqliteJournalMode,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants;
use crate::entities::auth_accounts;

pub mod migrator;
pub mod repositories;

pub use repositories::{AccountRecord, AccountRepository, SettingsRepository};

/// Failures of the store accessor. Never retried here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable at {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    fn unavailable(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a statement waits on a lock held by another connection or process
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            busy_timeout: Duration::from_secs(constants::store::BUSY_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    path: PathBuf,
}

impl Store {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_options(path, StoreOptions::default()).await
    }

    /// Opens the SQLite file at `path`, creating the file (but never its
    /// directory) when absent, and applies pending migrations.
    pub async fn open_with_options(path: &Path, options: StoreOptions) -> Result<Self, StoreError> {
        use sea_orm_migration::MigratorTrait;

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            return Err(StoreError::unavailable(
                path,
                format!("parent directory {} does not exist", parent.display()),
            ));
        }

        let busy_timeout = options.busy_timeout;
        let mut opt = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
        opt.max_connections(options.max_connections.max(1))
            .min_connections(options.min_connections.min(options.max_connections))
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(move |opts| {
                opts.busy_timeout(busy_timeout)
                    .journal_mode(SqliteJournalMode::Wal)
            });

        let conn = Database::connect(opt)
            .await
            .map_err(|e| StoreError::unavailable(path, e))?;

        // A corrupt or foreign file is only detected on the first real query.
        migrator::Migrator::up(&conn, None)
            .await
            .map_err(|e| StoreError::unavailable(path, e))?;

        info!("Store opened at {}", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing store without migrating it or changing its journal
    /// mode. Used by inspection, which must leave the file as it found it.
    pub async fn open_read_only(path: &Path, options: StoreOptions) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::unavailable(path, "no store file"));
        }

        let busy_timeout = options.busy_timeout;
        let mut opt = ConnectOptions::new(format!("sqlite:{}?mode=ro", path.display()));
        opt.max_connections(options.max_connections.max(1))
            .min_connections(options.min_connections.min(options.max_connections))
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(move |opts| opts.busy_timeout(busy_timeout).read_only(true));

        let conn = Database::connect(opt)
            .await
            .map_err(|e| StoreError::unavailable(path, e))?;

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store
            .ping()
            .await
            .map_err(|e| StoreError::unavailable(path, e))?;

        debug!("Store opened read-only at {}", path.display());

        Ok(store)
    }

    /// Whether a store file is already present, without creating one.
    #[must_use]
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(self) -> Result<(), StoreError> {
        debug!("Closing store at {}", self.path.display());
        self.conn.close().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Whether `name` exists as a table. Stores written by older releases
    /// may lack tables this crate creates.
    pub async fn has_table(&self, name: &str) -> Result<bool, DbErr> {
        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?",
                [name.into()],
            ))
            .await?;

        Ok(match row {
            Some(row) => row.try_get::<i64>("", "n")? > 0,
            None => false,
        })
    }

    #[must_use]
    pub const fn accounts(&self) -> AccountRepository<'_, DatabaseConnection> {
        AccountRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn settings(&self) -> SettingsRepository<'_, DatabaseConnection> {
        SettingsRepository::new(&self.conn)
    }

    pub async fn count_admins(&self) -> Result<u64, DbErr> {
        self.accounts().count_admins().await
    }

    pub async fn get_account_by_pick_name(
        &self,
        pick_name: &str,
    ) -> Result<Option<auth_accounts::Model>, DbErr> {
        self.accounts().find_by_pick_name(pick_name).await
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, DbErr> {
        self.settings().get_value(key).await
    }

    pub async fn list_settings(&self) -> Result<BTreeMap<String, String>, DbErr> {
        self.settings().list_values().await
    }
}
