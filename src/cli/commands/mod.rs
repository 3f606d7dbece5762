mod bootstrap;
mod check;
mod paths;
mod verify;

pub use bootstrap::cmd_bootstrap;
pub use check::cmd_check;
pub use paths::{cmd_init_config, cmd_path};
pub use verify::cmd_verify;

use crate::config::Config;
use std::path::{Path, PathBuf};

fn resolve_db_path(config: &Config, db: Option<&Path>) -> anyhow::Result<PathBuf> {
    db.map_or_else(|| config.database_path(), |path| Ok(path.to_path_buf()))
}
