//! Path and config helpers

use std::path::Path;

use crate::config::Config;

pub fn cmd_path(config: &Config) -> anyhow::Result<()> {
    let path = config.database_path()?;
    println!("{}", path.display());
    Ok(())
}

pub fn cmd_init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_config_path, Path::to_path_buf);

    if Config::create_default_if_missing(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists, left unchanged", path.display());
    }

    Ok(())
}
