//! Check command handler

use std::path::Path;

use crate::config::Config;
use crate::services::StoreReport;
use crate::services::diagnostics;

pub async fn cmd_check(config: &Config, db: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = super::resolve_db_path(config, db)?;
    let report = diagnostics::inspect(&path, config.store_options()).await?;

    if json {
        let mut value = serde_json::to_value(&report)?;
        value["bootstrap_required"] = serde_json::Value::Bool(report.bootstrap_required());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Store: {}", path.display());

    match &report {
        StoreReport::Missing { .. } => {
            println!("Database file not found (bootstrap will be required)");
        }
        StoreReport::Present {
            admin_count,
            settings,
            ..
        } => {
            println!("Admin accounts: {admin_count}");
            if settings.is_empty() {
                println!("Settings: (none)");
            } else {
                println!("Settings:");
                for (key, value) in settings {
                    println!("  {key} = {value}");
                }
            }
        }
    }

    println!(
        "Bootstrap required: {}",
        if report.bootstrap_required() { "yes" } else { "no" }
    );

    Ok(())
}
