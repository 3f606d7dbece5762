pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod paths;
pub mod services;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use db::{Store, StoreError, StoreOptions};
pub use services::{BootstrapDefaults, BootstrapError, BootstrapResult, ensure_bootstrapped};

use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config.general);

    match cli.command {
        Commands::Bootstrap { db, password, json } => {
            cli::commands::cmd_bootstrap(&config, db.as_deref(), password.as_deref(), json).await
        }

        Commands::Check { db, json } => cli::commands::cmd_check(&config, db.as_deref(), json).await,

        Commands::Verify {
            db,
            login,
            password,
        } => cli::commands::cmd_verify(&config, db.as_deref(), &login, &password).await,

        Commands::Path => cli::commands::cmd_path(&config),

        Commands::InitConfig { path } => cli::commands::cmd_init_config(path.as_deref()),
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(general: &config::GeneralConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);

    if general.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }
}
