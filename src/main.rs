use clap::Parser;
use firstrun::{Cli, Config, run};

fn main() -> anyhow::Result<()> {
    // A local .env may carry FIRSTRUN_ADMIN_PASSWORD; it must be loaded before clap reads env.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
