pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;
pub mod services;
pub mod state;

pub use cli::Cli;
pub use config::Config;

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Loads `.env`, then the config named on the command line or found on the
/// default search path.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    if matches!(cli.command, cli::Commands::Init) {
        return Ok(Config::default());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config);
    debug!(storage = %config.general.storage_path, "Starting");

    cli::dispatch(cli, config).await
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    // Logs go to stderr so `export` output on stdout stays clean.
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.general.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
