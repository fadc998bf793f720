use std::sync::Arc;

use clap::Parser;

mod cli;
mod profile;
mod render;
mod service;

#[cfg(test)]
mod tests;

use self::cli::Cli;
use self::service::DictionaryService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = profile::load_config(cli.config.as_deref())?;
    profile::init_logging(config.log_json);

    tracing::debug!("Data directory: {}", config.dictionary.data_dir.display());
    let service = Arc::new(DictionaryService::from_config(&config)?);

    cli::run(cli.command, service).await
}
