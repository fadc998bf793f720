use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::render;
use crate::service::DictionaryService;

#[derive(Parser, Debug)]
#[command(name = "jisho", about = "Offline Japanese-English dictionary", version)]
pub struct Cli {
    /// JSON config file. Unset fields fall back to environment defaults.
    #[arg(long, global = true, env = "JISHO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Download the latest JMdict release and rebuild the local index.
    Update,
    /// Look up a word written in kanji, kana, romaji or English.
    Search {
        /// Words to search for.
        #[arg(required = true)]
        query: Vec<String>,
        /// Emit JSON instead of a ranked list.
        #[arg(long)]
        json: bool,
        /// Show every sense grouped by part of speech.
        #[arg(long)]
        detail: bool,
    },
    /// Show whether a dictionary is installed.
    Status {
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: Command, service: Arc<DictionaryService>) -> anyhow::Result<()> {
    match command {
        Command::Update => handle_update(service).await,
        Command::Search {
            query,
            json,
            detail,
        } => handle_search(&service, &query.join(" "), json, detail).await,
        Command::Status { json } => handle_status(&service, json).await,
    }
}

async fn handle_update(service: Arc<DictionaryService>) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, cancelling update");
                cancel.cancel();
            }
        }
    });

    let tty = atty::is(atty::Stream::Stderr);
    let outcome = update(&service, &cancel, tty).await;
    ctrl_c.abort();

    println!("{}", outcome?);
    Ok(())
}

/// Run one update with progress rendering.
///
/// Success and cancellation both yield the message to print; cancellation is
/// not reported as an error.
pub(crate) async fn update(
    service: &DictionaryService,
    cancel: &CancellationToken,
    tty: bool,
) -> anyhow::Result<String> {
    let done = CancellationToken::new();
    let progress = tokio::spawn(render::watch_progress(service.subscribe(), tty, done.clone()));

    let report = service.update_dictionary(cancel).await;
    done.cancel();
    if let Err(e) = progress.await {
        tracing::warn!("Progress display task failed: {e}");
    }

    if report.success || report.cancelled {
        Ok(report.message)
    } else {
        anyhow::bail!(report.message)
    }
}

async fn handle_search(
    service: &DictionaryService,
    query: &str,
    as_json: bool,
    detail: bool,
) -> anyhow::Result<()> {
    let hits = service
        .search(query)
        .await
        .context("search failed; run `jisho update` to install the dictionary")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No results for {query:?}");
    } else {
        render::print_results(&hits, detail);
    }
    Ok(())
}

async fn handle_status(service: &DictionaryService, as_json: bool) -> anyhow::Result<()> {
    let metadata = if service.is_dictionary_ready().await {
        service.metadata().await
    } else {
        None
    };

    if as_json {
        let payload = json!({
            "ready": metadata.is_some(),
            "metadata": metadata,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    match metadata {
        Some(m) => {
            println!("Dictionary ready");
            println!("  version: {}", m.version);
            println!("  date:    {}", m.dict_date);
            println!("  entries: {}", m.entry_count);
        }
        None => println!("No dictionary installed. Run `jisho update`."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_search() {
        let cli = Cli::try_parse_from(["jisho", "search", "to", "eat", "--json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Search {
                query: vec!["to".into(), "eat".into()],
                json: true,
                detail: false,
            }
        );
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["jisho", "status", "--config", "jisho.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("jisho.json")));
        assert_eq!(cli.command, Command::Status { json: false });
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Cli::try_parse_from(["jisho", "search"]).is_err());
    }
}
