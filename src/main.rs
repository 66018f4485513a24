use std::sync::Arc;

use anyhow::bail;
use clap::Parser;

mod auth;
mod bookmarks;
mod cli;
mod completion;
mod config;
mod history;
mod search;
#[cfg(test)]
mod tests;
mod web;

use bookmarks::LinkStore;
use history::HistoryStore;
use search::SearchService;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    let config = config::Config::load_with(&args.data_dir);

    let store: Arc<dyn LinkStore> = Arc::new(bookmarks::BackendJson::load(&args.data_dir)?);
    let history: Arc<dyn HistoryStore> = Arc::new(history::BackendJson::load(&args.data_dir)?);

    let provider = completion::from_config(&config.ai);
    if let Some(provider) = &provider {
        log::info!("AI search backed by {}", provider.name());
    } else {
        log::warn!("no completion provider configured; AI search is disabled");
    }

    let service = Arc::new(SearchService::new(
        provider,
        store.clone(),
        history.clone(),
    ));

    match args.command {
        cli::Command::Daemon {} => {
            let state = web::AppState {
                search: service,
                store,
                history,
                auth: auth::ApiAuth::new(config.auth_token.clone()),
            };
            web::start_daemon(state, &config.listen_addr);
            Ok(())
        }

        cli::Command::Search { query } => {
            if !service.is_configured() {
                bail!("AI search is not configured; set up a provider in config.yaml or the environment");
            }

            let results = service.search(args.user, &query)?.into_results();

            println!("{}", serde_json::to_string_pretty(&results).unwrap());
            Ok(())
        }

        cli::Command::History { action } => match action {
            cli::HistoryAction::List {} => {
                let entries = history.list(args.user)?;
                println!("{}", serde_json::to_string_pretty(&entries).unwrap());
                Ok(())
            }
            cli::HistoryAction::Clear {} => {
                history.clear(args.user)?;
                println!("search history cleared");
                Ok(())
            }
        },
    }
}
