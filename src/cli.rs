use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "marklens",
    about = "Bookmark backend with natural-language AI search",
    version
)]
pub struct Args {
    /// Directory holding config.yaml and data files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// User to act as for one-shot commands
    #[arg(long, default_value_t = 1, global = true)]
    pub user: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP daemon
    Daemon {},

    /// One-shot natural-language search against the local store
    Search {
        /// Free-text query, e.g. "all my dev tools"
        query: String,
    },

    /// Inspect or clear the search history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Print recent searches, newest first
    List {},
    /// Delete the user's entire search history
    Clear {},
}
