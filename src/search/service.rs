use crate::bookmarks::LinkStore;
use crate::completion::CompletionProvider;
use crate::history::HistoryStore;
use crate::search::{assemble, build_prompt, candidates, matched_ids, SearchResults};
use std::sync::Arc;

/// Errors that can terminate a search request.
///
/// Malformed completions are deliberately absent: the parser degrades them to
/// an empty match list, so they never cross this boundary.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No completion provider is configured; permanent until an admin sets
    /// credentials
    #[error("no completion provider is configured")]
    NotConfigured,

    /// Empty or whitespace-only query
    #[error("search query is required")]
    InvalidQuery,

    /// The completion call failed (transport, provider error, timeout).
    /// Single attempt, no retries; details go to the log, not the caller.
    #[error("completion provider failed")]
    Provider(#[source] anyhow::Error),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Terminal success states, kept apart so the API layer can word its
/// responses like the result tabs the UI shows.
#[derive(Debug)]
pub enum SearchOutcome {
    /// The user has no visible links at all; no completion call was made
    EmptyCorpus,
    /// The full pipeline ran; the result set may still be empty
    Ranked(SearchResults),
}

impl SearchOutcome {
    pub fn into_results(self) -> SearchResults {
        match self {
            SearchOutcome::EmptyCorpus => SearchResults::default(),
            SearchOutcome::Ranked(results) => results,
        }
    }
}

/// Orchestrates one search request end to end. Stateless between requests;
/// every `search` call runs the pipeline fresh against the stores.
pub struct SearchService {
    provider: Option<Box<dyn CompletionProvider>>,
    store: Arc<dyn LinkStore>,
    history: Arc<dyn HistoryStore>,
}

impl SearchService {
    pub fn new(
        provider: Option<Box<dyn CompletionProvider>>,
        store: Arc<dyn LinkStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            provider,
            store,
            history,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Run the pipeline for one query.
    ///
    /// Precondition failures (no provider, blank query) return before any
    /// store or network access. Provider failures are caught here and never
    /// produce partial results. Every successful submission lands in the
    /// user's search history.
    pub fn search(&self, user_id: u64, query: &str) -> Result<SearchOutcome, SearchError> {
        let Some(provider) = self.provider.as_ref() else {
            return Err(SearchError::NotConfigured);
        };

        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }

        let corpus = candidates(self.store.as_ref(), user_id)?;
        if corpus.is_empty() {
            log::debug!("user {user_id} has no visible links, skipping completion");
            self.record_history(user_id, query);
            return Ok(SearchOutcome::EmptyCorpus);
        }

        let prompt = build_prompt(query, &corpus);
        log::debug!(
            "asking {} to rank {} candidates",
            provider.name(),
            corpus.len()
        );

        let raw = provider.complete(&prompt).map_err(|err| {
            log::error!("completion provider {} failed: {err:?}", provider.name());
            SearchError::Provider(err)
        })?;

        let ids = matched_ids(&raw);
        let results = assemble(self.store.as_ref(), user_id, &ids)?;

        log::info!(
            "search for user {user_id} matched {} of {} candidates",
            ids.len(),
            corpus.len()
        );

        self.record_history(user_id, query);
        Ok(SearchOutcome::Ranked(results))
    }

    /// History is best-effort bookkeeping; a failure here must not fail the
    /// search that already succeeded.
    fn record_history(&self, user_id: u64, query: &str) {
        if let Err(err) = self.history.add(user_id, query) {
            log::warn!("failed to record search history for user {user_id}: {err:?}");
        }
    }
}
