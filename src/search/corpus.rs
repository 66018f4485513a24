use crate::bookmarks::{LinkCandidate, LinkStore};
use crate::search::CORPUS_LIMIT;

/// Fetch the candidate corpus for a user: their most recently created visible
/// links, newest first, capped at [`CORPUS_LIMIT`]. Recency only bounds which
/// links are considered; relevance ordering is entirely up to the model.
///
/// An empty corpus is a valid outcome, not an error; the caller short-circuits
/// to an empty result set without touching the completion provider.
pub fn candidates(store: &dyn LinkStore, user_id: u64) -> anyhow::Result<Vec<LinkCandidate>> {
    store.recent_candidates(user_id, CORPUS_LIMIT)
}
