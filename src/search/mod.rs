//! Natural-language bookmark search.
//!
//! One request flows strictly in sequence: fetch the bounded candidate
//! corpus, render it into a single ranking prompt, run the completion,
//! parse the returned id list, then re-fetch and partition the matches.
//!
//! - `corpus`: bounded, permission-filtered candidate fetch
//! - `prompt`: prompt construction
//! - `parse`: defensive completion parsing
//! - `assemble`: re-fetch, ordering, partitioning, enrichment
//! - `service`: orchestration and the error boundary

mod assemble;
mod corpus;
mod parse;
mod prompt;
mod service;

pub use assemble::{assemble, Counts, SearchResults};
pub use corpus::candidates;
pub use parse::matched_ids;
pub use prompt::build_prompt;
pub use service::{SearchError, SearchOutcome, SearchService};

/// Upper bound on candidates handed to the model per request
pub const CORPUS_LIMIT: usize = 200;
