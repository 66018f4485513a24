use crate::bookmarks::{CollectionSummary, LinkStore, MatchedLink, TagSummary};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The four result categories the UI renders, plus per-category counts.
/// Built once per request and discarded after the response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub links: Vec<MatchedLink>,
    pub pins: Vec<MatchedLink>,
    pub collections: Vec<CollectionSummary>,
    pub tags: Vec<TagSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub links: usize,
    pub pins: usize,
    pub collections: usize,
    pub tags: usize,
}

impl SearchResults {
    pub fn counts(&self) -> Counts {
        Counts {
            links: self.links.len(),
            pins: self.pins.len(),
            collections: self.collections.len(),
            tags: self.tags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts() == Counts::default()
    }
}

/// Turn the model's ranked id list into the final result set.
///
/// The ids are untrusted: they are re-fetched under the same visibility
/// filter the corpus used, and ids the store does not return (fabricated, or
/// access revoked since the corpus fetch) are silently dropped. Relevance
/// order is authoritative and survives the re-fetch; the pin partition is
/// stable within it.
pub fn assemble(
    store: &dyn LinkStore,
    user_id: u64,
    matched_ids: &[u64],
) -> anyhow::Result<SearchResults> {
    if matched_ids.is_empty() {
        return Ok(SearchResults::default());
    }

    // dedupe at first occurrence; the list comes from free text
    let mut seen = HashSet::new();
    let ordered: Vec<u64> = matched_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let mut by_id: HashMap<u64, MatchedLink> = store
        .links_by_ids(user_id, &ordered)?
        .into_iter()
        .map(|link| (link.id, link))
        .collect();

    let mut links = Vec::new();
    let mut pins = Vec::new();
    let mut collection_ids = Vec::new();
    let mut tag_ids = Vec::new();

    for id in &ordered {
        let Some(link) = by_id.remove(id) else {
            continue;
        };

        if !collection_ids.contains(&link.collection_id) {
            collection_ids.push(link.collection_id);
        }
        for tag in &link.tags {
            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
            }
        }

        if link.pinned {
            pins.push(link);
        } else {
            links.push(link);
        }
    }

    let collections = if collection_ids.is_empty() {
        Vec::new()
    } else {
        store.collections_by_ids(&collection_ids)?
    };
    let tags = if tag_ids.is_empty() {
        Vec::new()
    } else {
        store.tags_by_ids(user_id, &tag_ids)?
    };

    Ok(SearchResults {
        links,
        pins,
        collections,
        tags,
    })
}
