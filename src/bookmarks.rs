use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::PathBuf,
    sync::RwLock,
};

/// Collection auto-created on first link when the user has none.
const DEFAULT_COLLECTION_NAME: &str = "Unsorted";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: u64,

    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,

    pub collection_id: u64,
    pub tag_ids: Vec<u64>,

    /// Users that pinned this link
    pub pinned_by: Vec<u64>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: u64,
    pub name: String,
    pub owner_id: u64,
    pub member_ids: Vec<u64>,
}

impl Collection {
    pub fn visible_to(&self, user_id: u64) -> bool {
        self.owner_id == user_id || self.member_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub owner_id: u64,
}

/// Minimal projection of a link used only for prompting. Built fresh per
/// search request, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCandidate {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

/// Full link record as returned to the search result assembler, with tags
/// resolved and the pin status evaluated for the requesting user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedLink {
    pub id: u64,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub collection_id: u64,
    pub tags: Vec<Tag>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: u64,
    pub name: String,
    /// Total links in the collection, not just the matched ones
    pub link_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub id: u64,
    pub name: String,
    /// Total links carrying the tag, not just the matched ones
    pub link_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCreate {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to the user's first owned collection (created if none exists)
    #[serde(default)]
    pub collection_id: Option<u64>,
}

/// Persistence port for links, collections and tags. The search pipeline only
/// ever sees links through the visibility filter: a link is visible to a user
/// when they own its collection or are a member of it.
pub trait LinkStore: Send + Sync {
    /// Newest-first candidates visible to the user, bounded by `limit`.
    fn recent_candidates(&self, user_id: u64, limit: usize) -> Result<Vec<LinkCandidate>>;

    /// Full records for the given ids, re-applying the visibility filter.
    /// Order of the returned records is unspecified; unknown ids are skipped.
    fn links_by_ids(&self, user_id: u64, ids: &[u64]) -> Result<Vec<MatchedLink>>;

    fn collections_by_ids(&self, ids: &[u64]) -> Result<Vec<CollectionSummary>>;

    /// Tags among `ids` owned by the user.
    fn tags_by_ids(&self, user_id: u64, ids: &[u64]) -> Result<Vec<TagSummary>>;

    fn create_collection(
        &self,
        owner_id: u64,
        name: &str,
        member_ids: Vec<u64>,
    ) -> Result<Collection>;

    fn create_link(&self, user_id: u64, create: LinkCreate) -> Result<Link>;

    /// Pin or unpin a visible link for the user. Returns false when the link
    /// does not exist or is not visible.
    fn set_pinned(&self, user_id: u64, link_id: u64, pinned: bool) -> Result<bool>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    links: Vec<Link>,
    collections: Vec<Collection>,
    tags: Vec<Tag>,

    next_link_id: u64,
    next_collection_id: u64,
    next_tag_id: u64,
}

impl StoreData {
    fn collection(&self, id: u64) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    fn visible(&self, user_id: u64, link: &Link) -> bool {
        self.collection(link.collection_id)
            .map(|c| c.visible_to(user_id))
            .unwrap_or(false)
    }

    fn resolve_tags(&self, link: &Link) -> Vec<Tag> {
        self.tags
            .iter()
            .filter(|t| link.tag_ids.contains(&t.id))
            .cloned()
            .collect()
    }
}

const DATA_FILE: &str = "links.json";

/// JSON-file-backed store. All state lives behind one `RwLock`; mutations
/// rewrite the file before the guard is released.
pub struct BackendJson {
    data: RwLock<StoreData>,
    path: PathBuf,
}

impl BackendJson {
    pub fn load(base_path: &str) -> Result<Self> {
        let path = PathBuf::from(base_path).join(DATA_FILE);

        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            StoreData {
                next_link_id: 1,
                next_collection_id: 1,
                next_tag_id: 1,
                ..Default::default()
            }
        };

        Ok(Self {
            data: RwLock::new(data),
            path,
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreData>> {
        self.data.read().map_err(|_| anyhow!("link store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreData>> {
        self.data.write().map_err(|_| anyhow!("link store lock poisoned"))
    }

    fn persist(&self, data: &StoreData) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}

impl LinkStore for BackendJson {
    fn recent_candidates(&self, user_id: u64, limit: usize) -> Result<Vec<LinkCandidate>> {
        let data = self.read()?;

        // id order tracks creation order; newest first bounds which links are
        // considered, the model re-ranks independently
        let mut links: Vec<&Link> = data
            .links
            .iter()
            .filter(|link| data.visible(user_id, link))
            .collect();
        links.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(links
            .into_iter()
            .take(limit)
            .map(|link| LinkCandidate {
                id: link.id,
                name: link.name.clone(),
                url: link.url.clone(),
                description: link.description.clone(),
                tags: data.resolve_tags(link).into_iter().map(|t| t.name).collect(),
                collection_name: data.collection(link.collection_id).map(|c| c.name.clone()),
            })
            .collect())
    }

    fn links_by_ids(&self, user_id: u64, ids: &[u64]) -> Result<Vec<MatchedLink>> {
        let data = self.read()?;
        let wanted: HashSet<u64> = ids.iter().copied().collect();

        Ok(data
            .links
            .iter()
            .filter(|link| wanted.contains(&link.id) && data.visible(user_id, link))
            .map(|link| MatchedLink {
                id: link.id,
                name: link.name.clone(),
                url: link.url.clone(),
                description: link.description.clone(),
                collection_id: link.collection_id,
                tags: data.resolve_tags(link),
                pinned: link.pinned_by.contains(&user_id),
                created_at: link.created_at,
            })
            .collect())
    }

    fn collections_by_ids(&self, ids: &[u64]) -> Result<Vec<CollectionSummary>> {
        let data = self.read()?;

        Ok(ids
            .iter()
            .filter_map(|id| data.collection(*id))
            .map(|collection| CollectionSummary {
                id: collection.id,
                name: collection.name.clone(),
                link_count: data
                    .links
                    .iter()
                    .filter(|l| l.collection_id == collection.id)
                    .count(),
            })
            .collect())
    }

    fn tags_by_ids(&self, user_id: u64, ids: &[u64]) -> Result<Vec<TagSummary>> {
        let data = self.read()?;

        Ok(ids
            .iter()
            .filter_map(|id| data.tags.iter().find(|t| t.id == *id))
            .filter(|tag| tag.owner_id == user_id)
            .map(|tag| TagSummary {
                id: tag.id,
                name: tag.name.clone(),
                link_count: data
                    .links
                    .iter()
                    .filter(|l| l.tag_ids.contains(&tag.id))
                    .count(),
            })
            .collect())
    }

    fn create_collection(
        &self,
        owner_id: u64,
        name: &str,
        member_ids: Vec<u64>,
    ) -> Result<Collection> {
        let mut data = self.write()?;

        let collection = Collection {
            id: data.next_collection_id,
            name: name.to_string(),
            owner_id,
            member_ids,
        };
        data.next_collection_id += 1;
        data.collections.push(collection.clone());

        self.persist(&data)?;
        Ok(collection)
    }

    fn create_link(&self, user_id: u64, create: LinkCreate) -> Result<Link> {
        let mut data = self.write()?;

        let collection_id = match create.collection_id {
            Some(id) => {
                let collection = data
                    .collection(id)
                    .ok_or_else(|| anyhow!("collection {id} not found"))?;
                if !collection.visible_to(user_id) {
                    return Err(anyhow!("collection {id} not found"));
                }
                id
            }
            None => {
                let owned = data
                    .collections
                    .iter()
                    .find(|c| c.owner_id == user_id)
                    .map(|c| c.id);
                match owned {
                    Some(id) => id,
                    None => {
                        let id = data.next_collection_id;
                        data.next_collection_id += 1;
                        data.collections.push(Collection {
                            id,
                            name: DEFAULT_COLLECTION_NAME.to_string(),
                            owner_id: user_id,
                            member_ids: vec![],
                        });
                        id
                    }
                }
            }
        };

        // tags are user-owned; reuse by name, create the rest
        let mut tag_ids = Vec::with_capacity(create.tags.len());
        for name in &create.tags {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let existing = data
                .tags
                .iter()
                .find(|t| t.owner_id == user_id && t.name == name)
                .map(|t| t.id);
            let id = match existing {
                Some(id) => id,
                None => {
                    let id = data.next_tag_id;
                    data.next_tag_id += 1;
                    data.tags.push(Tag {
                        id,
                        name,
                        owner_id: user_id,
                    });
                    id
                }
            };
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        let link = Link {
            id: data.next_link_id,
            name: create.name,
            url: create.url,
            description: create.description,
            collection_id,
            tag_ids,
            pinned_by: vec![],
            created_at: Utc::now(),
        };
        data.next_link_id += 1;
        data.links.push(link.clone());

        self.persist(&data)?;
        Ok(link)
    }

    fn set_pinned(&self, user_id: u64, link_id: u64, pinned: bool) -> Result<bool> {
        let mut data = self.write()?;

        let Some(idx) = data.links.iter().position(|l| l.id == link_id) else {
            return Ok(false);
        };
        if !data.visible(user_id, &data.links[idx]) {
            return Ok(false);
        }

        let pins = &mut data.links[idx].pinned_by;
        if pinned {
            if !pins.contains(&user_id) {
                pins.push(user_id);
            }
        } else {
            pins.retain(|id| *id != user_id);
        }

        self.persist(&data)?;
        Ok(true)
    }
}
