use crate::bookmarks::{BackendJson, LinkCreate, LinkStore};
use crate::completion::CompletionProvider;
use crate::history;
use crate::search::SearchService;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

pub const OWNER: u64 = 1;
pub const MEMBER: u64 = 2;
pub const STRANGER: u64 = 3;

/// Completion provider that replays a canned response and counts calls, so
/// tests can assert both what the pipeline does with a completion and
/// whether a completion was requested at all.
pub struct ScriptedProvider {
    response: String,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionProvider for Arc<ScriptedProvider> {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Provider that always fails, standing in for network/provider outages.
pub struct FailingProvider;

impl CompletionProvider for FailingProvider {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("connection refused"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Isolated file-backed store in a unique temp directory. Seeds:
/// - collection 1 "Dev" owned by OWNER, MEMBER as member; links 1..=3
/// - collection 2 "Reading" owned by OWNER; link 4
/// - collection 3 "Private" owned by STRANGER; link 5 (invisible to OWNER)
///
/// Link 1 carries tags "rust" + "tools" (owned by OWNER), link 2 carries
/// "rust", links 3 and 4 are untagged.
pub fn seeded_store() -> (Arc<BackendJson>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let store = BackendJson::load(tmp.path().to_str().unwrap()).expect("failed to load store");

    store
        .create_collection(OWNER, "Dev", vec![MEMBER])
        .unwrap();
    store.create_collection(OWNER, "Reading", vec![]).unwrap();
    store.create_collection(STRANGER, "Private", vec![]).unwrap();

    store
        .create_link(
            OWNER,
            LinkCreate {
                name: "The Rust Book".to_string(),
                url: Some("https://doc.rust-lang.org/book/".to_string()),
                description: Some("learn rust".to_string()),
                tags: vec!["rust".to_string(), "tools".to_string()],
                collection_id: Some(1),
            },
        )
        .unwrap();
    store
        .create_link(
            OWNER,
            LinkCreate {
                name: "crates.io".to_string(),
                url: Some("https://crates.io".to_string()),
                description: None,
                tags: vec!["rust".to_string()],
                collection_id: Some(1),
            },
        )
        .unwrap();
    store
        .create_link(
            OWNER,
            LinkCreate {
                name: "Figma".to_string(),
                url: Some("https://figma.com".to_string()),
                description: Some("design tool".to_string()),
                tags: vec![],
                collection_id: Some(1),
            },
        )
        .unwrap();
    store
        .create_link(
            OWNER,
            LinkCreate {
                name: "A long article".to_string(),
                url: None,
                description: None,
                tags: vec![],
                collection_id: Some(2),
            },
        )
        .unwrap();
    store
        .create_link(
            STRANGER,
            LinkCreate {
                name: "Secret notes".to_string(),
                url: None,
                description: None,
                tags: vec![],
                collection_id: Some(3),
            },
        )
        .unwrap();

    (Arc::new(store), tmp)
}

pub fn history_backend(tmp: &tempfile::TempDir) -> Arc<history::BackendJson> {
    Arc::new(history::BackendJson::load(tmp.path().to_str().unwrap()).unwrap())
}

/// Search service over the seeded store with the given provider.
pub fn service_with(
    provider: Option<Box<dyn CompletionProvider>>,
) -> (SearchService, Arc<BackendJson>, Arc<history::BackendJson>, tempfile::TempDir) {
    let (store, tmp) = seeded_store();
    let history = history_backend(&tmp);
    let service = SearchService::new(provider, store.clone(), history.clone());
    (service, store, history, tmp)
}
