use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use vecosy_refs::Reference;
use vecosy_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::snapshot::Snapshot;
use crate::traits::{FetchOutcome, ObjectStoreAdapter};

/// Name given to the upstream of a cloned store.
pub const DEFAULT_REMOTE: &str = "origin";

const HEADS: &str = "refs/heads/";
const TAGS: &str = "refs/tags/";

struct Remote {
    name: String,
    upstream: Arc<InMemoryObjectStore>,
    reachable: AtomicBool,
}

/// In-memory snapshot history.
///
/// Holds committed snapshots keyed by identity and a flat map of canonical
/// reference names. A store created with [`InMemoryObjectStore::clone_from`]
/// tracks an upstream store: fetching mirrors the upstream's branches into
/// `refs/remotes/origin/*` and its tags into `refs/tags/*`.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Arc<Snapshot>>>,
    refs: RwLock<BTreeMap<String, ObjectId>>,
    remote: Option<Remote>,
    reads: AtomicU64,
}

impl InMemoryObjectStore {
    /// Open an empty store with no upstream.
    pub fn open() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            refs: RwLock::new(BTreeMap::new()),
            remote: None,
            reads: AtomicU64::new(0),
        }
    }

    /// Clone `upstream`: the new store tracks it as `origin` and performs an
    /// initial fetch.
    pub fn clone_from(upstream: Arc<InMemoryObjectStore>) -> StoreResult<Self> {
        let store = Self {
            remote: Some(Remote {
                name: DEFAULT_REMOTE.to_string(),
                upstream,
                reachable: AtomicBool::new(true),
            }),
            ..Self::open()
        };
        store.fetch_from_remote()?;
        Ok(store)
    }

    /// Store a snapshot and return its identity. Idempotent.
    pub fn commit(&self, snapshot: Snapshot) -> ObjectId {
        let id = snapshot.id();
        self.objects
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(snapshot));
        id
    }

    /// The snapshot stored under `id`.
    pub fn snapshot(&self, id: &ObjectId) -> Option<Arc<Snapshot>> {
        self.objects.read().get(id).cloned()
    }

    /// Point `refs/heads/{branch}` at a committed snapshot.
    pub fn set_branch(&self, branch: &str, target: ObjectId) -> StoreResult<()> {
        self.set_ref(format!("{HEADS}{branch}"), target)
    }

    /// Point `refs/tags/{tag}` at a committed snapshot.
    pub fn set_tag(&self, tag: &str, target: ObjectId) -> StoreResult<()> {
        self.set_ref(format!("{TAGS}{tag}"), target)
    }

    /// Remove a reference by canonical name. Returns `true` if it existed.
    pub fn delete_ref(&self, name: &str) -> bool {
        self.refs.write().remove(name).is_some()
    }

    /// Current target of a reference by canonical name.
    pub fn ref_target(&self, name: &str) -> Option<ObjectId> {
        self.refs.read().get(name).copied()
    }

    /// Simulate losing (or regaining) connectivity to the upstream.
    pub fn set_remote_reachable(&self, reachable: bool) {
        if let Some(remote) = &self.remote {
            remote.reachable.store(reachable, Ordering::Release);
        }
    }

    /// Number of `read_file` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    fn set_ref(&self, name: String, target: ObjectId) -> StoreResult<()> {
        if !self.objects.read().contains_key(&target) {
            return Err(StoreError::ObjectNotFound(target));
        }
        self.refs.write().insert(name, target);
        Ok(())
    }

    fn fetch_from_remote(&self) -> StoreResult<FetchOutcome> {
        let remote = self.remote.as_ref().ok_or(StoreError::NoRemote)?;
        if !remote.reachable.load(Ordering::Acquire) {
            return Err(StoreError::RemoteUnavailable {
                remote: remote.name.clone(),
                reason: "connection refused".into(),
            });
        }

        let tracking_prefix = format!("refs/remotes/{}/", remote.name);
        let wanted: BTreeMap<String, ObjectId> = remote
            .upstream
            .refs
            .read()
            .iter()
            .filter_map(|(name, id)| {
                if let Some(branch) = name.strip_prefix(HEADS) {
                    Some((format!("{tracking_prefix}{branch}"), *id))
                } else if name.starts_with(TAGS) {
                    Some((name.clone(), *id))
                } else {
                    None
                }
            })
            .collect();

        {
            let upstream_objects = remote.upstream.objects.read();
            let mut objects = self.objects.write();
            for id in wanted.values() {
                if let Some(snapshot) = upstream_objects.get(id) {
                    objects.entry(*id).or_insert_with(|| Arc::clone(snapshot));
                }
            }
        }

        let mut refs = self.refs.write();
        let stale: Vec<String> = refs
            .keys()
            .filter(|name| name.starts_with(&tracking_prefix) && !wanted.contains_key(*name))
            .cloned()
            .collect();
        let mut changed = stale.len();
        for name in stale {
            debug!(reference = %name, "pruning remote-tracking ref");
            refs.remove(&name);
        }
        for (name, id) in wanted {
            if refs.insert(name, id) != Some(id) {
                changed += 1;
            }
        }

        if changed == 0 {
            Ok(FetchOutcome::AlreadyUpToDate)
        } else {
            debug!(remote = %remote.name, changed, "fetched ref updates");
            Ok(FetchOutcome::Updated)
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::open()
    }
}

#[async_trait]
impl ObjectStoreAdapter for InMemoryObjectStore {
    async fn list_references(&self) -> StoreResult<Vec<Reference>> {
        Ok(self
            .refs
            .read()
            .iter()
            .filter_map(|(name, id)| Reference::from_canonical(name.clone(), *id))
            .collect())
    }

    async fn fetch(&self) -> StoreResult<FetchOutcome> {
        self.fetch_from_remote()
    }

    async fn read_file(&self, reference: &Reference, path: &str) -> StoreResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let snapshot = self
            .snapshot(&reference.target)
            .ok_or(StoreError::ObjectNotFound(reference.target))?;
        snapshot
            .get(path)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| StoreError::FileNotFound {
                reference: reference.name.clone(),
                path: path.to_string(),
            })
    }

    async fn resolve_commit_identity(&self, reference: &Reference) -> StoreResult<ObjectId> {
        if self.objects.read().contains_key(&reference.target) {
            Ok(reference.target)
        } else {
            Err(StoreError::ObjectNotFound(reference.target))
        }
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.objects.read().len())
            .field("ref_count", &self.refs.read().len())
            .field("remote", &self.remote.as_ref().map(|r| r.name.as_str()))
            .finish()
    }
}
