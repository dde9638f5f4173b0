//! The core component index.
//!
//! [`ComponentIndex`] holds every tracked component keyed by its full id
//! string, plus a reverse map from relative path to owning entry so that
//! path lookups are a single map probe. All mutation is in-memory; nothing
//! reaches durable storage until [`ComponentIndex::persist`] is called.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tally_types::{ComponentId, FileRecord, Origin, TypeError};
use tracing::{debug, info, warn};

use crate::conflict::{ConflictWarnings, OverrideScope};
use crate::entry::{ComponentDescriptor, ComponentIndexEntry, PersistedEntry};
use crate::error::{IndexError, IndexResult};
use crate::traits::{IndexSnapshot, IndexStore};

/// Result of reconciling one descriptor against the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Canonical id: the existing entry's id when one matched.
    pub id: ComponentId,
    /// Files from the descriptor that ended up tracked by `id`.
    pub tracked: Vec<FileRecord>,
    /// Whether a new entry was created.
    pub created: bool,
    /// Files taken over from other components, with their previous owner.
    pub reassigned: Vec<(String, ComponentId)>,
}

/// The component index: component id -> tracked files, origin and root dir.
///
/// Every relative path maps to at most one entry. Cloning is cheap enough
/// to stage a whole operation on a copy and swap it in on success.
#[derive(Clone)]
pub struct ComponentIndex {
    entries: BTreeMap<String, ComponentIndexEntry>,
    /// Relative path -> key of the owning entry.
    paths: BTreeMap<String, String>,
    store: Arc<dyn IndexStore>,
}

impl std::fmt::Debug for ComponentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentIndex")
            .field("entries", &self.entries.len())
            .field("paths", &self.paths.len())
            .finish()
    }
}

impl ComponentIndex {
    /// Create an empty index backed by the given store.
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            paths: BTreeMap::new(),
            store,
        }
    }

    /// Load the index from its store. An empty store yields an empty index.
    pub fn load(store: Arc<dyn IndexStore>) -> IndexResult<Self> {
        let snapshot = store.load()?.unwrap_or_default();
        let mut index = Self::new(store);
        for (key, persisted) in snapshot {
            let id: ComponentId = key.parse().map_err(|e: TypeError| IndexError::Corrupt {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            let mut entry = persisted.into_entry(id);
            entry.files = entry
                .files
                .into_iter()
                .map(FileRecord::with_derived_name)
                .collect();
            index.insert(entry)?;
        }
        info!(entries = index.len(), "loaded component index");
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, ordered by id string.
    pub fn entries(&self) -> impl Iterator<Item = &ComponentIndexEntry> {
        self.entries.values()
    }

    /// Exact lookup by full id.
    pub fn get(&self, id: &ComponentId) -> Option<&ComponentIndexEntry> {
        self.entries.get(&id.to_string())
    }

    /// The id of the component tracking `relative_path`, if any.
    pub fn lookup_by_path(&self, relative_path: &str) -> Option<&ComponentId> {
        self.owner_of(relative_path).map(|entry| &entry.id)
    }

    /// The entry tracking `relative_path`, if any.
    pub fn owner_of(&self, relative_path: &str) -> Option<&ComponentIndexEntry> {
        self.paths
            .get(relative_path)
            .and_then(|key| self.entries.get(key))
    }

    /// The entry that was added from directory `root_dir`, if any.
    pub fn lookup_by_root_dir(&self, root_dir: &str) -> Option<&ComponentIndexEntry> {
        self.entries
            .values()
            .find(|entry| entry.root_dir.as_deref() == Some(root_dir))
    }

    /// Look up an entry by id.
    ///
    /// An exact match always wins. With `allow_fuzzy`, entries sharing the
    /// namespace and name are also considered and the most specific one is
    /// returned: versioned beats unversioned, then the greatest version.
    pub fn lookup_by_id(&self, id: &ComponentId, allow_fuzzy: bool) -> Option<&ComponentIndexEntry> {
        self.resolve_key(id, allow_fuzzy)
            .and_then(|key| self.entries.get(&key))
    }

    fn resolve_key(&self, id: &ComponentId, allow_fuzzy: bool) -> Option<String> {
        let exact = id.to_string();
        if self.entries.contains_key(&exact) {
            return Some(exact);
        }
        if !allow_fuzzy {
            return None;
        }
        self.entries
            .values()
            .filter(|entry| entry.id.same_box_and_name(id))
            .max_by_key(|entry| entry.id.version().map(str::to_owned))
            .map(|entry| entry.id.to_string())
    }

    /// Insert or replace an entry wholesale.
    ///
    /// Used when loading and by operations that own an entry outright
    /// (imports, dependency resolution). Fails if any of the entry's files
    /// is tracked by a different entry.
    pub fn insert(&mut self, entry: ComponentIndexEntry) -> IndexResult<()> {
        let key = entry.id.to_string();
        let paths: Vec<String> = entry.file_paths().map(str::to_owned).collect();

        for path in &paths {
            if let Some(owner) = self.paths.get(path) {
                if *owner != key {
                    return Err(IndexError::DuplicatePath {
                        path: path.clone(),
                        first: owner.clone(),
                        second: key,
                    });
                }
            }
        }

        if let Some(old) = self.entries.remove(&key) {
            for path in old.file_paths() {
                self.paths.remove(path);
            }
        }
        for path in paths {
            self.paths.insert(path, key.clone());
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Reconcile a descriptor against the index.
    ///
    /// - No matching entry (exact or fuzzy): a new entry is created with
    ///   `origin`, unless every file was skipped as a conflict.
    /// - Matching `Nested` entry: [`IndexError::NestedOwnership`].
    /// - Otherwise files are merged in. When the descriptor and the entry
    ///   share a `root_dir`, the entry's file set is replaced instead.
    ///
    /// A file tracked by another component is skipped and recorded in
    /// `warnings`, unless `overrides` covers it, in which case it is moved.
    /// Moving a file out of a `Nested` entry is
    /// [`IndexError::NestedFile`]. Errors leave the index untouched.
    pub fn upsert(
        &mut self,
        descriptor: ComponentDescriptor,
        origin: Origin,
        overrides: &OverrideScope,
        warnings: &mut ConflictWarnings,
    ) -> IndexResult<UpsertOutcome> {
        let existing_key = self.resolve_key(&descriptor.id, true);
        let id = match existing_key.as_ref().and_then(|key| self.entries.get(key)) {
            Some(entry) if !entry.origin.is_user_editable() => {
                return Err(IndexError::NestedOwnership {
                    id: entry.id.to_string(),
                })
            }
            Some(entry) => entry.id.clone(),
            None => descriptor.id.clone(),
        };
        let key = id.to_string();

        let mut accepted = Vec::new();
        let mut reassign = Vec::new();
        let mut skipped = Vec::new();
        let mut seen = BTreeSet::new();
        for file in descriptor.files {
            if !seen.insert(file.relative_path.clone()) {
                continue;
            }
            let owner = self
                .paths
                .get(&file.relative_path)
                .filter(|owner_key| **owner_key != key)
                .and_then(|owner_key| self.entries.get(owner_key));
            match owner {
                Some(owner) if overrides.covers(&file.relative_path) => {
                    if !owner.origin.is_user_editable() {
                        return Err(IndexError::NestedFile {
                            path: file.relative_path,
                            owner: owner.id.to_string(),
                        });
                    }
                    reassign.push((file.relative_path.clone(), owner.id.clone()));
                    accepted.push(file);
                }
                Some(owner) => {
                    warn!(
                        id = %id,
                        path = %file.relative_path,
                        owner = %owner.id,
                        "file already tracked by another component, skipping"
                    );
                    skipped.push(file.relative_path);
                }
                None => accepted.push(file),
            }
        }
        for path in skipped {
            warnings.record(&id, path);
        }

        let created = existing_key.is_none();
        if created && accepted.is_empty() {
            return Ok(UpsertOutcome {
                id,
                tracked: Vec::new(),
                created: false,
                reassigned: Vec::new(),
            });
        }

        for (path, previous) in &reassign {
            if let Some(owner) = self.entries.get_mut(&previous.to_string()) {
                owner.remove_file(path);
            }
            self.paths.remove(path);
            debug!(path = %path, from = %previous, to = %id, "reassigned file");
        }

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| ComponentIndexEntry::new(id.clone(), origin));

        let replace = !created
            && descriptor.root_dir.is_some()
            && entry.root_dir == descriptor.root_dir;
        if replace {
            let keep: BTreeSet<&str> = accepted.iter().map(|f| f.relative_path.as_str()).collect();
            for dropped in entry.files.iter().filter(|f| !keep.contains(f.relative_path.as_str())) {
                self.paths.remove(&dropped.relative_path);
            }
            entry.files = accepted.clone();
        } else {
            for file in &accepted {
                match entry
                    .files
                    .iter_mut()
                    .find(|existing| existing.relative_path == file.relative_path)
                {
                    Some(existing) => existing.is_test |= file.is_test,
                    None => entry.files.push(file.clone()),
                }
            }
        }

        if descriptor.root_dir.is_some() {
            entry.root_dir = descriptor.root_dir;
        }
        if let Some(main) = descriptor.main_file {
            if entry.has_file(&main) {
                entry.main_file = Some(main);
            }
        }
        if let Some(main) = entry.main_file.clone() {
            if !entry.has_file(&main) {
                entry.main_file = None;
            }
        }

        for file in &accepted {
            self.paths.insert(file.relative_path.clone(), key.clone());
        }

        debug!(
            id = %id,
            created,
            files = accepted.len(),
            reassigned = reassign.len(),
            "upserted component"
        );
        Ok(UpsertOutcome {
            id,
            tracked: accepted,
            created,
            reassigned: reassign,
        })
    }

    /// The full persisted form of the index.
    pub fn snapshot(&self) -> IndexSnapshot {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), PersistedEntry::from(entry)))
            .collect()
    }

    /// Write the whole index to its store.
    pub fn persist(&self) -> IndexResult<()> {
        self.store.save(&self.snapshot())?;
        info!(entries = self.len(), "persisted component index");
        Ok(())
    }
}
