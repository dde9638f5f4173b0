//! In-memory commit target: a path-keyed node tree behind a mutex, with an
//! op log and injectable failures.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{TargetError, TargetResult};
use crate::target::{CommitTarget, RemoveMode};

/// A node of the in-memory tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

/// One primitive call that changed the in-memory tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetOp {
    Write(PathBuf),
    Remove(PathBuf),
    Prune(PathBuf),
    Symlink { src: PathBuf, dest: PathBuf },
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<PathBuf, Node>,
    log: Vec<TargetOp>,
    failing: BTreeSet<PathBuf>,
}

/// An isolated, in-memory commit target.
///
/// Intended for tests and dry runs. Every effective operation is appended
/// to an ordered log so phase ordering can be observed.
#[derive(Default)]
pub struct InMemoryTarget {
    state: Mutex<State>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (and its parent directories) without logging.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        {
            let mut state = self.state.lock().expect("lock poisoned");
            let path = path.into();
            make_parents(&mut state.nodes, &path);
            state.nodes.insert(path, Node::File(contents.into()));
        }
        self
    }

    /// Make every later operation on `path` fail.
    pub fn fail_on(self, path: impl Into<PathBuf>) -> Self {
        self.state
            .lock()
            .expect("lock poisoned")
            .failing
            .insert(path.into());
        self
    }

    pub fn node(&self, path: impl AsRef<Path>) -> Option<Node> {
        self.state
            .lock()
            .expect("lock poisoned")
            .nodes
            .get(path.as_ref())
            .cloned()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.node(path) {
            Some(Node::File(contents)) => Some(contents),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.node(path).is_some()
    }

    /// The effective operations so far, in order.
    pub fn ops(&self) -> Vec<TargetOp> {
        self.state.lock().expect("lock poisoned").log.clone()
    }

    fn check(state: &State, path: &Path) -> TargetResult<()> {
        if state.failing.contains(path) {
            return Err(TargetError::Rejected {
                path: path.to_path_buf(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    /// Parents must be directories or absent.
    fn check_parents(state: &State, path: &Path) -> TargetResult<()> {
        for ancestor in path.ancestors().skip(1) {
            match state.nodes.get(ancestor) {
                None | Some(Node::Dir) => {}
                Some(_) => return Err(TargetError::NotADirectory(ancestor.to_path_buf())),
            }
        }
        Ok(())
    }
}

fn make_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() || ancestor.parent().is_none() {
            continue;
        }
        nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
}

fn descendants<'a>(
    nodes: &'a BTreeMap<PathBuf, Node>,
    path: &'a Path,
) -> impl Iterator<Item = &'a PathBuf> + 'a {
    nodes
        .range::<Path, _>((Bound::Excluded(path), Bound::Unbounded))
        .map(|(p, _)| p)
        .take_while(move |p| p.starts_with(path))
}

#[async_trait]
impl CommitTarget for InMemoryTarget {
    async fn write_file(&self, path: &Path, contents: &[u8]) -> TargetResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        Self::check(&state, path)?;
        Self::check_parents(&state, path)?;
        if let Some(Node::Dir) = state.nodes.get(path) {
            return Err(TargetError::AlreadyExists(path.to_path_buf()));
        }
        make_parents(&mut state.nodes, path);
        state
            .nodes
            .insert(path.to_path_buf(), Node::File(contents.to_vec()));
        state.log.push(TargetOp::Write(path.to_path_buf()));
        Ok(())
    }

    async fn remove_path(&self, path: &Path, mode: RemoveMode) -> TargetResult<bool> {
        let mut state = self.state.lock().expect("lock poisoned");
        Self::check(&state, path)?;
        let is_dir = match state.nodes.get(path) {
            None => return Ok(false),
            Some(node) => *node == Node::Dir,
        };
        let children: Vec<PathBuf> = descendants(&state.nodes, path).cloned().collect();

        match mode {
            RemoveMode::Any => {
                for child in &children {
                    state.nodes.remove(child);
                }
                state.nodes.remove(path);
                state.log.push(TargetOp::Remove(path.to_path_buf()));
            }
            RemoveMode::EmptyDirOnly => {
                if !is_dir || !children.is_empty() {
                    return Ok(false);
                }
                state.nodes.remove(path);
                state.log.push(TargetOp::Prune(path.to_path_buf()));
            }
        }
        Ok(true)
    }

    async fn symlink(&self, src: &Path, dest: &Path) -> TargetResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        Self::check(&state, dest)?;
        Self::check_parents(&state, dest)?;
        match state.nodes.get(dest) {
            None | Some(Node::Symlink(_)) => {}
            Some(_) => return Err(TargetError::AlreadyExists(dest.to_path_buf())),
        }
        make_parents(&mut state.nodes, dest);
        state
            .nodes
            .insert(dest.to_path_buf(), Node::Symlink(src.to_path_buf()));
        state.log.push(TargetOp::Symlink {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        Ok(())
    }
}
