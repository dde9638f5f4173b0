//! Inputs to the add resolver.

use std::path::{Path, PathBuf};

use tally_paths::IgnoreRules;
use tally_types::{Origin, DEFAULT_NAMESPACE};

/// What the user asked to track.
#[derive(Clone, Debug, Default)]
pub struct AddRequest {
    /// Files, directories or glob patterns, relative to the working directory.
    pub paths: Vec<PathBuf>,
    /// Explicit component id; collapses every path into one component.
    pub id: Option<String>,
    /// Namespace for derived ids and for an explicit id given without one.
    pub namespace: Option<String>,
    /// Test-file templates, e.g. `{dir}/{name}.test.js`.
    pub tests: Vec<String>,
    /// Exclude patterns.
    pub excludes: Vec<String>,
    /// Main-file template, e.g. `{dir}/index.js`.
    pub main: Option<String>,
    /// Reassign files already tracked by other components.
    pub override_all: bool,
    /// Origin given to newly created entries.
    pub origin: Origin,
}

impl AddRequest {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// The workspace an add runs in.
#[derive(Clone, Copy, Debug)]
pub struct AddContext<'a> {
    pub root: &'a Path,
    /// Directory relative user paths are resolved against.
    pub cwd: &'a Path,
    pub ignore: &'a IgnoreRules,
    pub default_namespace: &'a str,
}

impl<'a> AddContext<'a> {
    pub fn new(root: &'a Path, ignore: &'a IgnoreRules) -> Self {
        Self {
            root,
            cwd: root,
            ignore,
            default_namespace: DEFAULT_NAMESPACE,
        }
    }

    pub fn with_cwd(mut self, cwd: &'a Path) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn with_default_namespace(mut self, namespace: &'a str) -> Self {
        self.default_namespace = namespace;
        self
    }
}
