use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tally_index::{ComponentIndex, IndexSnapshot, IndexStore, JsonFileIndexStore};
use tally_paths::IgnoreRules;
use tally_types::DEFAULT_NAMESPACE;

use crate::config::WorkspaceConfig;

pub const TALLY_DIR: &str = ".tally";
const CONFIG_FILE: &str = "config.toml";
const INDEX_FILE: &str = "index.json";

/// A tally workspace: the directory holding `.tally/`.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
}

impl Workspace {
    /// Create `.tally/` under `root`, keeping any existing config and index.
    pub fn init(root: &Path) -> anyhow::Result<Self> {
        let dir = root.join(TALLY_DIR);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            WorkspaceConfig::default().save(&config_path)?;
        }
        let store = JsonFileIndexStore::new(dir.join(INDEX_FILE));
        if store.load()?.is_none() {
            store.save(&IndexSnapshot::new())?;
        }
        Self::open(root)
    }

    /// Find the nearest ancestor of `start` that holds `.tally/`.
    pub fn discover(start: &Path) -> anyhow::Result<Self> {
        match start.ancestors().find(|dir| dir.join(TALLY_DIR).is_dir()) {
            Some(root) => Self::open(root),
            None => bail!(
                "not a tally workspace (no {TALLY_DIR} directory in {} or any parent); run `tally init`",
                start.display()
            ),
        }
    }

    fn open(root: &Path) -> anyhow::Result<Self> {
        let config = WorkspaceConfig::load(&root.join(TALLY_DIR).join(CONFIG_FILE))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn default_namespace(&self) -> &str {
        self.config
            .default_namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(TALLY_DIR).join(INDEX_FILE)
    }

    pub fn ignore_rules(&self) -> anyhow::Result<IgnoreRules> {
        IgnoreRules::load(&self.root, &self.config.ignore, self.config.use_gitignore)
            .context("loading ignore rules")
    }

    pub fn open_index(&self) -> anyhow::Result<ComponentIndex> {
        let store = Arc::new(JsonFileIndexStore::new(self.index_path()));
        ComponentIndex::load(store)
            .with_context(|| format!("loading {}", self.index_path().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_discover_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Workspace::init(dir.path()).unwrap();
        let nested = dir.path().join("src/ui");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = Workspace::discover(&nested).unwrap();
        assert_eq!(ws.root(), dir.path());
        assert_eq!(ws.default_namespace(), "global");
        assert!(ws.index_path().is_file());
        assert!(ws.open_index().unwrap().is_empty());
    }

    #[test]
    fn discover_outside_workspace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workspace::discover(dir.path()).unwrap_err();
        assert!(err.to_string().contains("tally init"));
    }

    #[test]
    fn init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(TALLY_DIR)).unwrap();
        std::fs::write(
            dir.path().join(TALLY_DIR).join(CONFIG_FILE),
            "default_namespace = \"acme\"\n",
        )
        .unwrap();

        let ws = Workspace::init(dir.path()).unwrap();
        assert_eq!(ws.default_namespace(), "acme");
    }
}
