use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Workspace configuration, read from `.tally/config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Gitignore-style patterns excluded from every expansion, in order.
    pub ignore: Vec<String>,
    /// Also honour `<root>/.gitignore`.
    pub use_gitignore: bool,
    /// Namespace for ids that carry none.
    pub default_namespace: Option<String>,
    /// Test templates applied to every add.
    pub tests: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            use_gitignore: true,
            default_namespace: None,
            tests: Vec::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, WorkspaceConfig::default());
        assert!(config.use_gitignore);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "ignore = [\"dist/\", \"*.log\"]\ndefault_namespace = \"acme\"\n").unwrap();

        let config = WorkspaceConfig::load(&path).unwrap();
        assert_eq!(config.ignore, vec!["dist/", "*.log"]);
        assert_eq!(config.default_namespace.as_deref(), Some("acme"));
        assert!(config.use_gitignore);
        assert!(config.tests.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = WorkspaceConfig {
            tests: vec!["{dir}/{name}.spec.ts".into()],
            use_gitignore: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(WorkspaceConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "ignore = 3").unwrap();
        assert!(WorkspaceConfig::load(&path).is_err());
    }
}
