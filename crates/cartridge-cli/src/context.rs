//! Node configuration and the repository it points at.

use std::path::{Path, PathBuf};

use cartridge_fs::ConfigStore;
use cartridge_provision::{Instantiator, ProvisionConfig};
use cartridge_repo::CartridgeRepository;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default store root on a node.
pub const DEFAULT_REPOSITORY_PATH: &str = "/var/lib/cartridges";

/// Settings read from the node configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub repository: RepositorySettings,
    pub provision: ProvisionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub path: PathBuf,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_REPOSITORY_PATH),
        }
    }
}

impl NodeConfig {
    /// Load from `path`, falling back to defaults when no file is given or
    /// the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(ConfigStore::new().load_or_default(path)?),
            None => Ok(Self::default()),
        }
    }
}

/// Everything a command needs: the loaded repository and an instantiator.
#[derive(Debug)]
pub struct NodeContext {
    pub repository: CartridgeRepository,
    pub instantiator: Instantiator,
}

impl NodeContext {
    /// Load configuration, apply the root override, and open the repository.
    pub fn open(config_path: Option<&Path>, root_override: Option<&Path>) -> Result<Self> {
        let mut config = NodeConfig::load(config_path)?;
        if let Some(root) = root_override {
            config.repository.path = root.to_path_buf();
        }
        tracing::debug!(root = ?config.repository.path, "Opening cartridge repository");

        let repository = CartridgeRepository::open(&config.repository.path)?;
        let instantiator = Instantiator::new(&config.provision);
        Ok(Self {
            repository,
            instantiator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = NodeConfig::load(Some(&dir.path().join("node.toml"))).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.repository.path, PathBuf::from(DEFAULT_REPOSITORY_PATH));
    }

    #[test]
    fn yaml_config_sets_path_and_limits() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("node.yaml");
        fs::write(
            &file,
            "repository:\n  path: /srv/cartridges\nprovision:\n  download:\n    max_time_secs: 60\n",
        )
        .unwrap();

        let config = NodeConfig::load(Some(&file)).unwrap();
        assert_eq!(config.repository.path, PathBuf::from("/srv/cartridges"));
        assert_eq!(config.provision.download.max_time_secs, 60);
        assert_eq!(config.provision.download.rate_limit, "100k");
    }

    #[test]
    fn root_override_wins() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("node.toml");
        fs::write(&file, "[repository]\npath = \"/nonexistent/elsewhere\"\n").unwrap();
        let root = dir.path().join("store");

        let context = NodeContext::open(Some(&file), Some(&root)).unwrap();
        assert_eq!(context.repository.root(), root.as_path());
        assert!(root.is_dir());
    }
}
