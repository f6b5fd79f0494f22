//! Configuration for the `gz` application.
//!
//! Read once at startup from `.gitzen.toml` at the repository root. The
//! engine treats the configuration as read-only input.

use crate::{
    constants::CONFIG_FILE_NAME,
    errors::ZenResult,
    types::{GitBranchName, GitRemoteName, GitRootDir},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `gz` configuration for a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// The default remote branch that stacks are based on.
    pub default_branch: GitBranchName,
    /// The name of the remote holding the pull requests.
    pub remote: GitRemoteName,
    /// Additional remote branches that local branches may map onto directly.
    pub remote_branches: Vec<GitBranchName>,
    /// The repository root. Not serialized; filled in by [Config::load].
    #[serde(skip)]
    pub root_dir: GitRootDir,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_branch: GitBranchName::new("master"),
            remote: GitRemoteName::new("origin"),
            remote_branches: Vec::new(),
            root_dir: GitRootDir::new(""),
        }
    }
}

impl Config {
    /// Returns the path of the configuration file under `root_dir`.
    pub fn path(root_dir: &GitRootDir) -> PathBuf {
        Path::new(root_dir.as_str()).join(CONFIG_FILE_NAME)
    }

    /// Loads the configuration from `.gitzen.toml`, falling back to the
    /// defaults when the file does not exist.
    pub fn load(root_dir: &GitRootDir) -> ZenResult<Self> {
        let path = Self::path(root_dir);
        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "reading configuration");
            toml::from_str::<Self>(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        config.root_dir = root_dir.clone();
        Ok(config)
    }
}
