//! Small value types wrapping the strings that flow through the engine.
//!
//! Tokens, hashes, and branch names are all strings on the wire, but mixing
//! them up is exactly the kind of bug a sync engine cannot afford. Each gets
//! its own newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! str_wrapper {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new [$name] from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the inner string is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

str_wrapper!(
    /// Durable 8-hex-character identifier embedded in a commit message
    /// trailer. Assigned once by the commit-msg hook; stable across amends.
    ZenToken
);

str_wrapper!(
    /// A full 40-character commit hash. Changes on every amend.
    CommitHash
);

str_wrapper!(
    /// The first line of a commit message.
    CommitTitle
);

str_wrapper!(
    /// The body of a commit message, including the zen-token trailer.
    CommitBody
);

str_wrapper!(
    /// A local or remote git branch name.
    GitBranchName
);

str_wrapper!(
    /// The name of a git remote, e.g. `origin`.
    GitRemoteName
);

str_wrapper!(
    /// Absolute path to the repository root (the directory holding `.git`).
    GitRootDir
);

str_wrapper!(
    /// A GitHub login.
    GithubUsername
);

str_wrapper!(
    /// GitHub's opaque node id for a repository.
    GithubRepoId
);

str_wrapper!(
    /// GitHub's opaque node id for a pull request.
    PullRequestId
);

str_wrapper!(
    /// A pull request title.
    PullRequestTitle
);

str_wrapper!(
    /// A pull request body.
    PullRequestBody
);

str_wrapper!(
    /// GitHub's mergeability verdict for a pull request, e.g. `MERGEABLE`.
    PullRequestMergeable
);

str_wrapper!(
    /// GitHub's review decision for a pull request, e.g. `APPROVED`.
    PullRequestReviewDecision
);

/// A pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Creates a new [PullRequestNumber].
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the inner number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PullRequestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CommitHash {
    /// Returns the 7-character short form of the hash.
    pub fn short(&self) -> &str {
        let len = self.as_str().len().min(7);
        &self.as_str()[..len]
    }
}
