//! Error taxonomy for the `gz` application.
//!
//! Every fatal condition aborts the pipeline with a distinct variant; `main`
//! maps the variant to a stable process exit status. Side effects already
//! committed (pushed branches, patch records, closed PRs) are left as-is:
//! each is idempotently re-derivable on the next run.

use crate::types::{CommitHash, GitBranchName, PullRequestNumber, ZenToken};
use thiserror::Error;

/// Result type alias for the `gz` application.
pub type ZenResult<T> = Result<T, ZenError>;

/// All fatal conditions recognised by `gz`.
#[derive(Debug, Error)]
pub enum ZenError {
    /// The current working directory is not inside a git repository.
    #[error("Not in a git repository.")]
    NotInRepository,
    /// `HEAD` is detached or otherwise not a named branch.
    #[error("Unable to determine the current branch.")]
    NoCurrentBranch,
    /// A commit in the target range has no zen-token trailer.
    #[error(
        "Commit {0} has no zen-token. Is the commit-msg hook installed? Run `gz init` and amend."
    )]
    MissingZenToken(CommitHash),
    /// Two commits in the stack carry the same zen-token.
    #[error("Duplicate zen-token {0} in the commit stack. History is corrupt.")]
    DuplicateZenToken(ZenToken),
    /// The local branch has no remote counterpart in configuration.
    #[error("No remote branch found for local branch `{0}`.")]
    RemoteBranchNotFound(GitBranchName),
    /// The user is sitting on a generated `gitzen/pr/...` branch.
    #[error("Branch `{0}` is a generated pull request branch. Switch to your own branch first.")]
    RemoteBranchCheckedOut(GitBranchName),
    /// A cherry-pick or rebase produced an unresolved conflict.
    #[error("Conflict while building branch `{0}`. Resolve it manually and re-run `gz push`.")]
    PublishConflict(GitBranchName),
    /// A fast-forward pull after a squash-merge was rejected by the remote.
    #[error("Pull of `{0}` was rejected by the remote. Update it manually.")]
    FetchRejected(GitBranchName),
    /// The local commit no longer matches the pull request's head.
    #[error(
        "Local commit {commit} does not match pull request {number}. Run `gz push` and retry."
    )]
    StaleLocalVsRemote {
        /// The local commit hash.
        commit: CommitHash,
        /// The out-of-date pull request.
        number: PullRequestNumber,
    },
    /// A pull request body carries no recoverable zen-token.
    #[error("Pull request body for commit {0} has no zen-token; it could not be re-paired later.")]
    UntokenedPullRequest(CommitHash),
    /// Filesystem failure, including patch record writes.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Failure inside libgit2.
    #[error(transparent)]
    Git(#[from] git2::Error),
    /// The GitHub token is not available in the environment.
    #[error("GITHUB_TOKEN environment variable must be set.")]
    MissingGithubToken,
    /// Failure talking to GitHub.
    #[error(transparent)]
    Github(#[from] octocrab::Error),
    /// Malformed configuration file.
    #[error("Malformed configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// Unserializable configuration, only plausible on pathological input.
    #[error("Unable to write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    /// Malformed GraphQL response.
    #[error("Malformed GitHub response: {0}")]
    Json(#[from] serde_json::Error),
    /// An interactive prompt failed or was cancelled.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),
}

impl ZenError {
    /// Maps the error to its process exit status. The codes are stable and
    /// documented; scripts may rely on them.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotInRepository => 2,
            Self::NoCurrentBranch => 3,
            Self::MissingZenToken(_) => 4,
            Self::RemoteBranchNotFound(_) => 5,
            Self::RemoteBranchCheckedOut(_) => 6,
            Self::PublishConflict(_) => 7,
            Self::FetchRejected(_) => 8,
            Self::StaleLocalVsRemote { .. } => 9,
            Self::DuplicateZenToken(_) => 10,
            Self::UntokenedPullRequest(_) => 11,
            Self::Io(_)
            | Self::Git(_)
            | Self::MissingGithubToken
            | Self::Github(_)
            | Self::Config(_)
            | Self::ConfigWrite(_)
            | Self::Json(_)
            | Self::Prompt(_) => 1,
        }
    }
}
