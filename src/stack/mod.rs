//! The commit stack: typed commits and their reconciled pairings.
//!
//! A stack is the ordered sequence of local commits between the target
//! remote branch and `HEAD`, oldest first. Values here are immutable; they
//! are rebuilt from scratch on every run by re-parsing `git log`.

use crate::{
    github::PullRequest,
    types::{CommitBody, CommitHash, CommitTitle, GitBranchName, ZenToken},
};

mod parse;
pub use parse::parse_log;

/// One entry in the local commit stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    /// The durable identifier from the commit message trailer.
    pub zen_token: ZenToken,
    /// The current commit hash. Changes on amend.
    pub hash: CommitHash,
    /// The first line of the commit message.
    pub title: CommitTitle,
    /// The message body, including the zen-token trailer.
    pub body: CommitBody,
    /// True iff the title carries the work-in-progress prefix.
    pub wip: bool,
}

/// A commit paired with its open pull request, if one exists yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPr {
    /// The local commit.
    pub commit: GitCommit,
    /// The matching open pull request. [None] means a new PR is needed.
    pub pull_request: Option<PullRequest>,
}

impl CommitPr {
    /// Pairs `commit` with `pull_request`.
    pub fn new(commit: GitCommit, pull_request: Option<PullRequest>) -> Self {
        Self {
            commit,
            pull_request,
        }
    }
}

/// A fully rethreaded chain entry: the commit plus its resolved base and
/// head branch names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBranches {
    /// The local commit.
    pub commit: GitCommit,
    /// The branch this entry's pull request is based on.
    pub base: GitBranchName,
    /// The branch holding this entry's cherry-picked commit.
    pub head: GitBranchName,
    /// The matching open pull request, if any.
    pub pull_request: Option<PullRequest>,
    /// The remote-tracking target to build from instead of `base`. Only the
    /// first chain entry carries one (`<remote>/<default-branch>`).
    pub remote_target: Option<GitBranchName>,
    /// The hash of `head` once the branch has been materialized this run.
    pub published_head: Option<CommitHash>,
}

impl CommitBranches {
    /// Creates a chain entry that has not been materialized yet.
    pub fn new(
        commit: GitCommit,
        base: GitBranchName,
        head: GitBranchName,
        pull_request: Option<PullRequest>,
        remote_target: Option<GitBranchName>,
    ) -> Self {
        Self {
            commit,
            base,
            head,
            pull_request,
            remote_target,
            published_head: None,
        }
    }

    /// The branch to create from or rebase onto: the remote target when
    /// present, otherwise the base branch.
    pub fn build_target(&self) -> &GitBranchName {
        self.remote_target.as_ref().unwrap_or(&self.base)
    }
}
