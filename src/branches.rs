//! Deterministic branch naming and remote branch resolution.

use crate::{
    config::Config,
    constants::BRANCH_NAMESPACE,
    errors::{ZenError, ZenResult},
    types::{GitBranchName, GithubUsername, ZenToken},
};
use once_cell::sync::Lazy;
use regex::Regex;

static PR_BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^gitzen/pr/[a-zA-Z0-9_\-]+/[a-zA-Z0-9_\-/\.]+/[a-f0-9]{8}$").expect("valid regex")
});

/// Derives the branch name for a chain entry from the stack author, the
/// parent identifier (the previous entry's zen-token, or the default branch
/// name for the first entry), and the entry's own token.
///
/// The name is fully determined by the chain position, so a previously
/// created branch can always be located again without any side-table.
pub fn pr_branch(author: &GithubUsername, parent: &str, zen_token: &ZenToken) -> GitBranchName {
    GitBranchName::new(format!("{BRANCH_NAMESPACE}/{author}/{parent}/{zen_token}"))
}

/// Returns `true` if `branch` is a generated pull request branch.
pub fn is_pr_branch(branch: &GitBranchName) -> bool {
    PR_BRANCH.is_match(branch.as_str())
}

/// Resolves the remote branch that `local_branch` maps onto: the matching
/// entry from the configured remote branches if one exists, otherwise the
/// default branch.
pub fn required_remote_branch(
    local_branch: &GitBranchName,
    config: &Config,
) -> ZenResult<GitBranchName> {
    if config.remote_branches.contains(local_branch) {
        return Ok(local_branch.clone());
    }
    if config.default_branch.is_empty() {
        return Err(ZenError::RemoteBranchNotFound(local_branch.clone()));
    }
    Ok(config.default_branch.clone())
}
