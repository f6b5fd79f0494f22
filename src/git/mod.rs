//! Utilities for interacting with `git` repositories for the `gz` application.
//!
//! All mutating operations are invoked as an external `git` process through
//! the [GitEnv] trait; their merged stdout/stderr is the only channel of
//! structured data back into the engine and is parsed defensively. Tests
//! substitute a scripted fake. Repository discovery and metadata reads go
//! through `git2`.

use crate::{
    errors::{ZenError, ZenResult},
    types::{CommitHash, GitBranchName, GitRemoteName, GitRootDir},
};
use git2::{BranchType, Repository};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{env, process::Command};

static FULL_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-f0-9]{40}$").expect("valid regex"));

static GITHUB_REMOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com[:/](?P<owner>[^/]+)/(?P<repo>.+?)(?:\.git)?/?$").expect("valid regex")
});

/// The environment boundary for the external `git` process.
pub trait GitEnv {
    /// Runs `git` with the given arguments, returning the merged
    /// stdout/stderr as lines. A non-zero exit status is not an error at
    /// this level; callers parse the output for the markers they care about.
    fn git(&self, args: &[&str]) -> ZenResult<Vec<String>>;
}

/// The [GitEnv] backed by a real `git` subprocess.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealGitEnv;

impl GitEnv for RealGitEnv {
    fn git(&self, args: &[&str]) -> ZenResult<Vec<String>> {
        tracing::debug!(target: "git", "git {}", args.join(" "));
        let output = Command::new("git").args(args).output()?;
        let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_owned)
            .collect();
        lines.extend(
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_owned),
        );
        for line in &lines {
            tracing::debug!(target: "git", "| {line}");
        }
        tracing::debug!(target: "git", status = %output.status, "\\------------------");
        Ok(lines)
    }
}

/// Returns `true` if any output line contains `marker`.
pub fn output_contains(lines: &[String], marker: &str) -> bool {
    lines.iter().any(|line| line.contains(marker))
}

/// Lists local branches, raw `git branch --no-color` lines.
pub fn branch(env: &impl GitEnv) -> ZenResult<Vec<String>> {
    env.git(&["branch", "--no-color"])
}

/// Returns `true` if a local branch named `branch_name` exists.
pub fn branch_exists(env: &impl GitEnv, branch_name: &GitBranchName) -> ZenResult<bool> {
    let branches = branch(env)?;
    Ok(branches
        .iter()
        .filter(|line| line.len() > 2)
        .any(|line| line[2..].trim() == branch_name.as_str()))
}

/// Creates `new_branch` pointing at `source`.
pub fn branch_create(
    env: &impl GitEnv,
    new_branch: &GitBranchName,
    source: &GitBranchName,
) -> ZenResult<Vec<String>> {
    env.git(&["branch", new_branch.as_str(), source.as_str()])
}

/// Force-deletes a local branch.
pub fn branch_delete(env: &impl GitEnv, branch_name: &GitBranchName) -> ZenResult<Vec<String>> {
    env.git(&["branch", "-D", branch_name.as_str()])
}

/// Switches the working tree to `branch_name`.
pub fn switch(env: &impl GitEnv, branch_name: &GitBranchName) -> ZenResult<Vec<String>> {
    env.git(&["switch", branch_name.as_str()])
}

/// Rebases the current branch onto `target`, autostashing local changes.
pub fn rebase(env: &impl GitEnv, target: &GitBranchName) -> ZenResult<Vec<String>> {
    env.git(&["rebase", target.as_str(), "--autostash"])
}

/// Cherry-picks `reference` onto the current branch, recording the source
/// commit in the message.
pub fn cherry_pick(env: &impl GitEnv, reference: &GitBranchName) -> ZenResult<Vec<String>> {
    env.git(&["cherry-pick", "-x", reference.as_str()])
}

/// Skips the in-progress cherry-pick (used when a pick resolves to a no-op).
pub fn cherry_pick_skip(env: &impl GitEnv) -> ZenResult<Vec<String>> {
    env.git(&["cherry-pick", "--skip"])
}

/// Fetches `remote`.
pub fn fetch(env: &impl GitEnv, remote: &GitRemoteName) -> ZenResult<Vec<String>> {
    env.git(&["fetch", remote.as_str()])
}

/// Fast-forward pulls `branch` from `remote`.
pub fn pull(
    env: &impl GitEnv,
    remote: &GitRemoteName,
    branch: &GitBranchName,
) -> ZenResult<Vec<String>> {
    env.git(&["pull", "--ff-only", remote.as_str(), branch.as_str()])
}

/// Pushes `branch` to `remote`.
pub fn push(
    env: &impl GitEnv,
    remote: &GitRemoteName,
    branch: &GitBranchName,
) -> ZenResult<Vec<String>> {
    let refspec = format!("{branch}:{branch}");
    env.git(&["push", remote.as_str(), refspec.as_str()])
}

/// Pushes `branch` to `remote`, allowing a rewritten history as long as the
/// remote has not moved since it was last fetched.
pub fn push_force_with_lease(
    env: &impl GitEnv,
    remote: &GitRemoteName,
    branch: &GitBranchName,
) -> ZenResult<Vec<String>> {
    let refspec = format!("{branch}:{branch}");
    env.git(&["push", "--force-with-lease", remote.as_str(), refspec.as_str()])
}

/// Returns the raw `git log` lines for `<remote>/<branch>..HEAD`.
pub fn log_range(
    env: &impl GitEnv,
    remote: &GitRemoteName,
    branch: &GitBranchName,
) -> ZenResult<Vec<String>> {
    let range = format!("{remote}/{branch}..HEAD");
    env.git(&["log", "--no-color", range.as_str()])
}

/// Resolves `reference` to a full commit hash, or [None] when the reference
/// does not exist or the output is not a well-formed hash.
pub fn rev_parse(env: &impl GitEnv, reference: &str) -> ZenResult<Option<CommitHash>> {
    let lines = env.git(&["rev-parse", "--verify", "--quiet", reference])?;
    Ok(lines
        .first()
        .filter(|line| FULL_HASH.is_match(line))
        .map(CommitHash::new))
}

/// Returns the name of the currently checked out branch.
pub fn current_branch(env: &impl GitEnv) -> ZenResult<GitBranchName> {
    let lines = env.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    match lines.first().map(String::as_str) {
        None | Some("") | Some("HEAD") => Err(ZenError::NoCurrentBranch),
        Some(name) => Ok(GitBranchName::new(name)),
    }
}

/// Returns `true` if the working tree has no staged or unstaged changes.
pub fn is_working_tree_clean(env: &impl GitEnv) -> ZenResult<bool> {
    Ok(env.git(&["status", "--porcelain"])?.is_empty())
}

/// Restores the index and working tree to the content of `source`.
pub fn restore_source(env: &impl GitEnv, source: &CommitHash) -> ZenResult<Vec<String>> {
    let source_arg = format!("--source={source}");
    env.git(&["restore", source_arg.as_str(), "--staged", "--worktree", ":/"])
}

/// Commits the staged changes with one `-m` per message paragraph.
pub fn commit(env: &impl GitEnv, messages: &[&str]) -> ZenResult<Vec<String>> {
    let mut args = vec!["commit"];
    for message in messages {
        args.push("-m");
        args.push(message);
    }
    env.git(&args)
}

/// Returns the repository for the current working directory, and [None] if
/// the current working directory is not within a git repository or an error
/// occurs.
pub fn active_repository() -> Option<Repository> {
    Repository::discover(env::current_dir().ok()?).ok()
}

/// Returns the repository root as a [GitRootDir].
pub fn root_dir(repository: &Repository) -> ZenResult<GitRootDir> {
    let workdir = repository.workdir().ok_or(ZenError::NotInRepository)?;
    Ok(GitRootDir::new(workdir.display().to_string()))
}

/// Lists the names of all local branches.
pub fn local_branches(repository: &Repository) -> ZenResult<Vec<String>> {
    repository
        .branches(Some(BranchType::Local))?
        .map(|item| {
            let (branch, _) = item?;
            branch
                .name()?
                .map(ToOwned::to_owned)
                .ok_or(ZenError::NoCurrentBranch)
        })
        .collect()
}

/// Returns the `(owner, repo)` pair for the configured remote.
pub fn owner_and_repository(
    repository: &Repository,
    remote: &GitRemoteName,
) -> ZenResult<(String, String)> {
    let remote = repository.find_remote(remote.as_str())?;
    remote
        .url()
        .and_then(parse_github_remote)
        .ok_or(ZenError::NotInRepository)
}

/// Parses `owner/repo` out of an https or ssh GitHub remote URL.
fn parse_github_remote(url: &str) -> Option<(String, String)> {
    GITHUB_REMOTE
        .captures(url)
        .map(|captures| (captures["owner"].to_owned(), captures["repo"].to_owned()))
}
