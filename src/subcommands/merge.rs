//! `merge` subcommand.

use crate::{
    branches,
    config::Config,
    constants::PULL_REJECTED_MARKER,
    errors::{ZenError, ZenResult},
    git::{self, GitEnv, RealGitEnv},
    github::GithubEnv,
    patches, push,
    types::GitBranchName,
};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `merge` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct MergeArgs;

impl MergeArgs {
    /// Runs the `merge` subcommand.
    pub async fn run(self, repository: &git2::Repository, config: &Config) -> ZenResult<()> {
        let git_env = RealGitEnv;
        let github_env = super::github_env(repository, config)?;
        merge(&git_env, &github_env, config).await
    }
}

/// Squash-merges the pull request at the bottom of the stack, then lets the
/// push pipeline rebuild the remaining chain on the new default branch head.
/// The branch checked out on entry is restored on every exit path.
async fn merge(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
) -> ZenResult<()> {
    let local_branch = git::current_branch(git_env)?;
    let result = merge_pipeline(git_env, github_env, config, &local_branch).await;
    let restored = git::switch(git_env, &local_branch);
    result.and(restored.map(|_| ()))
}

async fn merge_pipeline(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
    local_branch: &GitBranchName,
) -> ZenResult<()> {
    if branches::is_pr_branch(local_branch) {
        return Err(ZenError::RemoteBranchCheckedOut(local_branch.clone()));
    }
    let remote_branch = branches::required_remote_branch(local_branch, config)?;
    let (_info, stack) = push::prepare_stack(git_env, github_env, config, local_branch).await?;

    let Some(bottom) = stack.first() else {
        println!("No pull requests to be merged.");
        return Ok(());
    };
    let Some(pull_request) = bottom.pull_request.as_ref() else {
        println!("No pull requests to be merged.");
        return Ok(());
    };
    // A merge on top of unpublished local edits would merge the wrong tree.
    if patches::is_outdated(&config.root_dir, &bottom.commit.zen_token, &bottom.commit.hash) {
        return Err(ZenError::StaleLocalVsRemote {
            commit: bottom.commit.hash.clone(),
            number: pull_request.number,
        });
    }

    github_env
        .merge_squash(pull_request.number, &pull_request.head_hash)
        .await?;
    println!(
        "{} {}",
        Color::Green.paint("Merged"),
        format_args!("PR-{} - {}", pull_request.number, pull_request.title)
    );
    patches::delete(&config.root_dir, &bottom.commit.zen_token)?;
    git::branch_delete(git_env, &pull_request.head_ref)?;

    git::switch(git_env, &remote_branch)?;
    let pull_output = git::pull(git_env, &config.remote, &remote_branch)?;
    if git::output_contains(&pull_output, PULL_REJECTED_MARKER) {
        return Err(ZenError::FetchRejected(remote_branch));
    }
    git::switch(git_env, local_branch)?;

    // The remaining commits now sit directly on the merged head; one push
    // rethreads and republishes the rest of the stack.
    push::push(git_env, github_env, config).await
}
