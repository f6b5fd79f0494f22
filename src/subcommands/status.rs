//! `status` subcommand.

use crate::{
    config::Config,
    errors::ZenResult,
    git::{self, GitEnv, RealGitEnv},
    github::GithubEnv,
    push,
};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct StatusArgs;

impl StatusArgs {
    /// Runs the `status` subcommand.
    pub async fn run(self, repository: &git2::Repository, config: &Config) -> ZenResult<()> {
        let git_env = RealGitEnv;
        let github_env = super::github_env(repository, config)?;
        print_status(&git_env, &github_env, config).await
    }
}

/// Prints one line per tracked pull request, bottom of the stack first.
pub(super) async fn print_status(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
) -> ZenResult<()> {
    let local_branch = git::current_branch(git_env)?;
    let (_info, stack) = push::prepare_stack(git_env, github_env, config, &local_branch).await?;
    let tracked: Vec<_> = stack
        .iter()
        .filter_map(|entry| entry.pull_request.as_ref())
        .collect();
    if tracked.is_empty() {
        println!("Stack is empty - no PRs found");
        return Ok(());
    }
    for pull_request in tracked {
        println!(
            "{} - {} - {}",
            Color::Cyan.paint(format!("PR-{}", pull_request.number)),
            pull_request.mergeable,
            pull_request.title
        );
    }
    Ok(())
}
