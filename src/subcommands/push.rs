//! `push` subcommand.

use crate::{config::Config, errors::ZenResult, git::RealGitEnv, push};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `push` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PushArgs;

impl PushArgs {
    /// Runs the `push` subcommand.
    pub async fn run(self, repository: &git2::Repository, config: &Config) -> ZenResult<()> {
        let git_env = RealGitEnv;
        let github_env = super::github_env(repository, config)?;
        push::push(&git_env, &github_env, config).await?;
        println!("{}", Color::Green.paint("Stack synchronized."));
        super::status::print_status(&git_env, &github_env, config).await
    }
}
