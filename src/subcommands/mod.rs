//! The subcommands for the `gz` application.

use crate::{config::Config, errors::ZenResult, github::RealGithubEnv};
use clap::Subcommand;
use hook::HookArgs;
use init::InitArgs;
use merge::MergeArgs;
use push::PushArgs;
use status::StatusArgs;

mod hook;
mod init;
mod merge;
mod push;
mod status;

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    /// Synchronize the local commit stack with its pull requests: one PR per
    /// commit, each based on the one below it.
    #[clap(alias = "p")]
    Push(PushArgs),
    /// Show the pull requests backing the current stack.
    #[clap(aliases = ["s", "st"])]
    Status(StatusArgs),
    /// Squash-merge the pull request at the bottom of the stack, then
    /// restack the rest.
    #[clap(alias = "m")]
    Merge(MergeArgs),
    /// Install the commit-msg hook and write the repository configuration.
    Init(InitArgs),
    /// Git hook entry point; invoked by the installed commit-msg hook.
    #[clap(hide = true)]
    Hook(HookArgs),
}

impl Subcommands {
    /// Runs the subcommand against the discovered repository.
    pub async fn run(self, repository: git2::Repository, config: Config) -> ZenResult<()> {
        match self {
            Self::Push(args) => args.run(&repository, &config).await,
            Self::Status(args) => args.run(&repository, &config).await,
            Self::Merge(args) => args.run(&repository, &config).await,
            Self::Init(args) => args.run(&repository, &config),
            Self::Hook(args) => args.run(),
        }
    }
}

/// Builds the authenticated GitHub client for the configured remote.
fn github_env(repository: &git2::Repository, config: &Config) -> ZenResult<RealGithubEnv> {
    let (owner, repo) = crate::git::owner_and_repository(repository, &config.remote)?;
    RealGithubEnv::new(owner, repo)
}
