//! `init` subcommand.

use crate::{
    config::Config,
    constants::COMMIT_MSG_HOOK,
    errors::ZenResult,
    git,
    types::GitBranchName,
};
use clap::Args;
use inquire::Select;
use nu_ansi_term::Color;
use std::path::Path;

/// CLI arguments for the `init` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct InitArgs;

impl InitArgs {
    /// Runs the `init` subcommand: installs the commit-msg hook that stamps
    /// zen-tokens, and writes `.gitzen.toml` when the repository has none.
    pub fn run(self, repository: &git2::Repository, config: &Config) -> ZenResult<()> {
        install_hook(&config.root_dir)?;
        println!("{}", Color::Green.paint("Installed the commit-msg hook."));

        let config_path = Config::path(&config.root_dir);
        if config_path.exists() {
            println!("Configuration already present at {}.", config_path.display());
            return Ok(());
        }

        const SELECT_TRUNK: &str = "Select the default branch that stacks will be based on.";
        let branches = git::local_branches(repository)?;
        let default_branch = Select::new(SELECT_TRUNK, branches).prompt()?;
        let fresh = Config {
            default_branch: GitBranchName::new(default_branch),
            root_dir: config.root_dir.clone(),
            ..Config::default()
        };
        std::fs::write(&config_path, toml::to_string(&fresh)?)?;
        println!(
            "{} {}",
            Color::Green.paint("Wrote"),
            config_path.display()
        );
        Ok(())
    }
}

fn install_hook(root_dir: &crate::types::GitRootDir) -> ZenResult<()> {
    let hooks_dir = Path::new(root_dir.as_str()).join(".git").join("hooks");
    std::fs::create_dir_all(&hooks_dir)?;
    let hook_path = hooks_dir.join("commit-msg");
    std::fs::write(&hook_path, COMMIT_MSG_HOOK)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
