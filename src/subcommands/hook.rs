//! `hook` subcommand, the target of the installed commit-msg hook.

use crate::{constants::ZEN_TOKEN_TRAILER, errors::ZenResult, token};
use clap::Args;
use std::path::PathBuf;

/// CLI arguments for the `hook` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct HookArgs {
    /// The message file handed over by git.
    pub file: PathBuf,
}

impl HookArgs {
    /// Runs the `hook` subcommand. For a commit message, stamps a fresh
    /// zen-token trailer unless one is already present. For a rebase todo
    /// list, turns every `pick` into `reword` so the commit-msg hook runs
    /// again for each replayed commit.
    pub fn run(self) -> ZenResult<()> {
        let contents = std::fs::read_to_string(&self.file)?;
        let rewritten = if is_rebase_todo(&self.file) {
            reword_picks(&contents)
        } else {
            stamp_token(&contents, &token::fresh())
        };
        if rewritten != contents {
            std::fs::write(&self.file, rewritten)?;
        }
        Ok(())
    }
}

fn is_rebase_todo(file: &std::path::Path) -> bool {
    file.file_name()
        .map(|name| name == "git-rebase-todo")
        .unwrap_or(false)
}

/// Appends a zen-token trailer after a separating blank line, unless the
/// message already carries one.
fn stamp_token(message: &str, fresh: &crate::types::ZenToken) -> String {
    if token::find_in_body(message).is_some() {
        return message.to_owned();
    }
    format!("{}\n\n{ZEN_TOKEN_TRAILER}{fresh}\n", message.trim_end())
}

fn reword_picks(todo: &str) -> String {
    let mut lines: Vec<String> = todo
        .lines()
        .map(|line| match line.strip_prefix("pick ") {
            Some(rest) => format!("reword {rest}"),
            None => line.to_owned(),
        })
        .collect();
    lines.push(String::new());
    lines.join("\n")
}
