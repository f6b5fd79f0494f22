//! Parsing `git log` output into the typed commit stack.

use super::GitCommit;
use crate::{
    constants::WIP_PREFIX,
    errors::{ZenError, ZenResult},
    token,
    types::{CommitBody, CommitHash, CommitTitle, ZenToken},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static COMMIT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^commit (?P<hash>[a-f0-9]{40})").expect("valid regex"));

/// Offset from a `commit <hash>` line to the subject line: the author, date
/// and separator lines in between are skipped.
const SUBJECT_OFFSET: usize = 4;

struct PartialCommit {
    hash: CommitHash,
    subject_line: usize,
    title: Option<CommitTitle>,
    body_lines: Vec<String>,
    token: Option<ZenToken>,
}

impl PartialCommit {
    fn start(hash: CommitHash, marker_line: usize) -> Self {
        Self {
            hash,
            subject_line: marker_line + SUBJECT_OFFSET,
            title: None,
            body_lines: Vec::new(),
            token: None,
        }
    }

    /// Seals the record. A commit without a zen-token is fatal: tokens are
    /// injected upstream by the commit-msg hook, never here.
    fn finish(self) -> ZenResult<GitCommit> {
        let zen_token = self.token.ok_or(ZenError::MissingZenToken(self.hash.clone()))?;
        let title = self.title.unwrap_or_else(|| CommitTitle::new(""));
        let wip = title.as_str().starts_with(WIP_PREFIX);
        let body = self.body_lines.join("\n").trim().to_owned();
        Ok(GitCommit {
            zen_token,
            hash: self.hash,
            title,
            body: CommitBody::new(body),
            wip,
        })
    }
}

/// Parses raw `git log <remote>/<target>..HEAD` output into the commit
/// stack, reordered oldest first.
///
/// ## Errors
/// - [ZenError::MissingZenToken] when any commit in range has no trailer.
/// - [ZenError::DuplicateZenToken] when two commits share a token.
pub fn parse_log(lines: &[String]) -> ZenResult<Vec<GitCommit>> {
    tracing::debug!(lines = lines.len(), "scanning log for commits");
    let mut commits = Vec::new();
    let mut current: Option<PartialCommit> = None;

    for (number, line) in lines.iter().enumerate() {
        if let Some(captures) = COMMIT_MARKER.captures(line) {
            if let Some(partial) = current.take() {
                commits.push(partial.finish()?);
            }
            let hash = CommitHash::new(&captures["hash"]);
            tracing::debug!(%hash, "found commit");
            current = Some(PartialCommit::start(hash, number));
            continue;
        }
        let Some(partial) = current.as_mut() else {
            continue;
        };
        if number < partial.subject_line {
            continue;
        }
        let trimmed = line.trim();
        if number == partial.subject_line {
            partial.title = Some(CommitTitle::new(trimmed));
        } else {
            if partial.token.is_none() {
                partial.token = token::find_in_line(trimmed);
            }
            partial.body_lines.push(trimmed.to_owned());
        }
    }
    if let Some(partial) = current.take() {
        commits.push(partial.finish()?);
    }

    // Git logs newest first; the stack reads oldest first.
    commits.reverse();

    let mut seen = HashSet::new();
    for commit in &commits {
        if !seen.insert(commit.zen_token.clone()) {
            return Err(ZenError::DuplicateZenToken(commit.zen_token.clone()));
        }
    }
    Ok(commits)
}
