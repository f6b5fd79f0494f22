//! The stack synchronization engine.
//!
//! One run is a single linear pipeline: parse the commit stack, update the
//! patch records, reconcile against the open pull requests (prune, pair,
//! extend, rethread), materialize the per-commit branches, push them, and
//! create or edit the pull requests to match. Every step depends on the
//! side effects of the previous one; nothing here is concurrent.

use crate::{
    branches,
    config::Config,
    constants::{CLOSE_COMMENT, CONFLICT_MARKER, EMPTY_CHERRY_PICK_MARKER},
    errors::{ZenError, ZenResult},
    git::{self, GitEnv},
    github::{GithubEnv, GithubInfo, PullRequest},
    patches::{self, GitPatch},
    stack::{parse_log, CommitBranches, CommitPr, GitCommit},
    token,
    types::{GitBranchName, GitRootDir, GithubUsername, ZenToken},
};
use std::collections::{HashMap, HashSet};

/// Runs the full push pipeline, restoring the branch that was checked out
/// on entry on every exit path.
pub async fn push(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
) -> ZenResult<()> {
    let original_branch = git::current_branch(git_env)?;
    let result = pipeline(git_env, github_env, config, &original_branch).await;
    let restored = git::switch(git_env, &original_branch);
    result.and(restored.map(|_| ()))
}

async fn pipeline(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
    local_branch: &GitBranchName,
) -> ZenResult<()> {
    if branches::is_pr_branch(local_branch) {
        return Err(ZenError::RemoteBranchCheckedOut(local_branch.clone()));
    }
    let remote_branch = branches::required_remote_branch(local_branch, config)?;
    let remote_target =
        GitBranchName::new(format!("{}/{}", config.remote, remote_branch));

    git::fetch(git_env, &config.remote)?;
    let rebase_output = git::rebase(git_env, &remote_target)?;
    if git::output_contains(&rebase_output, CONFLICT_MARKER) {
        return Err(ZenError::PublishConflict(local_branch.clone()));
    }

    let info = github_env.fetch_info().await?;
    tracing::debug!(
        user = %info.username,
        repo = %info.repo_id,
        open_prs = info.pull_requests.len(),
        "fetched remote view"
    );
    let log = git::log_range(git_env, &config.remote, &remote_branch)?;
    let mut commits = parse_log(&log)?;
    // Pruning must see every commit in range: a PR whose commit still
    // exists locally is never closed, even when that commit has since been
    // retitled work-in-progress.
    let kept =
        clean_up_deleted_commits(github_env, &config.root_dir, info.pull_requests, &commits)
            .await?;
    if let Some(position) = commits.iter().position(|commit| commit.wip) {
        tracing::info!(
            kept = position,
            "stopping the stack at the first work-in-progress commit"
        );
        commits.truncate(position);
    }

    let outdated = update_patches(&config.root_dir, &commits)?;
    if reordered(&kept, &commits) {
        tracing::info!("stack was reordered upstream; the chain will be rebuilt");
    }
    let stack = pair_stack(kept, &commits);
    let mut chain = rethread_stack(
        &info.username,
        stack,
        &remote_branch,
        Some(remote_target),
    );

    update_pr_branches(git_env, &mut chain, &outdated)?;
    publish_pr_branches(git_env, &chain, config)?;
    sync_pull_requests(github_env, &chain).await
}

/// Fetches the reconciliation inputs without publishing anything. Used by
/// the merge path to validate the bottom of the stack.
pub async fn prepare_stack(
    git_env: &impl GitEnv,
    github_env: &impl GithubEnv,
    config: &Config,
    local_branch: &GitBranchName,
) -> ZenResult<(GithubInfo, Vec<CommitPr>)> {
    let remote_branch = branches::required_remote_branch(local_branch, config)?;
    git::fetch(git_env, &config.remote)?;
    let info = github_env.fetch_info().await?;
    let log = git::log_range(git_env, &config.remote, &remote_branch)?;
    let mut commits = parse_log(&log)?;
    // The merge path must not see work-in-progress commits either; a WIP
    // bottom commit is not eligible for merging.
    if let Some(position) = commits.iter().position(|commit| commit.wip) {
        commits.truncate(position);
    }
    let mut by_token: HashMap<ZenToken, PullRequest> = info
        .pull_requests
        .iter()
        .map(|pr| (pr.zen_token.clone(), pr.clone()))
        .collect();
    let stack = commits
        .into_iter()
        .map(|commit| {
            let pull_request = by_token.remove(&commit.zen_token);
            CommitPr::new(commit, pull_request)
        })
        .collect();
    Ok((info, stack))
}

/// Writes a patch record (and thereby a patch ref) for every commit whose
/// hash changed since its last publish. Returns the set of outdated tokens.
pub fn update_patches(
    root_dir: &GitRootDir,
    commits: &[GitCommit],
) -> ZenResult<HashSet<ZenToken>> {
    let mut outdated = HashSet::new();
    for commit in commits {
        if patches::is_outdated(root_dir, &commit.zen_token, &commit.hash) {
            patches::write(
                root_dir,
                &GitPatch::new(commit.zen_token.clone(), commit.hash.clone()),
            )?;
            tracing::debug!(token = %commit.zen_token, hash = commit.hash.short(), "patch record refreshed");
            outdated.insert(commit.zen_token.clone());
        }
    }
    Ok(outdated)
}

/// Step A of reconciliation: closes every open pull request whose backing
/// commit no longer exists, deleting its patch record, and returns the
/// surviving pull requests in their remote order.
pub async fn clean_up_deleted_commits(
    github_env: &impl GithubEnv,
    root_dir: &GitRootDir,
    pull_requests: Vec<PullRequest>,
    commits: &[GitCommit],
) -> ZenResult<Vec<PullRequest>> {
    let stack_tokens: HashSet<&ZenToken> =
        commits.iter().map(|commit| &commit.zen_token).collect();
    let mut kept = Vec::with_capacity(pull_requests.len());
    for pull_request in pull_requests {
        if stack_tokens.contains(&pull_request.zen_token) {
            kept.push(pull_request);
            continue;
        }
        tracing::info!(
            number = %pull_request.number,
            id = %pull_request.id,
            "closing pull request for deleted commit"
        );
        github_env
            .close_pr_with_comment(pull_request.number, CLOSE_COMMENT)
            .await?;
        patches::delete(root_dir, &pull_request.zen_token)?;
    }
    Ok(kept)
}

/// Steps B and C of reconciliation: pairs each surviving pull request with
/// its commit (remote order preserved), then appends the untracked commits
/// as new entries with no pull request. A surviving PR whose commit is not
/// in the publishable stack (beyond the work-in-progress cut) is carried
/// by neither list; it stays open untouched.
pub fn pair_stack(kept: Vec<PullRequest>, commits: &[GitCommit]) -> Vec<CommitPr> {
    let by_token: HashMap<&ZenToken, &GitCommit> = commits
        .iter()
        .map(|commit| (&commit.zen_token, commit))
        .collect();
    let mut paired: HashSet<ZenToken> = HashSet::new();
    let mut stack = Vec::with_capacity(commits.len());
    for pull_request in kept {
        // Absent here means the commit sits at or above the WIP cut: the
        // PR stays open but is left out of this run's chain.
        if let Some(commit) = by_token.get(&pull_request.zen_token) {
            paired.insert(pull_request.zen_token.clone());
            stack.push(CommitPr::new((*commit).clone(), Some(pull_request)));
        }
    }
    for commit in commits {
        if !paired.contains(&commit.zen_token) {
            stack.push(CommitPr::new(commit.clone(), None));
        }
    }
    stack
}

/// Detects an upstream reorder: position by position, an open pull
/// request's first known commit no longer matches the local commit. The
/// chain is order-derived, so a reorder self-corrects on rethreading; this
/// signal exists for the operator's benefit.
pub fn reordered(pull_requests: &[PullRequest], commits: &[GitCommit]) -> bool {
    pull_requests
        .iter()
        .zip(commits)
        .any(|(pull_request, commit)| {
            pull_request
                .commits
                .first()
                .and_then(|first| first.zen_token.as_ref())
                .map(|token| *token != commit.zen_token)
                .unwrap_or(false)
        })
}

/// Step D of reconciliation: walks the stack head to tail, deriving every
/// entry's base and head branch names purely from chain position. Entry 0
/// is based on the default branch and carries the remote target; entry i is
/// based on entry i-1's head.
pub fn rethread_stack(
    author: &GithubUsername,
    stack: Vec<CommitPr>,
    default_branch: &GitBranchName,
    remote_target: Option<GitBranchName>,
) -> Vec<CommitBranches> {
    let mut chain = Vec::with_capacity(stack.len());
    let mut base = default_branch.clone();
    let mut parent: Option<ZenToken> = None;
    for (index, entry) in stack.into_iter().enumerate() {
        let parent_name = parent
            .as_ref()
            .map(|token| token.as_str().to_owned())
            .unwrap_or_else(|| default_branch.as_str().to_owned());
        let head = branches::pr_branch(author, &parent_name, &entry.commit.zen_token);
        let target = if index == 0 { remote_target.clone() } else { None };
        parent = Some(entry.commit.zen_token.clone());
        let next_base = head.clone();
        chain.push(CommitBranches::new(
            entry.commit,
            base,
            head,
            entry.pull_request,
            target,
        ));
        base = next_base;
    }
    chain
}

/// Materializes each chain entry's head branch: creates it from its build
/// target and cherry-picks the patch ref, or rebases an existing branch and
/// re-applies the commit's current content. A textual conflict aborts the
/// whole run; stacks are not partially published.
pub fn update_pr_branches(
    git_env: &impl GitEnv,
    chain: &mut [CommitBranches],
    outdated: &HashSet<ZenToken>,
) -> ZenResult<()> {
    for entry in chain.iter_mut() {
        let head = entry.head.clone();
        if !git::branch_exists(git_env, &head)? {
            git::branch_create(git_env, &head, entry.build_target())?;
            git::switch(git_env, &head)?;
            let output =
                git::cherry_pick(git_env, &patches::patch_ref(&entry.commit.zen_token))?;
            if git::output_contains(&output, EMPTY_CHERRY_PICK_MARKER) {
                git::cherry_pick_skip(git_env)?;
            } else if git::output_contains(&output, CONFLICT_MARKER) {
                return Err(ZenError::PublishConflict(head));
            }
        } else if outdated.contains(&entry.commit.zen_token) {
            git::switch(git_env, &head)?;
            let output = git::rebase(git_env, entry.build_target())?;
            if git::output_contains(&output, CONFLICT_MARKER) {
                return Err(ZenError::PublishConflict(head));
            }
            git::restore_source(git_env, &entry.commit.hash)?;
            if !git::is_working_tree_clean(git_env)? {
                let annotation =
                    format!("(cherry picked from commit {})", entry.commit.hash);
                git::commit(git_env, &[entry.commit.title.as_str(), annotation.as_str()])?;
            }
        } else {
            tracing::debug!(branch = %head, "branch up to date; nothing to rebuild");
        }
        entry.published_head = git::rev_parse(git_env, head.as_str())?;
    }
    Ok(())
}

/// Pushes each materialized branch: a plain push for a branch new to the
/// remote, nothing for a branch already up to date, and a force-with-lease
/// push for a branch whose history was rewritten this run (which includes
/// every branch downstream of a rewritten parent, since rebasing moved
/// them too).
pub fn publish_pr_branches(
    git_env: &impl GitEnv,
    chain: &[CommitBranches],
    config: &Config,
) -> ZenResult<()> {
    for entry in chain {
        let remote_ref = format!("{}/{}", config.remote, entry.head);
        let remote_hash = git::rev_parse(git_env, &remote_ref)?;
        match remote_hash {
            None => {
                git::push(git_env, &config.remote, &entry.head)?;
            }
            Some(ref hash) if Some(hash) == entry.published_head.as_ref() => {
                tracing::debug!(branch = %entry.head, "remote branch up to date");
            }
            Some(_) => {
                git::push_force_with_lease(git_env, &config.remote, &entry.head)?;
            }
        }
    }
    Ok(())
}

/// Creates a pull request for chain entries that have none, and edits the
/// base/title/body of entries whose head commit or base drifted. Entries
/// already in sync cost no API calls.
pub async fn sync_pull_requests(
    github_env: &impl GithubEnv,
    chain: &[CommitBranches],
) -> ZenResult<()> {
    for entry in chain {
        match &entry.pull_request {
            None => {
                // A PR whose body has no token could never be re-paired.
                if token::find_in_body(entry.commit.body.as_str()).is_none() {
                    return Err(ZenError::UntokenedPullRequest(entry.commit.hash.clone()));
                }
                let number = github_env
                    .create_pr(&entry.head, &entry.base, &entry.commit.title, &entry.commit.body)
                    .await?;
                tracing::info!(%number, branch = %entry.head, "created pull request");
            }
            Some(pull_request) => {
                let head_changed = entry
                    .published_head
                    .as_ref()
                    .map(|hash| *hash != pull_request.head_hash)
                    .unwrap_or(false);
                let base_drifted = pull_request.base_ref != entry.base;
                if head_changed || base_drifted {
                    github_env
                        .update_pr(
                            pull_request.number,
                            &entry.base,
                            &entry.commit.title,
                            &entry.commit.body,
                        )
                        .await?;
                    tracing::info!(number = %pull_request.number, "updated pull request");
                } else {
                    tracing::debug!(number = %pull_request.number, "pull request up to date");
                }
            }
        }
    }
    Ok(())
}
