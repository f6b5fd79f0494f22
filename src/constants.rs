//! Constants for the `gz` application.

/// Name of the configuration file, relative to the repository root.
pub(crate) const CONFIG_FILE_NAME: &str = ".gitzen.toml";

/// Namespace prefix for generated pull request branches.
pub(crate) const BRANCH_NAMESPACE: &str = "gitzen/pr";

/// Namespace for the per-token patch refs, used as cherry-pick sources.
pub(crate) const PATCH_REF_NAMESPACE: &str = "refs/gitzen/patches";

/// Commit message trailer carrying the durable identifier.
pub(crate) const ZEN_TOKEN_TRAILER: &str = "zen-token:";

/// Title prefix marking a commit as work-in-progress.
pub(crate) const WIP_PREFIX: &str = "WIP ";

/// Comment left on a pull request when its backing commit has been deleted.
pub(crate) const CLOSE_COMMENT: &str = "Closing pull request: commit has gone away";

/// Marker emitted by `git` when a cherry-pick or rebase hits a textual conflict.
pub(crate) const CONFLICT_MARKER: &str = "CONFLICT";

/// Marker emitted by `git` when a cherry-pick resolves to an empty commit.
pub(crate) const EMPTY_CHERRY_PICK_MARKER: &str = "The previous cherry-pick is now empty";

/// Marker emitted by `git` when a fast-forward pull is rejected.
pub(crate) const PULL_REJECTED_MARKER: &str = "! [rejected]";

/// Contents of the commit-msg hook installed by `gz init`.
pub(crate) const COMMIT_MSG_HOOK: &str = "#!/usr/bin/env bash\ngz hook \"$1\"\n";
