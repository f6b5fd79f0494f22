//! The patch store: one durable record per zen-token.
//!
//! Each record lives at `.git/refs/gitzen/patches/<token>` and holds the
//! last published commit hash. Because the file sits under `refs/`, it is
//! simultaneously a real git ref — `refs/gitzen/patches/<token>` — which the
//! branch publisher uses as a cherry-pick source that survives the local
//! branch moving on.

use crate::{
    constants::PATCH_REF_NAMESPACE,
    errors::ZenResult,
    types::{CommitHash, GitBranchName, GitRootDir, ZenToken},
};
use std::path::PathBuf;

/// A durable record mapping a zen-token to the last hash published for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPatch {
    /// The durable identifier.
    pub zen_token: ZenToken,
    /// The hash last published for the token.
    pub hash: CommitHash,
}

impl GitPatch {
    /// Creates a new [GitPatch].
    pub fn new(zen_token: ZenToken, hash: CommitHash) -> Self {
        Self { zen_token, hash }
    }
}

/// The directory holding the patch records.
fn patches_dir(root_dir: &GitRootDir) -> PathBuf {
    let mut path = PathBuf::from(root_dir.as_str());
    path.push(".git");
    for part in PATCH_REF_NAMESPACE.split('/') {
        path.push(part);
    }
    path
}

/// The record file for `zen_token`.
fn patch_file(root_dir: &GitRootDir, zen_token: &ZenToken) -> PathBuf {
    patches_dir(root_dir).join(zen_token.as_str())
}

/// The git ref backed by the record file, usable as a cherry-pick source.
pub fn patch_ref(zen_token: &ZenToken) -> GitBranchName {
    GitBranchName::new(format!("{PATCH_REF_NAMESPACE}/{zen_token}"))
}

/// Persists the record, creating the metadata namespace on first use.
/// Failure is fatal for the run: the engine cannot safely proceed without a
/// durable publish marker.
pub fn write(root_dir: &GitRootDir, patch: &GitPatch) -> ZenResult<()> {
    std::fs::create_dir_all(patches_dir(root_dir))?;
    std::fs::write(
        patch_file(root_dir, &patch.zen_token),
        format!("{}\n", patch.hash),
    )?;
    tracing::debug!(token = %patch.zen_token, hash = %patch.hash, "wrote patch record");
    Ok(())
}

/// Reads the last published hash for `zen_token`, or [None] when the token
/// has never been published.
pub fn read(root_dir: &GitRootDir, zen_token: &ZenToken) -> Option<CommitHash> {
    let contents = std::fs::read_to_string(patch_file(root_dir, zen_token)).ok()?;
    let hash = contents.trim();
    (!hash.is_empty()).then(|| CommitHash::new(hash))
}

/// Removes the record for `zen_token`. Called when a commit/PR pairing is
/// pruned from the stack; missing records are fine.
pub fn delete(root_dir: &GitRootDir, zen_token: &ZenToken) -> ZenResult<()> {
    let path = patch_file(root_dir, zen_token);
    if path.exists() {
        std::fs::remove_file(path)?;
        tracing::debug!(token = %zen_token, "deleted patch record");
    }
    Ok(())
}

/// A patch is outdated iff no record exists for its token or the recorded
/// hash differs from the current commit's hash.
pub fn is_outdated(root_dir: &GitRootDir, zen_token: &ZenToken, hash: &CommitHash) -> bool {
    match read(root_dir, zen_token) {
        Some(recorded) => recorded != *hash,
        None => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_root() -> (tempfile::TempDir, GitRootDir) {
        let dir = tempfile::tempdir().unwrap();
        let root = GitRootDir::new(dir.path().display().to_string());
        (dir, root)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, root) = scratch_root();
        let patch = GitPatch::new(ZenToken::new("cafe0123"), CommitHash::new("a1b2c3"));
        write(&root, &patch).unwrap();
        assert_eq!(
            read(&root, &patch.zen_token),
            Some(CommitHash::new("a1b2c3"))
        );
    }

    #[test]
    fn unknown_token_reads_as_absent_and_outdated() {
        let (_dir, root) = scratch_root();
        let token = ZenToken::new("cafe0123");
        assert_eq!(read(&root, &token), None);
        assert!(is_outdated(&root, &token, &CommitHash::new("a1b2c3")));
    }

    #[test]
    fn outdated_exactly_when_hash_changed() {
        let (_dir, root) = scratch_root();
        let token = ZenToken::new("cafe0123");
        write(&root, &GitPatch::new(token.clone(), CommitHash::new("a1b2c3"))).unwrap();
        assert!(!is_outdated(&root, &token, &CommitHash::new("a1b2c3")));
        assert!(is_outdated(&root, &token, &CommitHash::new("d4e5f6")));
    }

    #[test]
    fn delete_removes_the_record_and_is_idempotent() {
        let (_dir, root) = scratch_root();
        let token = ZenToken::new("cafe0123");
        write(&root, &GitPatch::new(token.clone(), CommitHash::new("a1b2c3"))).unwrap();
        delete(&root, &token).unwrap();
        assert_eq!(read(&root, &token), None);
        delete(&root, &token).unwrap();
    }

    #[test]
    fn record_file_doubles_as_the_git_ref() {
        let (dir, root) = scratch_root();
        let token = ZenToken::new("cafe0123");
        write(&root, &GitPatch::new(token.clone(), CommitHash::new("a1b2c3"))).unwrap();
        let ref_path = dir
            .path()
            .join(".git")
            .join("refs")
            .join("gitzen")
            .join("patches")
            .join("cafe0123");
        assert!(ref_path.is_file());
    }

    #[test]
    fn patch_ref_is_under_the_refs_namespace() {
        assert_eq!(
            patch_ref(&ZenToken::new("cafe0123")),
            GitBranchName::new("refs/gitzen/patches/cafe0123")
        );
    }
}
