//! Scripted in-memory environments and object mothers shared by the unit
//! tests. Compiled for tests only.

use crate::{
    branches,
    errors::ZenResult,
    git::GitEnv,
    github::{GithubCommit, GithubEnv, GithubInfo, PullRequest},
    types::{
        CommitBody, CommitHash, CommitTitle, GitBranchName, GithubRepoId, GithubUsername,
        PullRequestBody, PullRequestId, PullRequestMergeable, PullRequestNumber,
        PullRequestReviewDecision, PullRequestTitle, ZenToken,
    },
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A [GitEnv] that records every invocation and replays scripted output.
///
/// Responses registered with [FakeGitEnv::on] are keyed on the full
/// argument list and consumed one per call. Unscripted invocations are
/// still recorded and return empty output, which keeps tests focused on
/// the commands whose stdout actually drives a decision.
pub struct FakeGitEnv {
    responses: Mutex<HashMap<String, VecDeque<Vec<String>>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeGitEnv {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues `response` for the next invocation of `git args`.
    pub fn on(self, args: &[&str], response: &[&str]) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(args.join(" "))
            .or_default()
            .push_back(response.iter().map(|line| (*line).to_owned()).collect());
        self
    }

    /// Every invocation so far, as joined argument lists, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl GitEnv for FakeGitEnv {
    fn git(&self, args: &[&str]) -> ZenResult<Vec<String>> {
        let key = args.join(" ");
        self.requests.lock().unwrap().push(key.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());
        Ok(response.unwrap_or_default())
    }
}

/// A [GithubEnv] that serves a prepared [GithubInfo] and records every
/// mutation for the test to assert on.
pub struct FakeGithubEnv {
    pub info: GithubInfo,
    pub created: Mutex<Vec<(GitBranchName, GitBranchName, CommitTitle, CommitBody)>>,
    pub updated: Mutex<Vec<(PullRequestNumber, GitBranchName, CommitTitle, CommitBody)>>,
    pub closed_with_comment: Mutex<Vec<(PullRequestNumber, String)>>,
    pub merged: Mutex<Vec<(PullRequestNumber, CommitHash)>>,
    next_number: Mutex<u64>,
}

impl FakeGithubEnv {
    pub fn with_pull_requests(pull_requests: Vec<PullRequest>) -> Self {
        Self {
            info: GithubInfo {
                username: GithubUsername::new("some-user"),
                repo_id: GithubRepoId::new("REPO_ID"),
                pull_requests,
            },
            ..Self::default()
        }
    }
}

impl Default for FakeGithubEnv {
    fn default() -> Self {
        Self {
            info: GithubInfo {
                username: GithubUsername::new("some-user"),
                repo_id: GithubRepoId::new("REPO_ID"),
                pull_requests: Vec::new(),
            },
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            closed_with_comment: Mutex::new(Vec::new()),
            merged: Mutex::new(Vec::new()),
            next_number: Mutex::new(100),
        }
    }
}

impl GithubEnv for FakeGithubEnv {
    async fn fetch_info(&self) -> ZenResult<GithubInfo> {
        Ok(self.info.clone())
    }

    async fn create_pr(
        &self,
        head: &GitBranchName,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<PullRequestNumber> {
        self.created.lock().unwrap().push((
            head.clone(),
            base.clone(),
            title.clone(),
            body.clone(),
        ));
        let mut next = self.next_number.lock().unwrap();
        *next += 1;
        Ok(PullRequestNumber::new(*next))
    }

    async fn update_pr(
        &self,
        number: PullRequestNumber,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<()> {
        self.updated.lock().unwrap().push((
            number,
            base.clone(),
            title.clone(),
            body.clone(),
        ));
        Ok(())
    }

    async fn close_pr_with_comment(
        &self,
        number: PullRequestNumber,
        comment: &str,
    ) -> ZenResult<()> {
        self.closed_with_comment
            .lock()
            .unwrap()
            .push((number, comment.to_owned()));
        Ok(())
    }

    async fn merge_squash(
        &self,
        number: PullRequestNumber,
        head_hash: &CommitHash,
    ) -> ZenResult<()> {
        self.merged.lock().unwrap().push((number, head_hash.clone()));
        Ok(())
    }
}

/// A 40-character hash derived from an 8-character token.
pub fn hash_for(token: &str) -> CommitHash {
    CommitHash::new(token.repeat(5))
}

/// A local stack commit carrying `token` in its message trailer.
pub fn gen_commit(token: &str) -> crate::stack::GitCommit {
    crate::stack::GitCommit {
        zen_token: ZenToken::new(token),
        hash: hash_for(token),
        title: CommitTitle::new(format!("Commit {token}")),
        body: CommitBody::new(format!("A test body.\n\nzen-token:{token}")),
        wip: false,
    }
}

/// An open pull request tracking `token`, shaped the way the GraphQL query
/// reports one.
pub fn gen_pr(token: &str, number: u64) -> PullRequest {
    let author = GithubUsername::new("some-user");
    PullRequest {
        id: PullRequestId::new(format!("PR_{number}")),
        zen_token: ZenToken::new(token),
        number: PullRequestNumber::new(number),
        author: author.clone(),
        title: PullRequestTitle::new(format!("Commit {token}")),
        body: PullRequestBody::new(format!("A test body.\n\nzen-token:{token}")),
        base_ref: GitBranchName::new("master"),
        head_ref: branches::pr_branch(&author, "master", &ZenToken::new(token)),
        head_hash: hash_for(token),
        mergeable: PullRequestMergeable::new("MERGEABLE"),
        review_decision: PullRequestReviewDecision::new("APPROVED"),
        repo_id: GithubRepoId::new("REPO_ID"),
        commits: vec![GithubCommit {
            zen_token: Some(ZenToken::new(token)),
            hash: hash_for(token),
            title: CommitTitle::new(format!("Commit {token}")),
            body: CommitBody::new(format!("A test body.\n\nzen-token:{token}")),
        }],
    }
}
