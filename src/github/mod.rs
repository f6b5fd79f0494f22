//! The GitHub boundary for the `gz` application.
//!
//! One GraphQL query fetches the authenticated user's view of the open pull
//! requests; individual REST operations create, edit, comment on, close and
//! squash-merge them. The [GithubEnv] trait is the seam tests use to
//! substitute scripted responses.

use crate::{
    branches,
    errors::{ZenError, ZenResult},
    token,
    types::{
        CommitBody, CommitHash, CommitTitle, GitBranchName, GithubRepoId, GithubUsername,
        PullRequestBody, PullRequestId, PullRequestMergeable, PullRequestNumber,
        PullRequestReviewDecision, PullRequestTitle, ZenToken,
    },
};
use octocrab::Octocrab;
use serde::Deserialize;
use std::env;

/// A commit as GitHub sees it, which may lag the local stack until the next
/// synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubCommit {
    /// The zen-token recovered from the commit message, if any.
    pub zen_token: Option<ZenToken>,
    /// The commit hash on the remote.
    pub hash: CommitHash,
    /// The first line of the commit message.
    pub title: CommitTitle,
    /// The body of the commit message.
    pub body: CommitBody,
}

/// An open pull request, fetched fresh on every run and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// GitHub's node id.
    pub id: PullRequestId,
    /// The durable identifier recovered from the body or the commits.
    pub zen_token: ZenToken,
    /// The pull request number.
    pub number: PullRequestNumber,
    /// The author's login.
    pub author: GithubUsername,
    /// The title.
    pub title: PullRequestTitle,
    /// The body.
    pub body: PullRequestBody,
    /// The branch the pull request merges into.
    pub base_ref: GitBranchName,
    /// The branch holding the pull request's commits.
    pub head_ref: GitBranchName,
    /// The hash of the head commit.
    pub head_hash: CommitHash,
    /// GitHub's mergeability verdict.
    pub mergeable: PullRequestMergeable,
    /// GitHub's review decision.
    pub review_decision: PullRequestReviewDecision,
    /// GitHub's node id for the repository.
    pub repo_id: GithubRepoId,
    /// The commits on the pull request, oldest first.
    pub commits: Vec<GithubCommit>,
}

/// Everything one GraphQL round trip tells us about the remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubInfo {
    /// The authenticated user.
    pub username: GithubUsername,
    /// GitHub's node id for the repository.
    pub repo_id: GithubRepoId,
    /// The user's open pull requests on generated stack branches.
    pub pull_requests: Vec<PullRequest>,
}

/// The environment boundary for the hosted-PR operations.
#[allow(async_fn_in_trait)]
pub trait GithubEnv {
    /// Fetches the authenticated user, the repository id, and the open pull
    /// requests living on generated stack branches.
    async fn fetch_info(&self) -> ZenResult<GithubInfo>;

    /// Creates a pull request for `head` into `base`, titled and bodied
    /// from the commit.
    async fn create_pr(
        &self,
        head: &GitBranchName,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<PullRequestNumber>;

    /// Edits an existing pull request's base, title and body.
    async fn update_pr(
        &self,
        number: PullRequestNumber,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<()>;

    /// Leaves `comment` on the pull request and closes it.
    async fn close_pr_with_comment(
        &self,
        number: PullRequestNumber,
        comment: &str,
    ) -> ZenResult<()>;

    /// Squash-merges the pull request, guarded on `head_hash` still being
    /// the head commit.
    async fn merge_squash(
        &self,
        number: PullRequestNumber,
        head_hash: &CommitHash,
    ) -> ZenResult<()>;
}

// GraphQL originally adapted from ejoffe/spr's github client operations.
const PULL_REQUESTS_QUERY: &str = r#"query($repo_owner: String!, $repo_name: String!) {
    viewer { login }
    repository(owner: $repo_owner, name: $repo_name) {
        id
        pullRequests(first: 100, states: [OPEN]) {
            nodes {
                id
                number
                title
                body
                baseRefName
                headRefName
                author { login }
                mergeable
                reviewDecision
                repository { id }
                commits(first: 100) {
                    nodes {
                        commit {
                            oid
                            messageHeadline
                            messageBody
                        }
                    }
                }
            }
        }
    }
}"#;

#[derive(Deserialize)]
struct QueryData {
    viewer: ViewerNode,
    repository: RepositoryNode,
}

#[derive(Deserialize)]
struct ViewerNode {
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    id: String,
    pull_requests: PullRequestConnection,
}

#[derive(Deserialize)]
struct PullRequestConnection {
    nodes: Vec<PullRequestNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    id: String,
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    base_ref_name: String,
    head_ref_name: String,
    author: Option<AuthorNode>,
    mergeable: Option<String>,
    review_decision: Option<String>,
    repository: RepositoryIdNode,
    commits: CommitConnection,
}

#[derive(Deserialize)]
struct AuthorNode {
    login: String,
}

#[derive(Deserialize)]
struct RepositoryIdNode {
    id: String,
}

#[derive(Deserialize)]
struct CommitConnection {
    nodes: Vec<CommitNodeWrapper>,
}

#[derive(Deserialize)]
struct CommitNodeWrapper {
    commit: CommitNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitNode {
    oid: String,
    message_headline: String,
    #[serde(default)]
    message_body: String,
}

/// Maps the GraphQL payload to [GithubInfo], keeping only pull requests on
/// generated stack branches with a recoverable zen-token.
fn parse_info(data: serde_json::Value) -> ZenResult<GithubInfo> {
    let data: QueryData = serde_json::from_value(
        data.get("data").cloned().unwrap_or(serde_json::Value::Null),
    )?;
    let username = GithubUsername::new(data.viewer.login);
    let repo_id = GithubRepoId::new(data.repository.id);

    let mut pull_requests = Vec::new();
    for node in data.repository.pull_requests.nodes {
        let head_ref = GitBranchName::new(node.head_ref_name);
        if !branches::is_pr_branch(&head_ref) {
            continue;
        }
        let commits: Vec<GithubCommit> = node
            .commits
            .nodes
            .into_iter()
            .map(|wrapper| GithubCommit {
                zen_token: token::find_in_body(&wrapper.commit.message_body),
                hash: CommitHash::new(wrapper.commit.oid),
                title: CommitTitle::new(wrapper.commit.message_headline),
                body: CommitBody::new(wrapper.commit.message_body),
            })
            .collect();
        let zen_token = token::find_in_body(&node.body)
            .or_else(|| commits.iter().find_map(|commit| commit.zen_token.clone()));
        let Some(zen_token) = zen_token else {
            tracing::warn!(number = node.number, "skipping pull request without zen-token");
            continue;
        };
        let head_hash = commits
            .last()
            .map(|commit| commit.hash.clone())
            .unwrap_or_else(|| CommitHash::new(""));
        pull_requests.push(PullRequest {
            id: PullRequestId::new(node.id),
            zen_token,
            number: PullRequestNumber::new(node.number),
            author: GithubUsername::new(
                node.author.map(|author| author.login).unwrap_or_default(),
            ),
            title: PullRequestTitle::new(node.title),
            body: PullRequestBody::new(node.body),
            base_ref: GitBranchName::new(node.base_ref_name),
            head_ref,
            head_hash,
            mergeable: PullRequestMergeable::new(node.mergeable.unwrap_or_default()),
            review_decision: PullRequestReviewDecision::new(
                node.review_decision.unwrap_or_default(),
            ),
            repo_id: GithubRepoId::new(node.repository.id),
            commits,
        });
    }
    Ok(GithubInfo {
        username,
        repo_id,
        pull_requests,
    })
}

/// The [GithubEnv] backed by the GitHub API via `octocrab`.
pub struct RealGithubEnv {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl RealGithubEnv {
    /// Builds a client for `owner/repo`, authenticated with `GITHUB_TOKEN`.
    pub fn new(owner: String, repo: String) -> ZenResult<Self> {
        let github_token =
            env::var("GITHUB_TOKEN").map_err(|_| ZenError::MissingGithubToken)?;
        let octocrab = Octocrab::builder().personal_token(github_token).build()?;
        Ok(Self {
            octocrab,
            owner,
            repo,
        })
    }
}

impl GithubEnv for RealGithubEnv {
    async fn fetch_info(&self) -> ZenResult<GithubInfo> {
        tracing::debug!(owner = %self.owner, repo = %self.repo, "fetching pull requests");
        let response: serde_json::Value = self
            .octocrab
            .graphql(&serde_json::json!({
                "query": PULL_REQUESTS_QUERY,
                "variables": {
                    "repo_owner": self.owner,
                    "repo_name": self.repo,
                },
            }))
            .await?;
        parse_info(response)
    }

    async fn create_pr(
        &self,
        head: &GitBranchName,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<PullRequestNumber> {
        let created = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .create(title.as_str(), head.as_str(), base.as_str())
            .body(body.as_str())
            .send()
            .await?;
        Ok(PullRequestNumber::new(created.number))
    }

    async fn update_pr(
        &self,
        number: PullRequestNumber,
        base: &GitBranchName,
        title: &CommitTitle,
        body: &CommitBody,
    ) -> ZenResult<()> {
        self.octocrab
            .pulls(&self.owner, &self.repo)
            .update(number.value())
            .base(base.as_str())
            .title(title.as_str())
            .body(body.as_str())
            .send()
            .await?;
        Ok(())
    }

    async fn close_pr_with_comment(
        &self,
        number: PullRequestNumber,
        comment: &str,
    ) -> ZenResult<()> {
        self.octocrab
            .issues(&self.owner, &self.repo)
            .create_comment(number.value(), comment)
            .await?;
        self.octocrab
            .pulls(&self.owner, &self.repo)
            .update(number.value())
            .state(octocrab::params::pulls::State::Closed)
            .send()
            .await?;
        Ok(())
    }

    async fn merge_squash(
        &self,
        number: PullRequestNumber,
        head_hash: &CommitHash,
    ) -> ZenResult<()> {
        self.octocrab
            .pulls(&self.owner, &self.repo)
            .merge(number.value())
            .method(octocrab::params::pulls::MergeMethod::Squash)
            .sha(head_hash.as_str())
            .send()
            .await?;
        Ok(())
    }
}
