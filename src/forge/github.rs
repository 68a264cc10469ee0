//! forge::github
//!
//! GitHub forge implementation using REST and GraphQL APIs.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub. It uses:
//! - GraphQL for repository metadata, expression resolution, file lookups,
//!   commit creation (`createCommitOnBranch`) and auto-merge
//! - REST for refs, tag objects, pull requests and deployments
//!
//! Commits created through `createCommitOnBranch` are signed by GitHub, so
//! no local signing key is needed.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not implement automatic retry (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use ghup::forge::github::GitHubForge;
//! use ghup::core::config::token::Token;
//!
//! let forge = GitHubForge::new(Token::new("ghp_xxx"), "octocat/hello-world".parse()?);
//! let info = forge.repository_info().await?;
//! println!("default branch: {}", info.default_branch);
//! ```

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::traits::{
    CommitRequest, CreatePrRequest, Deployment, DeploymentRequest, DeploymentStatus,
    DeploymentStatusRequest, Forge, ForgeError, MergeCapabilities, MergeMethod, ObjectKind,
    PullRequest, RefEntry, RemoteRef, RepositoryInfo, TagObject,
};
use crate::core::config::token::Token;
use crate::core::types::{Oid, RefName, RefType, RepoSlug};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Web URL matching the default API base.
const DEFAULT_WEB_BASE: &str = "https://github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "ghup";

/// Page size for list endpoints.
const PER_PAGE: usize = 100;

/// GraphQL error text returned when `expectedHeadOid` no longer matches.
const EXPECTED_HEAD_MISMATCH: &str = "Expected branch to point to";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Access token
    token: Token,
    /// Repository coordinates
    repo: RepoSlug,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
    /// Web base URL used for commit links
    web_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("token", &"[REDACTED]")
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for `repo` on github.com.
    pub fn new(token: Token, repo: RepoSlug) -> Self {
        Self::with_api_base(token, repo, DEFAULT_API_BASE)
    }

    /// Create a forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (`https://github.example.com/api/v3`)
    /// or to point at a test server.
    pub fn with_api_base(token: Token, repo: RepoSlug, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let web_base = if api_base == DEFAULT_API_BASE {
            DEFAULT_WEB_BASE.to_string()
        } else {
            api_base
                .strip_suffix("/api/v3")
                .unwrap_or(&api_base)
                .to_string()
        };

        Self {
            client: Client::new(),
            token,
            repo,
            api_base,
            web_base,
        }
    }

    /// GraphQL endpoint derived from the API base.
    fn graphql_url(&self) -> String {
        match self.api_base.strip_suffix("/v3") {
            Some(root) => format!("{root}/graphql"),
            None => format!("{}/graphql", self.api_base),
        }
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token.expose()))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, path
        )
    }

    /// Build URL for a ref endpoint, escaping each path segment of the short name.
    fn ref_url(&self, endpoint: &str, name: &RefName) -> String {
        let segments: Vec<_> = name.short().split('/').map(urlencoding::encode).collect();
        self.repo_url(&format!("{endpoint}/{}", segments.join("/")))
    }

    /// Send a request with auth headers attached.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ForgeError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Send a request and decode the JSON response.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    /// Like [`fetch`](Self::fetch), mapping 404 to `None`.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ForgeError> {
        match self.fetch(request).await {
            Ok(value) => Ok(Some(value)),
            Err(ForgeError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    /// Map an error response from the API.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        // GitHub Apps use X-Accepted-GitHub-Permissions, classic OAuth uses X-Accepted-OAuth-Scopes.
        let headers = response.headers();
        let required_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .or_else(|| headers.get("X-Accepted-OAuth-Scopes"))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let rate_limited = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0");

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if rate_limited => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Execute a GraphQL query or mutation.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ForgeError> {
        let body = json!({ "query": query, "variables": variables });
        let request = self.client.post(self.graphql_url()).json(&body);
        let result: GraphQLResponse<T> = self.fetch(request).await?;

        if let Some(error) = result.errors.and_then(|e| e.into_iter().next()) {
            return Err(error.into());
        }
        result.data.ok_or_else(|| ForgeError::ApiError {
            status: 200,
            message: "GraphQL response contained no data".into(),
        })
    }

    /// Owner and name as GraphQL variables, merged with `extra`.
    fn repo_variables(&self, extra: serde_json::Value) -> serde_json::Value {
        let mut vars = json!({ "owner": self.repo.owner, "name": self.repo.name });
        if let (Some(map), serde_json::Value::Object(extra)) = (vars.as_object_mut(), extra) {
            map.extend(extra);
        }
        vars
    }

    /// Look up the file entry for `path` at `branch`.
    async fn file_entry(&self, branch: &str, path: &str) -> Result<Option<GqlFile>, ForgeError> {
        let data: GqlRepositoryData<GqlFileObject> = self
            .graphql(
                FILE_QUERY,
                self.repo_variables(json!({ "expression": branch, "path": path })),
            )
            .await?;
        Ok(data
            .repository
            .and_then(|r| r.object)
            .and_then(|o| o.file))
    }

    /// Follow annotated tag objects down to a commit.
    async fn peel(&self, mut object: GitHubObject) -> Result<Oid, ForgeError> {
        while object.kind == "tag" {
            let tag: GitHubTag = self
                .fetch(self.client.get(self.repo_url(&format!("git/tags/{}", object.sha))))
                .await?;
            object = tag.object;
        }
        parse_oid(&object.sha)
    }
}

fn parse_oid(s: &str) -> Result<Oid, ForgeError> {
    Oid::new(s).map_err(|e| ForgeError::ApiError {
        status: 200,
        message: format!("unexpected object id from GitHub: {e}"),
    })
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    fn repository(&self) -> &RepoSlug {
        &self.repo
    }

    fn commit_url(&self, sha: &Oid) -> String {
        format!(
            "{}/{}/{}/commit/{}",
            self.web_base, self.repo.owner, self.repo.name, sha
        )
    }

    async fn repository_info(&self) -> Result<RepositoryInfo, ForgeError> {
        let data: GqlRepositoryData<GqlRepositoryInfo> = self
            .graphql(REPOSITORY_INFO_QUERY, self.repo_variables(json!({})))
            .await?;
        let repo = data
            .repository
            .ok_or_else(|| ForgeError::NotFound(format!("repository {}", self.repo)))?;

        let (default_branch, default_branch_oid) = match repo.default_branch_ref {
            Some(r) => (r.name, Some(parse_oid(&r.target.oid)?)),
            None => (String::new(), None),
        };

        Ok(RepositoryInfo {
            node_id: repo.id,
            is_empty: repo.is_empty,
            default_branch,
            default_branch_oid,
            merge: MergeCapabilities {
                auto_merge_allowed: repo.auto_merge_allowed,
                merge_commit_allowed: repo.merge_commit_allowed,
                squash_merge_allowed: repo.squash_merge_allowed,
                rebase_merge_allowed: repo.rebase_merge_allowed,
            },
        })
    }

    async fn commit_sha(&self, hash: &str) -> Result<Option<Oid>, ForgeError> {
        let request = self.client.get(self.repo_url(&format!("commits/{hash}")));
        match self.fetch::<GitHubCommit>(request).await {
            Ok(commit) => parse_oid(&commit.sha).map(Some),
            // 422 is returned for a syntactically valid hash with no matching commit
            Err(ForgeError::NotFound(_)) | Err(ForgeError::ApiError { status: 422, .. }) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_expression(&self, expression: &str) -> Result<Option<Oid>, ForgeError> {
        let data: GqlRepositoryData<GqlObjectHolder> = self
            .graphql(
                RESOLVE_QUERY,
                self.repo_variables(json!({ "expression": expression })),
            )
            .await?;

        let Some(object) = data.repository.and_then(|r| r.object) else {
            return Ok(None);
        };
        debug!("{} resolved to {} {}", expression, object.typename, object.oid);

        match object.typename.as_str() {
            "Commit" => parse_oid(&object.oid).map(Some),
            "Tag" => match object.target {
                Some(target) if target.typename == "Commit" => parse_oid(&target.oid).map(Some),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    async fn file_oid(&self, branch: &str, path: &str) -> Result<Option<Oid>, ForgeError> {
        match self.file_entry(branch, path).await? {
            Some(file) => parse_oid(&file.oid).map(Some),
            None => Ok(None),
        }
    }

    async fn file_text(&self, branch: &str, path: &str) -> Result<Option<String>, ForgeError> {
        Ok(self
            .file_entry(branch, path)
            .await?
            .and_then(|f| f.object)
            .filter(|blob| !blob.is_binary.unwrap_or(false))
            .and_then(|blob| blob.text))
    }

    async fn get_ref(&self, name: &RefName) -> Result<Option<RemoteRef>, ForgeError> {
        let request = self.client.get(self.ref_url("git/ref", name));
        let Some(found) = self.fetch_optional::<GitHubRefResponse>(request).await? else {
            return Ok(None);
        };

        Ok(Some(RemoteRef {
            name: name.clone(),
            oid: parse_oid(&found.object.sha)?,
            kind: if found.object.kind == "tag" {
                ObjectKind::Tag
            } else {
                ObjectKind::Commit
            },
        }))
    }

    async fn create_ref(&self, name: &RefName, oid: &Oid) -> Result<(), ForgeError> {
        let body = CreateRefBody {
            ref_name: name.as_str(),
            sha: oid.as_str(),
        };
        let _: IgnoredAny = self
            .fetch(self.client.post(self.repo_url("git/refs")).json(&body))
            .await?;
        Ok(())
    }

    async fn update_ref(&self, name: &RefName, oid: &Oid, force: bool) -> Result<(), ForgeError> {
        let body = UpdateRefBody {
            sha: oid.as_str(),
            force,
        };
        let url = self.ref_url("git/refs", name);
        let _: IgnoredAny = self.fetch(self.client.patch(url).json(&body)).await?;
        Ok(())
    }

    async fn delete_ref(&self, name: &RefName) -> Result<(), ForgeError> {
        let url = self.ref_url("git/refs", name);
        let response = self.send(self.client.delete(url)).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    async fn create_tag_object(
        &self,
        tag: &str,
        message: &str,
        target: &Oid,
    ) -> Result<Oid, ForgeError> {
        let body = CreateTagBody {
            tag,
            message,
            object: target.as_str(),
            kind: "commit",
        };
        let created: GitHubTag = self
            .fetch(self.client.post(self.repo_url("git/tags")).json(&body))
            .await?;
        parse_oid(&created.sha)
    }

    async fn get_tag_object(&self, oid: &Oid) -> Result<TagObject, ForgeError> {
        let tag: GitHubTag = self
            .fetch(self.client.get(self.repo_url(&format!("git/tags/{oid}"))))
            .await?;
        Ok(TagObject {
            oid: parse_oid(&tag.sha)?,
            tag: tag.tag,
            message: tag.message,
            target: self.peel(tag.object).await?,
        })
    }

    async fn list_refs(&self, ref_type: RefType) -> Result<Vec<RefEntry>, ForgeError> {
        let url = self.repo_url(&format!("git/matching-refs/{ref_type}"));
        let mut entries = Vec::new();

        for page in 1.. {
            let request = self
                .client
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let refs: Vec<GitHubRefResponse> = self.fetch(request).await?;
            let count = refs.len();

            for r in refs {
                let Ok(name) = RefName::new(r.ref_name.as_str()) else {
                    debug!("skipping unparseable ref {}", r.ref_name);
                    continue;
                };
                entries.push(RefEntry {
                    name,
                    commit: self.peel(r.object).await?,
                });
            }

            if count < PER_PAGE {
                break;
            }
        }

        Ok(entries)
    }

    async fn create_commit(&self, request: CommitRequest) -> Result<Oid, ForgeError> {
        let engine = base64::engine::general_purpose::STANDARD;
        let additions: Vec<_> = request
            .additions
            .iter()
            .map(|a| json!({ "path": a.path, "contents": engine.encode(&a.contents) }))
            .collect();
        let deletions: Vec<_> = request
            .deletions
            .iter()
            .map(|path| json!({ "path": path }))
            .collect();

        let input = json!({
            "branch": {
                "repositoryNameWithOwner": self.repo.to_string(),
                "branchName": request.branch.as_str(),
            },
            "message": request.message,
            "expectedHeadOid": request.expected_head.as_str(),
            "fileChanges": { "additions": additions, "deletions": deletions },
        });

        let data: GqlCreateCommitData = self
            .graphql(CREATE_COMMIT_MUTATION, json!({ "input": input }))
            .await?;
        let commit = data
            .create_commit_on_branch
            .and_then(|c| c.commit)
            .ok_or_else(|| ForgeError::ApiError {
                status: 200,
                message: "createCommitOnBranch returned no commit".into(),
            })?;
        parse_oid(&commit.oid)
    }

    async fn find_pull_request(
        &self,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>, ForgeError> {
        let head_param = format!("{}:{}", self.repo.owner, head);
        let request = self.client.get(self.repo_url("pulls")).query(&[
            ("head", head_param.as_str()),
            ("base", base),
            ("state", "open"),
        ]);
        let prs: Vec<GitHubPullRequest> = self.fetch(request).await?;

        let full_name = self.repo.to_string();
        Ok(prs
            .into_iter()
            .find(|pr| {
                pr.head
                    .repo
                    .as_ref()
                    .is_some_and(|r| r.full_name.eq_ignore_ascii_case(&full_name))
            })
            .map(Into::into))
    }

    async fn create_pull_request(
        &self,
        request: CreatePrRequest,
    ) -> Result<PullRequest, ForgeError> {
        let body = CreatePrBody {
            head: &request.head,
            base: &request.base,
            title: &request.title,
            body: request.body.as_deref(),
            draft: request.draft,
        };
        let pr: GitHubPullRequest = self
            .fetch(self.client.post(self.repo_url("pulls")).json(&body))
            .await?;
        Ok(pr.into())
    }

    async fn enable_auto_merge(
        &self,
        pr: &PullRequest,
        method: MergeMethod,
    ) -> Result<(), ForgeError> {
        let node_id = pr
            .node_id
            .as_deref()
            .ok_or_else(|| ForgeError::NotFound(format!("node id of PR #{}", pr.number)))?;
        let _: IgnoredAny = self
            .graphql(
                ENABLE_AUTO_MERGE_MUTATION,
                json!({ "id": node_id, "method": method.graphql_name() }),
            )
            .await?;
        Ok(())
    }

    async fn list_deployments(
        &self,
        sha: &Oid,
        environment: &str,
    ) -> Result<Vec<Deployment>, ForgeError> {
        let request = self
            .client
            .get(self.repo_url("deployments"))
            .query(&[("sha", sha.as_str()), ("environment", environment)]);
        let deployments: Vec<GitHubDeployment> = self.fetch(request).await?;
        deployments.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_deployment(
        &self,
        request: DeploymentRequest,
    ) -> Result<Deployment, ForgeError> {
        let body = CreateDeploymentBody {
            ref_name: request.sha.as_str(),
            environment: &request.environment,
            description: request.description.as_deref(),
            transient_environment: request.transient,
            production_environment: request.production,
            auto_merge: false,
            required_contexts: &[],
        };
        let deployment: GitHubDeployment = self
            .fetch(self.client.post(self.repo_url("deployments")).json(&body))
            .await?;
        deployment.try_into()
    }

    async fn create_deployment_status(
        &self,
        deployment_id: u64,
        request: DeploymentStatusRequest,
    ) -> Result<DeploymentStatus, ForgeError> {
        let body = CreateDeploymentStatusBody {
            state: request.state.as_str(),
            description: request.description.as_deref(),
            environment_url: request.environment_url.as_deref(),
        };
        let url = self.repo_url(&format!("deployments/{deployment_id}/statuses"));
        let status: GitHubDeploymentStatus = self.fetch(self.client.post(url).json(&body)).await?;
        Ok(DeploymentStatus {
            id: status.id,
            state: request.state,
        })
    }
}

// --------------------------------------------------------------------------
// GraphQL Documents
// --------------------------------------------------------------------------

const REPOSITORY_INFO_QUERY: &str = r#"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    isEmpty
    autoMergeAllowed
    mergeCommitAllowed
    squashMergeAllowed
    rebaseMergeAllowed
    defaultBranchRef { name target { oid } }
  }
}"#;

const RESOLVE_QUERY: &str = r#"query($owner: String!, $name: String!, $expression: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      __typename
      oid
      ... on Tag { target { __typename oid } }
    }
  }
}"#;

const FILE_QUERY: &str = r#"query($owner: String!, $name: String!, $expression: String!, $path: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Commit {
        file(path: $path) {
          oid
          object { ... on Blob { text isBinary } }
        }
      }
    }
  }
}"#;

const CREATE_COMMIT_MUTATION: &str = r#"mutation($input: CreateCommitOnBranchInput!) {
  createCommitOnBranch(input: $input) { commit { oid } }
}"#;

const ENABLE_AUTO_MERGE_MUTATION: &str = r#"mutation($id: ID!, $method: PullRequestMergeMethod!) {
  enablePullRequestAutoMerge(input: {pullRequestId: $id, mergeMethod: $method}) {
    clientMutationId
  }
}"#;

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    head: &'a str,
    base: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    draft: bool,
}

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for moving a ref.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// Request body for creating a tag object.
#[derive(Serialize)]
struct CreateTagBody<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Request body for creating a deployment.
#[derive(Serialize)]
struct CreateDeploymentBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    environment: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    transient_environment: bool,
    production_environment: bool,
    auto_merge: bool,
    required_contexts: &'a [&'a str],
}

/// Request body for creating a deployment status.
#[derive(Serialize)]
struct CreateDeploymentStatusBody<'a> {
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment_url: Option<&'a str>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
}

/// Object a ref or tag points at.
#[derive(Deserialize)]
struct GitHubObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct GitHubRefResponse {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubObject,
}

#[derive(Deserialize)]
struct GitHubTag {
    sha: String,
    tag: String,
    message: String,
    object: GitHubObject,
}

/// GitHub PR response format.
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    #[serde(default)]
    draft: bool,
    head: GitHubPrRef,
    base: GitHubPrRef,
    title: String,
    node_id: String,
}

/// GitHub ref (head/base) format.
#[derive(Deserialize)]
struct GitHubPrRef {
    #[serde(rename = "ref")]
    ref_name: String,
    /// Repository info (None for deleted forks)
    repo: Option<GitHubRepoInfo>,
}

/// Minimal GitHub repository info.
#[derive(Deserialize)]
struct GitHubRepoInfo {
    full_name: String,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            url: pr.html_url,
            is_draft: pr.draft,
            head: pr.head.ref_name,
            base: pr.base.ref_name,
            title: pr.title,
            node_id: Some(pr.node_id),
        }
    }
}

#[derive(Deserialize)]
struct GitHubDeployment {
    id: u64,
    sha: String,
    environment: String,
}

impl TryFrom<GitHubDeployment> for Deployment {
    type Error = ForgeError;

    fn try_from(d: GitHubDeployment) -> Result<Self, Self::Error> {
        Ok(Deployment {
            id: d.id,
            sha: parse_oid(&d.sha)?,
            environment: d.environment,
        })
    }
}

#[derive(Deserialize)]
struct GitHubDeploymentStatus {
    id: u64,
}

/// GraphQL response wrapper.
#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error format.
#[derive(Deserialize)]
struct GraphQLError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl From<GraphQLError> for ForgeError {
    fn from(error: GraphQLError) -> Self {
        if error.message.contains(EXPECTED_HEAD_MISMATCH) {
            return ForgeError::Conflict(error.message);
        }
        match error.kind.as_deref() {
            Some("NOT_FOUND") => ForgeError::NotFound(error.message),
            Some("RATE_LIMITED") => ForgeError::RateLimited,
            Some("FORBIDDEN") => ForgeError::AuthFailed(error.message),
            _ => ForgeError::ApiError {
                status: 200,
                message: error.message,
            },
        }
    }
}

#[derive(Deserialize)]
struct GqlRepositoryData<T> {
    repository: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlRepositoryInfo {
    id: String,
    is_empty: bool,
    auto_merge_allowed: bool,
    merge_commit_allowed: bool,
    squash_merge_allowed: bool,
    rebase_merge_allowed: bool,
    default_branch_ref: Option<GqlRef>,
}

#[derive(Deserialize)]
struct GqlRef {
    name: String,
    target: GqlOid,
}

#[derive(Deserialize)]
struct GqlOid {
    oid: String,
}

#[derive(Deserialize)]
struct GqlObjectHolder {
    object: Option<GqlObject>,
}

#[derive(Deserialize)]
struct GqlObject {
    #[serde(rename = "__typename")]
    typename: String,
    oid: String,
    target: Option<GqlTarget>,
}

#[derive(Deserialize)]
struct GqlTarget {
    #[serde(rename = "__typename")]
    typename: String,
    oid: String,
}

#[derive(Deserialize)]
struct GqlFileObject {
    object: Option<GqlFileCommit>,
}

#[derive(Deserialize)]
struct GqlFileCommit {
    #[serde(default)]
    file: Option<GqlFile>,
}

#[derive(Deserialize)]
struct GqlFile {
    oid: String,
    object: Option<GqlBlob>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlBlob {
    text: Option<String>,
    is_binary: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlCreateCommitData {
    create_commit_on_branch: Option<GqlCreatedCommit>,
}

#[derive(Deserialize)]
struct GqlCreatedCommit {
    commit: Option<GqlOid>,
}

// --------------------------------------------------------------------------
// URL Parsing
// --------------------------------------------------------------------------

/// Parse a GitHub remote URL to extract owner and repo.
///
/// Supports both SSH and HTTPS formats:
/// - `git@github.com:owner/repo.git`
/// - `ssh://git@github.com/owner/repo.git`
/// - `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo`
///
/// # Returns
///
/// `Some(RepoSlug)` if the URL is a valid GitHub URL, `None` otherwise.
///
/// # Example
///
/// ```
/// use ghup::forge::github::parse_github_url;
///
/// let slug = parse_github_url("git@github.com:octocat/hello-world.git").unwrap();
/// assert_eq!(slug.owner, "octocat");
/// assert_eq!(slug.name, "hello-world");
/// ```
pub fn parse_github_url(url: &str) -> Option<RepoSlug> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let (owner, name) = rest.split_once('/')?;
    RepoSlug::new(owner, name).ok()
}
