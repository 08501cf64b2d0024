//! forge::github
//!
//! GitHub implementation of [`ObjectGraph`] over the REST git data API.
//!
//! # Design
//!
//! One `GitHubObjectGraph` holds the HTTP client, the API root and the
//! token; repositories are passed per call. Blobs and file contents are
//! fetched with the raw media type, so no base64 decoding is involved.
//!
//! # Rate Limiting
//!
//! [`GitHubObjectGraph::connect`] reads the rate-limit status once and
//! logs a warning when less than 30% of the quota remains. Requests that
//! hit the limit return `ForgeError::RateLimited`; nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use treeline::core::types::{RefName, RepositoryIdentity};
//! use treeline::forge::github::GitHubObjectGraph;
//! use treeline::forge::ObjectGraph;
//!
//! # tokio_test::block_on(async {
//! let graph = GitHubObjectGraph::connect("ghp_xxx", "https://api.github.com").await;
//! let repo = RepositoryIdentity::new("octocat", "hello-world");
//! let main = graph
//!     .get_ref(&repo, &RefName::for_existing_branch("main"))
//!     .await?;
//! println!("main is at {}", main.target);
//! # Ok::<(), treeline::forge::ForgeError>(())
//! # });
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::traits::{
    CreateCommitRequest, ForgeError, GitRef, ObjectGraph, Page, PageRequest, RepositoryMetadata,
};
use crate::core::types::{
    BranchReference, CommitObject, EntryPayload, FileMode, ObjectId, ObjectKind, RefName,
    RepositoryIdentity, Signature, Tree, TreeEntry,
};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "treeline-cli";

/// JSON media type for API requests.
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Raw media type: blob and file bodies come back as bytes.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Warn when less than this share (in percent) of the quota remains.
const RATE_LIMIT_WARN_PERCENT: u64 = 30;

/// GitHub object graph.
pub struct GitHubObjectGraph {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token or app token
    token: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubObjectGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubObjectGraph")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubObjectGraph {
    /// Create a client without contacting the API.
    ///
    /// `api_base` is the REST root, e.g. `https://api.github.com` or
    /// `https://github.example.com/api/v3`.
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client and run the one-time rate-limit check.
    pub async fn connect(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let graph = Self::new(token, api_base);
        graph.check_rate_limit().await;
        graph
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Log a warning when the remaining quota is low.
    ///
    /// Failures are logged at debug level and otherwise ignored.
    async fn check_rate_limit(&self) {
        match self.rate_limit().await {
            Ok(status) => {
                let RateLimitWindow { limit, remaining } = status.rate;
                debug!(limit, remaining, "rate limit status");
                if quota_is_low(limit, remaining) {
                    warn!(
                        limit,
                        remaining,
                        "GitHub API quota is running low ({remaining} of {limit} requests left)"
                    );
                }
            }
            Err(e) => debug!(error = %e, "rate limit check failed"),
        }
    }

    async fn rate_limit(&self) -> Result<RateLimitResponse, ForgeError> {
        let url = format!("{}/rate_limit", self.api_base);
        let response = self.send(self.client.get(&url), JSON_MEDIA_TYPE).await?;
        self.handle_response(response).await
    }

    /// Build common headers for API requests.
    fn headers(&self, accept: &'static str) -> Result<HeaderMap, ForgeError> {
        if self.token.is_empty() {
            return Err(ForgeError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    ///
    /// Every segment is percent-encoded on its own, so `#`, `?`, `%` and
    /// spaces in branch names or file paths stay inside their segment.
    fn repo_url<'a>(
        &self,
        repo: &RepositoryIdentity,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, ForgeError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            ForgeError::NetworkError(format!("invalid API base '{}': {e}", self.api_base))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ForgeError::NetworkError(format!("invalid API base '{}'", self.api_base))
            })?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Attach headers and send a request.
    async fn send(
        &self,
        request: RequestBuilder,
        accept: &'static str,
    ) -> Result<Response, ForgeError> {
        request
            .headers(self.headers(accept)?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
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
            Err(error_from_response(response).await)
        }
    }

    /// Handle a raw-media response.
    async fn handle_raw_response(&self, response: Response) -> Result<Vec<u8>, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| ForgeError::NetworkError(e.to_string()))
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Fetch one page of a JSON listing, reading the next page from `Link`.
    async fn get_page<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<Page<T>, ForgeError> {
        let response = self.send(request, JSON_MEDIA_TYPE).await?;
        let next_page = next_page_from_link(
            response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok()),
        );
        let items: Vec<T> = self.handle_response(response).await?;
        Ok(Page { items, next_page })
    }
}

/// Non-empty `/`-separated parts of a branch name or file path.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Whether less than [`RATE_LIMIT_WARN_PERCENT`] of the quota remains.
fn quota_is_low(limit: u64, remaining: u64) -> bool {
    limit > 0 && remaining * 100 < limit * RATE_LIMIT_WARN_PERCENT
}

/// Map an error response to a `ForgeError`.
async fn error_from_response(response: Response) -> ForgeError {
    let status = response.status();
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");

    // Try to get error message from body
    let message = match response.json::<GitHubErrorResponse>().await {
        Ok(err) => err.message,
        Err(_) => "Unknown error".to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
        StatusCode::FORBIDDEN if quota_exhausted => ForgeError::RateLimited,
        StatusCode::FORBIDDEN => ForgeError::AuthFailed(format!("Permission denied: {message}")),
        StatusCode::NOT_FOUND => ForgeError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ForgeError::Rejected(message),
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

/// Extract the `page` of the `rel="next"` link from a `Link` header.
fn next_page_from_link(header: Option<&str>) -> Option<u32> {
    header?
        .split(',')
        .filter_map(|part| {
            let (target, params) = part.split_once(';')?;
            params
                .split(';')
                .any(|p| p.trim() == r#"rel="next""#)
                .then_some(target)
        })
        .find_map(|target| {
            let target = target.trim().trim_start_matches('<').trim_end_matches('>');
            let url = Url::parse(target).ok()?;
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, page)| page.parse().ok())
        })
}

#[async_trait]
impl ObjectGraph for GitHubObjectGraph {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
    ) -> Result<GitRef, ForgeError> {
        let path = ["git", "ref"].into_iter().chain(segments(name.short_path()));
        let url = self.repo_url(repo, path)?;
        let response = self.send(self.client.get(url), JSON_MEDIA_TYPE).await?;
        let reference: GitHubRef = self.handle_response(response).await?;
        reference.try_into()
    }

    async fn get_commit(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<CommitObject, ForgeError> {
        let url = self.repo_url(repo, ["git", "commits", id.as_str()])?;
        let response = self.send(self.client.get(url), JSON_MEDIA_TYPE).await?;
        let commit: GitHubGitCommit = self.handle_response(response).await?;
        commit.try_into()
    }

    async fn get_tree(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
        recursive: bool,
    ) -> Result<Tree, ForgeError> {
        let url = self.repo_url(repo, ["git", "trees", id.as_str()])?;
        let mut request = self.client.get(url);
        if recursive {
            request = request.query(&[("recursive", "1")]);
        }
        let response = self.send(request, JSON_MEDIA_TYPE).await?;
        let tree: GitHubTree = self.handle_response(response).await?;
        tree.try_into()
    }

    async fn create_tree(
        &self,
        repo: &RepositoryIdentity,
        base: &ObjectId,
        entries: &[TreeEntry],
    ) -> Result<Tree, ForgeError> {
        let url = self.repo_url(repo, ["git", "trees"])?;
        let body = CreateTreeBody {
            base_tree: base.as_str(),
            tree: entries.iter().map(TreeEntryBody::from).collect(),
        };
        let response = self
            .send(self.client.post(url).json(&body), JSON_MEDIA_TYPE)
            .await?;
        let tree: GitHubTree = self.handle_response(response).await?;
        tree.try_into()
    }

    async fn create_commit(
        &self,
        repo: &RepositoryIdentity,
        request: CreateCommitRequest,
    ) -> Result<CommitObject, ForgeError> {
        let url = self.repo_url(repo, ["git", "commits"])?;
        let body = CreateCommitBody {
            message: &request.message,
            tree: request.tree.as_str(),
            parents: request.parents.iter().map(ObjectId::as_str).collect(),
        };
        let response = self
            .send(self.client.post(url).json(&body), JSON_MEDIA_TYPE)
            .await?;
        let commit: GitHubGitCommit = self.handle_response(response).await?;
        commit.try_into()
    }

    async fn create_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
    ) -> Result<GitRef, ForgeError> {
        let url = self.repo_url(repo, ["git", "refs"])?;
        let body = CreateRefBody {
            ref_name: name.as_str(),
            sha: target.as_str(),
        };
        let response = self
            .send(self.client.post(url).json(&body), JSON_MEDIA_TYPE)
            .await?;
        let reference: GitHubRef = self.handle_response(response).await?;
        reference.try_into()
    }

    async fn update_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
        force: bool,
    ) -> Result<GitRef, ForgeError> {
        let path = ["git", "refs"].into_iter().chain(segments(name.short_path()));
        let url = self.repo_url(repo, path)?;
        let body = UpdateRefBody {
            sha: target.as_str(),
            force,
        };
        let response = self
            .send(self.client.patch(url).json(&body), JSON_MEDIA_TYPE)
            .await?;
        let reference: GitHubRef = self.handle_response(response).await?;
        reference.try_into()
    }

    async fn list_branches(
        &self,
        repo: &RepositoryIdentity,
        page: PageRequest,
    ) -> Result<Page<BranchReference>, ForgeError> {
        let url = self.repo_url(repo, ["branches"])?;
        let request = self
            .client
            .get(url)
            .query(&[("per_page", page.per_page), ("page", page.page)]);
        let branches: Page<GitHubBranch> = self.get_page(request).await?;

        Ok(Page {
            items: branches
                .items
                .into_iter()
                .map(BranchReference::try_from)
                .collect::<Result<_, _>>()?,
            next_page: branches.next_page,
        })
    }

    async fn get_repository(
        &self,
        repo: &RepositoryIdentity,
    ) -> Result<RepositoryMetadata, ForgeError> {
        let url = self.repo_url(repo, std::iter::empty())?;
        let response = self.send(self.client.get(url), JSON_MEDIA_TYPE).await?;
        let info: GitHubRepository = self.handle_response(response).await?;
        Ok(RepositoryMetadata {
            default_branch: info.default_branch,
            url: info.html_url,
        })
    }

    async fn get_blob_raw(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<Vec<u8>, ForgeError> {
        let url = self.repo_url(repo, ["git", "blobs", id.as_str()])?;
        let response = self.send(self.client.get(url), RAW_MEDIA_TYPE).await?;
        self.handle_raw_response(response).await
    }

    async fn list_commits(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        page: PageRequest,
    ) -> Result<Page<CommitObject>, ForgeError> {
        let url = self.repo_url(repo, ["commits"])?;
        let request = self.client.get(url).query(&[
            ("path", path.to_string()),
            ("per_page", page.per_page.to_string()),
            ("page", page.page.to_string()),
        ]);
        let commits: Page<GitHubCommitListItem> = self.get_page(request).await?;

        Ok(Page {
            items: commits
                .items
                .into_iter()
                .map(CommitObject::try_from)
                .collect::<Result<_, _>>()?,
            next_page: commits.next_page,
        })
    }

    async fn get_file_contents(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        reference: &str,
    ) -> Result<Vec<u8>, ForgeError> {
        let parts = ["contents"].into_iter().chain(segments(path));
        let url = self.repo_url(repo, parts)?;
        let request = self.client.get(url).query(&[("ref", reference)]);
        let response = self.send(request, RAW_MEDIA_TYPE).await?;
        self.handle_raw_response(response).await
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

/// One entry in a tree creation request.
///
/// A deletion is sent as `"sha": null` with no content; omitting `sha`
/// entirely would be an invalid entry.
#[derive(Debug, Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<Option<&'a str>>,
}

impl<'a> From<&'a TreeEntry> for TreeEntryBody<'a> {
    fn from(entry: &'a TreeEntry) -> Self {
        let (content, sha) = match &entry.payload {
            EntryPayload::Content(content) => (Some(content.as_str()), None),
            EntryPayload::Object(id) => (None, Some(Some(id.as_str()))),
            EntryPayload::Delete => (None, Some(None)),
        };
        Self {
            path: &entry.path,
            mode: entry.mode.as_str(),
            kind: entry.kind.as_str(),
            content,
            sha,
        }
    }
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

/// Request body for creating a reference.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for updating a reference.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// `GET /rate_limit` response (only the overall window).
#[derive(Deserialize)]
struct RateLimitResponse {
    rate: RateLimitWindow,
}

#[derive(Deserialize)]
struct RateLimitWindow {
    limit: u64,
    remaining: u64,
}

/// GitHub reference format.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubObject,
}

#[derive(Deserialize)]
struct GitHubObject {
    sha: String,
    url: String,
}

/// A `{ "sha": ... }` pointer.
#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubSignature {
    name: String,
    email: String,
    date: chrono::DateTime<chrono::Utc>,
}

/// Commit as returned by the git data API.
#[derive(Deserialize)]
struct GitHubGitCommit {
    sha: String,
    html_url: String,
    message: String,
    author: GitHubSignature,
    tree: GitHubSha,
    parents: Vec<GitHubSha>,
}

/// Commit as returned by the commit listing.
#[derive(Deserialize)]
struct GitHubCommitListItem {
    sha: String,
    html_url: String,
    commit: GitHubCommitDetail,
    parents: Vec<GitHubSha>,
}

#[derive(Deserialize)]
struct GitHubCommitDetail {
    message: String,
    author: GitHubSignature,
    tree: GitHubSha,
}

#[derive(Deserialize)]
struct GitHubTree {
    sha: String,
    tree: Vec<GitHubTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct GitHubTreeEntry {
    path: String,
    mode: FileMode,
    #[serde(rename = "type")]
    kind: ObjectKind,
    sha: String,
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
    commit: GitHubObject,
}

#[derive(Deserialize)]
struct GitHubRepository {
    default_branch: String,
    html_url: String,
}

/// Parse an id the API handed back.
fn object_id(sha: String) -> Result<ObjectId, ForgeError> {
    ObjectId::new(sha).map_err(|e| ForgeError::ApiError {
        status: 200,
        message: format!("Failed to parse response: {e}"),
    })
}

fn parent_ids(parents: Vec<GitHubSha>) -> Result<Vec<ObjectId>, ForgeError> {
    parents.into_iter().map(|p| object_id(p.sha)).collect()
}

impl From<GitHubSignature> for Signature {
    fn from(sig: GitHubSignature) -> Self {
        Signature {
            name: sig.name,
            email: sig.email,
            date: sig.date,
        }
    }
}

impl TryFrom<GitHubRef> for GitRef {
    type Error = ForgeError;

    fn try_from(gh: GitHubRef) -> Result<Self, Self::Error> {
        Ok(GitRef {
            name: gh.ref_name,
            target: object_id(gh.object.sha)?,
            url: gh.object.url,
        })
    }
}

impl TryFrom<GitHubGitCommit> for CommitObject {
    type Error = ForgeError;

    fn try_from(gh: GitHubGitCommit) -> Result<Self, Self::Error> {
        Ok(CommitObject {
            id: object_id(gh.sha)?,
            parents: parent_ids(gh.parents)?,
            tree: object_id(gh.tree.sha)?,
            message: gh.message,
            author: gh.author.into(),
            url: gh.html_url,
        })
    }
}

impl TryFrom<GitHubCommitListItem> for CommitObject {
    type Error = ForgeError;

    fn try_from(gh: GitHubCommitListItem) -> Result<Self, Self::Error> {
        Ok(CommitObject {
            id: object_id(gh.sha)?,
            parents: parent_ids(gh.parents)?,
            tree: object_id(gh.commit.tree.sha)?,
            message: gh.commit.message,
            author: gh.commit.author.into(),
            url: gh.html_url,
        })
    }
}

impl TryFrom<GitHubTree> for Tree {
    type Error = ForgeError;

    fn try_from(gh: GitHubTree) -> Result<Self, Self::Error> {
        let entries = gh
            .tree
            .into_iter()
            .map(|e| Ok(TreeEntry::object(e.path, e.mode, e.kind, object_id(e.sha)?)))
            .collect::<Result<_, ForgeError>>()?;
        Ok(Tree {
            id: object_id(gh.sha)?,
            entries,
            truncated: gh.truncated,
        })
    }
}

impl TryFrom<GitHubBranch> for BranchReference {
    type Error = ForgeError;

    fn try_from(gh: GitHubBranch) -> Result<Self, Self::Error> {
        Ok(BranchReference {
            name: gh.name,
            target: object_id(gh.commit.sha)?,
            url: gh.commit.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn trims_trailing_slash() {
            let graph = GitHubObjectGraph::new("t", "https://github.example.com/api/v3/");
            assert_eq!(graph.api_base(), "https://github.example.com/api/v3");
        }

        #[test]
        fn repo_url_format() {
            let graph = GitHubObjectGraph::new("t", "https://api.github.com");
            let repo = RepositoryIdentity::new("octocat", "hello-world");
            assert_eq!(
                graph.repo_url(&repo, ["git", "trees"]).unwrap().as_str(),
                "https://api.github.com/repos/octocat/hello-world/git/trees"
            );
            assert_eq!(
                graph.repo_url(&repo, std::iter::empty()).unwrap().as_str(),
                "https://api.github.com/repos/octocat/hello-world"
            );
        }

        #[test]
        fn repo_url_keeps_enterprise_prefix() {
            let graph = GitHubObjectGraph::new("t", "https://github.example.com/api/v3");
            let repo = RepositoryIdentity::new("acme", "widgets");
            assert_eq!(
                graph.repo_url(&repo, ["branches"]).unwrap().as_str(),
                "https://github.example.com/api/v3/repos/acme/widgets/branches"
            );
        }

        #[test]
        fn repo_url_encodes_each_segment() {
            let graph = GitHubObjectGraph::new("t", "https://api.github.com");
            let repo = RepositoryIdentity::new("acme", "widgets");

            let reference = RefName::for_existing_branch("fix#1");
            let parts = ["git", "refs"].into_iter().chain(segments(reference.short_path()));
            let url = graph.repo_url(&repo, parts).unwrap();
            assert_eq!(url.path(), "/repos/acme/widgets/git/refs/heads/fix%231");
            assert_eq!(url.fragment(), None);

            let parts = ["contents"].into_iter().chain(segments("/docs/a?b #2%.md"));
            let url = graph.repo_url(&repo, parts).unwrap();
            assert_eq!(url.path(), "/repos/acme/widgets/contents/docs/a%3Fb%20%232%25.md");
            assert_eq!(url.query(), None);
        }

        #[test]
        fn unparseable_api_base() {
            let graph = GitHubObjectGraph::new("t", "not a url");
            let repo = RepositoryIdentity::new("acme", "widgets");
            assert!(matches!(
                graph.repo_url(&repo, ["branches"]),
                Err(ForgeError::NetworkError(_))
            ));
        }

        #[test]
        fn debug_redacts_token() {
            let graph = GitHubObjectGraph::new("ghp_secret_token_12345", "https://api.github.com");
            let debug = format!("{:?}", graph);
            assert!(!debug.contains("ghp_secret_token_12345"));
            assert!(debug.contains("[REDACTED]"));
        }

        #[test]
        fn empty_token_requires_auth() {
            let graph = GitHubObjectGraph::new("", "https://api.github.com");
            assert!(matches!(
                graph.headers(JSON_MEDIA_TYPE),
                Err(ForgeError::AuthRequired)
            ));
        }
    }

    mod wire_format {
        use super::*;

        #[test]
        fn addition_carries_content() {
            let entry = TreeEntry::file("a.txt", "hello");
            let json = serde_json::to_value(TreeEntryBody::from(&entry)).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "path": "a.txt",
                    "mode": "100644",
                    "type": "blob",
                    "content": "hello"
                })
            );
        }

        #[test]
        fn deletion_sends_explicit_null_sha() {
            let entry = TreeEntry::deletion("b.txt");
            let json = serde_json::to_string(&TreeEntryBody::from(&entry)).unwrap();
            assert_eq!(
                json,
                r#"{"path":"b.txt","mode":"100644","type":"blob","sha":null}"#
            );
        }

        #[test]
        fn existing_object_carries_sha() {
            let entry = TreeEntry::object(
                "bin/run",
                FileMode::Executable,
                ObjectKind::Blob,
                ObjectId::new("abc123").unwrap(),
            );
            let json = serde_json::to_value(TreeEntryBody::from(&entry)).unwrap();
            assert_eq!(json["mode"], "100755");
            assert_eq!(json["sha"], "abc123");
            assert!(json.get("content").is_none());
        }

        #[test]
        fn tree_response_parses_modes() {
            let tree: GitHubTree = serde_json::from_value(serde_json::json!({
                "sha": "t1",
                "url": "https://api.github.com/repos/o/r/git/trees/t1",
                "tree": [
                    {"path": "src", "mode": "040000", "type": "tree", "sha": "t2"},
                    {"path": "src/lib.rs", "mode": "100644", "type": "blob", "sha": "b1", "size": 3}
                ],
                "truncated": false
            }))
            .unwrap();
            let tree = Tree::try_from(tree).unwrap();
            assert_eq!(tree.entries.len(), 2);
            assert_eq!(tree.entries[0].kind, ObjectKind::Tree);
            assert_eq!(tree.entries[1].object_id().unwrap().as_str(), "b1");
        }
    }

    mod pagination {
        use super::*;

        #[test]
        fn next_link() {
            let header = r#"<https://api.github.com/repositories/1/branches?per_page=100&page=2>; rel="next", <https://api.github.com/repositories/1/branches?per_page=100&page=3>; rel="last""#;
            assert_eq!(next_page_from_link(Some(header)), Some(2));
        }

        #[test]
        fn last_page_has_no_next() {
            let header = r#"<https://api.github.com/repositories/1/branches?page=1>; rel="prev", <https://api.github.com/repositories/1/branches?page=1>; rel="first""#;
            assert_eq!(next_page_from_link(Some(header)), None);
        }

        #[test]
        fn missing_header() {
            assert_eq!(next_page_from_link(None), None);
            assert_eq!(next_page_from_link(Some("garbage")), None);
        }
    }

    #[test]
    fn quota_threshold() {
        assert!(!quota_is_low(5000, 5000));
        assert!(!quota_is_low(5000, 1500));
        assert!(quota_is_low(5000, 1499));
        assert!(quota_is_low(5000, 0));
        assert!(!quota_is_low(0, 0));
    }
}
