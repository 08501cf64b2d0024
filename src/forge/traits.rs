//! forge::traits
//!
//! The object-graph capability set and its request/response types.
//!
//! # Design
//!
//! `ObjectGraph` exposes only the git data operations the orchestrators
//! need, not a full hosting-service SDK. Every method takes the
//! repository it addresses, so one client instance serves any number of
//! repositories and holds no per-call state.
//!
//! # Example
//!
//! ```
//! use treeline::core::types::{RefName, RepositoryIdentity};
//! use treeline::forge::mock::MockObjectGraph;
//! use treeline::forge::ObjectGraph;
//!
//! # tokio_test::block_on(async {
//! let graph = MockObjectGraph::new();
//! let repo = RepositoryIdentity::new("octocat", "hello-world");
//! graph.seed_repository(&repo, &[("README.md", "hello")]);
//!
//! let main = graph
//!     .get_ref(&repo, &RefName::for_existing_branch("main"))
//!     .await
//!     .unwrap();
//! let commit = graph.get_commit(&repo, &main.target).await.unwrap();
//! assert!(commit.parents.is_empty());
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{
    BranchReference, CommitObject, ObjectId, RefName, RepositoryIdentity, Tree, TreeEntry,
};

/// Errors from object-graph operations.
///
/// These map the failure modes of the hosting service's HTTP API. None of
/// them is retried by this crate.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote refused a write it understood (reference exists,
    /// non-fast-forward update, invalid tree entries).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// A reference as reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    /// Fully qualified name (`refs/heads/<branch>`)
    pub name: String,
    /// Object the reference points at
    pub target: ObjectId,
    /// API URL of the target object
    pub url: String,
}

impl GitRef {
    /// View this reference as a branch, if it is one.
    pub fn to_branch(&self) -> Option<BranchReference> {
        self.name
            .strip_prefix("refs/heads/")
            .map(|name| BranchReference {
                name: name.to_string(),
                target: self.target.clone(),
                url: self.url.clone(),
            })
    }
}

/// Request to create a commit object.
#[derive(Debug, Clone)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: ObjectId,
    /// Ordered parent ids, first parent first
    pub parents: Vec<ObjectId>,
}

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub default_branch: String,
    /// Web URL of the repository
    pub url: String,
}

/// Which page of a listing to fetch.
///
/// Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// The first page with the given size.
    pub fn first(per_page: u32) -> Self {
        Self { page: 1, per_page }
    }

    /// The same page size at a different page.
    pub fn at(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page to request next, or `None` on the last page
    pub next_page: Option<u32>,
}

/// The object-graph capability set.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; orchestrations against
/// different branches may share one instance concurrently.
///
/// # Errors
///
/// All methods return `Result<T, ForgeError>`. Callers should expect:
/// - `NotFound`: the reference or object does not exist
/// - `Rejected`: the remote refused a write (e.g. non-fast-forward update)
/// - `AuthRequired` / `AuthFailed` / `RateLimited`: credential or quota trouble
/// - `ApiError` / `NetworkError`: anything else
#[async_trait]
pub trait ObjectGraph: Send + Sync {
    /// Get the implementation name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Resolve a reference to the object it points at.
    async fn get_ref(&self, repo: &RepositoryIdentity, name: &RefName)
        -> Result<GitRef, ForgeError>;

    /// Read a commit object.
    async fn get_commit(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<CommitObject, ForgeError>;

    /// Read a tree.
    ///
    /// `id` may name a tree or a commit (whose tree is returned). With
    /// `recursive`, entries of nested trees are included with full paths.
    async fn get_tree(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
        recursive: bool,
    ) -> Result<Tree, ForgeError>;

    /// Create a tree from `entries` applied on top of `base`.
    ///
    /// Paths not mentioned keep their value from `base`; deletion entries
    /// remove their path.
    async fn create_tree(
        &self,
        repo: &RepositoryIdentity,
        base: &ObjectId,
        entries: &[TreeEntry],
    ) -> Result<Tree, ForgeError>;

    /// Create a commit object. Does not move any reference.
    async fn create_commit(
        &self,
        repo: &RepositoryIdentity,
        request: CreateCommitRequest,
    ) -> Result<CommitObject, ForgeError>;

    /// Create a new reference.
    ///
    /// # Errors
    ///
    /// - `Rejected` if the reference already exists
    async fn create_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
    ) -> Result<GitRef, ForgeError>;

    /// Point an existing reference at `target`.
    ///
    /// With `force == false` the update is accepted only as a fast-forward.
    ///
    /// # Errors
    ///
    /// - `Rejected` if the update is not a fast-forward and `force` is false
    async fn update_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
        force: bool,
    ) -> Result<GitRef, ForgeError>;

    /// List one page of branches, in the remote's order.
    async fn list_branches(
        &self,
        repo: &RepositoryIdentity,
        page: PageRequest,
    ) -> Result<Page<BranchReference>, ForgeError>;

    /// Read repository metadata.
    async fn get_repository(
        &self,
        repo: &RepositoryIdentity,
    ) -> Result<RepositoryMetadata, ForgeError>;

    /// Read the raw bytes of a blob.
    async fn get_blob_raw(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<Vec<u8>, ForgeError>;

    /// List one page of commits touching `path`, newest first.
    async fn list_commits(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        page: PageRequest,
    ) -> Result<Page<CommitObject>, ForgeError>;

    /// Read the raw contents of `path` at `reference` (branch name or commit id).
    async fn get_file_contents(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        reference: &str,
    ) -> Result<Vec<u8>, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_navigation() {
        let first = PageRequest::first(100);
        assert_eq!(first, PageRequest { page: 1, per_page: 100 });
        assert_eq!(first.at(3), PageRequest { page: 3, per_page: 100 });
    }

    #[test]
    fn git_ref_as_branch() {
        let reference = GitRef {
            name: "refs/heads/feature/x".into(),
            target: ObjectId::new("abc").unwrap(),
            url: "https://api.github.com/repos/o/r/git/commits/abc".into(),
        };
        let branch = reference.to_branch().unwrap();
        assert_eq!(branch.name, "feature/x");
        assert_eq!(branch.target.as_str(), "abc");

        let tag = GitRef {
            name: "refs/tags/v1".into(),
            ..reference
        };
        assert!(tag.to_branch().is_none());
    }

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("refs/heads/x".into())),
            "not found: refs/heads/x"
        );
        assert_eq!(
            format!("{}", ForgeError::Rejected("Update is not a fast forward".into())),
            "rejected: Update is not a fast forward"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 500,
                    message: "boom".into()
                }
            ),
            "API error: 500 - boom"
        );
        assert_eq!(
            format!("{}", ForgeError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
    }
}
