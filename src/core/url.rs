//! core::url
//!
//! Resolves caller-supplied URLs into repository coordinates.
//!
//! Two shapes are accepted:
//!
//! - Content URLs, as handed out by the git data API for a blob:
//!   `https://<host>/api/v3/repos/<owner>/<repo>/git/blobs/<object-id>`
//! - Repository URLs, as shown in a browser:
//!   `https://<host>/<owner>/<repo>` or `https://<host>/<owner>/<repo>/tree/<branch>`
//!
//! Parsing never touches the network, so malformed input is rejected
//! before any remote call is issued.
//!
//! # Example
//!
//! ```
//! use treeline::core::url::{parse_repository_url, DEFAULT_BRANCH};
//!
//! let location = parse_repository_url("https://github.com/octocat/hello-world").unwrap();
//! assert_eq!(location.repo.owner, "octocat");
//! assert_eq!(location.branch, DEFAULT_BRANCH);
//!
//! let location =
//!     parse_repository_url("https://github.com/octocat/hello-world/tree/release/v2").unwrap();
//! assert_eq!(location.branch, "release/v2");
//! ```

use thiserror::Error;

use super::types::{ObjectId, RepositoryIdentity, TypeError};

/// Branch assumed when a repository URL has no `/tree/<branch>` suffix.
pub const DEFAULT_BRANCH: &str = "main";

/// Number of `/`-separated segments in a content URL, counting the empty
/// segment after `https:`.
const CONTENT_URL_SEGMENTS: usize = 11;
const CONTENT_OWNER_SEGMENT: usize = 6;
const CONTENT_REPO_SEGMENT: usize = 7;
const CONTENT_ID_SEGMENT: usize = 10;

/// Errors from URL parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error(
        "invalid content url '{url}': expected at least {expected} path segments, found {found}",
        expected = CONTENT_URL_SEGMENTS
    )]
    MissingSegments { url: String, found: usize },

    #[error("invalid content url '{url}': {field} is empty")]
    EmptySegment { url: String, field: &'static str },

    #[error("invalid content url '{url}': {source}")]
    InvalidObjectId { url: String, source: TypeError },

    #[error("invalid repository url '{0}': expected https://<host>/<owner>/<repo>[/tree/<branch>]")]
    InvalidRepositoryUrl(String),
}

/// Where a blob lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLocation {
    pub repo: RepositoryIdentity,
    pub object: ObjectId,
}

/// A repository and the branch a URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    pub repo: RepositoryIdentity,
    pub branch: String,
}

/// Parse a blob content URL.
///
/// Owner, repository and object id sit at fixed segment positions; the
/// literal segments in between are not checked.
///
/// # Example
///
/// ```
/// use treeline::core::url::parse_content_url;
///
/// let location = parse_content_url(
///     "https://github.com/api/v3/repos/some-user/my-project/git/blobs/90c519f0118369a331035cd20c559a0e477384cb",
/// )
/// .unwrap();
/// assert_eq!(location.repo.owner, "some-user");
/// assert_eq!(location.repo.name, "my-project");
/// assert_eq!(location.object.as_str(), "90c519f0118369a331035cd20c559a0e477384cb");
/// ```
pub fn parse_content_url(url: &str) -> Result<ContentLocation, UrlError> {
    let segments: Vec<&str> = url.split('/').collect();
    if segments.len() < CONTENT_URL_SEGMENTS {
        return Err(UrlError::MissingSegments {
            url: url.to_string(),
            found: segments.len(),
        });
    }

    let field = |index: usize, name: &'static str| {
        let value = segments[index];
        if value.is_empty() {
            Err(UrlError::EmptySegment {
                url: url.to_string(),
                field: name,
            })
        } else {
            Ok(value)
        }
    };

    let owner = field(CONTENT_OWNER_SEGMENT, "owner")?;
    let repo = field(CONTENT_REPO_SEGMENT, "repository")?;
    let object = ObjectId::new(field(CONTENT_ID_SEGMENT, "object id")?).map_err(|source| {
        UrlError::InvalidObjectId {
            url: url.to_string(),
            source,
        }
    })?;

    Ok(ContentLocation {
        repo: RepositoryIdentity::new(owner, repo),
        object,
    })
}

/// Parse a repository URL, with an optional `/tree/<branch>` suffix.
///
/// The branch may itself contain `/` but no control characters. Without
/// the suffix the branch is [`DEFAULT_BRANCH`].
pub fn parse_repository_url(url: &str) -> Result<RepositoryLocation, UrlError> {
    let invalid = || UrlError::InvalidRepositoryUrl(url.to_string());

    let rest = url.strip_prefix("https://").ok_or_else(invalid)?;
    let mut parts = rest.splitn(4, '/');

    parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

    let branch = match parts.next() {
        None => DEFAULT_BRANCH.to_string(),
        Some(suffix) => {
            let branch = suffix.strip_prefix("tree/").ok_or_else(invalid)?;
            if branch.is_empty() || branch.chars().any(char::is_control) {
                return Err(invalid());
            }
            branch.to_string()
        }
    };

    Ok(RepositoryLocation {
        repo: RepositoryIdentity::new(owner, repo),
        branch,
    })
}
