//! core::types
//!
//! Strong types for the object-graph domain.
//!
//! # Types
//!
//! - [`RepositoryIdentity`] - `(owner, name)` pair addressing a hosted repository
//! - [`ObjectId`] - Opaque content hash naming a blob, tree, or commit
//! - [`BranchName`] - Validated Git branch name
//! - [`RefName`] - Fully qualified reference name (`refs/heads/<branch>`)
//! - [`BranchReference`] - A branch and the commit it points at
//! - [`TreeEntry`] - One path in a tree read or a tree build request
//! - [`CommitObject`] - An immutable commit
//! - [`FileChangeSet`] - Caller-supplied additions and deletions
//!
//! # Examples
//!
//! ```
//! use treeline::core::types::{BranchName, RefName, RepositoryIdentity};
//!
//! let repo = RepositoryIdentity::new("octocat", "hello-world");
//! assert_eq!(repo.to_string(), "octocat/hello-world");
//!
//! let branch = BranchName::new("feature/login").unwrap();
//! assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature/login");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

/// A repository on the hosting service.
///
/// Immutable once parsed; downstream calls borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    /// User or organization owning the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryIdentity {
    /// Create a repository identity.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An opaque content hash.
///
/// The hosting service decides the hash function; this type only
/// guarantees the id is non-empty printable ASCII and usable as a single
/// URL path segment.
///
/// # Example
///
/// ```
/// use treeline::core::types::ObjectId;
///
/// let id = ObjectId::new("90c519f0118369a331035cd20c559a0e477384cb").unwrap();
/// assert_eq!(id.short(7), "90c519f");
/// assert!(ObjectId::new("").is_err());
/// assert!(ObjectId::new("a/b").is_err());
/// assert!(ObjectId::new("ééé").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create an object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` if the id is empty, contains `/`,
    /// or has any character outside printable ASCII.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidObjectId("object id cannot be empty".into()));
        }
        if id.contains('/') || !id.chars().all(|c| c.is_ascii_graphic()) {
            return Err(TypeError::InvalidObjectId(format!(
                "'{id}' is not a printable ASCII path segment"
            )));
        }
        Ok(Self(id))
    }

    /// Create an id from raw digest bytes (hex-encoded).
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Get an abbreviated form of the id.
    ///
    /// Ids are ASCII, so `len` counts characters.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
///
/// # Example
///
/// ```
/// use treeline::core::types::BranchName;
///
/// let name = BranchName::new("release/2024.06").unwrap();
/// assert_eq!(name.as_str(), "release/2024.06");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let reject = |reason: &str| -> Result<(), TypeError> {
            Err(TypeError::InvalidBranchName(format!("'{name}': {reason}")))
        };

        if name.is_empty() {
            return reject("cannot be empty");
        }
        if name == "@" {
            return reject("'@' is reserved");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return reject("cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return reject("cannot end with '.lock' or '/'");
        }
        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return reject(&format!("cannot contain '{pattern}'"));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return reject(&format!("cannot contain '{c}'"));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return reject("cannot contain control characters");
        }

        for component in name.split('/') {
            if component.starts_with('.') || component.ends_with(".lock") {
                return reject("path component cannot start with '.' or end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully qualified reference name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefName(String);

impl RefName {
    /// Reference for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Reference for a branch name that has not been validated.
    ///
    /// Used for branches that already exist on the remote; the remote is
    /// the authority on whether they resolve.
    pub fn for_existing_branch(branch: &str) -> Self {
        Self(format!("refs/heads/{branch}"))
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name with the leading `refs/` removed (`heads/<branch>`).
    ///
    /// This is the form the git data API expects in reference URLs.
    pub fn short_path(&self) -> &str {
        self.0.strip_prefix("refs/").unwrap_or(&self.0)
    }

    /// The branch name if this is a `refs/heads/` reference.
    pub fn branch(&self) -> Option<&str> {
        self.0.strip_prefix("refs/heads/")
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A branch and the commit it currently points at.
///
/// `target` is the only field that changes over a branch's life, and it is
/// always replaced wholesale by a reference update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReference {
    /// Branch name (without `refs/heads/`)
    pub name: String,
    /// Commit the branch points at
    pub target: ObjectId,
    /// Canonical URL reported by the remote
    pub url: String,
}

/// Tree entry file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    #[serde(rename = "100644")]
    Regular,
    #[serde(rename = "100755")]
    Executable,
    #[serde(rename = "040000")]
    Subdirectory,
    #[serde(rename = "160000")]
    Submodule,
    #[serde(rename = "120000")]
    Symlink,
}

impl FileMode {
    /// The octal mode string used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Subdirectory => "040000",
            FileMode::Submodule => "160000",
            FileMode::Symlink => "120000",
        }
    }
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }
}

/// What a tree entry carries.
///
/// Exactly one of inline content or an existing object id is present for
/// a live entry; a deletion carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPayload {
    /// Inline text the remote stores as a new blob.
    Content(String),
    /// An object that already exists on the remote.
    Object(ObjectId),
    /// Remove this path from the resulting tree.
    Delete,
}

/// One path in a tree.
///
/// In a build request, entries are deltas against a base tree: paths not
/// mentioned keep their base value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: FileMode,
    pub kind: ObjectKind,
    pub payload: EntryPayload,
}

impl TreeEntry {
    /// A regular file whose content is sent inline.
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FileMode::Regular,
            kind: ObjectKind::Blob,
            payload: EntryPayload::Content(content.into()),
        }
    }

    /// A deletion marker for `path`.
    pub fn deletion(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FileMode::Regular,
            kind: ObjectKind::Blob,
            payload: EntryPayload::Delete,
        }
    }

    /// An entry pointing at an existing object.
    pub fn object(path: impl Into<String>, mode: FileMode, kind: ObjectKind, id: ObjectId) -> Self {
        Self {
            path: path.into(),
            mode,
            kind,
            payload: EntryPayload::Object(id),
        }
    }

    /// The object id, if this entry references one.
    pub fn object_id(&self) -> Option<&ObjectId> {
        match &self.payload {
            EntryPayload::Object(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.payload == EntryPayload::Delete
    }
}

/// A tree as read back from the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub id: ObjectId,
    pub entries: Vec<TreeEntry>,
    /// Set when the remote capped a recursive listing.
    pub truncated: bool,
}

/// Commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// An immutable commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitObject {
    pub id: ObjectId,
    /// Ordered parent ids; first parent first.
    pub parents: Vec<ObjectId>,
    pub tree: ObjectId,
    pub message: String,
    pub author: Signature,
    /// Canonical (web) URL of the commit
    pub url: String,
}

/// Requested file changes for one commit.
///
/// Both collections are ordered so the resulting tree request is
/// deterministic.
///
/// # Example
///
/// ```
/// use treeline::core::types::FileChangeSet;
///
/// let changes = FileChangeSet::new()
///     .add("docs/a.txt", "hello")
///     .delete("docs/b.txt");
/// assert_eq!(changes.tree_entries().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChangeSet {
    pub additions: BTreeMap<String, String>,
    pub deletions: BTreeSet<String>,
}

impl FileChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn add(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.additions.insert(path.into(), content.into());
        self
    }

    /// Delete a file.
    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.deletions.insert(path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }

    /// Paths that are both added and deleted.
    pub fn overlapping(&self) -> Vec<&str> {
        self.deletions
            .iter()
            .filter(|path| self.additions.contains_key(*path))
            .map(String::as_str)
            .collect()
    }

    /// Tree build entries for this change set.
    ///
    /// Additions come first (sorted by path), then deletions (sorted by
    /// path). A path that is also being added is not deleted: the addition
    /// wins.
    pub fn tree_entries(&self) -> Vec<TreeEntry> {
        let additions = self
            .additions
            .iter()
            .map(|(path, content)| TreeEntry::file(path.clone(), content.clone()));
        let deletions = self
            .deletions
            .iter()
            .filter(|path| !self.additions.contains_key(*path))
            .map(|path| TreeEntry::deletion(path.clone()));
        additions.chain(deletions).collect()
    }
}
