//! forge::mock
//!
//! In-memory object graph for deterministic testing.
//!
//! # Design
//!
//! The mock stores blobs, trees, commits and branches per repository and
//! names every object by the SHA-256 of its content, so identical content
//! always shares an id. It follows the hosting service's write rules:
//!
//! - tree builds are deltas merged into a base tree
//! - deleting a path absent from the base tree is rejected
//! - reference updates without `force` must be fast-forwards
//! - creating an existing reference is rejected
//!
//! Every capability call is recorded, a single capability can be made to
//! fail, and a concurrent writer can be scheduled to move a branch right
//! before the next reference update.
//!
//! # Example
//!
//! ```
//! use treeline::core::types::{FileChangeSet, RepositoryIdentity};
//! use treeline::forge::mock::MockObjectGraph;
//!
//! let graph = MockObjectGraph::new();
//! let repo = RepositoryIdentity::new("acme", "widgets");
//! let root = graph.seed_repository(&repo, &[("README.md", "hello")]);
//!
//! let next = graph
//!     .push(&repo, "main", &FileChangeSet::new().add("a.txt", "a"), "add a")
//!     .unwrap();
//! assert_ne!(root, next);
//! assert_eq!(graph.branch_tip(&repo, "main"), Some(next.clone()));
//! assert_eq!(graph.files_at(&repo, &next).unwrap()["a.txt"], "a");
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use super::traits::{
    CreateCommitRequest, ForgeError, GitRef, ObjectGraph, Page, PageRequest, RepositoryMetadata,
};
use crate::core::types::{
    BranchReference, CommitObject, EntryPayload, FileChangeSet, FileMode, ObjectId, ObjectKind,
    RefName, RepositoryIdentity, Signature, Tree, TreeEntry,
};

/// Host used in URLs the mock hands out.
const MOCK_HOST: &str = "mock.invalid";

/// First commit timestamp (2024-01-01T00:00:00Z); each commit is a minute later.
const MOCK_EPOCH: i64 = 1_704_067_200;

/// Largest page the mock serves, like the hosting service.
const MAX_PER_PAGE: u32 = 100;

/// Mock object graph for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockObjectGraph {
    inner: Arc<Mutex<MockObjectGraphInner>>,
}

#[derive(Debug, Default)]
struct MockObjectGraphInner {
    repos: HashMap<RepositoryIdentity, MockRepository>,
    /// Capability to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded capability calls, in order.
    operations: Vec<MockOperation>,
}

/// Configuration for which capability should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetRef(ForgeError),
    GetCommit(ForgeError),
    GetTree(ForgeError),
    CreateTree(ForgeError),
    CreateCommit(ForgeError),
    CreateRef(ForgeError),
    UpdateRef(ForgeError),
    ListBranches(ForgeError),
    GetRepository(ForgeError),
    GetBlobRaw(ForgeError),
    ListCommits(ForgeError),
    GetFileContents(ForgeError),
}

impl FailOn {
    fn capability(&self) -> (&'static str, &ForgeError) {
        match self {
            FailOn::GetRef(e) => ("get_ref", e),
            FailOn::GetCommit(e) => ("get_commit", e),
            FailOn::GetTree(e) => ("get_tree", e),
            FailOn::CreateTree(e) => ("create_tree", e),
            FailOn::CreateCommit(e) => ("create_commit", e),
            FailOn::CreateRef(e) => ("create_ref", e),
            FailOn::UpdateRef(e) => ("update_ref", e),
            FailOn::ListBranches(e) => ("list_branches", e),
            FailOn::GetRepository(e) => ("get_repository", e),
            FailOn::GetBlobRaw(e) => ("get_blob_raw", e),
            FailOn::ListCommits(e) => ("list_commits", e),
            FailOn::GetFileContents(e) => ("get_file_contents", e),
        }
    }
}

/// Recorded capability call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetRef {
        name: String,
    },
    GetCommit {
        id: ObjectId,
    },
    GetTree {
        id: ObjectId,
        recursive: bool,
    },
    CreateTree {
        base: ObjectId,
        entries: Vec<TreeEntry>,
    },
    CreateCommit {
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: String,
    },
    CreateRef {
        name: String,
        target: ObjectId,
    },
    UpdateRef {
        name: String,
        target: ObjectId,
        force: bool,
    },
    ListBranches {
        page: u32,
        per_page: u32,
    },
    GetRepository,
    GetBlobRaw {
        id: ObjectId,
    },
    ListCommits {
        path: String,
        page: u32,
    },
    GetFileContents {
        path: String,
        reference: String,
    },
}

impl MockOperation {
    /// The capability this call went to.
    pub fn capability(&self) -> &'static str {
        match self {
            MockOperation::GetRef { .. } => "get_ref",
            MockOperation::GetCommit { .. } => "get_commit",
            MockOperation::GetTree { .. } => "get_tree",
            MockOperation::CreateTree { .. } => "create_tree",
            MockOperation::CreateCommit { .. } => "create_commit",
            MockOperation::CreateRef { .. } => "create_ref",
            MockOperation::UpdateRef { .. } => "update_ref",
            MockOperation::ListBranches { .. } => "list_branches",
            MockOperation::GetRepository => "get_repository",
            MockOperation::GetBlobRaw { .. } => "get_blob_raw",
            MockOperation::ListCommits { .. } => "list_commits",
            MockOperation::GetFileContents { .. } => "get_file_contents",
        }
    }
}

/// A leaf of a flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredEntry {
    mode: FileMode,
    kind: ObjectKind,
    id: ObjectId,
}

/// One repository's objects and references.
///
/// Trees are stored flattened: full file path to leaf entry. Directory
/// entries are derived when a tree is read.
#[derive(Debug)]
struct MockRepository {
    identity: RepositoryIdentity,
    default_branch: String,
    blobs: HashMap<ObjectId, Vec<u8>>,
    trees: HashMap<ObjectId, BTreeMap<String, StoredEntry>>,
    commits: HashMap<ObjectId, CommitObject>,
    branches: BTreeMap<String, ObjectId>,
    /// Branches a concurrent writer advances before the next update_ref.
    pending_writers: HashSet<String>,
    /// Commits created so far; drives commit timestamps.
    clock: i64,
}

impl MockObjectGraph {
    /// Create a new mock with no repositories.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockObjectGraphInner::default())),
        }
    }

    /// The id the mock assigns to a blob with this content.
    pub fn blob_id(content: &str) -> ObjectId {
        digest("blob", content.as_bytes())
    }

    /// Create (or replace) a repository whose `main` branch has a single
    /// root commit containing `files`.
    ///
    /// Returns the root commit id.
    pub fn seed_repository(&self, repo: &RepositoryIdentity, files: &[(&str, &str)]) -> ObjectId {
        let mut stored = MockRepository::new(repo.clone(), "main");

        let mut tree = BTreeMap::new();
        for (path, content) in files {
            let id = stored.store_blob(content.as_bytes());
            tree.insert(
                path.to_string(),
                StoredEntry {
                    mode: FileMode::Regular,
                    kind: ObjectKind::Blob,
                    id,
                },
            );
        }
        let tree = stored.store_tree(tree);
        let root = stored.store_commit(tree, Vec::new(), "Initial commit");
        stored.branches.insert("main".to_string(), root.id.clone());

        let mut inner = self.inner.lock().unwrap();
        inner.repos.insert(repo.clone(), stored);
        root.id
    }

    /// Commit `changes` onto `branch` directly, bypassing the recorded
    /// capabilities. Used to build history for tests.
    pub fn push(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
        changes: &FileChangeSet,
        message: &str,
    ) -> Result<ObjectId, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let tip = stored
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("branch {branch}")))?;
        let base = stored.tree_id_of(&tip)?;
        let tree = stored.apply(&base, &changes.tree_entries())?;
        let commit = stored.store_commit(tree, vec![tip], message);
        stored.branches.insert(branch.to_string(), commit.id.clone());
        Ok(commit.id)
    }

    /// Create branches pointing at the default branch tip.
    pub fn create_branches<I, S>(&self, repo: &RepositoryIdentity, names: I) -> Result<(), ForgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let tip = stored
            .branches
            .get(&stored.default_branch)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("branch {}", stored.default_branch)))?;
        for name in names {
            stored.branches.insert(name.into(), tip.clone());
        }
        Ok(())
    }

    /// Rename the default branch, moving its reference.
    pub fn rename_default_branch(
        &self,
        repo: &RepositoryIdentity,
        name: &str,
    ) -> Result<(), ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let old = std::mem::replace(&mut stored.default_branch, name.to_string());
        if let Some(tip) = stored.branches.remove(&old) {
            stored.branches.insert(name.to_string(), tip);
        }
        Ok(())
    }

    /// Have a concurrent writer advance `branch` right before the next
    /// `update_ref` on it.
    pub fn advance_before_update(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .repo_mut(repo)?
            .pending_writers
            .insert(branch.to_string());
        Ok(())
    }

    /// Current tip of a branch.
    pub fn branch_tip(&self, repo: &RepositoryIdentity, branch: &str) -> Option<ObjectId> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo)?.branches.get(branch).cloned()
    }

    /// Number of branches in a repository.
    pub fn branch_count(&self, repo: &RepositoryIdentity) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo).map_or(0, |r| r.branches.len())
    }

    /// Look up a commit (for test verification).
    pub fn commit(&self, repo: &RepositoryIdentity, id: &ObjectId) -> Option<CommitObject> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(repo)?.commits.get(id).cloned()
    }

    /// File contents of a commit or tree, keyed by full path.
    pub fn files_at(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Option<BTreeMap<String, String>> {
        let inner = self.inner.lock().unwrap();
        let stored = inner.repos.get(repo)?;
        let tree = stored.tree_id_of(id).ok()?;
        let files = stored.trees.get(&tree)?;
        Some(
            files
                .iter()
                .filter_map(|(path, entry)| {
                    let bytes = stored.blobs.get(&entry.id)?;
                    Some((path.clone(), String::from_utf8_lossy(bytes).into_owned()))
                })
                .collect(),
        )
    }

    /// Configure the mock to fail on a specific capability.
    ///
    /// # Example
    ///
    /// ```
    /// use treeline::forge::mock::{FailOn, MockObjectGraph};
    /// use treeline::forge::ForgeError;
    ///
    /// let graph = MockObjectGraph::new().fail_on(FailOn::CreateTree(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Names of the capabilities called, in order.
    pub fn capability_calls(&self) -> Vec<&'static str> {
        let inner = self.inner.lock().unwrap();
        inner.operations.iter().map(MockOperation::capability).collect()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail<T>(&self, capability: &str) -> Option<Result<T, ForgeError>> {
        let inner = self.inner.lock().unwrap();
        match inner.fail_on.as_ref().map(FailOn::capability) {
            Some((name, err)) if name == capability => Some(Err(err.clone())),
            _ => None,
        }
    }
}

impl Default for MockObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectGraphInner {
    fn repo(&self, repo: &RepositoryIdentity) -> Result<&MockRepository, ForgeError> {
        self.repos
            .get(repo)
            .ok_or_else(|| ForgeError::NotFound(format!("repository {repo}")))
    }

    fn repo_mut(&mut self, repo: &RepositoryIdentity) -> Result<&mut MockRepository, ForgeError> {
        self.repos
            .get_mut(repo)
            .ok_or_else(|| ForgeError::NotFound(format!("repository {repo}")))
    }
}

fn digest(kind: &str, body: &[u8]) -> ObjectId {
    let mut hasher = Sha256::new();
    hasher.update(format!("{kind} {}\0", body.len()).as_bytes());
    hasher.update(body);
    ObjectId::from_digest(&hasher.finalize())
}

/// Paginate `items` the way the hosting service does (1-based pages).
fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let per_page = page.per_page.clamp(1, MAX_PER_PAGE) as usize;
    let start = (page.page.max(1) as usize - 1).saturating_mul(per_page);
    let end = start.saturating_add(per_page).min(items.len());

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        next_page: (end < items.len()).then(|| page.page.max(1) + 1),
    }
}

/// Clear `path` (and anything below it) so a new entry can take its place.
///
/// Fails if a parent directory of `path` is a file.
fn replace_path(files: &mut BTreeMap<String, StoredEntry>, path: &str) -> Result<(), ForgeError> {
    if let Some((pos, _)) = path
        .match_indices('/')
        .find(|(pos, _)| files.contains_key(&path[..*pos]))
    {
        return Err(ForgeError::Rejected(format!(
            "'{path}' conflicts with file '{}'",
            &path[..pos]
        )));
    }
    let prefix = format!("{path}/");
    files.remove(path);
    files.retain(|p, _| !p.starts_with(&prefix));
    Ok(())
}

impl MockRepository {
    fn new(identity: RepositoryIdentity, default_branch: &str) -> Self {
        Self {
            identity,
            default_branch: default_branch.to_string(),
            blobs: HashMap::new(),
            trees: HashMap::new(),
            commits: HashMap::new(),
            branches: BTreeMap::new(),
            pending_writers: HashSet::new(),
            clock: 0,
        }
    }

    fn store_blob(&mut self, content: &[u8]) -> ObjectId {
        let id = digest("blob", content);
        self.blobs
            .entry(id.clone())
            .or_insert_with(|| content.to_vec());
        id
    }

    fn store_tree(&mut self, files: BTreeMap<String, StoredEntry>) -> ObjectId {
        let mut body = String::new();
        for (path, entry) in &files {
            body.push_str(&format!(
                "{} {} {}\t{}\n",
                entry.mode.as_str(),
                entry.kind.as_str(),
                entry.id,
                path
            ));
        }
        let id = digest("tree", body.as_bytes());
        self.trees.entry(id.clone()).or_insert(files);
        id
    }

    fn store_commit(&mut self, tree: ObjectId, parents: Vec<ObjectId>, message: &str) -> CommitObject {
        let date = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(MOCK_EPOCH + self.clock * 60);
        self.clock += 1;

        let mut body = format!("tree {tree}\n");
        for parent in &parents {
            body.push_str(&format!("parent {parent}\n"));
        }
        body.push_str(&format!("date {}\n\n{message}", date.timestamp()));
        let id = digest("commit", body.as_bytes());

        let commit = CommitObject {
            url: format!(
                "https://{MOCK_HOST}/{}/{}/commit/{id}",
                self.identity.owner, self.identity.name
            ),
            id: id.clone(),
            parents,
            tree,
            message: message.to_string(),
            author: Signature {
                name: "Mock Author".to_string(),
                email: "author@mock.invalid".to_string(),
                date,
            },
        };
        self.commits.insert(id, commit.clone());
        commit
    }

    /// API URL of a commit, as reported in references and branch listings.
    fn commit_api_url(&self, id: &ObjectId) -> String {
        format!(
            "https://api.{MOCK_HOST}/repos/{}/{}/git/commits/{id}",
            self.identity.owner, self.identity.name
        )
    }

    fn git_ref(&self, branch: &str, target: &ObjectId) -> GitRef {
        GitRef {
            name: format!("refs/heads/{branch}"),
            target: target.clone(),
            url: self.commit_api_url(target),
        }
    }

    /// Tree id for a tree or commit id.
    fn tree_id_of(&self, id: &ObjectId) -> Result<ObjectId, ForgeError> {
        if let Some(commit) = self.commits.get(id) {
            return Ok(commit.tree.clone());
        }
        if self.trees.contains_key(id) {
            return Ok(id.clone());
        }
        Err(ForgeError::NotFound(format!("tree {id}")))
    }

    /// Read a tree back, deriving directory entries from file paths.
    fn listing(&mut self, id: &ObjectId, recursive: bool) -> Result<Tree, ForgeError> {
        let tree_id = self.tree_id_of(id)?;
        let files = self
            .trees
            .get(&tree_id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("tree {id}")))?;

        let mut subtrees: BTreeMap<String, BTreeMap<String, StoredEntry>> = BTreeMap::new();
        for (path, entry) in &files {
            for (pos, _) in path.match_indices('/') {
                subtrees
                    .entry(path[..pos].to_string())
                    .or_default()
                    .insert(path[pos + 1..].to_string(), entry.clone());
            }
        }

        let mut entries = Vec::new();
        for (dir, sub) in subtrees {
            if recursive || !dir.contains('/') {
                let sub_id = self.store_tree(sub);
                entries.push(TreeEntry::object(
                    dir,
                    FileMode::Subdirectory,
                    ObjectKind::Tree,
                    sub_id,
                ));
            }
        }
        for (path, entry) in files {
            if recursive || !path.contains('/') {
                entries.push(TreeEntry::object(path, entry.mode, entry.kind, entry.id));
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Tree {
            id: tree_id,
            entries,
            truncated: false,
        })
    }

    /// Merge `entries` into the tree `base` and store the result.
    fn apply(&mut self, base: &ObjectId, entries: &[TreeEntry]) -> Result<ObjectId, ForgeError> {
        let mut files = self
            .trees
            .get(base)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("tree {base}")))?;

        for entry in entries {
            let path = entry.path.as_str();
            if path.is_empty() || path.starts_with('/') || path.ends_with('/') || path.contains("//")
            {
                return Err(ForgeError::Rejected(format!(
                    "invalid tree entry path '{path}'"
                )));
            }
            let prefix = format!("{path}/");

            match (&entry.payload, entry.kind) {
                (EntryPayload::Delete, _) => {
                    let before = files.len();
                    files.remove(path);
                    files.retain(|p, _| !p.starts_with(&prefix));
                    if files.len() == before {
                        return Err(ForgeError::Rejected(format!(
                            "cannot delete '{path}': not present in base tree"
                        )));
                    }
                }
                (EntryPayload::Content(content), _) => {
                    replace_path(&mut files, path)?;
                    let id = self.store_blob(content.as_bytes());
                    files.insert(
                        path.to_string(),
                        StoredEntry {
                            mode: entry.mode,
                            kind: ObjectKind::Blob,
                            id,
                        },
                    );
                }
                (EntryPayload::Object(id), ObjectKind::Tree) => {
                    let sub = self
                        .trees
                        .get(id)
                        .ok_or_else(|| ForgeError::Rejected(format!("tree {id} does not exist")))?;
                    replace_path(&mut files, path)?;
                    for (sub_path, sub_entry) in sub {
                        files.insert(format!("{path}/{sub_path}"), sub_entry.clone());
                    }
                }
                (EntryPayload::Object(id), kind) => {
                    if kind == ObjectKind::Blob && !self.blobs.contains_key(id) {
                        return Err(ForgeError::Rejected(format!("blob {id} does not exist")));
                    }
                    replace_path(&mut files, path)?;
                    files.insert(
                        path.to_string(),
                        StoredEntry {
                            mode: entry.mode,
                            kind,
                            id: id.clone(),
                        },
                    );
                }
            }
        }

        Ok(self.store_tree(files))
    }

    fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> bool {
        let mut queue = vec![descendant.clone()];
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop() {
            if &id == ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&id) {
                queue.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    /// Let a concurrent writer move `branch` if one is scheduled.
    fn run_pending_writer(&mut self, branch: &str) {
        if !self.pending_writers.remove(branch) {
            return;
        }
        if let Some(tip) = self.branches.get(branch).cloned() {
            if let Ok(tree) = self.tree_id_of(&tip) {
                let commit = self.store_commit(tree, vec![tip], "Concurrent change");
                self.branches.insert(branch.to_string(), commit.id);
            }
        }
    }

    fn entry_at(&self, tree: &ObjectId, path: &str) -> Option<&ObjectId> {
        self.trees.get(tree)?.get(path).map(|e| &e.id)
    }

    /// Commits on the default branch's first-parent chain that changed
    /// `path`, newest first.
    fn history(&self, path: &str) -> Vec<CommitObject> {
        let mut commits = Vec::new();
        let mut cursor = self.branches.get(&self.default_branch).cloned();

        while let Some(commit) = cursor.and_then(|id| self.commits.get(&id)) {
            let parent = commit.parents.first();
            let before = parent
                .and_then(|p| self.commits.get(p))
                .and_then(|c| self.entry_at(&c.tree, path));
            if self.entry_at(&commit.tree, path) != before {
                commits.push(commit.clone());
            }
            cursor = parent.cloned();
        }
        commits
    }

    /// Resolve a branch name or commit id.
    fn resolve(&self, reference: &str) -> Option<ObjectId> {
        if let Some(tip) = self.branches.get(reference) {
            return Some(tip.clone());
        }
        let id = ObjectId::new(reference).ok()?;
        self.commits.contains_key(&id).then_some(id)
    }
}

#[async_trait]
impl ObjectGraph for MockObjectGraph {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
    ) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::GetRef {
            name: name.to_string(),
        });

        if let Some(result) = self.check_fail("get_ref") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let stored = inner.repo(repo)?;
        let branch = name
            .branch()
            .ok_or_else(|| ForgeError::NotFound(name.to_string()))?;
        stored
            .branches
            .get(branch)
            .map(|target| stored.git_ref(branch, target))
            .ok_or_else(|| ForgeError::NotFound(name.to_string()))
    }

    async fn get_commit(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<CommitObject, ForgeError> {
        self.record(MockOperation::GetCommit { id: id.clone() });

        if let Some(result) = self.check_fail("get_commit") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        inner
            .repo(repo)?
            .commits
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("commit {id}")))
    }

    async fn get_tree(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
        recursive: bool,
    ) -> Result<Tree, ForgeError> {
        self.record(MockOperation::GetTree {
            id: id.clone(),
            recursive,
        });

        if let Some(result) = self.check_fail("get_tree") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.repo_mut(repo)?.listing(id, recursive)
    }

    async fn create_tree(
        &self,
        repo: &RepositoryIdentity,
        base: &ObjectId,
        entries: &[TreeEntry],
    ) -> Result<Tree, ForgeError> {
        self.record(MockOperation::CreateTree {
            base: base.clone(),
            entries: entries.to_vec(),
        });

        if let Some(result) = self.check_fail("create_tree") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let id = stored.apply(base, entries)?;
        stored.listing(&id, false)
    }

    async fn create_commit(
        &self,
        repo: &RepositoryIdentity,
        request: CreateCommitRequest,
    ) -> Result<CommitObject, ForgeError> {
        self.record(MockOperation::CreateCommit {
            tree: request.tree.clone(),
            parents: request.parents.clone(),
            message: request.message.clone(),
        });

        if let Some(result) = self.check_fail("create_commit") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        if !stored.trees.contains_key(&request.tree) {
            return Err(ForgeError::NotFound(format!("tree {}", request.tree)));
        }
        if let Some(missing) = request
            .parents
            .iter()
            .find(|p| !stored.commits.contains_key(*p))
        {
            return Err(ForgeError::NotFound(format!("commit {missing}")));
        }
        Ok(stored.store_commit(request.tree, request.parents, &request.message))
    }

    async fn create_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
    ) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::CreateRef {
            name: name.to_string(),
            target: target.clone(),
        });

        if let Some(result) = self.check_fail("create_ref") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let branch = name.branch().ok_or_else(|| {
            ForgeError::Rejected(format!("'{name}' is not a branch reference"))
        })?;
        if stored.branches.contains_key(branch) {
            return Err(ForgeError::Rejected("Reference already exists".into()));
        }
        if !stored.commits.contains_key(target) {
            return Err(ForgeError::Rejected("Object does not exist".into()));
        }
        stored.branches.insert(branch.to_string(), target.clone());
        Ok(stored.git_ref(branch, target))
    }

    async fn update_ref(
        &self,
        repo: &RepositoryIdentity,
        name: &RefName,
        target: &ObjectId,
        force: bool,
    ) -> Result<GitRef, ForgeError> {
        self.record(MockOperation::UpdateRef {
            name: name.to_string(),
            target: target.clone(),
            force,
        });

        if let Some(result) = self.check_fail("update_ref") {
            return result;
        }

        let mut inner = self.inner.lock().unwrap();
        let stored = inner.repo_mut(repo)?;
        let branch = name
            .branch()
            .filter(|b| stored.branches.contains_key(*b))
            .ok_or_else(|| ForgeError::Rejected("Reference does not exist".into()))?;
        if !stored.commits.contains_key(target) {
            return Err(ForgeError::Rejected("Object does not exist".into()));
        }

        stored.run_pending_writer(branch);

        let current = stored.branches.get(branch).cloned();
        if let Some(current) = current {
            if !force && !stored.is_ancestor(&current, target) {
                return Err(ForgeError::Rejected("Update is not a fast forward".into()));
            }
        }
        stored.branches.insert(branch.to_string(), target.clone());
        Ok(stored.git_ref(branch, target))
    }

    async fn list_branches(
        &self,
        repo: &RepositoryIdentity,
        page: PageRequest,
    ) -> Result<Page<BranchReference>, ForgeError> {
        self.record(MockOperation::ListBranches {
            page: page.page,
            per_page: page.per_page,
        });

        if let Some(result) = self.check_fail("list_branches") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let stored = inner.repo(repo)?;
        let branches: Vec<BranchReference> = stored
            .branches
            .iter()
            .map(|(name, target)| BranchReference {
                name: name.clone(),
                target: target.clone(),
                url: stored.commit_api_url(target),
            })
            .collect();
        Ok(paginate(&branches, page))
    }

    async fn get_repository(
        &self,
        repo: &RepositoryIdentity,
    ) -> Result<RepositoryMetadata, ForgeError> {
        self.record(MockOperation::GetRepository);

        if let Some(result) = self.check_fail("get_repository") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let stored = inner.repo(repo)?;
        Ok(RepositoryMetadata {
            default_branch: stored.default_branch.clone(),
            url: format!("https://{MOCK_HOST}/{repo}"),
        })
    }

    async fn get_blob_raw(
        &self,
        repo: &RepositoryIdentity,
        id: &ObjectId,
    ) -> Result<Vec<u8>, ForgeError> {
        self.record(MockOperation::GetBlobRaw { id: id.clone() });

        if let Some(result) = self.check_fail("get_blob_raw") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        inner
            .repo(repo)?
            .blobs
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("blob {id}")))
    }

    async fn list_commits(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        page: PageRequest,
    ) -> Result<Page<CommitObject>, ForgeError> {
        self.record(MockOperation::ListCommits {
            path: path.to_string(),
            page: page.page,
        });

        if let Some(result) = self.check_fail("list_commits") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let history = inner.repo(repo)?.history(path);
        Ok(paginate(&history, page))
    }

    async fn get_file_contents(
        &self,
        repo: &RepositoryIdentity,
        path: &str,
        reference: &str,
    ) -> Result<Vec<u8>, ForgeError> {
        self.record(MockOperation::GetFileContents {
            path: path.to_string(),
            reference: reference.to_string(),
        });

        if let Some(result) = self.check_fail("get_file_contents") {
            return result;
        }

        let inner = self.inner.lock().unwrap();
        let stored = inner.repo(repo)?;
        let not_found = || ForgeError::NotFound(format!("{path} at {reference}"));
        let commit = stored.resolve(reference).ok_or_else(not_found)?;
        let tree = stored.tree_id_of(&commit)?;
        let blob = stored.entry_at(&tree, path).ok_or_else(not_found)?;
        stored.blobs.get(blob).cloned().ok_or_else(not_found)
    }
}
