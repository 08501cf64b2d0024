//! engine::service
//!
//! URL-facing entry point over the orchestrations.
//!
//! Every method parses its URL arguments before the first remote call, so
//! malformed input fails with [`ChangeError::Parse`] and costs no round trip.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::branch::{self, create_branch_from};
use super::commit::{commit_changes, CommitOutcome};
use super::error::ChangeError;
use super::history::last_edit_date;
use super::read::{self, FileContent};
use crate::core::types::{BranchName, BranchReference, FileChangeSet, ObjectId};
use crate::core::url::{parse_content_url, parse_repository_url};
use crate::forge::ObjectGraph;

/// Change operations addressed by URL.
///
/// Holds one shared [`ObjectGraph`]; clones share it and may run
/// concurrently.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use treeline::core::types::FileChangeSet;
/// use treeline::core::types::RepositoryIdentity;
/// use treeline::engine::ChangeService;
/// use treeline::forge::mock::MockObjectGraph;
///
/// # tokio_test::block_on(async {
/// let graph = MockObjectGraph::new();
/// graph.seed_repository(&RepositoryIdentity::new("acme", "widgets"), &[]);
///
/// let service = ChangeService::new(Arc::new(graph), 100);
/// let outcome = service
///     .commit(
///         "https://github.com/acme/widgets",
///         None,
///         "Add readme",
///         &FileChangeSet::new().add("README.md", "# widgets"),
///     )
///     .await
///     .unwrap();
/// assert_eq!(outcome.branch, "main");
/// # });
/// ```
#[derive(Clone)]
pub struct ChangeService {
    graph: Arc<dyn ObjectGraph>,
    per_page: u32,
}

impl std::fmt::Debug for ChangeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeService")
            .field("graph", &self.graph.name())
            .field("per_page", &self.per_page)
            .finish()
    }
}

impl ChangeService {
    /// `per_page` bounds each listing round trip.
    pub fn new(graph: Arc<dyn ObjectGraph>, per_page: u32) -> Self {
        Self { graph, per_page }
    }

    /// Create branch `name` from the branch named in `repo_url` (`main`
    /// unless the URL has a `/tree/<branch>` suffix).
    pub async fn create_branch(
        &self,
        repo_url: &str,
        name: &str,
    ) -> Result<BranchReference, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        let name = BranchName::new(name)?;
        create_branch_from(self.graph.as_ref(), &location.repo, &location.branch, &name).await
    }

    /// Commit `changes` onto `branch`, or onto the branch named in
    /// `repo_url` when `branch` is `None`.
    pub async fn commit(
        &self,
        repo_url: &str,
        branch: Option<&str>,
        message: &str,
        changes: &FileChangeSet,
    ) -> Result<CommitOutcome, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        let branch = branch.unwrap_or(&location.branch);
        commit_changes(self.graph.as_ref(), &location.repo, branch, message, changes).await
    }

    /// Every branch of the repository.
    pub async fn list_branches(&self, repo_url: &str) -> Result<Vec<BranchReference>, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        branch::list_branches(self.graph.as_ref(), &location.repo, self.per_page).await
    }

    pub async fn default_branch_name(&self, repo_url: &str) -> Result<String, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        branch::default_branch_name(self.graph.as_ref(), &location.repo).await
    }

    /// Blob behind a content URL.
    pub async fn get_file(&self, content_url: &str) -> Result<FileContent, ChangeError> {
        let location = parse_content_url(content_url)?;
        read::get_file(self.graph.as_ref(), &location).await
    }

    /// Contents of `path` at the tip of `branch`, or of the branch named
    /// in `repo_url` when `branch` is `None`.
    pub async fn get_file_latest(
        &self,
        repo_url: &str,
        branch: Option<&str>,
        path: &str,
    ) -> Result<String, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        let branch = branch.unwrap_or(&location.branch);
        read::get_file_latest(self.graph.as_ref(), &location.repo, branch, path).await
    }

    /// When `path` last took on the content with id `object`.
    pub async fn last_edit_date(
        &self,
        repo_url: &str,
        path: &str,
        object: &str,
    ) -> Result<DateTime<Utc>, ChangeError> {
        let location = parse_repository_url(repo_url)?;
        let object = ObjectId::new(object)?;
        last_edit_date(
            self.graph.as_ref(),
            &location.repo,
            path,
            &object,
            self.per_page,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RepositoryIdentity;
    use crate::forge::mock::MockObjectGraph;

    fn setup() -> (MockObjectGraph, ChangeService) {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&RepositoryIdentity::new("acme", "widgets"), &[("a.txt", "hi")]);
        let service = ChangeService::new(Arc::new(graph.clone()), 100);
        (graph, service)
    }

    #[tokio::test]
    async fn bad_url_makes_no_calls() {
        let (graph, service) = setup();

        let err = service
            .commit("https://github.com/acme", None, "msg", &FileChangeSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::Parse(_)));

        let err = service.get_file("https://github.com/short").await.unwrap_err();
        assert!(matches!(err, ChangeError::Parse(_)));

        assert!(graph.operations().is_empty());
    }

    #[tokio::test]
    async fn bad_branch_name_makes_no_calls() {
        let (graph, service) = setup();

        let err = service
            .create_branch("https://github.com/acme/widgets", "bad..name")
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::InvalidInput(_)));
        assert!(graph.operations().is_empty());
    }

    #[tokio::test]
    async fn branch_from_url_suffix() {
        let (graph, service) = setup();
        let repo = RepositoryIdentity::new("acme", "widgets");
        graph.create_branches(&repo, ["develop"]).unwrap();

        let branch = service
            .create_branch("https://github.com/acme/widgets/tree/develop", "topic")
            .await
            .unwrap();
        assert_eq!(Some(branch.target), graph.branch_tip(&repo, "develop"));
        assert_eq!(
            graph.operations()[0],
            crate::forge::mock::MockOperation::GetRef {
                name: "refs/heads/develop".to_string()
            }
        );
    }

    #[tokio::test]
    async fn file_latest_branch_override() {
        let (graph, service) = setup();
        let repo = RepositoryIdentity::new("acme", "widgets");
        graph.create_branches(&repo, ["next"]).unwrap();
        graph
            .push(&repo, "next", &FileChangeSet::new().add("a.txt", "next"), "edit")
            .unwrap();

        let url = "https://github.com/acme/widgets";
        assert_eq!(service.get_file_latest(url, None, "a.txt").await.unwrap(), "hi");
        assert_eq!(
            service.get_file_latest(url, Some("next"), "a.txt").await.unwrap(),
            "next"
        );
    }

    #[tokio::test]
    async fn last_edit_date_rejects_malformed_id() {
        let (graph, service) = setup();

        let err = service
            .last_edit_date("https://github.com/acme/widgets", "a.txt", "bad id")
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::InvalidInput(_)));
        assert!(graph.operations().is_empty());
    }
}
