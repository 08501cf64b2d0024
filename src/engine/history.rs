//! engine::history
//!
//! Find when a file last took on a particular content.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::error::{ChangeError, Step, StepExt};
use crate::core::types::{ObjectId, RepositoryIdentity};
use crate::forge::{ObjectGraph, PageRequest};

/// Authorship date of the newest commit touching `path` whose full tree
/// contains an entry with id `object`.
///
/// Commit pages are fetched one at a time and the walk stops at the first
/// match, so a recent edit costs one listing call plus one tree read.
///
/// # Errors
///
/// [`ChangeError::NotFound`] if no listed commit contains `object`; the
/// caller holds a stale or unrelated id.
pub async fn last_edit_date(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    path: &str,
    object: &ObjectId,
    per_page: u32,
) -> Result<DateTime<Utc>, ChangeError> {
    let mut request = PageRequest::first(per_page);

    loop {
        let page = graph
            .list_commits(repo, path, request)
            .await
            .at_step(Step::ListCommits, path)?;
        debug!(%repo, path, page = request.page, count = page.items.len(), "fetched commit page");

        for commit in page.items {
            let tree = graph
                .get_tree(repo, &commit.id, true)
                .await
                .at_step(Step::ReadTree, commit.id.as_str())?;
            if tree.truncated {
                warn!(%repo, commit = %commit.id.short(7), "tree listing truncated by remote");
            }

            if tree.entries.iter().any(|e| e.object_id() == Some(object)) {
                debug!(%repo, path, commit = %commit.id.short(7), "found matching commit");
                return Ok(commit.author.date);
            }
        }

        match page.next_page {
            Some(next) => request = request.at(next),
            None => break,
        }
    }

    Err(ChangeError::NotFound {
        path: path.to_string(),
        object: object.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FileChangeSet;
    use crate::forge::mock::{FailOn, MockObjectGraph};
    use crate::forge::ForgeError;

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new("acme", "widgets")
    }

    #[tokio::test]
    async fn stops_at_newest_match() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("a.txt", "v1")]);
        let edit = graph
            .push(&repo(), "main", &FileChangeSet::new().add("a.txt", "v2"), "edit")
            .unwrap();
        let expected = graph.commit(&repo(), &edit).unwrap().author.date;

        let date = last_edit_date(&graph, &repo(), "a.txt", &MockObjectGraph::blob_id("v2"), 100)
            .await
            .unwrap();
        assert_eq!(date, expected);
        assert_eq!(graph.capability_calls(), vec!["list_commits", "get_tree"]);
    }

    #[tokio::test]
    async fn older_content_walks_further_back() {
        let graph = MockObjectGraph::new();
        let root = graph.seed_repository(&repo(), &[("a.txt", "v1")]);
        graph
            .push(&repo(), "main", &FileChangeSet::new().add("a.txt", "v2"), "edit")
            .unwrap();
        let expected = graph.commit(&repo(), &root).unwrap().author.date;

        let date = last_edit_date(&graph, &repo(), "a.txt", &MockObjectGraph::blob_id("v1"), 1)
            .await
            .unwrap();
        assert_eq!(date, expected);
        assert_eq!(
            graph.capability_calls(),
            vec!["list_commits", "get_tree", "list_commits", "get_tree"]
        );
    }

    #[tokio::test]
    async fn unknown_object_is_not_found() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("a.txt", "v1")]);

        let err = last_edit_date(&graph, &repo(), "a.txt", &MockObjectGraph::blob_id("nope"), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::NotFound { .. }));
        assert_eq!(err.step(), None);
    }

    #[tokio::test]
    async fn tree_failure_is_reported_at_read_tree() {
        let graph = MockObjectGraph::new().fail_on(FailOn::GetTree(ForgeError::NetworkError(
            "reset".into(),
        )));
        graph.seed_repository(&repo(), &[("a.txt", "v1")]);

        let err = last_edit_date(&graph, &repo(), "a.txt", &MockObjectGraph::blob_id("v1"), 100)
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some(Step::ReadTree));
    }
}
