//! engine::read
//!
//! Read-only file accessors.

use serde::Serialize;
use tracing::debug;

use super::error::{ChangeError, Step, StepExt};
use crate::core::types::{ObjectId, RepositoryIdentity};
use crate::core::url::ContentLocation;
use crate::forge::ObjectGraph;

/// Text content of a blob together with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub content: String,
    pub id: ObjectId,
}

/// Fetch the blob a content URL points at.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub async fn get_file(
    graph: &dyn ObjectGraph,
    location: &ContentLocation,
) -> Result<FileContent, ChangeError> {
    debug!(repo = %location.repo, blob = %location.object.short(7), "reading blob");
    let bytes = graph
        .get_blob_raw(&location.repo, &location.object)
        .await
        .at_step(Step::ReadBlob, location.object.as_str())?;

    Ok(FileContent {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        id: location.object.clone(),
    })
}

/// Contents of `path` at the tip of `branch`.
pub async fn get_file_latest(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    branch: &str,
    path: &str,
) -> Result<String, ChangeError> {
    debug!(%repo, branch, path, "reading file");
    let bytes = graph
        .get_file_contents(repo, path, branch)
        .await
        .at_step(Step::ReadFile, path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FileChangeSet;
    use crate::forge::mock::MockObjectGraph;
    use crate::forge::ForgeError;

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new("acme", "widgets")
    }

    #[tokio::test]
    async fn reads_blob_by_id() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("a.txt", "hello")]);

        let location = ContentLocation {
            repo: repo(),
            object: MockObjectGraph::blob_id("hello"),
        };
        let file = get_file(&graph, &location).await.unwrap();
        assert_eq!(file.content, "hello");
        assert_eq!(file.id, location.object);
    }

    #[tokio::test]
    async fn missing_blob_is_transport_at_read_blob() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[]);

        let location = ContentLocation {
            repo: repo(),
            object: MockObjectGraph::blob_id("absent"),
        };
        let err = get_file(&graph, &location).await.unwrap_err();
        assert_eq!(err.step(), Some(Step::ReadBlob));
        assert!(matches!(err.forge_error(), Some(ForgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn latest_follows_the_branch() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("a.txt", "v1")]);
        graph
            .push(&repo(), "main", &FileChangeSet::new().add("a.txt", "v2"), "edit")
            .unwrap();

        let content = get_file_latest(&graph, &repo(), "main", "a.txt")
            .await
            .unwrap();
        assert_eq!(content, "v2");
    }
}
