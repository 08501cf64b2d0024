//! engine::commit
//!
//! Apply a set of file changes to a branch as one commit.
//!
//! # Protocol
//!
//! Four strictly sequential remote steps, each consuming the previous
//! step's id:
//!
//! 1. **Resolve**: read `refs/heads/<branch>` to get the tip commit
//! 2. **Read base**: read the tip commit to get its tree
//! 3. **Build tree**: submit the changes as a delta against that tree
//! 4. **Commit + advance**: create a commit whose only parent is the tip,
//!    then move the branch to it with `force = false`
//!
//! The final update is rejected by the remote if the branch moved after
//! step 1; that surfaces as [`ChangeError::ConcurrentUpdate`] and the
//! caller must run the protocol again. Nothing is retried and nothing is
//! rolled back: a tree or commit created before a failure is left
//! unreferenced.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{ChangeError, Step, StepExt};
use crate::core::types::{FileChangeSet, ObjectId, RefName, RepositoryIdentity};
use crate::forge::{CreateCommitRequest, ObjectGraph};

/// A commit that now sits at the tip of its branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub branch: String,
    pub commit: ObjectId,
    /// Canonical (web) URL of the commit
    pub url: String,
}

/// Commit `changes` onto `branch` in one step.
///
/// An empty change set still produces a commit (with the base tree).
/// A path that is both added and deleted is added.
///
/// # Errors
///
/// - [`ChangeError::ReferenceNotFound`] if the branch does not exist
/// - [`ChangeError::ObjectNotFound`] if the tip commit cannot be read
/// - [`ChangeError::TreeBuild`] if the remote rejects the entries
/// - [`ChangeError::ConcurrentUpdate`] if the branch moved meanwhile
/// - [`ChangeError::Transport`] for any other remote failure
///
/// # Example
///
/// ```
/// use treeline::core::types::{FileChangeSet, RepositoryIdentity};
/// use treeline::engine::commit_changes;
/// use treeline::forge::mock::MockObjectGraph;
///
/// # tokio_test::block_on(async {
/// let graph = MockObjectGraph::new();
/// let repo = RepositoryIdentity::new("acme", "widgets");
/// graph.seed_repository(&repo, &[("b.txt", "old")]);
///
/// let changes = FileChangeSet::new().add("a.txt", "hello").delete("b.txt");
/// let outcome = commit_changes(&graph, &repo, "main", "Update files", &changes)
///     .await
///     .unwrap();
///
/// assert_eq!(graph.branch_tip(&repo, "main"), Some(outcome.commit));
/// # });
/// ```
pub async fn commit_changes(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    branch: &str,
    message: &str,
    changes: &FileChangeSet,
) -> Result<CommitOutcome, ChangeError> {
    let reference = RefName::for_existing_branch(branch);

    debug!(%repo, branch, "resolving branch");
    let tip = graph
        .get_ref(repo, &reference)
        .await
        .at_step(Step::ResolveReference, reference.as_str())?
        .target;

    debug!(%repo, commit = %tip.short(7), "reading base commit");
    let base = graph
        .get_commit(repo, &tip)
        .await
        .at_step(Step::ReadBaseCommit, tip.as_str())?;

    for path in changes.overlapping() {
        warn!(path, "path is both added and deleted; keeping the addition");
    }
    let entries = changes.tree_entries();

    debug!(%repo, base_tree = %base.tree.short(7), entries = entries.len(), "creating tree");
    let tree = graph
        .create_tree(repo, &base.tree, &entries)
        .await
        .at_step(Step::CreateTree, base.tree.as_str())?;

    debug!(%repo, tree = %tree.id.short(7), "creating commit");
    let commit = graph
        .create_commit(
            repo,
            CreateCommitRequest {
                message: message.to_string(),
                tree: tree.id.clone(),
                parents: vec![tip.clone()],
            },
        )
        .await
        .at_step(Step::CreateCommit, tree.id.as_str())?;

    debug!(%repo, branch, commit = %commit.id.short(7), "advancing branch");
    graph
        .update_ref(repo, &reference, &commit.id, false)
        .await
        .at_step(Step::UpdateReference, branch)?;

    info!(%repo, branch, commit = %commit.id, "committed changes");
    Ok(CommitOutcome {
        branch: branch.to_string(),
        commit: commit.id,
        url: commit.url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockObjectGraph, MockOperation};
    use crate::forge::ForgeError;

    fn repo() -> RepositoryIdentity {
        RepositoryIdentity::new("acme", "widgets")
    }

    #[tokio::test]
    async fn calls_capabilities_in_protocol_order() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("b.txt", "b")]);

        commit_changes(&graph, &repo(), "main", "msg", &FileChangeSet::new().add("a", "a"))
            .await
            .unwrap();

        assert_eq!(
            graph.capability_calls(),
            vec!["get_ref", "get_commit", "create_tree", "create_commit", "update_ref"]
        );
    }

    #[tokio::test]
    async fn update_is_never_forced() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[]);

        commit_changes(&graph, &repo(), "main", "msg", &FileChangeSet::new())
            .await
            .unwrap();

        let forced: Vec<bool> = graph
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::UpdateRef { force, .. } => Some(force),
                _ => None,
            })
            .collect();
        assert_eq!(forced, vec![false]);
    }

    #[tokio::test]
    async fn overlapping_paths_send_only_the_addition() {
        let graph = MockObjectGraph::new();
        graph.seed_repository(&repo(), &[("a.txt", "old")]);

        let changes = FileChangeSet::new().add("a.txt", "new").delete("a.txt");
        let outcome = commit_changes(&graph, &repo(), "main", "msg", &changes)
            .await
            .unwrap();

        let sent = graph
            .operations()
            .into_iter()
            .find_map(|op| match op {
                MockOperation::CreateTree { entries, .. } => Some(entries),
                _ => None,
            })
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_deletion());
        assert_eq!(
            graph.files_at(&repo(), &outcome.commit).unwrap()["a.txt"],
            "new"
        );
    }

    #[tokio::test]
    async fn dangling_tip_is_object_not_found() {
        let graph = MockObjectGraph::new()
            .fail_on(FailOn::GetCommit(ForgeError::NotFound("commit".into())));
        graph.seed_repository(&repo(), &[]);

        let err = commit_changes(&graph, &repo(), "main", "msg", &FileChangeSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::ObjectNotFound { .. }));
        assert_eq!(err.step(), Some(Step::ReadBaseCommit));
    }

    #[tokio::test]
    async fn commit_failure_stops_before_update() {
        let graph = MockObjectGraph::new().fail_on(FailOn::CreateCommit(ForgeError::ApiError {
            status: 500,
            message: "boom".into(),
        }));
        let root = graph.seed_repository(&repo(), &[]);

        let err = commit_changes(&graph, &repo(), "main", "msg", &FileChangeSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::Transport { step: Step::CreateCommit, .. }));
        assert!(!graph.capability_calls().contains(&"update_ref"));
        assert_eq!(graph.branch_tip(&repo(), "main"), Some(root));
    }
}
