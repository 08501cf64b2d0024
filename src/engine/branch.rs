//! engine::branch
//!
//! Branch creation, branch listing and the default-branch lookup.

use tracing::{debug, info};

use super::error::{ChangeError, Step, StepExt};
use crate::core::types::{BranchName, BranchReference, RefName, RepositoryIdentity};
use crate::core::url::DEFAULT_BRANCH;
use crate::forge::{ObjectGraph, PageRequest};

/// Create `name` pointing at the tip of `main`.
///
/// # Errors
///
/// - [`ChangeError::ReferenceNotFound`] if `main` does not exist
/// - [`ChangeError::ReferenceExists`] if `name` is taken
///
/// # Example
///
/// ```
/// use treeline::core::types::{BranchName, RepositoryIdentity};
/// use treeline::engine::{create_branch, ChangeError};
/// use treeline::forge::mock::MockObjectGraph;
///
/// # tokio_test::block_on(async {
/// let graph = MockObjectGraph::new();
/// let repo = RepositoryIdentity::new("acme", "widgets");
/// let main = graph.seed_repository(&repo, &[]);
///
/// let name = BranchName::new("feature").unwrap();
/// let branch = create_branch(&graph, &repo, &name).await.unwrap();
/// assert_eq!(branch.target, main);
///
/// let again = create_branch(&graph, &repo, &name).await;
/// assert!(matches!(again, Err(ChangeError::ReferenceExists { .. })));
/// # });
/// ```
pub async fn create_branch(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    name: &BranchName,
) -> Result<BranchReference, ChangeError> {
    create_branch_from(graph, repo, DEFAULT_BRANCH, name).await
}

/// Create `name` pointing at the tip of `base`.
pub async fn create_branch_from(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    base: &str,
    name: &BranchName,
) -> Result<BranchReference, ChangeError> {
    let base_ref = RefName::for_existing_branch(base);
    let new_ref = RefName::for_branch(name);

    debug!(%repo, base, "resolving base branch");
    let tip = graph
        .get_ref(repo, &base_ref)
        .await
        .at_step(Step::ResolveReference, base_ref.as_str())?
        .target;

    debug!(%repo, branch = %name, commit = %tip.short(7), "creating branch");
    let created = graph
        .create_ref(repo, &new_ref, &tip)
        .await
        .at_step(Step::CreateReference, new_ref.as_str())?;

    info!(%repo, branch = %name, commit = %created.target, "created branch");
    Ok(BranchReference {
        name: name.to_string(),
        target: created.target,
        url: created.url,
    })
}

/// List every branch, following pages until the remote reports no more.
///
/// `per_page` bounds each round trip; it does not limit the result.
pub async fn list_branches(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
    per_page: u32,
) -> Result<Vec<BranchReference>, ChangeError> {
    let mut branches = Vec::new();
    let mut request = PageRequest::first(per_page);

    loop {
        let page = graph
            .list_branches(repo, request)
            .await
            .at_step(Step::ListBranches, &repo.to_string())?;
        debug!(%repo, page = request.page, count = page.items.len(), "fetched branch page");
        branches.extend(page.items);

        match page.next_page {
            Some(next) => request = request.at(next),
            None => break,
        }
    }

    debug!(%repo, total = branches.len(), "listed branches");
    Ok(branches)
}

/// Name of the repository's default branch.
pub async fn default_branch_name(
    graph: &dyn ObjectGraph,
    repo: &RepositoryIdentity,
) -> Result<String, ChangeError> {
    let metadata = graph
        .get_repository(repo)
        .await
        .at_step(Step::ReadRepository, &repo.to_string())?;
    Ok(metadata.default_branch)
}
