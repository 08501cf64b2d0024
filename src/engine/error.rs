//! engine::error
//!
//! Typed orchestration failures.
//!
//! Every remote failure is wrapped with the step that issued the call and
//! returned immediately. Classification depends on the step: a `NotFound`
//! while resolving a reference means the branch is missing, while the same
//! error reading a commit means the object graph is inconsistent.

use thiserror::Error;

use crate::core::types::{ObjectId, TypeError};
use crate::core::url::UrlError;
use crate::forge::ForgeError;

/// GitHub's 422 message when the reference to update was deleted.
const MISSING_REFERENCE_MESSAGE: &str = "Reference does not exist";

/// A remote call made by an orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ResolveReference,
    ReadBaseCommit,
    CreateTree,
    CreateCommit,
    UpdateReference,
    CreateReference,
    ListBranches,
    ReadRepository,
    ReadBlob,
    ReadFile,
    ListCommits,
    ReadTree,
}

impl Step {
    /// Human-readable step name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResolveReference => "resolve reference",
            Step::ReadBaseCommit => "read base commit",
            Step::CreateTree => "create tree",
            Step::CreateCommit => "create commit",
            Step::UpdateReference => "update reference",
            Step::CreateReference => "create reference",
            Step::ListBranches => "list branches",
            Step::ReadRepository => "read repository",
            Step::ReadBlob => "read blob",
            Step::ReadFile => "read file",
            Step::ListCommits => "list commits",
            Step::ReadTree => "read tree",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from orchestrations.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// A caller-supplied URL did not parse. No remote call was made.
    #[error(transparent)]
    Parse(#[from] UrlError),

    /// A caller-supplied name or id is invalid. No remote call was made.
    #[error(transparent)]
    InvalidInput(#[from] TypeError),

    #[error("{step}: reference '{reference}' not found")]
    ReferenceNotFound {
        step: Step,
        reference: String,
        #[source]
        source: ForgeError,
    },

    #[error("{step}: reference '{reference}' already exists")]
    ReferenceExists {
        step: Step,
        reference: String,
        #[source]
        source: ForgeError,
    },

    /// A dangling id; the remote graph is inconsistent.
    #[error("{step}: object '{object}' not found")]
    ObjectNotFound {
        step: Step,
        object: String,
        #[source]
        source: ForgeError,
    },

    #[error("{step}: remote rejected the tree entries")]
    TreeBuild {
        step: Step,
        #[source]
        source: ForgeError,
    },

    /// The branch moved after it was resolved. Re-run the whole protocol.
    ///
    /// A branch deleted in the meantime is reported as `ReferenceNotFound`
    /// instead.
    #[error("{step}: branch '{branch}' moved concurrently")]
    ConcurrentUpdate {
        step: Step,
        branch: String,
        #[source]
        source: ForgeError,
    },

    #[error("{step} failed")]
    Transport {
        step: Step,
        #[source]
        source: ForgeError,
    },

    /// History lookup found no commit containing the object.
    #[error("no commit touching '{path}' contains object {object}")]
    NotFound { path: String, object: ObjectId },
}

impl ChangeError {
    /// The step that failed, for failures raised by a remote call.
    pub fn step(&self) -> Option<Step> {
        match self {
            ChangeError::ReferenceNotFound { step, .. }
            | ChangeError::ReferenceExists { step, .. }
            | ChangeError::ObjectNotFound { step, .. }
            | ChangeError::TreeBuild { step, .. }
            | ChangeError::ConcurrentUpdate { step, .. }
            | ChangeError::Transport { step, .. } => Some(*step),
            ChangeError::Parse(_) | ChangeError::InvalidInput(_) | ChangeError::NotFound { .. } => {
                None
            }
        }
    }

    /// The underlying forge error, if any.
    pub fn forge_error(&self) -> Option<&ForgeError> {
        match self {
            ChangeError::ReferenceNotFound { source, .. }
            | ChangeError::ReferenceExists { source, .. }
            | ChangeError::ObjectNotFound { source, .. }
            | ChangeError::TreeBuild { source, .. }
            | ChangeError::ConcurrentUpdate { source, .. }
            | ChangeError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Classify a forge failure raised by `step`.
    ///
    /// `subject` names what the step addressed: a reference name for
    /// reference steps, an object id for object steps, a branch for updates.
    pub(crate) fn classify(step: Step, subject: &str, source: ForgeError) -> Self {
        let subject = subject.to_string();
        match (step, &source) {
            (Step::UpdateReference, ForgeError::Rejected(message))
                if message.contains(MISSING_REFERENCE_MESSAGE) =>
            {
                ChangeError::ReferenceNotFound {
                    step,
                    reference: subject,
                    source,
                }
            }
            (Step::ResolveReference, ForgeError::NotFound(_))
            | (Step::UpdateReference, ForgeError::NotFound(_))
            | (Step::CreateReference, ForgeError::NotFound(_)) => ChangeError::ReferenceNotFound {
                step,
                reference: subject,
                source,
            },
            (Step::ReadBaseCommit, ForgeError::NotFound(_))
            | (Step::CreateTree, ForgeError::NotFound(_))
            | (Step::CreateCommit, ForgeError::NotFound(_)) => ChangeError::ObjectNotFound {
                step,
                object: subject,
                source,
            },
            (Step::CreateTree, ForgeError::Rejected(_)) => ChangeError::TreeBuild { step, source },
            (Step::UpdateReference, ForgeError::Rejected(_)) => ChangeError::ConcurrentUpdate {
                step,
                branch: subject,
                source,
            },
            (Step::CreateReference, ForgeError::Rejected(_)) => ChangeError::ReferenceExists {
                step,
                reference: subject,
                source,
            },
            _ => ChangeError::Transport { step, source },
        }
    }
}

/// Attach a step to forge results.
pub(crate) trait StepExt<T> {
    fn at_step(self, step: Step, subject: &str) -> Result<T, ChangeError>;
}

impl<T> StepExt<T> for Result<T, ForgeError> {
    fn at_step(self, step: Step, subject: &str) -> Result<T, ChangeError> {
        self.map_err(|e| ChangeError::classify(step, subject, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ForgeError {
        ForgeError::NotFound("Not Found".into())
    }

    fn rejected() -> ForgeError {
        ForgeError::Rejected("Unprocessable".into())
    }

    #[test]
    fn not_found_by_step() {
        assert!(matches!(
            ChangeError::classify(Step::ResolveReference, "refs/heads/x", not_found()),
            ChangeError::ReferenceNotFound { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::ReadBaseCommit, "abc", not_found()),
            ChangeError::ObjectNotFound { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::CreateTree, "abc", not_found()),
            ChangeError::ObjectNotFound { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::UpdateReference, "x", not_found()),
            ChangeError::ReferenceNotFound { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::ListBranches, "o/r", not_found()),
            ChangeError::Transport { .. }
        ));
    }

    #[test]
    fn rejected_by_step() {
        assert!(matches!(
            ChangeError::classify(Step::CreateTree, "abc", rejected()),
            ChangeError::TreeBuild { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::UpdateReference, "main", rejected()),
            ChangeError::ConcurrentUpdate { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::CreateReference, "refs/heads/x", rejected()),
            ChangeError::ReferenceExists { .. }
        ));
        assert!(matches!(
            ChangeError::classify(Step::CreateCommit, "abc", rejected()),
            ChangeError::Transport { .. }
        ));
    }

    #[test]
    fn deleted_branch_on_update_is_not_found() {
        let err = ChangeError::classify(
            Step::UpdateReference,
            "main",
            ForgeError::Rejected("Reference does not exist".into()),
        );
        assert!(matches!(
            err,
            ChangeError::ReferenceNotFound { ref reference, .. } if reference == "main"
        ));
        assert_eq!(err.step(), Some(Step::UpdateReference));
    }

    #[test]
    fn other_errors_are_transport() {
        for err in [
            ForgeError::RateLimited,
            ForgeError::AuthRequired,
            ForgeError::NetworkError("reset".into()),
        ] {
            let change = ChangeError::classify(Step::UpdateReference, "main", err);
            assert!(matches!(change, ChangeError::Transport { .. }));
            assert_eq!(change.step(), Some(Step::UpdateReference));
        }
    }

    #[test]
    fn message_names_the_step() {
        let err = ChangeError::classify(Step::UpdateReference, "main", rejected());
        assert_eq!(
            err.to_string(),
            "update reference: branch 'main' moved concurrently"
        );

        let err = ChangeError::classify(Step::ListCommits, "a.txt", ForgeError::RateLimited);
        assert_eq!(err.to_string(), "list commits failed");
        assert!(matches!(err.forge_error(), Some(ForgeError::RateLimited)));
    }

    #[test]
    fn input_errors_have_no_step() {
        let err = ChangeError::from(UrlError::InvalidRepositoryUrl("x".into()));
        assert_eq!(err.step(), None);
        assert!(err.forge_error().is_none());
    }
}
