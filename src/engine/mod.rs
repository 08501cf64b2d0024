//! engine
//!
//! Sequences object-graph capabilities into change operations.
//!
//! # Architecture
//!
//! Each operation is a free async function over `&dyn ObjectGraph` and a
//! [`RepositoryIdentity`](crate::core::types::RepositoryIdentity):
//!
//! - [`commit_changes`] - resolve, read base, build tree, commit and advance
//! - [`create_branch`] / [`create_branch_from`] - copy a branch tip to a new ref
//! - [`list_branches`] - drain the paginated branch listing
//! - [`last_edit_date`] - walk a file's history for a content id
//! - [`get_file`] / [`get_file_latest`] - read-only file accessors
//!
//! [`ChangeService`] wraps these behind repository and content URLs.
//!
//! # Invariants
//!
//! - Remote calls within one operation run strictly in order; each consumes
//!   the id returned by the previous one
//! - The first failure is returned, tagged with its [`Step`]; nothing is
//!   retried or rolled back
//! - Branch references only advance with `force = false`
//! - No object state is cached between operations

mod branch;
mod commit;
mod error;
mod history;
mod read;
mod service;

pub use branch::{create_branch, create_branch_from, default_branch_name, list_branches};
pub use commit::{commit_changes, CommitOutcome};
pub use error::{ChangeError, Step};
pub use history::last_edit_date;
pub use read::{get_file, get_file_latest, FileContent};
pub use service::ChangeService;
