//! forge
//!
//! Access to the hosting service's object graph (blobs, trees, commits,
//! references).
//!
//! # Architecture
//!
//! The [`ObjectGraph`] trait is the capability set the orchestrators in
//! [`crate::engine`] sequence. Two implementations exist:
//!
//! - [`github`]: GitHub REST git data API via `reqwest`
//! - [`mock`]: in-memory, content-addressed graph for deterministic tests
//!
//! Forge calls are never retried; the first failure is returned.

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
