//! core
//!
//! Domain types, URL resolution and configuration for treeline.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepositoryIdentity, ObjectId, BranchName, etc.
//! - [`url`] - Content and repository URL parsing
//! - [`config`] - Configuration schema and loading
//!
//! Nothing in this layer performs network I/O.

pub mod config;
pub mod types;
pub mod url;
