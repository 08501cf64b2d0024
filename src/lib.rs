//! treeline - branch and multi-file commit orchestration for GitHub
//!
//! treeline drives the GitHub git data API (blobs, trees, commits,
//! references) so callers can say "create branch X" or "apply these file
//! additions and deletions as one commit" without handling the object
//! model themselves. No local clone is involved.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrations: commit, branch creation, listing, history
//! - [`core`] - Domain types, URL parsing, configuration
//! - [`forge`] - The `ObjectGraph` capability trait, GitHub client and mock
//! - [`secrets`] - Token storage
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! 1. Branches only move with `force = false`; a concurrent push is
//!    reported, never overwritten
//! 2. Every failure names the remote step that raised it
//! 3. Malformed URLs are rejected before any network call
//! 4. No object state is cached between operations

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod secrets;
pub mod ui;
