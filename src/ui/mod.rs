//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//! - [`prompts`] - Masked token input

pub mod output;
pub mod prompts;
