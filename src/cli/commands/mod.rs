//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates its URL arguments (before any client exists)
//! 2. Builds a [`ChangeService`] over the GitHub client and calls it
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Remote commands are async because they involve network I/O. Handlers
//! create a `tokio::runtime::Runtime` and `block_on` their async body.

mod auth;
mod branch;
mod commit;
mod completion;
mod config_cmd;
mod file;

pub use auth::auth;
pub use branch::{branch_create, branch_default, branch_list};
pub use commit::commit;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use file::{file_get, file_last_edit, file_latest};

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::args::{BranchAction, Command, ConfigAction, FileAction};
use crate::core::config::Config;
use crate::engine::ChangeService;
use crate::forge::github::GitHubObjectGraph;
use crate::secrets::{self, FileSecretStore};
use crate::ui::output::Verbosity;

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
    pub json: bool,
    pub interactive: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context, config: Config) -> Result<()> {
    match command {
        Command::Branch { action } => match action {
            BranchAction::Create { repo_url, name } => {
                branch_create(ctx, &config, &repo_url, &name)
            }
            BranchAction::List { repo_url } => branch_list(ctx, &config, &repo_url),
            BranchAction::DefaultBranch { repo_url } => branch_default(ctx, &config, &repo_url),
        },
        Command::Commit {
            repo_url,
            branch,
            message,
            add,
            delete,
        } => commit(
            ctx,
            &config,
            &repo_url,
            branch.as_deref(),
            &message,
            &add,
            &delete,
        ),
        Command::File { action } => match action {
            FileAction::Get { content_url } => file_get(ctx, &config, &content_url),
            FileAction::Latest {
                repo_url,
                path,
                branch,
            } => file_latest(ctx, &config, &repo_url, &path, branch.as_deref()),
            FileAction::LastEdit {
                repo_url,
                path,
                object_id,
            } => file_last_edit(ctx, &config, &repo_url, &path, &object_id),
        },
        Command::Auth {
            token,
            host,
            status,
            logout,
        } => auth(ctx, &config, token.as_deref(), host.as_deref(), status, logout),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_get(&config, &key),
            ConfigAction::Set { key, value } => config_set(ctx, config, &key, &value),
            ConfigAction::List => config_list(ctx, &config),
        },
        Command::Completion { shell } => completion(shell),
    }
}

/// Connect to the configured API and wrap the client in a service.
///
/// Resolves the token first so a missing credential fails without a
/// network round trip.
pub(crate) async fn connect(config: &Config) -> Result<ChangeService> {
    let store = FileSecretStore::new().context("Failed to open credential store")?;
    let token = secrets::resolve_token(&store, &config.api_host())?;

    let graph = GitHubObjectGraph::connect(token, config.api_base()).await;
    Ok(ChangeService::new(Arc::new(graph), config.per_page()))
}

/// Create a runtime for one command.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}
