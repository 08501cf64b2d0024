//! commit command - Apply file additions and deletions as one commit

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::{connect, runtime, Context};
use crate::core::config::Config;
use crate::core::types::FileChangeSet;
use crate::core::url::parse_repository_url;
use crate::ui::output;

/// Commit local files and deletions to a branch.
///
/// Each `--add` is `<repo path>=<local file>`.
pub fn commit(
    ctx: &Context,
    config: &Config,
    repo_url: &str,
    branch: Option<&str>,
    message: &str,
    add: &[String],
    delete: &[String],
) -> Result<()> {
    let location = parse_repository_url(repo_url)?;
    let target = branch.unwrap_or(&location.branch).to_string();

    let mut changes = FileChangeSet::new();
    for arg in add {
        let (path, file) = parse_addition(arg)?;
        let content = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        changes = changes.add(path, content);
    }
    for path in delete {
        if path.is_empty() {
            bail!("--delete needs a repository path");
        }
        changes = changes.delete(path.as_str());
    }

    let outcome = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .commit(repo_url, branch, message, &changes)
            .await
            .with_context(|| format!("Failed to commit to '{target}'"))
    })?;

    if ctx.json {
        output::json(&outcome)?;
    } else {
        output::print(
            format!(
                "Committed {} to '{}'\n{}",
                outcome.commit.short(7),
                outcome.branch,
                outcome.url
            ),
            ctx.verbosity(),
        );
    }
    Ok(())
}

/// Split `<repo path>=<local file>`.
fn parse_addition(arg: &str) -> Result<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((path, file)) if !path.is_empty() && !file.is_empty() => {
            Ok((path.to_string(), PathBuf::from(file)))
        }
        _ => bail!("--add expects <path>=<file>, got '{arg}'"),
    }
}
