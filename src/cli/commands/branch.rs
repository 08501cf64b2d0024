//! branch commands - Create, list, and inspect branches

use anyhow::{Context as _, Result};

use super::{connect, runtime, Context};
use crate::core::config::Config;
use crate::core::types::BranchName;
use crate::core::url::parse_repository_url;
use crate::ui::output;

/// Create a branch from the tip of the URL's branch (`main` by default).
pub fn branch_create(ctx: &Context, config: &Config, repo_url: &str, name: &str) -> Result<()> {
    let location = parse_repository_url(repo_url)?;
    BranchName::new(name).context("Invalid branch name")?;

    let branch = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .create_branch(repo_url, name)
            .await
            .with_context(|| format!("Failed to create branch '{name}'"))
    })?;

    if ctx.json {
        output::json(&branch)?;
    } else {
        output::print(
            format!(
                "Created branch '{}' from '{}' at {}",
                branch.name,
                location.branch,
                branch.target.short(7)
            ),
            ctx.verbosity(),
        );
    }
    Ok(())
}

/// List every branch of the repository.
pub fn branch_list(ctx: &Context, config: &Config, repo_url: &str) -> Result<()> {
    parse_repository_url(repo_url)?;

    let branches = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .list_branches(repo_url)
            .await
            .context("Failed to list branches")
    })?;

    if ctx.json {
        output::json(&branches)?;
    } else {
        // Names always go to stdout so the list stays pipeable under --quiet.
        for branch in &branches {
            println!("{}\t{}", branch.target.short(7), branch.name);
        }
    }
    Ok(())
}

/// Print the repository's default branch.
pub fn branch_default(ctx: &Context, config: &Config, repo_url: &str) -> Result<()> {
    parse_repository_url(repo_url)?;

    let name = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .default_branch_name(repo_url)
            .await
            .context("Failed to read repository")
    })?;

    if ctx.json {
        output::json(&serde_json::json!({ "default_branch": name }))?;
    } else {
        println!("{name}");
    }
    Ok(())
}
