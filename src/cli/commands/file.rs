//! file commands - Read files and file history

use anyhow::{Context as _, Result};

use super::{connect, runtime, Context};
use crate::core::config::Config;
use crate::core::url::{parse_content_url, parse_repository_url};
use crate::ui::output;

/// Print the blob behind a content URL.
pub fn file_get(ctx: &Context, config: &Config, content_url: &str) -> Result<()> {
    parse_content_url(content_url)?;

    let file = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .get_file(content_url)
            .await
            .context("Failed to read blob")
    })?;

    if ctx.json {
        output::json(&file)?;
    } else {
        print!("{}", file.content);
    }
    Ok(())
}

/// Print a file at the tip of a branch.
pub fn file_latest(
    ctx: &Context,
    config: &Config,
    repo_url: &str,
    path: &str,
    branch: Option<&str>,
) -> Result<()> {
    parse_repository_url(repo_url)?;

    let content = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .get_file_latest(repo_url, branch, path)
            .await
            .with_context(|| format!("Failed to read '{path}'"))
    })?;

    if ctx.json {
        output::json(&serde_json::json!({ "path": path, "content": content }))?;
    } else {
        print!("{content}");
    }
    Ok(())
}

/// Print when `path` last took on the content `object_id`.
pub fn file_last_edit(
    ctx: &Context,
    config: &Config,
    repo_url: &str,
    path: &str,
    object_id: &str,
) -> Result<()> {
    parse_repository_url(repo_url)?;

    let date = runtime()?.block_on(async {
        let service = connect(config).await?;
        service
            .last_edit_date(repo_url, path, object_id)
            .await
            .with_context(|| format!("Failed to look up history of '{path}'"))
    })?;

    if ctx.json {
        output::json(&serde_json::json!({ "path": path, "object": object_id, "date": date }))?;
    } else {
        println!("{}", date.to_rfc3339());
    }
    Ok(())
}
