use super::spinner;
use anyhow::{Context, Result};
use appinfo_cache::{
    AppId, AppInfoCache, AppKind, BuildId, CancelFlag, Config, MetadataTree, extract_dlc_ids,
};
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
    Raw,
}

async fn fetch_tree(
    config: &Config,
    cancel: CancelFlag,
    app_id: AppId,
    branch: &str,
    min_build: BuildId,
    max_attempts: Option<u32>,
    show_progress: bool,
) -> Result<MetadataTree> {
    let cache = AppInfoCache::from_config(config, cancel, max_attempts)
        .context("Failed to open metadata cache")?;

    let pb = spinner(format!("Fetching app info for {}...", app_id), show_progress);
    let result = cache.get_app_info(app_id, branch, min_build).await;
    pb.finish_and_clear();

    result.with_context(|| format!("No app info available for {}", app_id))
}

fn kind_label(kind: AppKind) -> colored::ColoredString {
    match kind {
        AppKind::Missing => "not populated".yellow(),
        AppKind::NonGame => "non-game".cyan(),
        AppKind::Game => "game".green(),
    }
}

pub async fn info(
    config: &Config,
    cancel: CancelFlag,
    app_id: AppId,
    branch: &str,
    min_build: BuildId,
    max_attempts: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let tree = fetch_tree(
        config,
        cancel,
        app_id,
        branch,
        min_build,
        max_attempts,
        format == OutputFormat::Summary,
    )
    .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        OutputFormat::Raw => {
            for child in tree.children() {
                print!("{}", child);
            }
        }
        OutputFormat::Summary => {
            let title = tree.name().unwrap_or("(unnamed)");
            println!("{}", format!("==> {} {}", app_id, title).bold().green());
            println!("{}: {}", "Kind".bold(), kind_label(tree.kind()));
            if let Some(app_type) = tree.app_type() {
                println!("{}: {}", "Type".bold(), app_type);
            }
            match tree.branch_build_id(branch) {
                Some(build) => println!("{} ({}): {}", "Build".bold(), branch, build.to_string().cyan()),
                None => println!("{} ({}): {}", "Build".bold(), branch, "none".dimmed()),
            }
            let dlc = extract_dlc_ids(&tree);
            println!("{}: {}", "DLC".bold(), dlc.len().to_string().cyan());
        }
    }

    Ok(())
}

pub async fn dlc(
    config: &Config,
    cancel: CancelFlag,
    app_id: AppId,
    branch: &str,
    min_build: BuildId,
    json: bool,
) -> Result<()> {
    let tree = fetch_tree(config, cancel, app_id, branch, min_build, None, !json).await?;
    let ids = extract_dlc_ids(&tree);

    if json {
        println!("{}", serde_json::to_string(&ids)?);
        return Ok(());
    }

    if ids.is_empty() {
        println!("{} No DLC referenced by {}", "✓".green(), app_id);
        return Ok(());
    }

    println!(
        "{}",
        format!("==> {} DLC for {}", ids.len(), app_id).bold().green()
    );
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}
