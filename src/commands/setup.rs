use super::spinner;
use anyhow::{Context, Result};
use appinfo_cache::steamcmd::{self, SteamCmd};
use appinfo_cache::version::{self, GateOutcome};
use appinfo_cache::{CacheStore, Config, ToolRunner};
use colored::Colorize;
use std::fs;

pub async fn setup(config: &Config) -> Result<()> {
    let tool = SteamCmd::new(&config.steamcmd);
    tool.kill().await;

    if !config.steamcmd.exists() {
        anyhow::bail!(
            "steamcmd not found at {}\nDownload it from Valve and unpack it there, or pass --steamcmd",
            config.steamcmd.display()
        );
    }

    // steamcmd's own app-info cache can hold stale trees across sessions
    let tool_cache = config.tool_appinfo_cache();
    if tool_cache.exists() {
        fs::remove_file(&tool_cache)
            .with_context(|| format!("Failed to remove {}", tool_cache.display()))?;
        println!("{} Cleared steamcmd app-info cache", "✓".green());
    }

    let store = CacheStore::new(config.cache_root());
    match version::ensure_compatible(&store)? {
        GateOutcome::Compatible(found) => {
            println!("{} Metadata cache format {} is current", "✓".green(), found);
        }
        GateOutcome::Purged { found } => {
            println!(
                "{} Metadata cache reset ({} → {})",
                "✓".green(),
                found.as_deref().map(str::trim).unwrap_or("unstamped"),
                version::current_version()
            );
        }
    }

    if !config.tool_bootstrapped() {
        let pb = spinner("Running steamcmd first-time update...".to_string(), true);
        let result = tool.invoke(&steamcmd::quit_command()).await;
        pb.finish_and_clear();
        result.context("steamcmd first-time update failed")?;
        println!("{} steamcmd updated", "✓".green());
    }

    println!(
        "{} Ready: {}",
        "✓".green().bold(),
        config.tool_dir.display().to_string().cyan()
    );
    Ok(())
}

pub async fn teardown(config: &Config) -> Result<()> {
    SteamCmd::new(&config.steamcmd).kill().await;

    if !config.tool_dir.exists() {
        println!("{} Nothing to remove", "✓".green());
        return Ok(());
    }

    fs::remove_dir_all(&config.tool_dir)
        .with_context(|| format!("Failed to remove {}", config.tool_dir.display()))?;
    println!(
        "{} Removed {}",
        "✓".green().bold(),
        config.tool_dir.display().to_string().bold()
    );
    Ok(())
}
