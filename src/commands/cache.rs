use anyhow::{Context, Result};
use appinfo_cache::{AppId, AppInfoCache, CacheStore, CancelFlag, Config};
use colored::Colorize;

pub async fn invalidate(
    config: &Config,
    cancel: CancelFlag,
    app_ids: &[AppId],
    cascade: bool,
) -> Result<()> {
    let cache = AppInfoCache::from_config(config, cancel, None)
        .context("Failed to open metadata cache")?;

    let mut total = 0;
    for &app_id in app_ids {
        let removed = cache.invalidate(app_id, cascade).await?;
        if removed.is_empty() {
            println!("{} {} was not cached", "•".dimmed(), app_id);
            continue;
        }
        total += removed.len();
        let ids: Vec<String> = removed.iter().map(|id| id.to_string()).collect();
        println!("{} Invalidated {}", "✓".green(), ids.join(", ").bold());
    }

    if total > 0 {
        println!("Removed {} entries", total.to_string().bold());
    }
    Ok(())
}

pub async fn cache(config: &Config, cancel: CancelFlag, clean: bool) -> Result<()> {
    if clean {
        println!("Cleaning metadata cache...");
        let cache = AppInfoCache::from_config(config, cancel, None)
            .context("Failed to open metadata cache")?;
        let count = cache
            .purge()
            .await
            .context("Failed to purge metadata cache")?;
        println!(
            "{} Removed {} entries",
            "✓".green().bold(),
            count.to_string().bold()
        );
        return Ok(());
    }

    let store = CacheStore::new(config.cache_root());
    println!("{}", "==> Metadata Cache".bold().green());
    println!();
    println!(
        "{}: {}",
        "Location".bold(),
        store.root().display().to_string().cyan()
    );
    println!(
        "{}: {}",
        "Format".bold(),
        store
            .read_stamp()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unstamped".to_string())
            .cyan()
    );

    let entries = store.entries()?;
    if entries.is_empty() {
        println!("{}: {}", "Entries".bold(), "0".dimmed());
        return Ok(());
    }

    let total: u64 = entries.iter().map(|e| e.size).sum();
    println!("{}: {}", "Entries".bold(), entries.len().to_string().cyan());
    println!("{}: {}", "Size".bold(), format_size(total).cyan());
    println!();

    for entry in &entries {
        let modified = entry
            .modified
            .map(|t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {:>10}  {:>9}  {}",
            entry.app_id.to_string().bold(),
            format_size(entry.size),
            modified.dimmed()
        );
    }

    println!();
    println!("Run {} to clean the cache", "appinfo cache --clean".dimmed());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024 / 2), "1.5 MB");
    }
}
