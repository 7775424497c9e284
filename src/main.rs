mod commands;

use appinfo_cache::{AppId, BuildId, CancelFlag, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "appinfo")]
#[command(author, version, about = "Cached steamcmd app info with build-aware invalidation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Tool directory holding steamcmd and the metadata cache
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Path to the steamcmd executable
    #[arg(long, global = true, value_name = "PATH")]
    steamcmd: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show app info, fetching it when the cache is missing or stale
    Info {
        /// Steam app id
        app_id: AppId,

        /// Branch whose build id is checked
        #[arg(long, default_value = "public")]
        branch: String,

        /// Oldest acceptable build id for the branch
        #[arg(long, default_value_t = 0)]
        min_build: BuildId,

        /// Give up after this many steamcmd fetches
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Print the tree as JSON
        #[arg(long, conflicts_with = "raw")]
        json: bool,

        /// Print the tree in KeyValues form
        #[arg(long)]
        raw: bool,
    },

    /// List the DLC app ids an app references
    Dlc {
        /// Steam app id
        app_id: AppId,

        /// Branch whose build id is checked
        #[arg(long, default_value = "public")]
        branch: String,

        /// Oldest acceptable build id for the branch
        #[arg(long, default_value_t = 0)]
        min_build: BuildId,

        /// Print ids as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Drop cached app info
    Invalidate {
        /// Steam app ids
        #[arg(required = true)]
        app_ids: Vec<AppId>,

        /// Also drop the DLC listed by each cached app
        #[arg(long)]
        cascade: bool,
    },

    /// Show or clean the metadata cache
    Cache {
        /// Remove every cached entry
        #[arg(long)]
        clean: bool,
    },

    /// Prepare steamcmd and check the cache format
    Setup,

    /// Stop steamcmd and remove the whole tool directory
    Teardown,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match cli.home {
        Some(home) => Config::with_tool_dir(home),
        None => Config::from_env(),
    };
    if let Some(steamcmd) = cli.steamcmd {
        config.steamcmd = steamcmd;
    }

    // Ctrl-C stops the refresh loop at its next checkpoint
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Info {
            app_id,
            branch,
            min_build,
            max_attempts,
            json,
            raw,
        } => {
            let format = if json {
                commands::OutputFormat::Json
            } else if raw {
                commands::OutputFormat::Raw
            } else {
                commands::OutputFormat::Summary
            };
            commands::info(&config, cancel, app_id, &branch, min_build, max_attempts, format)
                .await?;
        }
        Commands::Dlc {
            app_id,
            branch,
            min_build,
            json,
        } => {
            commands::dlc(&config, cancel, app_id, &branch, min_build, json).await?;
        }
        Commands::Invalidate { app_ids, cascade } => {
            commands::invalidate(&config, cancel, &app_ids, cascade).await?;
        }
        Commands::Cache { clean } => {
            commands::cache(&config, cancel, clean).await?;
        }
        Commands::Setup => {
            commands::setup(&config).await?;
        }
        Commands::Teardown => {
            commands::teardown(&config).await?;
        }
    }

    Ok(())
}
