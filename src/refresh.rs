//! Cache-first app info retrieval with build-aware invalidation.
//!
//! [`AppInfoCache::get_app_info`] drives one app id through
//!
//! ```text
//! CacheCheck ──hit──▶ Parse ──▶ Validate ──accept──▶ Done
//!     │miss             ▲  │corrupt cache   │missing / stale
//!     ▼                 │  ▼                ▼
//!   Fetch ──────────────┘  Fetch ◀──── (invalidate) Fetch
//! ```
//!
//! - A cached document that no longer parses is deleted and fetched again; a
//!   freshly fetched one that doesn't parse fails the call.
//! - An empty tree means steamcmd hasn't populated the app yet: fetch again.
//! - A game whose branch build is older than the requested minimum is stale:
//!   the entry and every DLC it lists are deleted as one batch, then fetched.
//! - Only accepted, fully parsed documents are written.
//!
//! Cancellation is checked on entry, before every fetch and after every tool
//! invocation. Once observed, the call fails without touching the cache again.
//!
//! steamcmd shares one working directory across apps, so every call holds a
//! process-wide lock for its whole cycle.

use crate::AppId;
use crate::appinfo::{self, AppKind, BuildId, MetadataTree};
use crate::cache::CacheStore;
use crate::cancel::CancelFlag;
use crate::config::Config;
use crate::dlc::extract_dlc_ids;
use crate::error::{AppInfoError, Result};
use crate::steamcmd::{self, SteamCmd, ToolRunner};
use crate::version;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Serializes refresh cycles across the process
static REFRESH_LOCK: Mutex<()> = Mutex::const_new(());

/// Placeholder app used to force steamcmd to refresh its app-info state
/// without downloading real content
pub const DEFAULT_REFRESH_APP_ID: AppId = 4;

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Parent of the per-app `+force_install_dir` targets
    pub install_root: PathBuf,
    /// App passed to `+app_update`
    pub refresh_app_id: AppId,
    /// Fetch ceiling per call; `None` retries until cancelled
    pub max_attempts: Option<u32>,
}

impl RefreshSettings {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            refresh_app_id: DEFAULT_REFRESH_APP_ID,
            max_attempts: None,
        }
    }

    pub fn max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cache,
    Fetched,
}

/// What validation decided about a parsed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accept,
    /// Not populated yet; fetch again, nothing to invalidate
    Pending,
    /// Build too old; invalidate with DLC
    Stale,
}

enum State {
    CacheCheck,
    Fetch,
    Parse { text: String, origin: Origin },
    Validate {
        tree: MetadataTree,
        document: String,
        origin: Origin,
    },
}

fn validate(tree: &MetadataTree, branch: &str, min_build: BuildId) -> Verdict {
    match tree.kind() {
        AppKind::Missing => Verdict::Pending,
        AppKind::NonGame => Verdict::Accept,
        AppKind::Game => match tree.branch_build_id(branch) {
            // Branch-less or non-catalog titles have no build to compare
            None => Verdict::Accept,
            Some(build) if build < min_build => Verdict::Stale,
            Some(_) => Verdict::Accept,
        },
    }
}

/// App info backed by the on-disk cache and steamcmd
pub struct AppInfoCache<R = SteamCmd> {
    store: CacheStore,
    tool: R,
    cancel: CancelFlag,
    settings: RefreshSettings,
}

impl AppInfoCache<SteamCmd> {
    /// Open the cache described by `config`, driving the real steamcmd
    pub fn from_config(
        config: &Config,
        cancel: CancelFlag,
        max_attempts: Option<u32>,
    ) -> Result<Self> {
        Self::open(
            CacheStore::new(config.cache_root()),
            SteamCmd::new(&config.steamcmd),
            cancel,
            RefreshSettings::new(config.install_root()).max_attempts(max_attempts),
        )
    }
}

impl<R: ToolRunner> AppInfoCache<R> {
    /// Runs the version gate on `store` before anything else can read it
    pub fn open(
        store: CacheStore,
        tool: R,
        cancel: CancelFlag,
        settings: RefreshSettings,
    ) -> Result<Self> {
        let outcome = version::ensure_compatible(&store)?;
        debug!(?outcome, root = %store.root().display(), "metadata cache opened");
        Ok(Self {
            store,
            tool,
            cancel,
            settings,
        })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn tool(&self) -> &R {
        &self.tool
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Metadata for `app_id` whose `branch` build is at least `min_build`.
    ///
    /// Errors are the "no usable result" cases: launch failure, no output,
    /// an unparsable fresh fetch, cancellation, or an exhausted retry ceiling.
    pub async fn get_app_info(
        &self,
        app_id: AppId,
        branch: &str,
        min_build: BuildId,
    ) -> Result<MetadataTree> {
        let _guard = REFRESH_LOCK.lock().await;
        self.cancel.check()?;

        let mut attempts = 0u32;
        let mut state = State::CacheCheck;
        loop {
            state = match state {
                State::CacheCheck => {
                    if self.store.exists(app_id) {
                        debug!(app_id, "cache hit");
                        State::Parse {
                            text: self.store.read(app_id)?,
                            origin: Origin::Cache,
                        }
                    } else {
                        State::Fetch
                    }
                }

                State::Fetch => {
                    self.cancel.check()?;
                    attempts += 1;
                    if let Some(max) = self.settings.max_attempts
                        && attempts > max
                    {
                        return Err(AppInfoError::RetriesExhausted {
                            app_id,
                            attempts: max,
                        });
                    }
                    State::Parse {
                        text: self.fetch(app_id, attempts).await?,
                        origin: Origin::Fetched,
                    }
                }

                State::Parse { text, origin } => {
                    let parsed = match origin {
                        Origin::Cache => Ok(text),
                        Origin::Fetched => appinfo::locate_document(&text, app_id),
                    }
                    .and_then(|document| {
                        MetadataTree::parse(&document).map(|tree| (tree, document))
                    });

                    match parsed {
                        Ok((tree, document)) => State::Validate {
                            tree,
                            document,
                            origin,
                        },
                        Err(source) if origin == Origin::Cache => {
                            warn!(app_id, error = %source, "cached app info is corrupt, refetching");
                            self.store.delete(app_id)?;
                            State::Fetch
                        }
                        Err(source) => return Err(AppInfoError::Parse { app_id, source }),
                    }
                }

                State::Validate {
                    tree,
                    document,
                    origin,
                } => match validate(&tree, branch, min_build) {
                    Verdict::Accept => {
                        if origin == Origin::Fetched {
                            self.store.write(app_id, &document)?;
                        }
                        return Ok(tree);
                    }
                    Verdict::Pending => {
                        debug!(app_id, "app info not populated yet");
                        State::Fetch
                    }
                    Verdict::Stale => {
                        let mut doomed = vec![app_id];
                        doomed.extend(extract_dlc_ids(&tree));
                        let removed = self.store.delete_many(&doomed)?;
                        info!(
                            app_id,
                            branch,
                            min_build,
                            build = ?tree.branch_build_id(branch),
                            removed,
                            "stale app info invalidated"
                        );
                        State::Fetch
                    }
                },
            };
        }
    }

    /// [`get_app_info`](Self::get_app_info) collapsed to an option; the error is logged
    pub async fn try_get_app_info(
        &self,
        app_id: AppId,
        branch: &str,
        min_build: BuildId,
    ) -> Option<MetadataTree> {
        match self.get_app_info(app_id, branch, min_build).await {
            Ok(tree) => Some(tree),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                warn!(app_id, error = %e, "app info unavailable");
                None
            }
        }
    }

    /// Delete one cached entry, optionally with the DLC its cached tree lists.
    /// Returns the ids that were actually removed.
    pub async fn invalidate(&self, app_id: AppId, cascade: bool) -> Result<Vec<AppId>> {
        let _guard = REFRESH_LOCK.lock().await;

        let mut doomed = vec![app_id];
        if cascade && self.store.exists(app_id) {
            match MetadataTree::parse(&self.store.read(app_id)?) {
                Ok(tree) => doomed.extend(extract_dlc_ids(&tree)),
                Err(e) => warn!(app_id, error = %e, "cached app info is corrupt, DLC unknown"),
            }
        }

        let mut removed = Vec::new();
        for id in doomed {
            if self.store.delete(id)? {
                removed.push(id);
            }
        }
        info!(app_id, ?removed, "invalidated");
        Ok(removed)
    }

    /// Remove every cached entry and restamp the cache. Returns how many
    /// entries were removed.
    pub async fn purge(&self) -> Result<usize> {
        let _guard = REFRESH_LOCK.lock().await;

        let count = self.store.entries()?.len();
        self.store.purge_all()?;
        self.store.write_stamp(version::current_version())?;
        Ok(count)
    }

    async fn fetch(&self, app_id: AppId, attempt: u32) -> Result<String> {
        info!(app_id, attempt, "fetching app info from steamcmd");
        let install_dir = self.settings.install_root.join(app_id.to_string());

        self.tool
            .invoke(&steamcmd::update_command(
                app_id,
                &install_dir,
                self.settings.refresh_app_id,
            ))
            .await?;
        self.cancel.check()?;

        let output = self.tool.invoke(&steamcmd::print_command(app_id)).await?;
        self.cancel.check()?;

        if output.trim().is_empty() {
            return Err(AppInfoError::NoOutput(app_id));
        }
        Ok(output)
    }
}
