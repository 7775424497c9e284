//! Library interface for appinfo-cache
//!
//! Fetches `app_info_print` output from steamcmd, keeps one accepted tree per
//! app id on disk, and invalidates entries (and their DLC) when the cached
//! build falls behind the build a caller asks for.

pub mod appinfo;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod dlc;
pub mod error;
pub mod refresh;
pub mod steamcmd;
pub mod vdf;
pub mod version;

/// Steam application id (games and DLC share one id space)
pub type AppId = u32;

// Re-export commonly used items
pub use appinfo::{AppKind, BuildId, MetadataTree};
pub use cache::CacheStore;
pub use cancel::CancelFlag;
pub use config::Config;
pub use dlc::extract_dlc_ids;
pub use error::{AppInfoError, Result};
pub use refresh::{AppInfoCache, RefreshSettings};
pub use steamcmd::{SteamCmd, ToolRunner};
