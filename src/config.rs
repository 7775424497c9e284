//! Where steamcmd and the metadata cache live.

use std::path::{Path, PathBuf};

/// Tool and cache locations
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory shared by steamcmd and the metadata cache
    pub tool_dir: PathBuf,
    /// steamcmd executable
    pub steamcmd: PathBuf,
}

/// Default tool directory (`$APPINFO_HOME`, else `~/.cache/appinfo` or equivalent)
pub fn default_tool_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("APPINFO_HOME") {
        PathBuf::from(home)
    } else if let Some(cache_home) = std::env::var_os("XDG_CACHE_HOME") {
        PathBuf::from(cache_home).join("appinfo")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".cache/appinfo")
    } else {
        PathBuf::from(".cache/appinfo")
    }
}

fn steamcmd_file_name() -> &'static str {
    if cfg!(windows) {
        "steamcmd.exe"
    } else {
        "steamcmd"
    }
}

/// Client library steamcmd installs on its first self-update
fn client_library_paths(tool_dir: &Path) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![tool_dir.join("steamclient.dll")]
    } else {
        vec![
            tool_dir.join("steamclient.so"),
            tool_dir.join("linux32/steamclient.so"),
            tool_dir.join("linux64/steamclient.so"),
        ]
    }
}

impl Config {
    /// Resolve from `APPINFO_HOME` / `APPINFO_STEAMCMD` and the usual cache dirs
    pub fn from_env() -> Self {
        let mut config = Self::with_tool_dir(default_tool_dir());
        if let Some(path) = std::env::var_os("APPINFO_STEAMCMD") {
            config.steamcmd = PathBuf::from(path);
        }
        config
    }

    pub fn with_tool_dir(tool_dir: impl Into<PathBuf>) -> Self {
        let tool_dir = tool_dir.into();
        let steamcmd = tool_dir.join(steamcmd_file_name());
        Self { tool_dir, steamcmd }
    }

    /// Root of the per-app metadata cache
    pub fn cache_root(&self) -> PathBuf {
        self.tool_dir.join("appinfo")
    }

    /// Scratch install directories used to force an app-info refresh
    pub fn install_root(&self) -> PathBuf {
        self.tool_dir.join("appupdate")
    }

    /// steamcmd's own binary app-info cache
    pub fn tool_appinfo_cache(&self) -> PathBuf {
        self.tool_dir.join("appcache").join("appinfo.vdf")
    }

    /// Whether steamcmd has completed its first-run self-update
    pub fn tool_bootstrapped(&self) -> bool {
        client_library_paths(&self.tool_dir)
            .iter()
            .any(|p| p.exists())
    }
}
