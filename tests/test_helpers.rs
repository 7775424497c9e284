// Test helpers for isolated refresh tests
// Provides a temporary tool directory and a scripted stand-in for steamcmd

#![allow(dead_code)]

use appinfo_cache::{
    AppId, AppInfoCache, CacheStore, CancelFlag, Config, RefreshSettings, Result, ToolRunner,
};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Isolated tool directory, cleaned up on drop
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config::with_tool_dir(temp_dir.path());
        Self { temp_dir, config }
    }

    pub fn cache_root(&self) -> PathBuf {
        self.config.cache_root()
    }

    /// Open a cache over this environment driven by `tool`
    pub fn open(&self, tool: FakeSteamCmd, cancel: CancelFlag) -> AppInfoCache<FakeSteamCmd> {
        self.open_with(tool, cancel, None)
    }

    pub fn open_with(
        &self,
        tool: FakeSteamCmd,
        cancel: CancelFlag,
        max_attempts: Option<u32>,
    ) -> AppInfoCache<FakeSteamCmd> {
        AppInfoCache::open(
            CacheStore::new(self.cache_root()),
            tool,
            cancel,
            RefreshSettings::new(self.config.install_root()).max_attempts(max_attempts),
        )
        .expect("Failed to open cache")
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Every file under `root` with its contents, for byte-for-byte comparisons
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let contents = std::fs::read(e.path()).unwrap();
            (e.path().to_path_buf(), contents)
        })
        .collect()
}

/// Stand-in for steamcmd.
///
/// `+app_update` sessions answer with a fixed success line. `app_info_print`
/// sessions pop the next scripted output; once the script runs dry the last
/// output repeats.
pub struct FakeSteamCmd {
    outputs: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    calls: Mutex<Vec<Vec<String>>>,
    cancel_on_print: Option<(usize, CancelFlag)>,
}

impl FakeSteamCmd {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
            calls: Mutex::new(Vec::new()),
            cancel_on_print: None,
        }
    }

    /// Raise `flag` while answering the `n`th print session (1-based)
    pub fn cancel_on_print(mut self, n: usize, flag: CancelFlag) -> Self {
        self.cancel_on_print = Some((n, flag));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Completed fetches (each fetch ends with one print session)
    pub fn print_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| !is_update(args))
            .count()
    }
}

fn is_update(args: &[String]) -> bool {
    args.iter().any(|a| a == "+app_update")
}

impl ToolRunner for FakeSteamCmd {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        self.calls.lock().unwrap().push(args.to_vec());
        if is_update(args) {
            return Ok("Success! App '4' fully installed.".to_string());
        }

        if let Some((n, flag)) = &self.cancel_on_print
            && self.print_calls() == *n
        {
            flag.cancel();
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.outputs.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// steamcmd-style output wrapping a game tree for `app_id`
pub fn game_output(app_id: AppId, build: u64, dlc: &[AppId]) -> String {
    let list: Vec<String> = dlc.iter().map(|id| id.to_string()).collect();
    format!(
        "Redirecting stderr to 'logs/stderr.txt'\n\
         Loading Steam API...OK\n\
         AppID : {app_id}, change number : 1/0, last change : Thu Jan  1 00:00:00 1970\n\
         \"{app_id}\"\n\
         {{\n\
         \t\"common\"\n\t{{\n\t\t\"name\"\t\t\"Test Game\"\n\t\t\"type\"\t\t\"Game\"\n\t}}\n\
         \t\"extended\"\n\t{{\n\t\t\"listofdlc\"\t\t\"{list}\"\n\t}}\n\
         \t\"depots\"\n\t{{\n\t\t\"branches\"\n\t\t{{\n\t\t\t\"public\"\n\t\t\t{{\n\
         \t\t\t\t\"buildid\"\t\t\"{build}\"\n\t\t\t}}\n\t\t}}\n\t}}\n\
         }}\n\
         Unloading Steam API...OK",
        list = list.join(",")
    )
}

/// Cached-document form of [`game_output`]
pub fn game_document(app_id: AppId, build: u64, dlc: &[AppId]) -> String {
    appinfo_cache::appinfo::locate_document(&game_output(app_id, build, dlc), app_id).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() {
        let root = {
            let env = TestEnvironment::new();
            env.temp_dir.path().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_game_output_is_well_formed() {
        let document = game_document(10, 7, &[11, 12]);
        let tree = appinfo_cache::MetadataTree::parse(&document).unwrap();
        assert_eq!(tree.branch_build_id("public"), Some(7));
        assert_eq!(appinfo_cache::extract_dlc_ids(&tree), vec![11, 12]);
    }
}
