//! On-disk store for accepted app info documents.
//!
//! Layout under the cache root:
//! ```text
//! <root>/
//!   version.txt          # cache format stamp (see crate::version)
//!   440/appinfo.txt      # last accepted document for app 440
//!   570/appinfo.txt
//! ```
//!
//! Every path is the root joined with a numeric id, so nothing can resolve
//! outside the root. Writes go to a temp file first and are renamed into
//! place: an entry is either complete or absent.

use crate::AppId;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

const ENTRY_FILE: &str = "appinfo.txt";
const TEMP_SUFFIX: &str = ".tmp";
pub const VERSION_FILE: &str = "version.txt";

/// A cached id as reported by [`CacheStore::entries`]
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub app_id: AppId,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage subtree for one id
    pub fn entry_dir(&self, app_id: AppId) -> PathBuf {
        self.root.join(app_id.to_string())
    }

    fn entry_path(&self, app_id: AppId) -> PathBuf {
        self.entry_dir(app_id).join(ENTRY_FILE)
    }

    pub fn exists(&self, app_id: AppId) -> bool {
        self.entry_path(app_id).is_file()
    }

    pub fn read(&self, app_id: AppId) -> Result<String> {
        Ok(fs::read_to_string(self.entry_path(app_id))?)
    }

    /// Persist a fully validated document
    pub fn write(&self, app_id: AppId, document: &str) -> Result<()> {
        let dir = self.entry_dir(app_id);
        fs::create_dir_all(&dir)?;

        let target = dir.join(ENTRY_FILE);
        let temp = dir.join(format!("{ENTRY_FILE}{TEMP_SUFFIX}"));
        fs::write(&temp, document)?;
        fs::rename(&temp, &target)?;

        debug!(app_id, bytes = document.len(), "cache entry written");
        Ok(())
    }

    /// Remove the id's whole storage subtree. Returns whether anything was there.
    pub fn delete(&self, app_id: AppId) -> Result<bool> {
        let dir = self.entry_dir(app_id);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!(app_id, "cache entry deleted");
        Ok(true)
    }

    /// Delete a batch of ids; returns how many entries actually existed
    pub fn delete_many(&self, app_ids: &[AppId]) -> Result<usize> {
        let mut removed = 0;
        for &app_id in app_ids {
            if self.delete(app_id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Wipe the whole root (entries and stamp) and recreate it empty
    pub fn purge_all(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        info!(root = %self.root.display(), "metadata cache purged");
        Ok(())
    }

    /// Raw stamp text, `None` if the file is missing or unreadable
    pub fn read_stamp(&self) -> Option<String> {
        fs::read_to_string(self.root.join(VERSION_FILE)).ok()
    }

    pub fn write_stamp(&self, version: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(VERSION_FILE), version)?;
        Ok(())
    }

    /// Ids with a complete entry, sorted ascending
    pub fn entries(&self) -> Result<Vec<CachedEntry>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Ok(app_id) = entry.file_name().to_string_lossy().parse::<AppId>() else {
                continue;
            };
            let path = self.entry_path(app_id);
            if !path.is_file() {
                continue;
            }

            let size = WalkDir::new(entry.path())
                .into_iter()
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum();
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();

            entries.push(CachedEntry {
                app_id,
                size,
                modified,
            });
        }

        entries.sort_by_key(|e| e.app_id);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_read_delete() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path().join("appinfo"));

        assert!(!store.exists(440));
        store.write(440, "\"440\" { }").unwrap();
        assert!(store.exists(440));
        assert_eq!(store.read(440).unwrap(), "\"440\" { }");

        assert!(store.delete(440).unwrap());
        assert!(!store.exists(440));
        assert!(!store.entry_dir(440).exists());
        assert!(!store.delete(440).unwrap());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path());
        store.write(1, "a").unwrap();
        store.write(1, "b").unwrap();

        let names: Vec<_> = fs::read_dir(store.entry_dir(1))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec![ENTRY_FILE.to_string()]);
        assert_eq!(store.read(1).unwrap(), "b");
    }

    #[test]
    fn test_directory_without_entry_file_is_not_cached() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path());
        fs::create_dir_all(store.entry_dir(7)).unwrap();
        assert!(!store.exists(7));
        assert!(store.entries().unwrap().is_empty());
        // The leftover directory still gets cleaned up
        assert!(store.delete(7).unwrap());
    }

    #[test]
    fn test_delete_many_counts_existing() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path());
        store.write(1, "x").unwrap();
        store.write(3, "x").unwrap();
        assert_eq!(store.delete_many(&[1, 2, 3]).unwrap(), 2);
        assert!(!store.exists(1));
        assert!(!store.exists(3));
    }

    #[test]
    fn test_purge_all_resets_root() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path().join("appinfo"));
        store.write(1, "x").unwrap();
        store.write_stamp("0.1.0").unwrap();

        store.purge_all().unwrap();
        assert!(store.root().exists());
        assert!(!store.exists(1));
        assert!(store.read_stamp().is_none());
    }

    #[test]
    fn test_entries_sorted_and_sized() {
        let temp = tempdir().unwrap();
        let store = CacheStore::new(temp.path());
        store.write(20, "abcd").unwrap();
        store.write(3, "ab").unwrap();
        store.write_stamp("0.1.0").unwrap();

        let entries = store.entries().unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.app_id).collect();
        assert_eq!(ids, vec![3, 20]);
        assert_eq!(entries[0].size, 2);
        assert_eq!(entries[1].size, 4);
        assert!(entries[0].modified.is_some());
    }
}
