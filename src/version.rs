//! Cache format compatibility gate.
//!
//! The cache root carries a `version.txt` stamp naming the release that wrote
//! it. Before any entry is trusted the stamp is checked; a missing, garbled or
//! too-old stamp wipes the whole metadata cache and restamps it with the
//! running version.

use crate::cache::CacheStore;
use crate::error::Result;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Oldest stamp whose documents this build can still read
pub const MIN_COMPATIBLE_VERSION: &str = "0.1.0";

/// Dotted numeric version (`2.0.2.0`, `0.1.0`); missing parts compare as zero
#[derive(Debug, Clone, Eq)]
pub struct CacheVersion(Vec<u32>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version: {0:?}")]
pub struct InvalidVersion(pub String);

impl FromStr for CacheVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Pre-release and build metadata don't affect the format
        let core = trimmed.split(['-', '+']).next().unwrap_or_default();
        let parts = core
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| InvalidVersion(s.to_string()))?;

        if parts.is_empty() || parts.len() > 4 {
            return Err(InvalidVersion(s.to_string()));
        }
        Ok(Self(parts))
    }
}

impl Ord for CacheVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in 0..self.0.len().max(other.0.len()) {
            let a = self.0.get(i).unwrap_or(&0);
            let b = other.0.get(i).unwrap_or(&0);
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for CacheVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CacheVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Version stamped into caches written by this build
pub fn current_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Result of [`ensure_compatible`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Stamp is recent enough; the cache was left alone
    Compatible(CacheVersion),
    /// Cache was wiped; `found` is the raw stamp that was rejected, if any
    Purged { found: Option<String> },
}

fn is_compatible(stamp: Option<&str>) -> Option<CacheVersion> {
    let found: CacheVersion = stamp?.parse().ok()?;
    let minimum: CacheVersion = MIN_COMPATIBLE_VERSION.parse().ok()?;
    (found >= minimum).then_some(found)
}

/// Check the stamp and purge + restamp the cache when it can't be trusted
pub fn ensure_compatible(store: &CacheStore) -> Result<GateOutcome> {
    let stamp = store.read_stamp();
    if let Some(version) = is_compatible(stamp.as_deref()) {
        return Ok(GateOutcome::Compatible(version));
    }

    info!(
        found = stamp.as_deref().unwrap_or("<none>"),
        minimum = MIN_COMPATIBLE_VERSION,
        "metadata cache format incompatible, purging"
    );
    store.purge_all()?;
    store.write_stamp(current_version())?;

    Ok(GateOutcome::Purged { found: stamp })
}
