//! DLC ids referenced by an app's metadata.
//!
//! Two places in app info name DLC:
//! - `extended/listofdlc`, a comma separated list of app ids
//! - `depots/<depot id>/dlcappid`, for depots that ship DLC content
//!
//! Both are merged in first-seen order without duplicates. An id that does not
//! parse is skipped on its own; the rest of the tree is still trusted.

use crate::AppId;
use crate::appinfo::MetadataTree;
use crate::vdf::Value;
use std::collections::HashSet;

/// Ordered, de-duplicated DLC ids for `tree`
pub fn extract_dlc_ids(tree: &MetadataTree) -> Vec<AppId> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |id: AppId| {
        if seen.insert(id) {
            ids.push(id);
        }
    };

    if let Some(list) = tree.get_path(&["extended", "listofdlc"]).and_then(Value::as_str) {
        for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match raw.parse() {
                Ok(id) => push(id),
                Err(_) => tracing::debug!(raw, "skipping malformed listofdlc entry"),
            }
        }
    }

    if let Some(depots) = tree.get("depots") {
        for depot in depots.children() {
            if depot.key.parse::<u64>().is_err() {
                continue;
            }
            let Some(raw) = depot.value.get("dlcappid").and_then(Value::as_str) else {
                continue;
            };
            match raw.trim().parse() {
                Ok(id) => push(id),
                Err(_) => tracing::debug!(depot = %depot.key, raw, "skipping malformed dlcappid"),
            }
        }
    }

    ids
}
