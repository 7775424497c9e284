//! Typed view over a parsed `app_info_print` tree.
//!
//! steamcmd prints the tree body somewhere in the middle of its log output.
//! [`locate_document`] cuts the body out and keys it by app id; the result is
//! the *document* that gets cached. [`MetadataTree`] is what callers work
//! with: either [`MetadataTree::Empty`] (steamcmd has not populated the app
//! yet) or the ordered children of the app's root node.

use crate::AppId;
use crate::vdf::{self, ParseError, Property, Value};
use serde::{Serialize, Serializer};

/// Build number of a branch (`depots/branches/<branch>/buildid`)
pub type BuildId = u64;

/// Parsed app info. A scalar root or a root with no children is `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataTree {
    Empty,
    Tree(Vec<Property>),
}

/// How the refresh logic treats a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    /// Nothing populated yet
    Missing,
    /// `common/type` is present and is not "Game" (DLC, tools, demos...)
    NonGame,
    /// Everything else, including trees with no `common/type`
    Game,
}

impl MetadataTree {
    /// Parse a cached document (`"<id>" { ... }`)
    pub fn parse(document: &str) -> Result<Self, ParseError> {
        vdf::parse(document).map(Self::from)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MetadataTree::Empty)
    }

    pub fn children(&self) -> &[Property] {
        match self {
            MetadataTree::Tree(children) => children,
            MetadataTree::Empty => &[],
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        vdf::find(self.children(), key)
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.get(first)?.get_path(rest)
    }

    fn scalar(&self, path: &[&str]) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// `common/type`
    pub fn app_type(&self) -> Option<&str> {
        self.scalar(&["common", "type"])
    }

    /// `common/name`
    pub fn name(&self) -> Option<&str> {
        self.scalar(&["common", "name"])
    }

    pub fn kind(&self) -> AppKind {
        if self.is_empty() {
            return AppKind::Missing;
        }
        match self.app_type() {
            // Exact literal; lowercase "game" is not treated as a catalog game
            Some(t) if t != "Game" => AppKind::NonGame,
            _ => AppKind::Game,
        }
    }

    /// Build id published for `branch`. `None` when the branch or its build id
    /// is absent; a build id that is not an unsigned integer counts as absent.
    pub fn branch_build_id(&self, branch: &str) -> Option<BuildId> {
        let raw = self.scalar(&["depots", "branches", branch, "buildid"])?;
        match raw.trim().parse() {
            Ok(build) => Some(build),
            Err(_) => {
                tracing::debug!(branch, raw, "ignoring non-numeric buildid");
                None
            }
        }
    }
}

impl From<Property> for MetadataTree {
    fn from(root: Property) -> Self {
        match root.value {
            Value::Tree(children) if !children.is_empty() => MetadataTree::Tree(children),
            _ => MetadataTree::Empty,
        }
    }
}

impl Serialize for MetadataTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataTree::Empty => serializer.serialize_none(),
            MetadataTree::Tree(children) => vdf::serialize_children(children, serializer),
        }
    }
}

/// Cut the tree body out of raw steamcmd output and key it by `app_id`.
///
/// The body spans the first `{` to the last `}`. steamcmd normally prints the
/// quoted id just before that first brace, so it is re-attached in front of
/// the span. When the span itself already opens with the quoted id, the
/// outer brace is only framing and is dropped instead.
pub fn locate_document(raw: &str, app_id: AppId) -> Result<String, ParseError> {
    let open = raw.find('{').ok_or(ParseError::MissingBody)?;
    let close = raw.rfind('}').ok_or(ParseError::MissingBody)?;
    if close < open {
        return Err(ParseError::MissingBody);
    }

    let span = &raw[open..=close];
    let key = format!("\"{}\"", app_id);
    let inner = &span[1..];
    if inner.trim_start().starts_with(&key) {
        Ok(inner.trim_start().to_string())
    } else {
        Ok(format!("{}\n{}", key, span))
    }
}
