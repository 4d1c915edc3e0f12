//! core::object
//!
//! The object model: immutable [`Blob`] and [`Commit`] records.
//!
//! # Content Addressing
//!
//! Every object is identified by a SHA-256 digest of a canonical byte
//! rendering of its fields. The rendering is domain-separated (blobs and
//! commits can never collide) and uses NUL delimiters plus a sorted file
//! map, so the same logical record always hashes to the same id on any
//! platform.
//!
//! # Immutability
//!
//! Objects are created by `add`, `commit`, and `merge`, and are never
//! mutated or deleted afterwards. The store relies on this: writing an
//! object whose id already exists is a no-op.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::core::types::{ObjectId, RelPath};

/// Display format for commit timestamps.
///
/// Timestamps are informational only; ordering never depends on them.
pub const TIMESTAMP_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// The message carried by every repository's root commit.
pub const INITIAL_COMMIT_MESSAGE: &str = "initial commit";

/// The fixed timestamp of every repository's root commit (the epoch).
///
/// Root commits carry no real creation time on purpose: with message,
/// parents, tree, and timestamp all fixed, every repository's root
/// commit hashes to the same id. Two repositories therefore always
/// share at least one ancestor, which is what lets fetch-then-merge
/// find a split point across repository boundaries.
pub const INITIAL_COMMIT_TIMESTAMP: &str = "Thu Jan 1 00:00:00 1970 +0000";

/// Discriminates the two stored object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Commit,
}

impl ObjectKind {
    /// Human-readable kind name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Commit => "commit",
        }
    }
}

/// An immutable snapshot of one file's bytes at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// The repository-relative path the file had when captured.
    pub path: RelPath,
    /// The raw file bytes.
    pub content: Vec<u8>,
}

impl Blob {
    /// Capture a blob from a path and its content.
    pub fn new(path: RelPath, content: Vec<u8>) -> Self {
        Self { path, content }
    }

    /// The content-addressed id: `SHA-256("strata-blob" ‖ path ‖ NUL ‖ content)`.
    ///
    /// Identical (path, content) pairs always produce the same id, which
    /// is what deduplicates repeated adds of an unchanged file.
    pub fn id(&self) -> ObjectId {
        let mut hasher = Sha256::new();
        hasher.update(b"strata-blob\0");
        hasher.update(self.path.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.content);
        ObjectId::from_digest(hasher.finalize().into())
    }
}

/// An immutable commit DAG node.
///
/// The file map is a complete snapshot (every tracked path at that point
/// in history), not a diff: it is inherited from the first parent and
/// overlaid with staged changes at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The commit message.
    pub message: String,
    /// Formatted creation time; display only.
    pub timestamp: String,
    /// Parent ids: empty for the root, one ordinarily, two for merges.
    pub parents: Vec<ObjectId>,
    /// Complete path -> blob id snapshot.
    pub files: BTreeMap<RelPath, ObjectId>,
}

impl Commit {
    /// Create a commit stamped with the current local time.
    pub fn new(
        message: impl Into<String>,
        parents: Vec<ObjectId>,
        files: BTreeMap<RelPath, ObjectId>,
    ) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            parents,
            files,
        }
    }

    /// The root commit every repository starts from.
    ///
    /// Fully deterministic, so it hashes identically everywhere.
    pub fn initial() -> Self {
        Self {
            message: INITIAL_COMMIT_MESSAGE.into(),
            timestamp: INITIAL_COMMIT_TIMESTAMP.into(),
            parents: Vec::new(),
            files: BTreeMap::new(),
        }
    }

    /// The content-addressed id, covering message, timestamp, parent
    /// list, and the sorted file map.
    pub fn id(&self) -> ObjectId {
        let mut hasher = Sha256::new();
        hasher.update(b"strata-commit\0");
        hasher.update(self.message.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.timestamp.as_bytes());
        hasher.update([0u8]);
        for parent in &self.parents {
            hasher.update(parent.as_str().as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([0u8]);
        for (path, blob) in &self.files {
            hasher.update(path.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(blob.as_str().as_bytes());
            hasher.update([0u8]);
        }
        ObjectId::from_digest(hasher.finalize().into())
    }

    /// First parent, if any. Log traversal follows only this edge.
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    /// Whether this is a two-parent merge commit.
    pub fn is_merge(&self) -> bool {
        self.parents.len() == 2
    }
}

/// A stored object of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Commit(Commit),
}

impl Object {
    /// The object's kind tag.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Commit(_) => ObjectKind::Commit,
        }
    }

    /// The object's content-addressed id.
    pub fn id(&self) -> ObjectId {
        match self {
            Object::Blob(blob) => blob.id(),
            Object::Commit(commit) => commit.id(),
        }
    }
}
