//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - Content hash of a stored object (SHA-256, hex)
//! - [`BranchName`] - Validated branch name
//! - [`RelPath`] - Repository-root-relative file path
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs. In
//! particular, commits key their file maps by [`RelPath`], never by
//! absolute working-directory paths, so commit records are portable
//! between repositories.
//!
//! # Examples
//!
//! ```
//! use strata::core::types::{BranchName, ObjectId, RelPath};
//!
//! let branch = BranchName::new("feature/one").unwrap();
//! assert_eq!(branch.file_name(), "feature_one");
//!
//! let path = RelPath::new("src/main.rs").unwrap();
//! assert_eq!(path.as_str(), "src/main.rs");
//!
//! assert!(ObjectId::new("not-a-hash").is_err());
//! assert!(RelPath::new("../escape").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Number of hex characters in an [`ObjectId`].
pub const ID_HEX_LEN: usize = 64;

/// Number of leading hex characters used as the object shard directory.
pub const ID_SHARD_LEN: usize = 3;

/// A content hash identifying a stored object.
///
/// Ids are 64 lowercase hex characters (SHA-256). Two objects with
/// identical content always collide to the same id; that collision is
/// what makes repeated stores harmless no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a validated object id from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` unless the input is exactly
    /// 64 lowercase hex characters.
    pub fn new(hex: impl Into<String>) -> Result<Self, TypeError> {
        let hex = hex.into();
        if hex.len() != ID_HEX_LEN {
            return Err(TypeError::InvalidObjectId(format!(
                "expected {ID_HEX_LEN} hex chars, got {}",
                hex.len()
            )));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(TypeError::InvalidObjectId(
                "id must be lowercase hex".into(),
            ));
        }
        Ok(Self(hex))
    }

    /// Construct an id from a raw SHA-256 digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Get the id as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The shard directory component: the first three hex characters.
    pub fn shard(&self) -> &str {
        &self.0[..ID_SHARD_LEN]
    }

    /// The object file name within its shard: the remaining hex characters.
    pub fn rest(&self) -> &str {
        &self.0[ID_SHARD_LEN..]
    }

    /// An abbreviated form for display.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> String {
        id.0
    }
}

/// A validated branch name.
///
/// Branch names:
/// - Cannot be empty
/// - Cannot start with `-` or `.`
/// - Cannot contain whitespace, control characters, or `..`
/// - May contain `/`; on disk the separator is stored as `_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates the
    /// rules above.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name.starts_with('-') || name.starts_with('.') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-' or '.'".into(),
            ));
        }
        if name.contains("..") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '..'".into(),
            ));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain whitespace or control characters".into(),
            ));
        }
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start or end with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The on-disk ref file name, with `/` encoded as `_`.
    ///
    /// Remote tracking branches created by fetch (`origin/master`) land
    /// next to ordinary branches under `refs/heads/`, so the separator
    /// must not introduce subdirectories.
    pub fn file_name(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> String {
        name.0
    }
}

/// A repository-root-relative file path.
///
/// Paths use `/` separators, are never empty, never absolute, and never
/// contain `.` or `..` components. Blob and commit records carry these,
/// which keeps them valid when a commit is transplanted into a different
/// working directory by fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// Create a new validated relative path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` for empty, absolute, or
    /// traversing paths.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        // Accept platform separators from user input, store normalized.
        let path = path.replace('\\', "/");
        if path.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }
        if path.starts_with('/') {
            return Err(TypeError::InvalidPath(format!(
                "path must be relative to the repository root: {path}"
            )));
        }
        for component in path.split('/') {
            if component.is_empty() {
                return Err(TypeError::InvalidPath(format!(
                    "path cannot contain empty components: {path}"
                )));
            }
            if component == "." || component == ".." {
                return Err(TypeError::InvalidPath(format!(
                    "path cannot contain '.' or '..' components: {path}"
                )));
            }
        }
        Ok(Self(path))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path component, for display in status listings.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve against a working-directory root.
    pub fn resolve(&self, root: &std::path::Path) -> std::path::PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RelPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> String {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_accepts_sha256_hex() {
        let hex = "a".repeat(64);
        let id = ObjectId::new(hex.clone()).unwrap();
        assert_eq!(id.as_str(), hex);
        assert_eq!(id.shard(), "aaa");
        assert_eq!(id.rest().len(), 61);
    }

    #[test]
    fn object_id_rejects_bad_input() {
        assert!(ObjectId::new("abc").is_err());
        assert!(ObjectId::new("G".repeat(64)).is_err());
        assert!(ObjectId::new("A".repeat(64)).is_err());
    }

    #[test]
    fn branch_name_rules() {
        assert!(BranchName::new("master").is_ok());
        assert!(BranchName::new("feature/one").is_ok());
        assert!(BranchName::new("").is_err());
        assert!(BranchName::new("-flag").is_err());
        assert!(BranchName::new("a..b").is_err());
        assert!(BranchName::new("has space").is_err());
    }

    #[test]
    fn branch_file_name_encodes_slash() {
        let name = BranchName::new("origin/master").unwrap();
        assert_eq!(name.file_name(), "origin_master");
    }

    #[test]
    fn rel_path_rules() {
        assert!(RelPath::new("a.txt").is_ok());
        assert!(RelPath::new("dir/a.txt").is_ok());
        assert!(RelPath::new("/abs").is_err());
        assert!(RelPath::new("../up").is_err());
        assert!(RelPath::new("a//b").is_err());
        assert!(RelPath::new("").is_err());
    }

    #[test]
    fn rel_path_normalizes_backslashes() {
        let p = RelPath::new("dir\\a.txt").unwrap();
        assert_eq!(p.as_str(), "dir/a.txt");
        assert_eq!(p.file_name(), "a.txt");
    }
}
