//! core::paths
//!
//! Centralized path routing for the `.strata` storage layout.
//!
//! # Storage Layout
//!
//! All repository data is stored under `<root>/.strata/`:
//!
//! ```text
//! .strata/
//!   objects/<first-3-hex>/<remaining-hex>   # one file per stored object
//!   refs/heads/<branch>                     # content = commit id hex
//!   HEAD                                    # content = current branch name
//!   index                                   # staging index (versioned JSON)
//!   remote                                  # remote registrations (versioned JSON)
//!   lock                                    # exclusive lock file
//!   config.toml                             # optional per-repo configuration
//! ```
//!
//! **Hard rule:** no code outside this module computes `.strata` paths by
//! hand. Remote sync opens a second `RepoPaths` rooted at the remote's
//! directory, so nothing below this layer may assume a single fixed root.
//!
//! # Example
//!
//! ```
//! use strata::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/work/repo"));
//! assert_eq!(paths.head_file(), PathBuf::from("/work/repo/.strata/HEAD"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::{BranchName, ObjectId};

/// Name of the repository data directory.
pub const STRATA_DIR: &str = ".strata";

/// Centralized path routing for one repository root.
///
/// This is a plain value; remote sync constructs one per side rather
/// than relying on any process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// The working-directory root containing `.strata`.
    root: PathBuf,
}

impl RepoPaths {
    /// Create path routing for a repository rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The working-directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.strata` data directory.
    pub fn strata_dir(&self) -> PathBuf {
        self.root.join(STRATA_DIR)
    }

    /// Whether a repository exists at this root.
    pub fn is_initialized(&self) -> bool {
        self.strata_dir().is_dir()
    }

    /// The object storage directory.
    pub fn objects_dir(&self) -> PathBuf {
        self.strata_dir().join("objects")
    }

    /// The shard directory for a given object id.
    pub fn object_shard(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir().join(id.shard())
    }

    /// The file holding a given object.
    pub fn object_file(&self, id: &ObjectId) -> PathBuf {
        self.object_shard(id).join(id.rest())
    }

    /// The branch heads directory.
    pub fn heads_dir(&self) -> PathBuf {
        self.strata_dir().join("refs").join("heads")
    }

    /// The ref file for a branch (`/` in the name encoded as `_`).
    pub fn branch_file(&self, name: &BranchName) -> PathBuf {
        self.heads_dir().join(name.file_name())
    }

    /// The HEAD file naming the current branch.
    pub fn head_file(&self) -> PathBuf {
        self.strata_dir().join("HEAD")
    }

    /// The staging index file.
    pub fn index_file(&self) -> PathBuf {
        self.strata_dir().join("index")
    }

    /// The remote registration file.
    pub fn remote_file(&self) -> PathBuf {
        self.strata_dir().join("remote")
    }

    /// The repository lock file.
    pub fn lock_file(&self) -> PathBuf {
        self.strata_dir().join("lock")
    }

    /// The optional per-repository config file.
    pub fn config_file(&self) -> PathBuf {
        self.strata_dir().join("config.toml")
    }
}
