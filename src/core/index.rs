//! core::index
//!
//! The staging index: the mutable pending-change set applied to the
//! next commit.
//!
//! # Invariant
//!
//! A path is never staged for addition and removal at the same time.
//! Staging one side clears the other, and every mutation persists the
//! index immediately; there is no implicit batching.
//!
//! # Storage
//!
//! `.strata/index`, a self-describing versioned JSON record
//! ([`IndexRecordV1`]) parsed strictly.

use std::collections::BTreeMap;
use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::RepoPaths;
use crate::core::types::{ObjectId, RelPath};

/// The kind identifier for the staging index record.
pub const INDEX_KIND: &str = "strata.index";

/// Current index schema version.
pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// Errors from staging index persistence.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("malformed staging index: {0}")]
    Malformed(String),

    #[error("staging index i/o error: {0}")]
    Io(#[from] io::Error),
}

/// On-disk index record, version 1.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexRecordV1 {
    pub kind: String,
    pub schema_version: u32,
    pub additions: BTreeMap<RelPath, ObjectId>,
    pub removals: BTreeMap<RelPath, ObjectId>,
}

/// The staging index for one repository.
///
/// Loaded eagerly and persisted after every mutation.
#[derive(Debug)]
pub struct StagingIndex {
    paths: RepoPaths,
    additions: BTreeMap<RelPath, ObjectId>,
    removals: BTreeMap<RelPath, ObjectId>,
}

impl StagingIndex {
    /// Create an empty index and persist it (used by `init`).
    pub fn create(paths: &RepoPaths) -> Result<Self, IndexError> {
        let index = Self {
            paths: paths.clone(),
            additions: BTreeMap::new(),
            removals: BTreeMap::new(),
        };
        index.save()?;
        Ok(index)
    }

    /// Load the index from disk.
    pub fn load(paths: &RepoPaths) -> Result<Self, IndexError> {
        let data = fs::read_to_string(paths.index_file())?;
        let record: IndexRecordV1 =
            serde_json::from_str(&data).map_err(|e| IndexError::Malformed(e.to_string()))?;
        if record.kind != INDEX_KIND {
            return Err(IndexError::Malformed(format!(
                "unexpected kind '{}'",
                record.kind
            )));
        }
        if record.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::Malformed(format!(
                "unsupported schema version {}",
                record.schema_version
            )));
        }
        Ok(Self {
            paths: paths.clone(),
            additions: record.additions,
            removals: record.removals,
        })
    }

    fn save(&self) -> Result<(), IndexError> {
        let record = IndexRecordV1 {
            kind: INDEX_KIND.to_string(),
            schema_version: INDEX_SCHEMA_VERSION,
            additions: self.additions.clone(),
            removals: self.removals.clone(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| IndexError::Malformed(e.to_string()))?;
        fs::write(self.paths.index_file(), json)?;
        Ok(())
    }

    /// Paths staged for addition, with the blob id to add.
    pub fn additions(&self) -> &BTreeMap<RelPath, ObjectId> {
        &self.additions
    }

    /// Paths staged for removal.
    pub fn removals(&self) -> &BTreeMap<RelPath, ObjectId> {
        &self.removals
    }

    /// Whether both maps are empty. Gates `commit`.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Stage a path for addition, clearing any pending removal of it.
    pub fn stage_addition(&mut self, path: RelPath, blob: ObjectId) -> Result<(), IndexError> {
        self.removals.remove(&path);
        self.additions.insert(path, blob);
        self.save()
    }

    /// Stage a path for removal, clearing any pending addition of it.
    pub fn stage_removal(&mut self, path: RelPath, blob: ObjectId) -> Result<(), IndexError> {
        self.additions.remove(&path);
        self.removals.insert(path, blob);
        self.save()
    }

    /// Drop a pending addition. Returns whether one was present.
    pub fn unstage_addition(&mut self, path: &RelPath) -> Result<bool, IndexError> {
        let removed = self.additions.remove(path).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Drop a pending removal. Returns whether one was present.
    pub fn unstage_removal(&mut self, path: &RelPath) -> Result<bool, IndexError> {
        let removed = self.removals.remove(path).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Clear both maps (after commit, checkout, and reset).
    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.additions.clear();
        self.removals.clear();
        self.save()
    }
}
