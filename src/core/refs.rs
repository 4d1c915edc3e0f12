//! core::refs
//!
//! Durable pointers: the symbolic HEAD and one ref file per branch.
//!
//! # Storage
//!
//! - `HEAD` holds the name of the currently checked-out branch. There
//!   is no detached state; HEAD always names a branch.
//! - `refs/heads/<branch>` holds the hex id of the branch's tip commit,
//!   with `/` in the branch name stored as `_` so tracking branches like
//!   `origin/master` do not introduce subdirectories.

use std::fs;
use std::io;

use thiserror::Error;

use crate::core::paths::RepoPaths;
use crate::core::types::{BranchName, ObjectId};

/// Errors from ref storage.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("corrupt ref: {0}")]
    Corrupt(String),

    #[error("ref store i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Durable pointer storage for one repository.
#[derive(Debug, Clone)]
pub struct RefStore {
    paths: RepoPaths,
}

impl RefStore {
    /// Open the ref store for a repository's paths.
    pub fn new(paths: &RepoPaths) -> Self {
        Self {
            paths: paths.clone(),
        }
    }

    /// The currently checked-out branch.
    pub fn head_branch(&self) -> Result<BranchName, RefError> {
        let raw = fs::read_to_string(self.paths.head_file())?;
        BranchName::new(raw.trim())
            .map_err(|e| RefError::Corrupt(format!("HEAD: {e}")))
    }

    /// Point HEAD at a branch.
    pub fn set_head_branch(&self, name: &BranchName) -> Result<(), RefError> {
        fs::write(self.paths.head_file(), name.as_str())?;
        Ok(())
    }

    /// Read a branch's tip commit id, or `None` if the branch does not
    /// exist.
    pub fn read(&self, name: &BranchName) -> Result<Option<ObjectId>, RefError> {
        let raw = match fs::read_to_string(self.paths.branch_file(name)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id = ObjectId::new(raw.trim())
            .map_err(|e| RefError::Corrupt(format!("branch {name}: {e}")))?;
        Ok(Some(id))
    }

    /// Whether a branch exists.
    pub fn exists(&self, name: &BranchName) -> bool {
        self.paths.branch_file(name).exists()
    }

    /// Point a branch at a commit, creating the ref if needed.
    pub fn write(&self, name: &BranchName, id: &ObjectId) -> Result<(), RefError> {
        fs::create_dir_all(self.paths.heads_dir())?;
        fs::write(self.paths.branch_file(name), id.as_str())?;
        Ok(())
    }

    /// Delete a branch's ref file.
    pub fn delete(&self, name: &BranchName) -> Result<(), RefError> {
        fs::remove_file(self.paths.branch_file(name))?;
        Ok(())
    }

    /// All branch names in their on-disk (encoded) spelling, sorted.
    pub fn list(&self) -> Result<Vec<String>, RefError> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(self.paths.heads_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
