//! repo::worktree
//!
//! Working-directory materialization and inspection: status, the three
//! checkout forms, reset, and branch management.
//!
//! # The untracked-file guard
//!
//! Checkout, reset, and merge all rewrite the working tree from a
//! target commit. Before any write, they fail if a file the target
//! tracks exists on disk without being tracked by the commit currently
//! checked out; silently overwriting work that was never committed is
//! the one data loss this engine refuses to allow.

use std::fs;

use crate::core::object::Commit;
use crate::core::types::{BranchName, ObjectId, RelPath};
use crate::repo::{RepoError, Repository};

/// How an unstaged file differs from its recorded version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModKind {
    Modified,
    Deleted,
}

impl ModKind {
    /// The annotation shown in status output.
    pub fn label(self) -> &'static str {
        match self {
            ModKind::Modified => "modified",
            ModKind::Deleted => "deleted",
        }
    }
}

/// The full `status` report. Formatting lives in the CLI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// On-disk branch names, sorted.
    pub branches: Vec<String>,
    /// The current branch in its on-disk spelling.
    pub current_branch: String,
    /// Paths staged for addition, sorted.
    pub staged: Vec<RelPath>,
    /// Paths staged for removal, sorted.
    pub removed: Vec<RelPath>,
    /// Tracked or staged paths whose working copy differs, sorted.
    pub modifications: Vec<(RelPath, ModKind)>,
    /// On-disk paths that are neither staged nor tracked, sorted.
    pub untracked: Vec<RelPath>,
}

impl Repository {
    /// Compute the status report for this repository.
    pub fn status(&self) -> Result<StatusReport, RepoError> {
        let head = self.head_commit()?;
        let current_branch = self.current_branch()?.file_name();
        let branches = self.refs().list()?;

        let staged: Vec<RelPath> = self.index().additions().keys().cloned().collect();
        let removed: Vec<RelPath> = self.index().removals().keys().cloned().collect();

        let mut modifications = Vec::new();
        // Staged additions whose working copy changed again or vanished.
        for (path, staged_id) in self.index().additions() {
            match self.working_blob_id(path)? {
                None => modifications.push((path.clone(), ModKind::Deleted)),
                Some(on_disk) if &on_disk != staged_id => {
                    modifications.push((path.clone(), ModKind::Modified));
                }
                Some(_) => {}
            }
        }
        // Tracked paths with no staged change of either kind.
        for (path, tracked_id) in &head.files {
            if self.index().additions().contains_key(path)
                || self.index().removals().contains_key(path)
            {
                continue;
            }
            match self.working_blob_id(path)? {
                None => modifications.push((path.clone(), ModKind::Deleted)),
                Some(on_disk) if &on_disk != tracked_id => {
                    modifications.push((path.clone(), ModKind::Modified));
                }
                Some(_) => {}
            }
        }
        modifications.sort_by(|a, b| a.0.cmp(&b.0));

        let mut untracked = Vec::new();
        for path in self.working_files()? {
            if !self.index().additions().contains_key(&path)
                && !self.index().removals().contains_key(&path)
                && !head.files.contains_key(&path)
            {
                untracked.push(path);
            }
        }
        untracked.sort();

        Ok(StatusReport {
            branches,
            current_branch,
            staged,
            removed,
            modifications,
            untracked,
        })
    }

    /// Restore one file from the head commit.
    pub fn checkout_file(&self, path: &str) -> Result<(), RepoError> {
        let head = self.head_commit()?;
        self.restore_file(&head, path)
    }

    /// Restore one file from an arbitrary commit.
    pub fn checkout_commit_file(&self, id_prefix: &str, path: &str) -> Result<(), RepoError> {
        let (_, commit) = self.resolve_commit(id_prefix)?;
        self.restore_file(&commit, path)
    }

    fn restore_file(&self, commit: &Commit, path: &str) -> Result<(), RepoError> {
        let rel = RelPath::new(path).map_err(|_| RepoError::FileNotInCommit)?;
        let blob_id = commit
            .files
            .get(&rel)
            .ok_or(RepoError::FileNotInCommit)?;
        self.write_blob_to_worktree(blob_id)?;
        Ok(())
    }

    /// Check out a branch: materialize its tip and move HEAD.
    ///
    /// # Errors
    ///
    /// [`RepoError::NoSuchBranchCheckout`], [`RepoError::CurrentBranchCheckout`],
    /// or [`RepoError::UntrackedInTheWay`].
    pub fn checkout_branch(&mut self, name: &str) -> Result<(), RepoError> {
        let target = BranchName::new(name).map_err(|_| RepoError::NoSuchBranchCheckout)?;
        let tip = match self.refs().read(&target)? {
            Some(tip) => tip,
            None => return Err(RepoError::NoSuchBranchCheckout),
        };
        if self.current_branch()?.file_name() == target.file_name() {
            return Err(RepoError::CurrentBranchCheckout);
        }

        let commit = self.objects().get_commit(&tip)?;
        self.guard_untracked(&commit)?;
        self.materialize(&commit)?;
        self.refs().set_head_branch(&target)?;
        self.index_mut().clear()?;
        Ok(())
    }

    /// Move the current branch to a commit and materialize its tree.
    ///
    /// Same transplant as a branch checkout, but HEAD keeps naming the
    /// current branch; the branch ref itself moves.
    pub fn reset(&mut self, id_prefix: &str) -> Result<(), RepoError> {
        let (id, commit) = self.resolve_commit(id_prefix)?;
        self.guard_untracked(&commit)?;
        self.materialize(&commit)?;
        let branch = self.current_branch()?;
        self.refs().write(&branch, &id)?;
        self.index_mut().clear()?;
        Ok(())
    }

    /// Create a branch pointing at the current commit.
    pub fn create_branch(&self, name: &str) -> Result<(), RepoError> {
        let branch = BranchName::new(name).map_err(|_| RepoError::InvalidBranchName)?;
        if self.refs().exists(&branch) {
            return Err(RepoError::BranchExists);
        }
        let id = self.current_commit_id()?;
        self.refs().write(&branch, &id)?;
        Ok(())
    }

    /// Delete a branch's ref (its commits stay in the store).
    pub fn remove_branch(&self, name: &str) -> Result<(), RepoError> {
        let branch = BranchName::new(name).map_err(|_| RepoError::NoSuchBranch)?;
        if !self.refs().exists(&branch) {
            return Err(RepoError::NoSuchBranch);
        }
        if self.current_branch()?.file_name() == branch.file_name() {
            return Err(RepoError::CurrentBranchRemove);
        }
        self.refs().delete(&branch)?;
        Ok(())
    }

    /// Fail if materializing `target` would overwrite an untracked file.
    pub(crate) fn guard_untracked(&self, target: &Commit) -> Result<(), RepoError> {
        let head = self.head_commit()?;
        for path in target.files.keys() {
            if path.resolve(self.root()).is_file() && !head.files.contains_key(path) {
                return Err(RepoError::UntrackedInTheWay);
            }
        }
        Ok(())
    }

    /// Rewrite the working tree to match `target`'s snapshot.
    ///
    /// Writes every blob the target tracks and deletes every file the
    /// current head tracks that the target does not. Run the untracked
    /// guard first.
    pub(crate) fn materialize(&self, target: &Commit) -> Result<(), RepoError> {
        for blob_id in target.files.values() {
            self.write_blob_to_worktree(blob_id)?;
        }
        let head = self.head_commit()?;
        for path in head.files.keys() {
            if !target.files.contains_key(path) {
                let file = path.resolve(self.root());
                if file.exists() {
                    fs::remove_file(file)?;
                }
            }
        }
        Ok(())
    }

    /// Write one stored blob back to its working-tree location.
    pub(crate) fn write_blob_to_worktree(&self, blob_id: &ObjectId) -> Result<(), RepoError> {
        let blob = self.objects().get_blob(blob_id)?;
        let file = blob.path.resolve(self.root());
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, &blob.content)?;
        Ok(())
    }

    /// Hash a working file the way `add` would, without storing it.
    fn working_blob_id(&self, path: &RelPath) -> Result<Option<ObjectId>, RepoError> {
        let file = path.resolve(self.root());
        if !file.is_file() {
            return Ok(None);
        }
        let blob = crate::core::object::Blob::new(path.clone(), fs::read(file)?);
        Ok(Some(blob.id()))
    }

    /// Every file under the working tree, as repo-relative paths.
    ///
    /// Skips the `.strata` directory.
    fn working_files(&self) -> Result<Vec<RelPath>, RepoError> {
        let mut found = Vec::new();
        let mut stack = vec![self.root().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if path == self.paths().strata_dir() {
                    continue;
                }
                if entry.file_type()?.is_dir() {
                    stack.push(path);
                } else if let Ok(stripped) = path.strip_prefix(self.root()) {
                    if let Ok(rel) = RelPath::new(stripped.to_string_lossy()) {
                        found.push(rel);
                    }
                }
            }
        }
        Ok(found)
    }
}
