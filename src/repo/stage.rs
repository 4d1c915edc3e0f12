//! repo::stage
//!
//! The `add` and `rm` staging operations.

use std::fs;

use crate::core::object::{Blob, Object};
use crate::core::types::RelPath;
use crate::repo::{RepoError, Repository};

impl Repository {
    /// Stage a working file for addition.
    ///
    /// The file is captured as a blob immediately (so later edits do
    /// not change what was staged) and compared against the head
    /// commit's entry for the path: re-adding an unchanged file clears
    /// any pending add or removal instead of staging anything.
    ///
    /// # Errors
    ///
    /// [`RepoError::FileNotFound`] if the working file does not exist.
    pub fn add(&mut self, path: &str) -> Result<(), RepoError> {
        let rel = RelPath::new(path).map_err(|_| RepoError::FileNotFound)?;
        let file = rel.resolve(self.root());
        if !file.is_file() {
            return Err(RepoError::FileNotFound);
        }

        let blob = Blob::new(rel.clone(), fs::read(&file)?);
        let blob_id = self.objects().put(&Object::Blob(blob))?;

        let head = self.head_commit()?;
        if head.files.get(&rel) == Some(&blob_id) {
            // Unchanged since the head commit: adding is a no-op that
            // also cancels any pending staged change for the path.
            self.index_mut().unstage_addition(&rel)?;
            self.index_mut().unstage_removal(&rel)?;
        } else {
            self.index_mut().stage_addition(rel, blob_id)?;
        }
        Ok(())
    }

    /// Unstage a pending addition, or stage a tracked file for removal.
    ///
    /// Staging a removal also deletes the working file.
    ///
    /// # Errors
    ///
    /// [`RepoError::NothingToRemove`] if the path is neither staged for
    /// addition nor tracked by the head commit.
    pub fn remove(&mut self, path: &str) -> Result<(), RepoError> {
        let rel = RelPath::new(path).map_err(|_| RepoError::NothingToRemove)?;

        if self.index_mut().unstage_addition(&rel)? {
            return Ok(());
        }

        let head = self.head_commit()?;
        match head.files.get(&rel) {
            Some(blob_id) => {
                let blob_id = blob_id.clone();
                self.index_mut().stage_removal(rel.clone(), blob_id)?;
                let file = rel.resolve(self.root());
                if file.exists() {
                    fs::remove_file(file)?;
                }
                Ok(())
            }
            None => Err(RepoError::NothingToRemove),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repository;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path(), None).unwrap();
        (dir, repo)
    }

    fn write(repo: &Repository, path: &str, content: &str) {
        fs::write(repo.root().join(path), content).unwrap();
    }

    #[test]
    fn add_stages_a_new_file() {
        let (_dir, mut repo) = repo();
        write(&repo, "a.txt", "hello");
        repo.add("a.txt").unwrap();
        let rel = RelPath::new("a.txt").unwrap();
        assert!(repo.index().additions().contains_key(&rel));
    }

    #[test]
    fn add_missing_file_fails() {
        let (_dir, mut repo) = repo();
        assert!(matches!(repo.add("ghost.txt"), Err(RepoError::FileNotFound)));
    }

    #[test]
    fn re_adding_unchanged_file_is_a_no_op() {
        let (_dir, mut repo) = repo();
        write(&repo, "a.txt", "hello");
        repo.add("a.txt").unwrap();
        repo.commit("first", None).unwrap();

        repo.add("a.txt").unwrap();
        assert!(repo.index().is_empty());
    }

    #[test]
    fn rm_before_commit_unstages() {
        let (_dir, mut repo) = repo();
        write(&repo, "x.txt", "x");
        repo.add("x.txt").unwrap();
        repo.remove("x.txt").unwrap();
        assert!(repo.index().is_empty());
        // Unstaging does not delete the working file.
        assert!(repo.root().join("x.txt").exists());
    }

    #[test]
    fn rm_tracked_file_stages_removal_and_deletes() {
        let (_dir, mut repo) = repo();
        write(&repo, "a.txt", "hello");
        repo.add("a.txt").unwrap();
        repo.commit("first", None).unwrap();

        repo.remove("a.txt").unwrap();
        let rel = RelPath::new("a.txt").unwrap();
        assert!(repo.index().removals().contains_key(&rel));
        assert!(!repo.root().join("a.txt").exists());
    }

    #[test]
    fn rm_untracked_file_fails() {
        let (_dir, mut repo) = repo();
        write(&repo, "a.txt", "hello");
        assert!(matches!(
            repo.remove("a.txt"),
            Err(RepoError::NothingToRemove)
        ));
    }
}
