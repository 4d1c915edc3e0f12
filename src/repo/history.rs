//! repo::history
//!
//! Commit creation and history traversal.
//!
//! # Traversal notes
//!
//! `log` follows first parents only, from the head to the root. Second
//! parents of merge commits are not visited; this mirrors the original
//! design and is a documented limitation rather than a bug.
//!
//! `global-log` and `find` are linear scans over every object in the
//! store, which is the intended cost model for this engine (no
//! reverse index is maintained).

use std::collections::{HashMap, VecDeque};

use crate::core::object::{Commit, Object};
use crate::core::types::ObjectId;
use crate::repo::{RepoError, Repository};

/// One entry of `log` / `global-log` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    /// Both parents of a merge commit, abbreviated in display.
    pub merge_parents: Option<(ObjectId, ObjectId)>,
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    fn from_commit(id: ObjectId, commit: &Commit) -> Self {
        let merge_parents = if commit.is_merge() {
            Some((commit.parents[0].clone(), commit.parents[1].clone()))
        } else {
            None
        };
        Self {
            id,
            merge_parents,
            timestamp: commit.timestamp.clone(),
            message: commit.message.clone(),
        }
    }
}

impl Repository {
    /// Create a commit from the staging index.
    ///
    /// The new commit's file map is the head commit's map with staged
    /// additions overlaid and staged removals deleted. Its parent list
    /// is the current head, plus `extra_parent` when merging. On
    /// success the current branch ref advances and the index is
    /// cleared.
    ///
    /// # Errors
    ///
    /// [`RepoError::EmptyCommit`] if nothing is staged;
    /// [`RepoError::EmptyMessage`] if the message is blank.
    pub fn commit(
        &mut self,
        message: &str,
        extra_parent: Option<ObjectId>,
    ) -> Result<ObjectId, RepoError> {
        if self.index().is_empty() {
            return Err(RepoError::EmptyCommit);
        }
        if message.trim().is_empty() {
            return Err(RepoError::EmptyMessage);
        }

        let head_id = self.current_commit_id()?;
        let head = self.objects().get_commit(&head_id)?;

        let mut files = head.files;
        for (path, blob) in self.index().additions() {
            files.insert(path.clone(), blob.clone());
        }
        for path in self.index().removals().keys() {
            files.remove(path);
        }

        let mut parents = vec![head_id];
        parents.extend(extra_parent);

        let commit = Commit::new(message, parents, files);
        let id = self.objects().put(&Object::Commit(commit))?;

        let branch = self.current_branch()?;
        self.refs().write(&branch, &id)?;
        self.index_mut().clear()?;
        Ok(id)
    }

    /// History of the current branch, head first, first parents only.
    pub fn log(&self) -> Result<Vec<LogEntry>, RepoError> {
        let mut entries = Vec::new();
        let mut cursor = Some(self.current_commit_id()?);
        while let Some(id) = cursor {
            let commit = self.objects().get_commit(&id)?;
            entries.push(LogEntry::from_commit(id, &commit));
            cursor = commit.first_parent().cloned();
        }
        Ok(entries)
    }

    /// Every commit in the store, in unspecified order.
    pub fn global_log(&self) -> Result<Vec<LogEntry>, RepoError> {
        let commits = self.objects().all_commits()?;
        Ok(commits
            .into_iter()
            .map(|(id, commit)| LogEntry::from_commit(id, &commit))
            .collect())
    }

    /// Ids of every commit whose message matches exactly.
    ///
    /// # Errors
    ///
    /// [`RepoError::NoCommitsFound`] if no commit matches.
    pub fn find(&self, message: &str) -> Result<Vec<ObjectId>, RepoError> {
        let mut ids: Vec<ObjectId> = self
            .objects()
            .all_commits()?
            .into_iter()
            .filter(|(_, commit)| commit.message == message)
            .map(|(id, _)| id)
            .collect();
        if ids.is_empty() {
            return Err(RepoError::NoCommitsFound);
        }
        ids.sort();
        Ok(ids)
    }

    /// All ancestors of `start` (inclusive) with their BFS depth.
    ///
    /// Walks every parent edge. Depth is the minimum number of edges
    /// from `start`; the merge split-point search uses it to break
    /// ties.
    pub fn ancestors_with_depth(
        &self,
        start: &ObjectId,
    ) -> Result<HashMap<ObjectId, usize>, RepoError> {
        let mut depths = HashMap::new();
        let mut queue = VecDeque::new();
        depths.insert(start.clone(), 0);
        queue.push_back(start.clone());
        while let Some(id) = queue.pop_front() {
            let depth = depths[&id];
            let commit = self.objects().get_commit(&id)?;
            for parent in &commit.parents {
                if !depths.contains_key(parent) {
                    depths.insert(parent.clone(), depth + 1);
                    queue.push_back(parent.clone());
                }
            }
        }
        Ok(depths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path(), None).unwrap();
        (dir, repo)
    }

    fn add_commit(repo: &mut Repository, path: &str, content: &str, message: &str) -> ObjectId {
        fs::write(repo.root().join(path), content).unwrap();
        repo.add(path).unwrap();
        repo.commit(message, None).unwrap()
    }

    #[test]
    fn commit_requires_staged_changes() {
        let (_dir, mut repo) = repo();
        assert!(matches!(
            repo.commit("empty", None),
            Err(RepoError::EmptyCommit)
        ));
    }

    #[test]
    fn commit_requires_a_message() {
        let (_dir, mut repo) = repo();
        fs::write(repo.root().join("a.txt"), "x").unwrap();
        repo.add("a.txt").unwrap();
        assert!(matches!(
            repo.commit("  ", None),
            Err(RepoError::EmptyMessage)
        ));
    }

    #[test]
    fn commit_snapshots_and_advances_the_branch() {
        let (_dir, mut repo) = repo();
        let id = add_commit(&mut repo, "a.txt", "hello", "first");
        assert_eq!(repo.current_commit_id().unwrap(), id);
        assert!(repo.index().is_empty());

        let head = repo.head_commit().unwrap();
        assert_eq!(head.files.len(), 1);
        assert_eq!(head.message, "first");
    }

    #[test]
    fn commit_applies_staged_removals() {
        let (_dir, mut repo) = repo();
        add_commit(&mut repo, "a.txt", "hello", "first");
        repo.remove("a.txt").unwrap();
        repo.commit("drop a", None).unwrap();
        assert!(repo.head_commit().unwrap().files.is_empty());
    }

    #[test]
    fn log_walks_first_parents_to_the_root() {
        let (_dir, mut repo) = repo();
        add_commit(&mut repo, "a.txt", "1", "first");
        add_commit(&mut repo, "a.txt", "2", "second");

        let entries = repo.log().unwrap();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["second", "first", "initial commit"]);
    }

    #[test]
    fn find_matches_exact_messages() {
        let (_dir, mut repo) = repo();
        let first = add_commit(&mut repo, "a.txt", "1", "same");
        let second = add_commit(&mut repo, "a.txt", "2", "same");
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(repo.find("same").unwrap(), expected);
        assert!(matches!(
            repo.find("nope"),
            Err(RepoError::NoCommitsFound)
        ));
    }

    #[test]
    fn ancestors_with_depth_covers_all_parents() {
        let (_dir, mut repo) = repo();
        let root = repo.current_commit_id().unwrap();
        let first = add_commit(&mut repo, "a.txt", "1", "first");
        let head = add_commit(&mut repo, "a.txt", "2", "second");

        let depths = repo.ancestors_with_depth(&head).unwrap();
        assert_eq!(depths[&head], 0);
        assert_eq!(depths[&first], 1);
        assert_eq!(depths[&root], 2);
    }
}
