//! repo::merge
//!
//! The three-way merge engine.
//!
//! # Shape of a merge
//!
//! Given the current commit C and the target branch tip M, find their
//! split point S (a common ancestor) and reconcile:
//!
//! - S == M: the target is already incorporated; nothing to do
//! - S == C: fast-forward; a plain branch checkout, no merge commit
//! - otherwise: classify every path in files(M) ∪ files(S) against
//!   {S, C, M}, stage auto-merged takes and rendered conflicts, and
//!   seal the result in a two-parent commit
//!
//! # Split-point search
//!
//! The search deliberately replicates the original heuristic rather
//! than a canonical lowest-common-ancestor: enumerate C's ancestors
//! with BFS depth, then walk breadth-first from M; the first frontier
//! containing any of C's ancestors wins, ties within that frontier
//! broken by the smallest recorded depth on C's side. For DAGs with
//! multiple maximal common ancestors this can pick a non-canonical
//! base, which matches the behavior this engine is cloning.
//!
//! # Conflicts are not errors
//!
//! A conflicted path is rendered with markers, staged, and counted;
//! the merge still completes and commits. The outcome reports whether
//! any conflict was encountered.

use std::collections::BTreeSet;
use std::fs;

use crate::core::object::{Blob, Object};
use crate::core::types::{BranchName, ObjectId, RelPath};
use crate::repo::{RepoError, Repository};

/// How a merge concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The current branch was behind the target; resolved by checkout.
    FastForward,
    /// A merge commit was created.
    Merged {
        /// Whether any path needed conflict markers.
        conflicts: bool,
    },
}

impl Repository {
    /// Merge a branch into the current branch.
    ///
    /// # Errors
    ///
    /// In guard order: [`RepoError::UncommittedChanges`] if anything is
    /// staged, [`RepoError::NoSuchBranch`] if the target is missing,
    /// [`RepoError::CurrentBranchMerge`] for a self-merge,
    /// [`RepoError::UntrackedInTheWay`] if the target would overwrite
    /// untracked work, and [`RepoError::BranchIsAncestor`] when the
    /// target is already incorporated.
    pub fn merge(&mut self, branch: &str) -> Result<MergeOutcome, RepoError> {
        if !self.index().is_empty() {
            return Err(RepoError::UncommittedChanges);
        }
        let target = BranchName::new(branch).map_err(|_| RepoError::NoSuchBranch)?;
        let target_tip = self.branch_tip(&target)?;
        let current = self.current_branch()?;
        if current.file_name() == target.file_name() {
            return Err(RepoError::CurrentBranchMerge);
        }

        let current_tip = self.current_commit_id()?;
        let target_commit = self.objects().get_commit(&target_tip)?;
        self.guard_untracked(&target_commit)?;

        let split = self.split_point(&current_tip, &target_tip)?;
        if split == target_tip {
            return Err(RepoError::BranchIsAncestor);
        }
        if split == current_tip {
            self.checkout_branch(target.as_str())?;
            return Ok(MergeOutcome::FastForward);
        }

        let split_commit = self.objects().get_commit(&split)?;
        let current_commit = self.objects().get_commit(&current_tip)?;

        let mut paths: BTreeSet<RelPath> = target_commit.files.keys().cloned().collect();
        paths.extend(split_commit.files.keys().cloned());

        let mut conflicts = false;
        for path in paths {
            let s = split_commit.files.get(&path);
            let c = current_commit.files.get(&path);
            let m = target_commit.files.get(&path);

            match (s, c, m) {
                // New in the target since the split.
                (None, None, Some(m)) => self.take_target(&path, m)?,
                // Only the target changed it since the split.
                (Some(s), Some(c), Some(m)) if s == c && c != m => {
                    self.take_target(&path, m)?;
                }
                // Added independently on both sides with different content.
                (None, Some(c), Some(m)) if c != m => {
                    self.render_conflict(&path, Some(c), Some(m))?;
                    conflicts = true;
                }
                // Modified differently on both sides.
                (Some(s), Some(c), Some(m)) if s != c && s != m && c != m => {
                    self.render_conflict(&path, Some(c), Some(m))?;
                    conflicts = true;
                }
                // Current side deleted it, target modified it.
                (Some(s), None, Some(m)) if s != m => {
                    self.render_conflict(&path, None, Some(m))?;
                    conflicts = true;
                }
                // Target deleted it, current side never touched it.
                (Some(s), Some(c), None) if s == c => {
                    let c = c.clone();
                    self.index_mut().stage_removal(path.clone(), c)?;
                    let file = path.resolve(self.root());
                    if file.exists() {
                        fs::remove_file(file)?;
                    }
                }
                // Target deleted it, current side modified it.
                (Some(s), Some(c), None) if s != c => {
                    self.render_conflict(&path, Some(c), None)?;
                    conflicts = true;
                }
                // Unchanged, identical on both sides, or deleted by both.
                _ => {}
            }
        }

        let message = format!("Merged {target} into {current}.");
        self.commit(&message, Some(target_tip))?;
        Ok(MergeOutcome::Merged { conflicts })
    }

    /// The split point of two commits (see the module docs for the
    /// heuristic this replicates).
    pub(crate) fn split_point(
        &self,
        current: &ObjectId,
        target: &ObjectId,
    ) -> Result<ObjectId, RepoError> {
        let ancestors = self.ancestors_with_depth(current)?;

        let mut level = vec![target.clone()];
        let mut visited = BTreeSet::new();
        while !level.is_empty() {
            let mut best: Option<(usize, ObjectId)> = None;
            for id in &level {
                if let Some(&depth) = ancestors.get(id) {
                    if best.as_ref().map_or(true, |(d, _)| depth < *d) {
                        best = Some((depth, id.clone()));
                    }
                }
            }
            if let Some((_, id)) = best {
                return Ok(id);
            }

            let mut next = Vec::new();
            for id in level {
                let commit = self.objects().get_commit(&id)?;
                for parent in commit.parents {
                    if visited.insert(parent.clone()) {
                        next.push(parent);
                    }
                }
            }
            level = next;
        }

        // Every history descends from the shared deterministic root
        // commit, so the walk above always terminates at a common
        // ancestor first.
        Err(RepoError::NoSuchCommit)
    }

    /// Auto-merge a path in the target's favor: restore its blob into
    /// the working tree and stage it.
    fn take_target(&mut self, path: &RelPath, blob_id: &ObjectId) -> Result<(), RepoError> {
        self.write_blob_to_worktree(blob_id)?;
        self.index_mut()
            .stage_addition(path.clone(), blob_id.clone())?;
        Ok(())
    }

    /// Write a conflicted path with markers embedding both sides, then
    /// stage the rendered file.
    fn render_conflict(
        &mut self,
        path: &RelPath,
        current: Option<&ObjectId>,
        target: Option<&ObjectId>,
    ) -> Result<(), RepoError> {
        let current_bytes = match current {
            Some(id) => self.objects().get_blob(id)?.content,
            None => Vec::new(),
        };
        let target_bytes = match target {
            Some(id) => self.objects().get_blob(id)?.content,
            None => Vec::new(),
        };

        let mut rendered = Vec::with_capacity(current_bytes.len() + target_bytes.len() + 32);
        rendered.extend_from_slice(b"<<<<<<< HEAD\n");
        rendered.extend_from_slice(&current_bytes);
        rendered.extend_from_slice(b"=======\n");
        rendered.extend_from_slice(&target_bytes);
        rendered.extend_from_slice(b">>>>>>>\n");

        let file = path.resolve(self.root());
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, &rendered)?;

        let blob = Blob::new(path.clone(), rendered);
        let blob_id = self.objects().put(&Object::Blob(blob))?;
        self.index_mut().stage_addition(path.clone(), blob_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path(), None).unwrap();
        (dir, repo)
    }

    fn write(repo: &Repository, path: &str, content: &str) {
        fs::write(repo.root().join(path), content).unwrap();
    }

    fn read(repo: &Repository, path: &str) -> String {
        fs::read_to_string(repo.root().join(path)).unwrap()
    }

    fn add_commit(repo: &mut Repository, path: &str, content: &str, message: &str) {
        write(repo, path, content);
        repo.add(path).unwrap();
        repo.commit(message, None).unwrap();
    }

    /// base commit on master, then a `side` branch.
    fn base_with_side(repo: &mut Repository) {
        add_commit(repo, "a.txt", "base\n", "base");
        repo.create_branch("side").unwrap();
    }

    #[test]
    fn merge_guards_fire_in_order() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);

        write(&repo, "b.txt", "staged\n");
        repo.add("b.txt").unwrap();
        assert!(matches!(
            repo.merge("side"),
            Err(RepoError::UncommittedChanges)
        ));
        repo.remove("b.txt").unwrap();

        assert!(matches!(repo.merge("ghost"), Err(RepoError::NoSuchBranch)));
        assert!(matches!(
            repo.merge("master"),
            Err(RepoError::CurrentBranchMerge)
        ));
    }

    #[test]
    fn merging_an_ancestor_is_rejected() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        add_commit(&mut repo, "a.txt", "ahead\n", "ahead");
        assert!(matches!(
            repo.merge("side"),
            Err(RepoError::BranchIsAncestor)
        ));
    }

    #[test]
    fn fast_forward_checks_out_the_target() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        repo.checkout_branch("side").unwrap();
        add_commit(&mut repo, "a.txt", "side edit\n", "side edit");
        let side_tip = repo.current_commit_id().unwrap();
        let commits_before = repo.global_log().unwrap().len();

        repo.checkout_branch("master").unwrap();
        let outcome = repo.merge("side").unwrap();
        assert_eq!(outcome, MergeOutcome::FastForward);
        assert_eq!(read(&repo, "a.txt"), "side edit\n");
        // No merge commit was created.
        assert_eq!(repo.current_commit_id().unwrap(), side_tip);
        assert_eq!(repo.global_log().unwrap().len(), commits_before);
        // Fast-forward is a plain checkout, so HEAD follows the target.
        assert_eq!(repo.current_branch().unwrap().as_str(), "side");
    }

    #[test]
    fn clean_merge_takes_target_changes() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        repo.checkout_branch("side").unwrap();
        add_commit(&mut repo, "new.txt", "from side\n", "side adds new");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, "other.txt", "from master\n", "master adds other");

        let outcome = repo.merge("side").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflicts: false });
        assert_eq!(read(&repo, "new.txt"), "from side\n");
        assert_eq!(read(&repo, "other.txt"), "from master\n");

        let head = repo.head_commit().unwrap();
        assert_eq!(head.parents.len(), 2);
        assert_eq!(head.message, "Merged side into master.");
        assert!(repo.index().is_empty());
    }

    #[test]
    fn divergent_edits_render_conflict_markers() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        repo.checkout_branch("side").unwrap();
        add_commit(&mut repo, "a.txt", "foo\n", "side edit");
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, "a.txt", "bar\n", "master edit");

        let outcome = repo.merge("side").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflicts: true });
        assert_eq!(
            read(&repo, "a.txt"),
            "<<<<<<< HEAD\nbar\n=======\nfoo\n>>>>>>>\n"
        );
        assert_eq!(repo.head_commit().unwrap().parents.len(), 2);
    }

    #[test]
    fn delete_modify_conflict_has_empty_side() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        repo.checkout_branch("side").unwrap();
        add_commit(&mut repo, "a.txt", "side version\n", "side edit");
        repo.checkout_branch("master").unwrap();
        repo.remove("a.txt").unwrap();
        repo.commit("master deletes a", None).unwrap();
        add_commit(&mut repo, "keep.txt", "k\n", "keep");

        let outcome = repo.merge("side").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflicts: true });
        assert_eq!(
            read(&repo, "a.txt"),
            "<<<<<<< HEAD\n=======\nside version\n>>>>>>>\n"
        );
    }

    #[test]
    fn target_deletion_is_mirrored() {
        let (_dir, mut repo) = repo();
        base_with_side(&mut repo);
        repo.checkout_branch("side").unwrap();
        repo.remove("a.txt").unwrap();
        repo.commit("side deletes a", None).unwrap();
        repo.checkout_branch("master").unwrap();
        add_commit(&mut repo, "other.txt", "o\n", "master other");

        let outcome = repo.merge("side").unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { conflicts: false });
        assert!(!repo.root().join("a.txt").exists());
        assert!(!repo
            .head_commit()
            .unwrap()
            .files
            .contains_key(&RelPath::new("a.txt").unwrap()));
    }

    #[test]
    fn split_point_of_diverged_branches_is_their_base() {
        let (_dir, mut repo) = repo();
        add_commit(&mut repo, "a.txt", "base\n", "base");
        let base = repo.current_commit_id().unwrap();
        repo.create_branch("side").unwrap();
        add_commit(&mut repo, "a.txt", "m1\n", "m1");
        let master_tip = repo.current_commit_id().unwrap();
        repo.checkout_branch("side").unwrap();
        add_commit(&mut repo, "a.txt", "s1\n", "s1");
        let side_tip = repo.current_commit_id().unwrap();

        assert_eq!(repo.split_point(&master_tip, &side_tip).unwrap(), base);
        assert_eq!(repo.split_point(&side_tip, &master_tip).unwrap(), base);
        assert_eq!(
            repo.split_point(&master_tip, &master_tip).unwrap(),
            master_tip
        );
    }
}
