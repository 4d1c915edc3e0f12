//! repo::remote
//!
//! Remote registration and the push/fetch/pull reachability-copy
//! protocol.
//!
//! # Reachability copy
//!
//! Both directions run the same shape of algorithm: walk the commit
//! graph breadth-first from a tip, prune the walk at every commit the
//! receiving store already contains, copy the frontier that remains,
//! then copy every blob those commits reference that the receiver
//! lacks. The existence probe makes re-copies impossible, and because
//! commit file maps are keyed by repository-relative paths, records
//! move between repositories byte-for-byte — no rewriting.
//!
//! # Registration
//!
//! `.strata/remote` holds a versioned JSON map from remote name to the
//! remote repository's root path. A path given as `.../.strata` is
//! accepted and normalized to the root above it.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::object::Object;
use crate::core::paths::STRATA_DIR;
use crate::core::types::{BranchName, ObjectId};
use crate::repo::transport::{LocalTransport, Transport};
use crate::repo::{RepoError, Repository};

/// The kind identifier for the remote registration record.
pub const REMOTE_KIND: &str = "strata.remotes";

/// Current remote registration schema version.
pub const REMOTE_SCHEMA_VERSION: u32 = 1;

/// On-disk remote registration record, version 1.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteRecordV1 {
    kind: String,
    schema_version: u32,
    remotes: BTreeMap<String, PathBuf>,
}

impl Repository {
    fn load_remotes(&self) -> Result<BTreeMap<String, PathBuf>, RepoError> {
        let raw = match fs::read_to_string(self.paths().remote_file()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(RepoError::Io(e)),
        };
        let record: RemoteRecordV1 = serde_json::from_str(&raw)
            .map_err(|e| RepoError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if record.kind != REMOTE_KIND || record.schema_version != REMOTE_SCHEMA_VERSION {
            return Err(RepoError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "unsupported remote registration record",
            )));
        }
        Ok(record.remotes)
    }

    fn save_remotes(&self, remotes: BTreeMap<String, PathBuf>) -> Result<(), RepoError> {
        let record = RemoteRecordV1 {
            kind: REMOTE_KIND.to_string(),
            schema_version: REMOTE_SCHEMA_VERSION,
            remotes,
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| RepoError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(self.paths().remote_file(), json)?;
        Ok(())
    }

    /// Register a remote under a local name.
    ///
    /// # Errors
    ///
    /// [`RepoError::RemoteExists`] if the name is taken. The path is
    /// not validated here; it is checked when first used.
    pub fn add_remote(&self, name: &str, path: &Path) -> Result<(), RepoError> {
        let mut remotes = self.load_remotes()?;
        if remotes.contains_key(name) {
            return Err(RepoError::RemoteExists);
        }
        // Accept a path to the data directory itself.
        let root = if path.file_name().map(|n| n == STRATA_DIR).unwrap_or(false) {
            path.parent().unwrap_or(path).to_path_buf()
        } else {
            path.to_path_buf()
        };
        remotes.insert(name.to_string(), root);
        self.save_remotes(remotes)
    }

    /// Forget a registered remote.
    pub fn rm_remote(&self, name: &str) -> Result<(), RepoError> {
        let mut remotes = self.load_remotes()?;
        if remotes.remove(name).is_none() {
            return Err(RepoError::NoSuchRemote);
        }
        self.save_remotes(remotes)
    }

    /// Open a transport to a registered remote.
    fn open_remote(&self, name: &str) -> Result<LocalTransport, RepoError> {
        let remotes = self.load_remotes()?;
        let root = remotes.get(name).ok_or(RepoError::NoSuchRemote)?;
        LocalTransport::open(root)
    }

    /// Push the current branch's history to a remote branch.
    ///
    /// Fast-forward only: if the remote branch exists, its tip must be
    /// an ancestor of the local head.
    ///
    /// # Errors
    ///
    /// [`RepoError::NoSuchRemote`], [`RepoError::RemoteNotFound`], or
    /// [`RepoError::PushRejected`] when histories have diverged.
    pub fn push(&self, remote_name: &str, branch: &str) -> Result<(), RepoError> {
        let mut transport = self.open_remote(remote_name)?;
        let branch = BranchName::new(branch).map_err(|_| RepoError::NoSuchBranch)?;

        let local_head = self.current_commit_id()?;
        if let Some(remote_tip) = transport.read_ref(&branch)? {
            let ancestors = self.ancestors_with_depth(&local_head)?;
            if !ancestors.contains_key(&remote_tip) {
                return Err(RepoError::PushRejected);
            }
        }

        let missing = self.missing_on_remote(&local_head, &transport)?;
        self.copy_commits_to(&missing, &mut transport)?;
        transport.write_ref(&branch, &local_head)
    }

    /// Copy a remote branch's history into the local store and point a
    /// tracking branch at it. The working tree is untouched.
    ///
    /// Returns the tracking branch (`<remote>/<branch>`, stored on disk
    /// as `<remote>_<branch>`).
    ///
    /// # Errors
    ///
    /// [`RepoError::RemoteBranchMissing`] if the remote lacks the
    /// branch.
    pub fn fetch(&self, remote_name: &str, branch: &str) -> Result<BranchName, RepoError> {
        let transport = self.open_remote(remote_name)?;
        let branch = BranchName::new(branch).map_err(|_| RepoError::RemoteBranchMissing)?;
        let remote_tip = transport
            .read_ref(&branch)?
            .ok_or(RepoError::RemoteBranchMissing)?;

        // Walk the remote graph, pruning where the local store already
        // has the commit.
        let mut to_copy = Vec::new();
        let mut queue = VecDeque::new();
        let mut seen = std::collections::BTreeSet::new();
        queue.push_back(remote_tip.clone());
        seen.insert(remote_tip.clone());
        while let Some(id) = queue.pop_front() {
            if self.objects().contains(&id) {
                continue;
            }
            let object = transport.fetch_object(&id)?;
            let commit = match &object {
                Object::Commit(commit) => commit.clone(),
                Object::Blob(_) => {
                    return Err(RepoError::Store(
                        crate::core::store::StoreError::WrongKind {
                            id: id.to_string(),
                            expected: "commit",
                        },
                    ));
                }
            };
            to_copy.push(object);
            for parent in commit.parents {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent);
                }
            }
        }

        // Commits first, then any blobs they reference that are absent
        // locally. Relative paths make the records portable as-is.
        for object in &to_copy {
            self.objects().put(object)?;
            if let Object::Commit(commit) = object {
                for blob_id in commit.files.values() {
                    if !self.objects().contains(blob_id) {
                        let blob = transport.fetch_object(blob_id)?;
                        self.objects().put(&blob)?;
                    }
                }
            }
        }

        let tracking = BranchName::new(format!("{remote_name}/{branch}"))
            .map_err(|_| RepoError::RemoteBranchMissing)?;
        self.refs().write(&tracking, &remote_tip)?;
        Ok(tracking)
    }

    /// Fetch a remote branch, then merge its tracking branch into the
    /// current branch.
    pub fn pull(
        &mut self,
        remote_name: &str,
        branch: &str,
    ) -> Result<crate::repo::merge::MergeOutcome, RepoError> {
        let tracking = self.fetch(remote_name, branch)?;
        self.merge(tracking.as_str())
    }

    /// Commits reachable from `tip` that the remote store lacks,
    /// pruning the walk at commits it already has.
    fn missing_on_remote(
        &self,
        tip: &ObjectId,
        transport: &dyn Transport,
    ) -> Result<Vec<ObjectId>, RepoError> {
        let mut missing = Vec::new();
        let mut queue = VecDeque::new();
        let mut seen = std::collections::BTreeSet::new();
        queue.push_back(tip.clone());
        seen.insert(tip.clone());
        while let Some(id) = queue.pop_front() {
            if transport.object_exists(&id)? {
                continue;
            }
            let commit = self.objects().get_commit(&id)?;
            missing.push(id);
            for parent in commit.parents {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(missing)
    }

    /// Copy the given commits and their referenced blobs to the remote.
    fn copy_commits_to(
        &self,
        commits: &[ObjectId],
        transport: &mut dyn Transport,
    ) -> Result<(), RepoError> {
        for id in commits {
            let commit = self.objects().get_commit(id)?;
            for blob_id in commit.files.values() {
                if !transport.object_exists(blob_id)? {
                    let blob = self.objects().get(blob_id)?;
                    transport.store_object(&blob)?;
                }
            }
            transport.store_object(&Object::Commit(commit))?;
        }
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

    fn add_commit(repo: &mut Repository, path: &str, content: &str, message: &str) -> ObjectId {
        fs::write(repo.root().join(path), content).unwrap();
        repo.add(path).unwrap();
        repo.commit(message, None).unwrap()
    }

    #[test]
    fn remote_registration_round_trips() {
        let (_dir, repo) = repo();
        repo.add_remote("origin", Path::new("/tmp/elsewhere")).unwrap();
        assert!(matches!(
            repo.add_remote("origin", Path::new("/tmp/other")),
            Err(RepoError::RemoteExists)
        ));
        repo.rm_remote("origin").unwrap();
        assert!(matches!(
            repo.rm_remote("origin"),
            Err(RepoError::NoSuchRemote)
        ));
    }

    #[test]
    fn strata_suffix_paths_are_normalized() {
        let (_local_dir, local) = repo();
        let (remote_dir, mut remote) = repo();
        add_commit(&mut remote, "a.txt", "x\n", "remote commit");

        local
            .add_remote("origin", &remote_dir.path().join(".strata"))
            .unwrap();
        // Fetch succeeds, proving the root was found.
        local.fetch("origin", "master").unwrap();
    }

    #[test]
    fn push_copies_history_and_moves_the_remote_tree() {
        let (_local_dir, mut local) = repo();
        let (remote_dir, _remote) = repo();
        let tip = add_commit(&mut local, "a.txt", "pushed\n", "first");

        local.add_remote("origin", remote_dir.path()).unwrap();
        local.push("origin", "master").unwrap();

        let remote = Repository::open(remote_dir.path()).unwrap();
        assert_eq!(remote.current_commit_id().unwrap(), tip);
        // The remote had master checked out, so its tree was reset.
        assert_eq!(
            fs::read_to_string(remote_dir.path().join("a.txt")).unwrap(),
            "pushed\n"
        );
    }

    #[test]
    fn diverged_push_is_rejected_and_remote_unmodified() {
        let (_local_dir, mut local) = repo();
        let (remote_dir, mut remote) = repo();
        let remote_tip = add_commit(&mut remote, "r.txt", "r\n", "remote only");
        add_commit(&mut local, "l.txt", "l\n", "local only");

        local.add_remote("origin", remote_dir.path()).unwrap();
        assert!(matches!(
            local.push("origin", "master"),
            Err(RepoError::PushRejected)
        ));

        let remote = Repository::open(remote_dir.path()).unwrap();
        assert_eq!(remote.current_commit_id().unwrap(), remote_tip);
        assert_eq!(remote.global_log().unwrap().len(), 2);
    }

    #[test]
    fn fetch_creates_a_tracking_branch_without_touching_the_tree() {
        let (_local_dir, mut local) = repo();
        let (remote_dir, mut remote) = repo();
        let remote_tip = add_commit(&mut remote, "r.txt", "r\n", "remote commit");

        local.add_remote("origin", remote_dir.path()).unwrap();
        let tracking = local.fetch("origin", "master").unwrap();
        assert_eq!(tracking.file_name(), "origin_master");
        assert_eq!(local.refs().read(&tracking).unwrap(), Some(remote_tip));
        assert!(!local.root().join("r.txt").exists());
        // But the commits and blobs are in the local store now.
        assert_eq!(local.global_log().unwrap().len(), 2);

        add_commit(&mut local, "keep.txt", "k\n", "local work");
        assert!(local.root().join("keep.txt").exists());
    }

    #[test]
    fn fetch_missing_branch_fails() {
        let (_local_dir, local) = repo();
        let (remote_dir, _remote) = repo();
        local.add_remote("origin", remote_dir.path()).unwrap();
        assert!(matches!(
            local.fetch("origin", "ghost"),
            Err(RepoError::RemoteBranchMissing)
        ));
    }

    #[test]
    fn pull_merges_the_fetched_branch() {
        let (_local_dir, mut local) = repo();
        let (remote_dir, mut remote) = repo();
        add_commit(&mut remote, "r.txt", "from remote\n", "remote commit");

        local.add_remote("origin", remote_dir.path()).unwrap();
        local.pull("origin", "master").unwrap();
        // Shared deterministic root makes this a fast-forward.
        assert_eq!(
            fs::read_to_string(local.root().join("r.txt")).unwrap(),
            "from remote\n"
        );
    }
}
