//! repo::transport
//!
//! The transport seam between two object/ref stores.
//!
//! Remote sync never talks to a remote's storage directly; it goes
//! through the [`Transport`] capability so the reachability-copy
//! algorithms in [`crate::repo::remote`] stay independent of how the
//! far side is reached. The only implementation today is
//! [`LocalTransport`], which opens the remote as an ordinary repository
//! session at a filesystem path; a wire protocol could be substituted
//! here without touching the merge engine or the commit graph.

use crate::core::object::Object;
use crate::core::types::{BranchName, ObjectId};
use crate::repo::{RepoError, Repository};

/// Capability to read and write one remote repository's storage.
pub trait Transport {
    /// Cheap existence probe, the dedup primitive of push and fetch.
    fn object_exists(&self, id: &ObjectId) -> Result<bool, RepoError>;

    /// Read one object from the remote store.
    fn fetch_object(&self, id: &ObjectId) -> Result<Object, RepoError>;

    /// Write one object into the remote store (idempotent).
    fn store_object(&mut self, object: &Object) -> Result<ObjectId, RepoError>;

    /// Read a remote branch tip, `None` if the branch does not exist.
    fn read_ref(&self, branch: &BranchName) -> Result<Option<ObjectId>, RepoError>;

    /// Move a remote branch to a commit the remote store already holds.
    fn write_ref(&mut self, branch: &BranchName, id: &ObjectId) -> Result<(), RepoError>;
}

/// Transport over a repository reachable by filesystem path.
#[derive(Debug)]
pub struct LocalTransport {
    remote: Repository,
}

impl LocalTransport {
    /// Open the repository at `root` as a remote.
    ///
    /// # Errors
    ///
    /// [`RepoError::RemoteNotFound`] if no repository exists there.
    pub fn open(root: &std::path::Path) -> Result<Self, RepoError> {
        match Repository::open(root) {
            Ok(remote) => Ok(Self { remote }),
            Err(RepoError::NotInitialized) => Err(RepoError::RemoteNotFound),
            Err(e) => Err(e),
        }
    }
}

impl Transport for LocalTransport {
    fn object_exists(&self, id: &ObjectId) -> Result<bool, RepoError> {
        Ok(self.remote.objects().contains(id))
    }

    fn fetch_object(&self, id: &ObjectId) -> Result<Object, RepoError> {
        Ok(self.remote.objects().get(id)?)
    }

    fn store_object(&mut self, object: &Object) -> Result<ObjectId, RepoError> {
        Ok(self.remote.objects().put(object)?)
    }

    fn read_ref(&self, branch: &BranchName) -> Result<Option<ObjectId>, RepoError> {
        Ok(self.remote.refs().read(branch)?)
    }

    /// A path-addressed remote has a working directory of its own. When
    /// the branch being moved is the one the remote has checked out,
    /// moving the ref implies updating that tree, so this performs a
    /// full reset on the remote session (a wire-protocol remote would
    /// do the same on its own side of the connection).
    fn write_ref(&mut self, branch: &BranchName, id: &ObjectId) -> Result<(), RepoError> {
        let checked_out =
            self.remote.current_branch()?.file_name() == branch.file_name();
        if checked_out {
            self.remote.reset(id.as_str())
        } else {
            Ok(self.remote.refs().write(branch, id)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::{Blob, Commit};
    use crate::core::types::RelPath;
    use tempfile::TempDir;

    #[test]
    fn open_requires_an_initialized_remote() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            LocalTransport::open(dir.path()),
            Err(RepoError::RemoteNotFound)
        ));
        Repository::init(dir.path(), None).unwrap();
        assert!(LocalTransport::open(dir.path()).is_ok());
    }

    #[test]
    fn objects_and_refs_round_trip() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path(), None).unwrap();
        let mut transport = LocalTransport::open(dir.path()).unwrap();

        let blob = Object::Blob(Blob::new(RelPath::new("a").unwrap(), b"x".to_vec()));
        let id = transport.store_object(&blob).unwrap();
        assert!(transport.object_exists(&id).unwrap());
        assert_eq!(transport.fetch_object(&id).unwrap(), blob);

        let branch = BranchName::new("dev").unwrap();
        assert_eq!(transport.read_ref(&branch).unwrap(), None);
        let root = Commit::initial().id();
        transport.write_ref(&branch, &root).unwrap();
        assert_eq!(transport.read_ref(&branch).unwrap(), Some(root));
    }
}
