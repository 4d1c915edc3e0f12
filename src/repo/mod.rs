//! repo
//!
//! The repository session and every operation that reads or mutates it.
//!
//! # Modules
//!
//! - [`stage`] - `add` / `rm` staging operations
//! - [`history`] - commit creation and history traversal (log, find)
//! - [`worktree`] - status, checkout, reset, branch management
//! - [`merge`] - the three-way merge engine
//! - [`remote`] - remote registration and push/fetch/pull
//! - [`transport`] - the object/ref transport seam used by remote sync
//!
//! # The session value
//!
//! All state lives in an explicit [`Repository`] value (root path, object
//! store, ref store, staging index) passed to every operation. Nothing is
//! process-global, which is what lets push and fetch hold a local and a
//! remote session open at the same time.
//!
//! # Errors
//!
//! Every recognized failure is a [`RepoError`] variant whose `Display`
//! is the exact one-line message the CLI prints. The engine validates
//! preconditions eagerly and never proceeds past a failed guard; merge
//! conflicts are the one non-fatal case and are reported through
//! [`merge::MergeOutcome`], not an error.

pub mod history;
pub mod merge;
pub mod remote;
pub mod stage;
pub mod transport;
pub mod worktree;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::{ConfigError, RepoConfig};
use crate::core::index::{IndexError, StagingIndex};
use crate::core::lock::LockError;
use crate::core::object::{Commit, Object};
use crate::core::paths::RepoPaths;
use crate::core::refs::{RefError, RefStore};
use crate::core::store::{ObjectStore, StoreError};
use crate::core::types::{BranchName, ObjectId};

/// Engine-level errors. `Display` is the user-facing line.
#[derive(Debug, Error)]
pub enum RepoError {
    // -- state errors -------------------------------------------------------
    #[error("A strata version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Not in an initialized strata directory.")]
    NotInitialized,

    #[error("File does not exist.")]
    FileNotFound,

    #[error("No changes added to the commit.")]
    EmptyCommit,

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No reason to remove the file.")]
    NothingToRemove,

    #[error("No commit with that id exists.")]
    NoSuchCommit,

    #[error("File does not exist in that commit.")]
    FileNotInCommit,

    /// Missing branch, checkout's spelling.
    #[error("No such branch exists.")]
    NoSuchBranchCheckout,

    /// Missing branch, everywhere else.
    #[error("A branch with that name does not exist.")]
    NoSuchBranch,

    #[error("No need to checkout the current branch.")]
    CurrentBranchCheckout,

    #[error("Cannot remove the current branch.")]
    CurrentBranchRemove,

    #[error("Cannot merge a branch with itself.")]
    CurrentBranchMerge,

    #[error("A branch with that name already exists.")]
    BranchExists,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedInTheWay,

    #[error("You have uncommitted changes.")]
    UncommittedChanges,

    #[error("Given branch is an ancestor of the current branch.")]
    BranchIsAncestor,

    #[error("Found no commit with that message.")]
    NoCommitsFound,

    #[error("Invalid branch name.")]
    InvalidBranchName,

    // -- environment errors -------------------------------------------------
    #[error("A remote with that name already exists.")]
    RemoteExists,

    #[error("A remote with that name does not exist.")]
    NoSuchRemote,

    #[error("Remote directory not found.")]
    RemoteNotFound,

    #[error("That remote does not have that branch.")]
    RemoteBranchMissing,

    #[error("Please pull down remote changes before pushing.")]
    PushRejected,

    // -- faults below the engine --------------------------------------------
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Refs(#[from] RefError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// An open repository session.
///
/// Holds the path routing, both stores, and the loaded staging index
/// for one repository root. Remote sync opens a second session at the
/// remote's root.
#[derive(Debug)]
pub struct Repository {
    paths: RepoPaths,
    objects: ObjectStore,
    refs: RefStore,
    index: StagingIndex,
    config: RepoConfig,
}

impl Repository {
    /// Initialize a new repository at `root`.
    ///
    /// Creates the `.strata` layout, the root commit, the initial
    /// branch pointing at it, HEAD, and an empty index.
    ///
    /// # Errors
    ///
    /// [`RepoError::AlreadyInitialized`] if `.strata` already exists.
    pub fn init(root: &Path, branch: Option<&str>) -> Result<Self, RepoError> {
        let paths = RepoPaths::new(root.to_path_buf());
        if paths.is_initialized() {
            return Err(RepoError::AlreadyInitialized);
        }

        fs::create_dir_all(paths.objects_dir())?;
        fs::create_dir_all(paths.heads_dir())?;

        let config = RepoConfig {
            default_branch: branch.map(str::to_string),
        };
        let initial_branch = config.initial_branch()?;
        let toml = toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(paths.config_file(), toml)?;

        let objects = ObjectStore::new(&paths);
        let refs = RefStore::new(&paths);
        let root_commit = Commit::initial();
        let root_id = objects.put(&Object::Commit(root_commit))?;
        refs.write(&initial_branch, &root_id)?;
        refs.set_head_branch(&initial_branch)?;
        let index = StagingIndex::create(&paths)?;

        Ok(Self {
            paths,
            objects,
            refs,
            index,
            config,
        })
    }

    /// Open an existing repository at `root`.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotInitialized`] if `root` has no `.strata` layout.
    pub fn open(root: &Path) -> Result<Self, RepoError> {
        let paths = RepoPaths::new(root.to_path_buf());
        if !paths.is_initialized() {
            return Err(RepoError::NotInitialized);
        }
        let config = RepoConfig::load(&paths)?;
        let index = StagingIndex::load(&paths)?;
        Ok(Self {
            objects: ObjectStore::new(&paths),
            refs: RefStore::new(&paths),
            paths,
            index,
            config,
        })
    }

    /// The working-directory root.
    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// Path routing for this repository.
    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    /// The object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The ref store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// The staging index.
    pub fn index(&self) -> &StagingIndex {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut StagingIndex {
        &mut self.index
    }

    /// Loaded repository configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The currently checked-out branch.
    pub fn current_branch(&self) -> Result<BranchName, RepoError> {
        Ok(self.refs.head_branch()?)
    }

    /// The id of the current branch's tip commit.
    pub fn current_commit_id(&self) -> Result<ObjectId, RepoError> {
        let branch = self.current_branch()?;
        self.refs
            .read(&branch)?
            // HEAD names a branch that must exist; a missing ref file is
            // repository corruption, not a user error.
            .ok_or(RepoError::NoSuchBranch)
    }

    /// The current branch's tip commit.
    pub fn head_commit(&self) -> Result<Commit, RepoError> {
        let id = self.current_commit_id()?;
        Ok(self.objects.get_commit(&id)?)
    }

    /// Resolve a possibly-abbreviated commit id from user input.
    ///
    /// Absent ids, ambiguous prefixes, and non-commit objects all
    /// surface as [`RepoError::NoSuchCommit`].
    pub fn resolve_commit(&self, id_prefix: &str) -> Result<(ObjectId, Commit), RepoError> {
        let id = match self.objects.resolve_prefix(id_prefix) {
            Ok(id) => id,
            Err(StoreError::NotFound(_)) | Err(StoreError::AmbiguousPrefix(_)) => {
                return Err(RepoError::NoSuchCommit);
            }
            Err(e) => return Err(e.into()),
        };
        match self.objects.get_commit(&id) {
            Ok(commit) => Ok((id, commit)),
            Err(StoreError::WrongKind { .. }) | Err(StoreError::NotFound(_)) => {
                Err(RepoError::NoSuchCommit)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a branch tip, mapping a missing branch to the non-checkout
    /// error spelling.
    pub(crate) fn branch_tip(&self, name: &BranchName) -> Result<ObjectId, RepoError> {
        self.refs.read(name)?.ok_or(RepoError::NoSuchBranch)
    }
}

/// Resolve the working directory a command should run in.
pub fn working_dir(cwd_override: Option<&Path>) -> Result<PathBuf, RepoError> {
    match cwd_override {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}
