//! core::store
//!
//! Content-addressed persistence for immutable objects.
//!
//! # Layout
//!
//! Objects live under `objects/<first-3-hex>/<remaining-hex>`, one file
//! per object, sharded by id prefix so directory listings stay small.
//!
//! # Semantics
//!
//! - `put` is idempotent: an object whose id already exists on disk is
//!   not rewritten (content addressing makes the bytes identical)
//! - No delete is exposed; unreferenced objects are never reclaimed
//! - `contains` is the cheap existence probe the remote reachability
//!   copy leans on
//!
//! Abbreviated commit ids are resolved by [`ObjectStore::resolve_prefix`],
//! which scans the shard named by the first three characters.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::codec::{self, CodecError};
use crate::core::object::{Blob, Commit, Object, ObjectKind};
use crate::core::paths::RepoPaths;
use crate::core::types::{ObjectId, ID_HEX_LEN, ID_SHARD_LEN};

/// Minimum length of an abbreviated object id.
pub const MIN_PREFIX_LEN: usize = 4;

/// Errors from object storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object with the given id (or id prefix) exists.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An abbreviated id matched more than one object.
    #[error("ambiguous object id prefix: {0}")]
    AmbiguousPrefix(String),

    /// A stored file failed to decode.
    #[error("corrupt object {id}: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: CodecError,
    },

    /// The object existed but had the wrong kind.
    #[error("object {id} is not a {expected}")]
    WrongKind { id: String, expected: &'static str },

    #[error("object store i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Content-addressed object store rooted at one repository.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Open the store for a repository's paths.
    pub fn new(paths: &RepoPaths) -> Self {
        Self {
            objects_dir: paths.objects_dir(),
        }
    }

    fn object_file(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir.join(id.shard()).join(id.rest())
    }

    /// Store an object, returning its id.
    ///
    /// Re-storing an existing object is a harmless no-op.
    pub fn put(&self, object: &Object) -> Result<ObjectId, StoreError> {
        let id = object.id();
        let file = self.object_file(&id);
        if file.exists() {
            return Ok(id);
        }
        fs::create_dir_all(self.objects_dir.join(id.shard()))?;
        fs::write(&file, codec::encode(object))?;
        Ok(id)
    }

    /// Whether an object with this id exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_file(id).exists()
    }

    /// Load an object of either kind.
    pub fn get(&self, id: &ObjectId) -> Result<Object, StoreError> {
        let file = self.object_file(id);
        let data = match fs::read(&file) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        codec::decode(&data).map_err(|source| StoreError::Corrupt {
            id: id.to_string(),
            source,
        })
    }

    /// Load a blob by id.
    pub fn get_blob(&self, id: &ObjectId) -> Result<Blob, StoreError> {
        match self.get(id)? {
            Object::Blob(blob) => Ok(blob),
            Object::Commit(_) => Err(StoreError::WrongKind {
                id: id.to_string(),
                expected: ObjectKind::Blob.name(),
            }),
        }
    }

    /// Load a commit by id.
    pub fn get_commit(&self, id: &ObjectId) -> Result<Commit, StoreError> {
        match self.get(id)? {
            Object::Commit(commit) => Ok(commit),
            Object::Blob(_) => Err(StoreError::WrongKind {
                id: id.to_string(),
                expected: ObjectKind::Commit.name(),
            }),
        }
    }

    /// Resolve a possibly-abbreviated object id.
    ///
    /// Prefixes shorter than [`MIN_PREFIX_LEN`] characters, prefixes
    /// matching nothing, and full-length ids that do not exist all
    /// return [`StoreError::NotFound`]; a prefix matching two objects
    /// returns [`StoreError::AmbiguousPrefix`].
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId, StoreError> {
        if prefix.len() == ID_HEX_LEN {
            let id = ObjectId::new(prefix)
                .map_err(|_| StoreError::NotFound(prefix.to_string()))?;
            return if self.contains(&id) {
                Ok(id)
            } else {
                Err(StoreError::NotFound(prefix.to_string()))
            };
        }
        if prefix.len() < MIN_PREFIX_LEN
            || prefix.len() > ID_HEX_LEN
            || !prefix.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err(StoreError::NotFound(prefix.to_string()));
        }

        let shard_dir = self.objects_dir.join(&prefix[..ID_SHARD_LEN]);
        let rest = &prefix[ID_SHARD_LEN..];
        let mut found: Option<ObjectId> = None;
        let entries = match fs::read_dir(&shard_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(prefix.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(rest) {
                let full = format!("{}{}", &prefix[..ID_SHARD_LEN], name);
                let id = ObjectId::new(full)
                    .map_err(|_| StoreError::NotFound(prefix.to_string()))?;
                if found.is_some() {
                    return Err(StoreError::AmbiguousPrefix(prefix.to_string()));
                }
                found = Some(id);
            }
        }
        found.ok_or_else(|| StoreError::NotFound(prefix.to_string()))
    }

    /// Every commit in the store, in unspecified order.
    ///
    /// Used by `global-log` and `find`. Blobs are skipped by their kind
    /// tag without attempting a commit parse.
    pub fn all_commits(&self) -> Result<Vec<(ObjectId, Commit)>, StoreError> {
        let mut commits = Vec::new();
        let shards = match fs::read_dir(&self.objects_dir) {
            Ok(shards) => shards,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(commits),
            Err(e) => return Err(e.into()),
        };
        for shard in shards {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let data = fs::read(entry.path())?;
                if !matches!(codec::peek_kind(&data), Ok(ObjectKind::Commit)) {
                    continue;
                }
                let name = format!(
                    "{}{}",
                    shard.file_name().to_string_lossy(),
                    entry.file_name().to_string_lossy()
                );
                let commit = codec::decode_commit(&data).map_err(|source| {
                    StoreError::Corrupt {
                        id: name.clone(),
                        source,
                    }
                })?;
                let id = ObjectId::new(name.clone())
                    .map_err(|_| StoreError::NotFound(name))?;
                commits.push((id, commit));
            }
        }
        Ok(commits)
    }
}
