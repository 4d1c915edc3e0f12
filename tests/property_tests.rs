//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use strata::core::codec;
use strata::core::index::StagingIndex;
use strata::core::object::{Blob, Commit, Object};
use strata::core::paths::RepoPaths;
use strata::core::types::{BranchName, ObjectId, RelPath};

/// Strategy for a single path component.
fn path_component() -> impl Strategy<Value = String> {
    "[a-z0-9_][a-z0-9_.-]{0,8}".prop_filter("no dot components", |c| c != "." && c != "..")
}

/// Strategy for valid repository-relative paths.
fn rel_path() -> impl Strategy<Value = String> {
    prop::collection::vec(path_component(), 1..4).prop_map(|parts| parts.join("/"))
}

/// Strategy for valid hex object ids.
fn hex_id() -> impl Strategy<Value = String> {
    "[0-9a-f]{64}"
}

/// Strategy for arbitrary (possibly non-UTF-8) blob content.
fn blob_content() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

proptest! {
    /// Any valid id round-trips through serde.
    #[test]
    fn object_id_serde_roundtrip(hex in hex_id()) {
        let id = ObjectId::new(&hex).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(id, parsed);
    }

    /// Shard and rest always reassemble the full id.
    #[test]
    fn object_id_shard_split(hex in hex_id()) {
        let id = ObjectId::new(&hex).unwrap();
        prop_assert_eq!(format!("{}{}", id.shard(), id.rest()), hex);
    }

    /// Uppercase hex is rejected, never silently folded.
    #[test]
    fn object_id_rejects_uppercase(hex in "[0-9a-f]{63}[A-F]") {
        prop_assert!(ObjectId::new(&hex).is_err());
    }

    /// Any valid relative path round-trips through serde.
    #[test]
    fn rel_path_serde_roundtrip(path in rel_path()) {
        let rel = RelPath::new(&path).unwrap();
        let json = serde_json::to_string(&rel).unwrap();
        let parsed: RelPath = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(rel, parsed);
    }

    /// Blob ids are a pure function of path and content.
    #[test]
    fn blob_id_is_deterministic(path in rel_path(), content in blob_content()) {
        let rel = RelPath::new(&path).unwrap();
        let a = Blob::new(rel.clone(), content.clone());
        let b = Blob::new(rel, content);
        prop_assert_eq!(a.id(), b.id());
    }

    /// Different content never collides with the same path.
    #[test]
    fn blob_id_depends_on_content(path in rel_path(), content in blob_content()) {
        let rel = RelPath::new(&path).unwrap();
        let mut other = content.clone();
        other.push(0x01);
        let a = Blob::new(rel.clone(), content);
        let b = Blob::new(rel, other);
        prop_assert_ne!(a.id(), b.id());
    }

    /// The same bytes under two different paths are distinct blobs.
    #[test]
    fn blob_id_depends_on_path(path in rel_path(), content in blob_content()) {
        let rel = RelPath::new(&path).unwrap();
        let other = RelPath::new(format!("{path}.x")).unwrap();
        let a = Blob::new(rel, content.clone());
        let b = Blob::new(other, content);
        prop_assert_ne!(a.id(), b.id());
    }

    /// Every blob survives the storage encoding unchanged.
    #[test]
    fn codec_blob_roundtrip(path in rel_path(), content in blob_content()) {
        let blob = Blob::new(RelPath::new(&path).unwrap(), content);
        let encoded = codec::encode(&Object::Blob(blob.clone()));
        prop_assert_eq!(codec::decode(&encoded).unwrap(), Object::Blob(blob));
    }

    /// Truncating an encoded object always fails cleanly, never panics.
    #[test]
    fn codec_rejects_truncation(path in rel_path(), content in blob_content(), cut in 0usize..64) {
        let blob = Blob::new(RelPath::new(&path).unwrap(), content);
        let encoded = codec::encode(&Object::Blob(blob));
        let cut = cut.min(encoded.len().saturating_sub(1));
        prop_assert!(codec::decode(&encoded[..cut]).is_err());
    }

    /// A path is staged for addition or removal, never both, under any
    /// interleaving of staging operations.
    #[test]
    fn index_addition_and_removal_are_exclusive(ops in prop::collection::vec(any::<bool>(), 1..20)) {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = RepoPaths::new(dir.path().to_path_buf());
        std::fs::create_dir_all(paths.strata_dir()).unwrap();
        let mut index = StagingIndex::create(&paths).unwrap();

        let path = RelPath::new("a.txt").unwrap();
        let blob = Blob::new(path.clone(), b"x".to_vec()).id();
        for &add in &ops {
            if add {
                index.stage_addition(path.clone(), blob.clone()).unwrap();
            } else {
                index.stage_removal(path.clone(), blob.clone()).unwrap();
            }
            let both = index.additions().contains_key(&path)
                && index.removals().contains_key(&path);
            prop_assert!(!both);
        }
    }

    /// Commit ids commit to the message.
    #[test]
    fn commit_id_depends_on_message(message in "[ -~]{1,40}") {
        let parent = Commit::initial().id();
        let files = std::collections::BTreeMap::new();
        let a = Commit::new(&message, vec![parent.clone()], files.clone());
        let mut b = a.clone();
        b.message.push('!');
        prop_assert_ne!(a.id(), b.id());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Branch names containing slashes map to flat ref file names.
    #[test]
    fn branch_file_name_never_nests(name in "[a-z]{1,8}(/[a-z]{1,8}){0,2}") {
        let branch = BranchName::new(&name).unwrap();
        prop_assert!(!branch.file_name().contains('/'));
    }
}
