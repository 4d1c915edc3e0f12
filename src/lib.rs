//! Strata - a small local version-control engine
//!
//! Strata is a single-binary educational clone of a distributed VCS: a
//! content-addressable object store, a commit DAG, a staging index, a
//! three-way merge, and a "remote" synchronization protocol that treats
//! another repository reachable by filesystem path as the far side.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to repo)
//! - [`repo`] - Repository session and the operations that mutate it:
//!   staging, commit-graph traversal, working-tree materialization, merge,
//!   and remote sync
//! - [`core`] - Domain types, object model, codec, and storage leaves
//! - [`ui`] - User-facing output utilities
//!
//! # Correctness Invariants
//!
//! Strata maintains the following invariants:
//!
//! 1. Objects are immutable and content-addressed; a stored object is never
//!    rewritten or reclaimed
//! 2. The commit parent graph is acyclic: a new commit's parents are always
//!    pre-existing ids
//! 3. A path is never staged for addition and removal at the same time
//! 4. HEAD always names a branch; there is no detached state
//! 5. At most one mutating command runs against a repository at a time,
//!    enforced by an exclusive repository lock

pub mod cli;
pub mod core;
pub mod repo;
pub mod ui;
