//! core
//!
//! Core domain types and storage leaves for Strata.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId, BranchName, RelPath
//! - [`object`] - The object model: Blob and Commit records and their ids
//! - [`codec`] - Versioned on-disk envelope for stored objects
//! - [`store`] - Content-addressed object store
//! - [`refs`] - Durable pointers: HEAD and branch heads
//! - [`index`] - The staging index
//! - [`paths`] - Centralized path routing for the `.strata` layout
//! - [`lock`] - Exclusive repository lock
//! - [`config`] - Per-repository configuration
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - On-disk records are self-describing and strictly parsed
//! - All hashing is deterministic

pub mod codec;
pub mod config;
pub mod index;
pub mod lock;
pub mod object;
pub mod paths;
pub mod refs;
pub mod store;
pub mod types;
