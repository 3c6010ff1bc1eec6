//! # Quill Engine
//!
//! The deterministic reconciliation core of Quill, a local-first quote
//! collection. It owns the in-memory record store and the server-wins
//! merge between the local record list and a pulled remote snapshot -
//! the same inputs always produce the same outputs.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of storage, network, or clocks
//! - **Deterministic**: same inputs always produce same outputs
//! - **Testable**: pure logic, no mocks needed
//! - **Portable**: runs anywhere Rust runs
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A quote is stored as a [`Record`] with:
//! - A unique id, namespaced by provenance (`local-...` / `remote-...`)
//! - The quote text and a display category
//! - A dirty flag - set on local mutation, cleared on remote
//!   acknowledgment
//! - An [`Origin`] and a client-assigned `updated_at` timestamp
//!
//! ### Store
//!
//! The [`RecordStore`] holds the ordered record sequence and is the sole
//! owner of record identity. Mutations are synchronous and never persist
//! implicitly; callers save through their persistence gateway afterwards.
//!
//! ### Merge
//!
//! [`merge_remote`] folds a full remote snapshot into the store as a
//! deterministic upsert keyed by id. On a content conflict the server
//! wins unconditionally; the losing local state is captured as a
//! [`ConflictRecord`] so a caller can audit it or put it back with
//! [`restore_snapshot`].
//!
//! ## Quick Start
//!
//! ```rust
//! use quill_engine::{merge_remote, Record, RecordStore, RemoteRecord};
//!
//! let mut store = RecordStore::new();
//! store.add(Record::local("local-1", "Less is more.", "design", 1000)).unwrap();
//!
//! let snapshot = vec![
//!     RemoteRecord::new("local-1", "Less, but better.", "design"),
//!     RemoteRecord::new("remote-2", "Stay hungry.", "life"),
//! ];
//! let report = merge_remote(&mut store, &snapshot, 2000);
//!
//! assert_eq!(store.len(), 2);
//! assert_eq!(report.conflict_count(), 1);
//! assert_eq!(report.conflicts[0].local_snapshot.text, "Less is more.");
//! assert_eq!(store.find("local-1").unwrap().text, "Less, but better.");
//! ```
//!
//! ## Persistence
//!
//! The [`codec`] module serializes the record list as the flat JSON array
//! the persistence gateway stores; imports are validated atomically.

pub mod codec;
pub mod error;
pub mod merge;
pub mod record;
pub mod store;

// Re-export main types at crate root
pub use error::Error;
pub use merge::{merge_remote, restore_snapshot, ConflictRecord, MergeReport};
pub use record::{Origin, Record, RemoteRecord};
pub use store::RecordStore;

/// Type aliases for clarity
pub type RecordId = String;
pub type Timestamp = i64;
