//! # Quill Client
//!
//! Async sync orchestration over the [`quill_engine`] core. The client
//! owns a [`Reconciler`] that pushes locally dirty records, pulls the
//! remote snapshot, and merges it server-wins, plus a [`SyncPoller`]
//! that triggers cycles on an interval.
//!
//! All IO happens behind three seams supplied by the embedding
//! application: [`PersistenceGateway`] for durable storage,
//! [`RemoteGateway`] for the server, and [`Notifier`] for the
//! presentation layer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quill_client::{NullNotifier, Reconciler, SyncPoller};
//! use std::sync::Arc;
//! use std::time::Duration;
//! # use quill_client::{PersistenceGateway, RemoteGateway, Result};
//! # use quill_engine::{ConflictRecord, Record, RecordId, RemoteRecord};
//! # struct Disk; struct Api;
//! # #[async_trait::async_trait]
//! # impl PersistenceGateway for Disk {
//! #     async fn load_all(&self) -> Result<Option<Vec<Record>>> { Ok(None) }
//! #     async fn save_all(&self, _: &[Record]) -> Result<()> { Ok(()) }
//! #     async fn load_conflicts(&self) -> Result<Option<Vec<ConflictRecord>>> { Ok(None) }
//! #     async fn save_conflicts(&self, _: &[ConflictRecord]) -> Result<()> { Ok(()) }
//! # }
//! # #[async_trait::async_trait]
//! # impl RemoteGateway for Api {
//! #     async fn fetch_remote(&self, _: usize) -> Result<Vec<RemoteRecord>> { Ok(vec![]) }
//! #     async fn push_record(&self, r: &Record) -> Result<RecordId> { Ok(r.id.clone()) }
//! # }
//!
//! # async fn run() -> Result<()> {
//! let reconciler = Arc::new(Reconciler::new(Api, Disk, NullNotifier));
//! reconciler.load().await?;
//! reconciler.add_quote("Stay hungry, stay foolish.", "life").await?;
//!
//! let mut poller = SyncPoller::new(Arc::clone(&reconciler));
//! poller.start(Duration::from_secs(30));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod poller;
pub mod reconciler;

pub use error::{Result, SyncError};
pub use gateway::{Notifier, NullNotifier, PersistenceGateway, RemoteGateway};
pub use poller::SyncPoller;
pub use reconciler::{Reconciler, SyncConfig, SyncReport};
