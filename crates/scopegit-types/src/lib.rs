//! Foundation types for scopegit.
//!
//! This crate provides the shared vocabulary used by every other scopegit
//! crate: the closed error taxonomy, the three-state status triple reported
//! by the Git engine, and the shapes exchanged with the scoped storage
//! backend.
//!
//! # Key Types
//!
//! - [`VcsError`]: The closed error taxonomy shared by the translator and the adapter
//! - [`RepositoryError`]: Repository-level failure kinds
//! - [`StatusTriple`]: `(head, workdir, stage)` presence tuple for one path
//! - [`StorageLocator`]: Opaque backend address (URI) for a storage node
//! - [`StorageEntry`]: Minimal stat record yielded by the storage backend

pub mod entry;
pub mod error;
pub mod locator;
pub mod percent;
pub mod status;

pub use entry::{EntryKind, StorageEntry};
pub use error::{ErrorKind, RepositoryError, VcsError, VcsResult};
pub use locator::StorageLocator;
pub use status::StatusTriple;
