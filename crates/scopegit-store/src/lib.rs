//! Scoped storage backends for scopegit.
//!
//! The storage layer is addressed by [`StorageLocator`](scopegit_types::StorageLocator)
//! rather than by path: every primitive takes the locator of the node it
//! touches, and nodes created by the backend are returned as fresh locators.
//!
//! # Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`InMemoryStorage`] -- map-based store for tests and embedding
//! - [`LocalStorage`] -- maps canonical paths onto a directory on disk
//!
//! # Rules
//!
//! 1. A backend never fabricates parents: creating a node under a missing
//!    parent fails with [`StorageError::NotFound`].
//! 2. `stat` on a missing node succeeds with `exists == false`.
//! 3. `delete` removes a directory together with its descendants.

pub mod error;
pub mod local;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use local::LocalStorage;
pub use memory::InMemoryStorage;
pub use traits::{ChildEntry, StorageBackend};
