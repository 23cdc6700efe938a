//! Filesystem adapter for scopegit.
//!
//! Path-based tools expect a POSIX-like async filesystem. [`ScopedFs`]
//! provides one over a [`StorageBackend`](scopegit_store::StorageBackend):
//! every operation normalizes its path, encodes it under the current
//! [`ActiveRootContext`](scopegit_path::ActiveRootContext), and calls the
//! backend primitive for the resulting locator.
//!
//! # Surfaces
//!
//! - [`FsClient`] -- the awaitable operation set, implemented by [`ScopedFs`]
//! - [`CallbackFs`] -- single-fire callback surface over any [`FsClient`]
//!
//! # Policies
//!
//! - `read_file` reports a directory target as not found.
//! - `unlink` is best-effort: backend failures are logged, never returned.
//! - `symlink` and `readlink` always fail; the backend has no links.
//! - Nothing here holds a lock across a `stat` and the mutation that
//!   follows it. A concurrent writer can win the race between them.

pub mod callback;
pub mod data;
pub mod options;
pub mod scoped;
pub mod stats;
pub mod traits;

pub use callback::{ArgSlot, Callback, CallbackFs, OnceCallback};
pub use data::{FileData, RawBytes, WriteData};
pub use options::{Encoding, MkdirOptions, ReadOptions, WriteOptions};
pub use scoped::ScopedFs;
pub use stats::{StatKind, Stats};
pub use traits::FsClient;
