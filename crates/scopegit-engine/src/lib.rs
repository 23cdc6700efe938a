//! The Git engine boundary for scopegit.
//!
//! The sidebar treats the Git object graph, refs, and network transport as a
//! black box reached through the [`GitEngine`] trait. Everything the engine
//! reads or writes in the working copy goes through the filesystem adapter,
//! so it sees exactly the paths the user granted.
//!
//! # Key Types
//!
//! - [`GitEngine`] -- async engine contract (status matrix, index, commits, refs, transfers)
//! - [`TransferHooks`] -- progress, message, and credential callbacks for long operations
//! - [`StatusRow`] -- one `(path, head, workdir, stage)` row of the status matrix
//! - [`Oid`] -- object identifier
//! - [`InMemoryEngine`] -- in-memory engine over a [`FsClient`](scopegit_fs::FsClient), with an
//!   in-process [`RemoteHub`] standing in for the network
//!
//! # Status Matrix Encoding
//!
//! | column  | 0      | 1                  | 2                     | 3                        |
//! |---------|--------|--------------------|-----------------------|--------------------------|
//! | head    | absent | present            |                       |                          |
//! | workdir | absent | identical to HEAD  | different from HEAD   |                          |
//! | stage   | absent | identical to HEAD  | identical to workdir  | different from workdir   |

pub mod error;
pub mod hooks;
pub mod memory;
pub mod names;
pub mod oid;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use hooks::{NoHooks, TransferHooks};
pub use memory::{InMemoryEngine, RemoteHub};
pub use names::{validate_branch_name, validate_remote_name};
pub use oid::{ObjectHasher, Oid};
pub use traits::GitEngine;
pub use types::{
    CloneOptions, CommitInfo, Credentials, FetchOptions, FetchOutcome, Progress, PullOptions,
    PushOptions, PushOutcome, RemoteInfo, Signature, StatusRow, TreeEntry, TreeEntryKind,
};
