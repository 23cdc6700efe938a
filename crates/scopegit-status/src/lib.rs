//! Status reconciliation for scopegit.
//!
//! The Git engine reports one `(head, workdir, stage)` triple per path. This
//! crate turns those triples into user-facing records, groups them into
//! staged and unstaged lists, and keeps the lists current as files change.
//!
//! # Key Types
//!
//! - [`Classification`] -- symbol, staged flag, and description for one triple
//! - [`FileStatusRecord`] -- a classified path
//! - [`StatusView`] -- the staged/unstaged record lists
//! - [`WatchRegistry`] -- at most one change-watch per path
//! - [`StatusReconciler`] -- full rebuilds, incremental patches, and the
//!   inactive-view buffer

pub mod classify;
pub mod reconciler;
pub mod record;
pub mod view;
pub mod watch;

pub use classify::{classify, lookup, Classification, CLASSIFICATIONS};
pub use reconciler::StatusReconciler;
pub use record::FileStatusRecord;
pub use view::{PatchOutcome, StatusView};
pub use watch::{FileWatcher, RecordingWatcher, WatchCallback, WatchRegistry};
