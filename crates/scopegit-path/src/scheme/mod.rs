//! Locator scheme strategies.
//!
//! Each supported URI family is one [`LocatorScheme`]. The
//! [`PathTranslator`](crate::PathTranslator) holds them in a dispatch table
//! and asks each in turn whether it claims a locator (for decoding) or a
//! canonical path (for encoding).

mod file;
mod home;
mod primary;

pub use file::FileScheme;
pub use home::HomeTreeScheme;
pub use primary::PrimaryTreeScheme;

use std::fmt;

use scopegit_types::{StorageLocator, VcsResult};

use crate::context::ActiveRootContext;

/// One bidirectional path/locator encoding.
pub trait LocatorScheme: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this scheme can decode `locator`.
    fn matches_locator(&self, locator: &str) -> bool;

    /// Whether this scheme encodes the canonical `path`.
    fn matches_path(&self, path: &str) -> bool;

    /// Decode a locator into a canonical path (not yet normalized).
    fn decode(&self, locator: &str) -> VcsResult<String>;

    /// Encode a normalized canonical path.
    fn encode(&self, path: &str, ctx: &ActiveRootContext) -> VcsResult<StorageLocator>;
}
