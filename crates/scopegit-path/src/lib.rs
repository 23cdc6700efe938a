//! Path translation for scopegit.
//!
//! Path-based tools (the Git engine in particular) speak canonical POSIX
//! paths; the scoped storage backend speaks URIs whose shape depends on which
//! storage root granted access. This crate maps between the two.
//!
//! # Modules
//!
//! - [`posix`]: pure canonical-path helpers (`normalize`, `dirname`, ...)
//! - [`scheme`]: one [`LocatorScheme`] strategy per supported URI family
//! - [`translator`]: the [`PathTranslator`] dispatch table over those strategies
//! - [`context`]: the [`ActiveRootContext`] that disambiguates home-relative encodings
//! - [`config`]: [`TranslatorConfig`] naming the authorities and roots in use
//!
//! Nothing here performs I/O.

pub mod config;
pub mod context;
pub mod posix;
pub mod scheme;
pub mod translator;

pub use scopegit_types::percent;

pub use config::{MainRootScheme, TranslatorConfig};
pub use context::{ActiveRootContext, SharedRootContext};
pub use posix::{basename, dirname, join, normalize, resolve, split};
pub use scheme::{FileScheme, HomeTreeScheme, LocatorScheme, PrimaryTreeScheme};
pub use translator::PathTranslator;
