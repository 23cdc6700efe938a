//! The scopegit session layer.
//!
//! A [`VersionControl`] session ties together the pieces a version-control
//! sidebar needs: the selected folder and the active root it implies, the
//! scoped filesystem and Git engine, the live status view, and the access
//! token used for transfers. Every user command goes through the session.
//!
//! # Key Types
//!
//! - [`VersionControl`] -- folder detection, staging, commits, branches,
//!   remotes, and transfers
//! - [`SidebarConfig`] -- TOML-loadable session settings
//! - [`CredentialProvider`] -- prompts for a token when a remote asks for one
//! - [`TransferObserver`] -- receives progress and status lines
//! - [`SdkError`] -- everything a command can fail with, with user-facing text

pub mod config;
pub mod credentials;
pub mod error;
pub mod outcome;
pub mod session;

pub use config::SidebarConfig;
pub use credentials::{
    format_progress, CredentialProvider, NoCredentials, Silent, StaticToken, TransferObserver,
};
pub use error::{SdkError, SdkResult};
pub use outcome::{CommitOutcome, CommitRequest, PullOutcome, RefreshOutcome};
pub use session::{repository_name, VersionControl};
