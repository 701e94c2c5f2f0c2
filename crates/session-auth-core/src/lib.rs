//! Core building blocks for session-auth.
//!
//! Holds the option types and the generic deep-merge used to layer them,
//! the database adapter trait, persisted models, the session object handed
//! to callbacks, and the shared error type.

pub mod callbacks;
pub mod db;
pub mod env;
pub mod error;
pub mod merge;
pub mod options;
pub mod session;

// Re-exports for convenience
pub use callbacks::{Callbacks, SessionCallback};
pub use db::adapter::Adapter;
pub use db::models::{SessionRecord, User};
pub use env::DeploymentStage;
pub use error::{ApiError, AuthError, ErrorCode, Result};
pub use merge::deep_merge;
pub use options::{AuthOptions, AuthSettings, OptionsLayer};
pub use session::{AuthSession, SessionUser};
