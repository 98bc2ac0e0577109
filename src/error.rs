//! Error taxonomy shared by every pipeline and engine operation.
//!
//! All submission, approval, and export operations surface one of these
//! variants synchronously. The HTTP layer in [`crate::server`] maps them to
//! status codes; the CLI prints them through `anyhow`.

use thiserror::Error;

/// Crate-wide error type.
///
/// - [`Validation`](Error::Validation) — user-correctable input problems
///   (bad filename, content too short, filename already queued).
/// - [`NotFound`](Error::NotFound) — operating on an item or chunk that is
///   not in the expected stage/status.
/// - [`Config`](Error::Config) — missing or malformed export credentials
///   or repository targets.
/// - [`Remote`](Error::Remote) — an individual push failure. `push_all`
///   converts these into result counts instead of propagating them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Remote(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Error::Remote(msg.into())
    }
}
