//! Application-layer error type.

use thiserror::Error;

/// An error returned by a permission-checked operation.
///
/// `Forbidden` is the ordinary rejected-operation outcome, not an
/// exceptional condition; `Store` wraps a backend failure, which the caller
/// must surface to the end user rather than swallow.
#[derive(Debug, Error)]
pub enum Error {
  #[error("forbidden: requires {0}")]
  Forbidden(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}
