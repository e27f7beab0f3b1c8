//! Error types for `vigia-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("visitor {0} is already checked out")]
  AlreadyCheckedOut(Uuid),

  #[error("alert {0} is already resolved")]
  AlreadyResolved(Uuid),

  #[error("unknown {0} tag: {1:?}")]
  UnknownTag(&'static str, String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
