//! Error types for `yatube-core`.

use thiserror::Error;

/// Domain-level failures. Storage backends wrap these in their own error type
/// and expose them through [`crate::store::StoreError::domain`].
#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("group not found: {0}")]
  GroupNotFound(String),

  #[error("post not found: {0}")]
  PostNotFound(i64),

  #[error("username is already taken: {0}")]
  UsernameTaken(String),

  #[error("group slug is already taken: {0}")]
  SlugTaken(String),

  #[error("invalid group slug: {0:?}")]
  InvalidSlug(String),

  #[error("user {follower} already follows user {author}")]
  AlreadyFollowing { follower: i64, author: i64 },

  #[error("user {follower} does not follow user {author}")]
  NotFollowing { follower: i64, author: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
