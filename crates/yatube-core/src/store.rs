//! The `BlogStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `yatube-store-sqlite`).
//! The web layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  follow::{Follow, FollowStats},
  group::{Group, NewGroup},
  post::{Comment, CommentView, FeedPost, NewComment, NewPost, Post, PostEdit},
  user::{NewUser, Session, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which posts a feed query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
  All,
  Group(i64),
  Author(i64),
  /// Posts whose author is followed by the given user.
  FollowedBy(i64),
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors must be able to surface the domain error they carry, so
/// callers can tell "already following" from "disk full" without knowing the
/// concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Yatube storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BlogStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with [`crate::Error::UsernameTaken`] if the
  /// username exists.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Replace a user's password hash.
  fn set_password_hash(
    &self,
    user_id: i64,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a user together with their posts, comments, follow edges and
  /// sessions. Fails with [`crate::Error::UserNotFound`] if absent.
  fn delete_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Open a new session for `user_id` with a fresh random key.
  fn create_session(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Resolve a session key to its user. Returns `None` for unknown keys.
  fn session_user<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Delete a session. Deleting an unknown key is not an error.
  fn delete_session<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Persist a group. Fails with [`crate::Error::SlugTaken`] or
  /// [`crate::Error::InvalidSlug`].
  fn create_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + 'a;

  /// All groups ordered by title, for the post form's group selector.
  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Delete a group. Its posts survive with no group.
  fn delete_group(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a post. The `pub_date` timestamp is set by the store.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Apply an edit, leaving author and `pub_date` untouched.
  fn update_post(
    &self,
    id: i64,
    edit: PostEdit,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Number of posts matching `filter`.
  fn count_posts(
    &self,
    filter: PostFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// One window of the posts matching `filter`, newest first (ties broken by
  /// id descending), each annotated with its comment count.
  fn list_posts(
    &self,
    filter: PostFilter,
    limit: u64,
    offset: u64,
  ) -> impl Future<Output = Result<Vec<FeedPost>, Self::Error>> + Send + '_;

  /// A single post rendered the same way as a feed entry.
  fn get_feed_post(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<FeedPost>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a post, oldest first.
  fn list_comments(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Vec<CommentView>, Self::Error>> + Send + '_;

  // ── Follow graph ──────────────────────────────────────────────────────

  /// Create the edge `follower → author`. Fails with
  /// [`crate::Error::AlreadyFollowing`] if it exists.
  fn follow(
    &self,
    follower: i64,
    author: i64,
  ) -> impl Future<Output = Result<Follow, Self::Error>> + Send + '_;

  /// Delete the edge `follower → author`. Fails with
  /// [`crate::Error::NotFollowing`] if it does not exist.
  fn unfollow(
    &self,
    follower: i64,
    author: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn is_following(
    &self,
    follower: i64,
    author: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Incoming edges.
  fn follower_count(
    &self,
    user: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Outgoing edges.
  fn following_count(
    &self,
    user: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Both counts in one call.
  fn follow_stats(
    &self,
    user: i64,
  ) -> impl Future<Output = Result<FollowStats, Self::Error>> + Send + '_ {
    async move {
      Ok(FollowStats {
        followers: self.follower_count(user).await?,
        following: self.following_count(user).await?,
      })
    }
  }
}
