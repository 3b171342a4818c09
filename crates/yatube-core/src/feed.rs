//! The feed assembler: ordered, paginated, comment-annotated post lists for
//! the four page contexts (home, group, profile, following).

use tracing::debug;

use crate::{
  paginate::{Page, Paginator},
  post::FeedPost,
  store::{BlogStore, PostFilter},
};

/// Posts per page on the home, group and following feeds.
pub const FEED_PAGE_SIZE: u64 = 10;

/// Posts per page on a profile.
pub const PROFILE_PAGE_SIZE: u64 = 5;

/// The context a feed is assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
  /// Every post.
  All,
  /// Posts in one group.
  Group(i64),
  /// Posts by one author.
  Author(i64),
  /// Posts by the authors the given user follows.
  Following(i64),
}

impl FeedScope {
  pub fn page_size(&self) -> u64 {
    match self {
      Self::Author(_) => PROFILE_PAGE_SIZE,
      Self::All | Self::Group(_) | Self::Following(_) => FEED_PAGE_SIZE,
    }
  }

  pub fn filter(&self) -> PostFilter {
    match *self {
      Self::All => PostFilter::All,
      Self::Group(id) => PostFilter::Group(id),
      Self::Author(id) => PostFilter::Author(id),
      Self::Following(id) => PostFilter::FollowedBy(id),
    }
  }
}

/// Build one page of the feed for `scope`.
///
/// `page` is the raw `?page=` value; see [`Paginator::resolve`] for how bad
/// values are handled. A following feed for a user with no subscriptions is
/// an unpaginated empty page and touches no post rows.
pub async fn assemble<S: BlogStore>(
  store: &S,
  scope: FeedScope,
  page: Option<&str>,
) -> Result<Page<FeedPost>, S::Error> {
  if let FeedScope::Following(user) = scope
    && store.following_count(user).await? == 0
  {
    debug!(user, "following feed short-circuited: no subscriptions");
    return Ok(Page::unpaginated());
  }

  let filter    = scope.filter();
  let count     = store.count_posts(filter).await?;
  let paginator = Paginator::new(count, scope.page_size());
  let meta      = paginator.meta(paginator.resolve(page));
  let items     = store.list_posts(filter, meta.per_page, meta.offset()).await?;

  Ok(Page::paginated(items, meta))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    follow::Follow,
    group::{Group, NewGroup},
    post::{Comment, CommentView, NewComment, NewPost, Post, PostEdit},
    store::StoreError,
    user::{NewUser, Session, User},
  };
  use chrono::Utc;

  #[derive(Debug, thiserror::Error)]
  #[error("fake")]
  struct FakeError;

  impl StoreError for FakeError {
    fn domain(&self) -> Option<&crate::Error> { None }
  }

  /// Answers only the queries the assembler needs; everything else panics.
  struct FakeStore {
    following: u64,
    posts:     u64,
  }

  fn post(id: i64) -> FeedPost {
    FeedPost {
      id,
      text: format!("post {id}"),
      pub_date: Utc::now(),
      image: None,
      author_id: 1,
      author_username: "leo".into(),
      author_name: "leo".into(),
      group_slug: None,
      group_title: None,
      comment_count: 0,
    }
  }

  impl BlogStore for FakeStore {
    type Error = FakeError;
    async fn create_user(&self, _: NewUser) -> Result<User, FakeError> { unimplemented!() }
    async fn get_user(&self, _: i64) -> Result<Option<User>, FakeError> { unimplemented!() }
    async fn get_user_by_username(&self, _: &str) -> Result<Option<User>, FakeError> { unimplemented!() }
    async fn set_password_hash(&self, _: i64, _: String) -> Result<(), FakeError> { unimplemented!() }
    async fn delete_user(&self, _: i64) -> Result<(), FakeError> { unimplemented!() }
    async fn create_session(&self, _: i64) -> Result<Session, FakeError> { unimplemented!() }
    async fn session_user(&self, _: &str) -> Result<Option<User>, FakeError> { unimplemented!() }
    async fn delete_session(&self, _: &str) -> Result<(), FakeError> { unimplemented!() }
    async fn create_group(&self, _: NewGroup) -> Result<Group, FakeError> { unimplemented!() }
    async fn get_group_by_slug(&self, _: &str) -> Result<Option<Group>, FakeError> { unimplemented!() }
    async fn list_groups(&self) -> Result<Vec<Group>, FakeError> { unimplemented!() }
    async fn delete_group(&self, _: i64) -> Result<(), FakeError> { unimplemented!() }
    async fn create_post(&self, _: NewPost) -> Result<Post, FakeError> { unimplemented!() }
    async fn get_post(&self, _: i64) -> Result<Option<Post>, FakeError> { unimplemented!() }
    async fn update_post(&self, _: i64, _: PostEdit) -> Result<Post, FakeError> { unimplemented!() }
    async fn get_feed_post(&self, _: i64) -> Result<Option<FeedPost>, FakeError> { unimplemented!() }
    async fn add_comment(&self, _: NewComment) -> Result<Comment, FakeError> { unimplemented!() }
    async fn list_comments(&self, _: i64) -> Result<Vec<CommentView>, FakeError> { unimplemented!() }
    async fn follow(&self, _: i64, _: i64) -> Result<Follow, FakeError> { unimplemented!() }
    async fn unfollow(&self, _: i64, _: i64) -> Result<(), FakeError> { unimplemented!() }
    async fn is_following(&self, _: i64, _: i64) -> Result<bool, FakeError> { unimplemented!() }
    async fn follower_count(&self, _: i64) -> Result<u64, FakeError> { unimplemented!() }

    async fn following_count(&self, _: i64) -> Result<u64, FakeError> { Ok(self.following) }

    async fn count_posts(&self, _: PostFilter) -> Result<u64, FakeError> { Ok(self.posts) }

    async fn list_posts(&self, _: PostFilter, limit: u64, offset: u64) -> Result<Vec<FeedPost>, FakeError> {
      let end = (offset + limit).min(self.posts);
      Ok((offset..end).map(|i| post(i as i64)).collect())
    }
  }

  #[test]
  fn page_sizes() {
    assert_eq!(FeedScope::All.page_size(), 10);
    assert_eq!(FeedScope::Group(1).page_size(), 10);
    assert_eq!(FeedScope::Following(1).page_size(), 10);
    assert_eq!(FeedScope::Author(1).page_size(), 5);
  }

  #[tokio::test]
  async fn following_nobody_is_unpaginated_and_skips_post_queries() {
    // `posts` would make list_posts return rows if it were reached.
    let store = FakeStore { following: 0, posts: 7 };
    let page = assemble(&store, FeedScope::Following(1), None).await.unwrap();
    assert!(page.is_empty());
    assert!(page.meta.is_none());
  }

  #[tokio::test]
  async fn following_someone_is_paginated() {
    let store = FakeStore { following: 2, posts: 3 };
    let page = assemble(&store, FeedScope::Following(1), None).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.meta.unwrap().num_pages, 1);
  }

  #[tokio::test]
  async fn author_feed_uses_profile_page_size_and_clamps() {
    let store = FakeStore { following: 0, posts: 12 };
    let page = assemble(&store, FeedScope::Author(1), Some("42")).await.unwrap();
    let meta = page.meta.unwrap();
    assert_eq!(meta.number, 3);
    assert_eq!(meta.num_pages, 3);
    assert_eq!(page.items.len(), 2);
  }
}
