//! Route handlers, one module per area of the site.

pub mod accounts;
pub mod follow;
pub mod pages;
pub mod posts;

use serde::Deserialize;
use yatube_core::{
  post::{FeedPost, Post},
  store::{BlogStore, PostFilter},
  user::User,
};

use crate::{
  error::{Error, Result},
  views::ProfileCard,
};

/// `?page=` on feed pages. Kept as a string: unparseable values are not an
/// error, they select page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<String>,
}

pub(crate) fn post_url(username: &str, post_id: i64) -> String {
  format!("/{username}/{post_id}/")
}

pub(crate) fn profile_url(username: &str) -> String {
  format!("/{username}/")
}

pub(crate) async fn author_or_404<S: BlogStore>(store: &S, username: &str) -> Result<User> {
  store
    .get_user_by_username(username)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)
}

fn parse_post_id(raw: &str) -> Result<i64> {
  raw.parse().map_err(|_| Error::NotFound)
}

/// Resolve `/{username}/{post_id}/` for display. The post must belong to the
/// named author.
pub(crate) async fn feed_post_or_404<S: BlogStore>(
  store: &S,
  username: &str,
  post_id: &str,
) -> Result<(User, FeedPost)> {
  let author = author_or_404(store, username).await?;
  let id = parse_post_id(post_id)?;
  let post = store
    .get_feed_post(id)
    .await
    .map_err(Error::store)?
    .filter(|p| p.author_id == author.id)
    .ok_or(Error::NotFound)?;
  Ok((author, post))
}

/// Like [`feed_post_or_404`] but returns the bare row, for editing.
pub(crate) async fn post_or_404<S: BlogStore>(
  store: &S,
  username: &str,
  post_id: &str,
) -> Result<(User, Post)> {
  let author = author_or_404(store, username).await?;
  let id = parse_post_id(post_id)?;
  let post = store
    .get_post(id)
    .await
    .map_err(Error::store)?
    .filter(|p| p.author_id == author.id)
    .ok_or(Error::NotFound)?;
  Ok((author, post))
}

pub(crate) async fn profile_card<S: BlogStore>(
  store: &S,
  author: &User,
  viewer: Option<&User>,
) -> Result<ProfileCard> {
  let stats = store.follow_stats(author.id).await.map_err(Error::store)?;
  let post_count = store
    .count_posts(PostFilter::Author(author.id))
    .await
    .map_err(Error::store)?;
  let (subscribed, can_follow) = match viewer {
    Some(viewer) if viewer.id != author.id => {
      let subscribed = store
        .is_following(viewer.id, author.id)
        .await
        .map_err(Error::store)?;
      (subscribed, true)
    }
    _ => (false, false),
  };
  Ok(ProfileCard {
    username: author.username.clone(),
    name: author.display_name(),
    post_count,
    followers: stats.followers,
    following: stats.following,
    subscribed,
    can_follow,
  })
}
