//! The follow graph as seen from the browser: the followed-authors feed and
//! the follow/unfollow links on profiles.

use axum::{
  extract::{Path, Query, State},
  response::{Html, Redirect},
};
use tracing::{info, warn};
use yatube_core::{
  Error as DomainError,
  feed::{self, FeedScope},
  store::{BlogStore, StoreError as _},
};

use crate::{
  AppState,
  auth::LoginRequired,
  error::{Error, Result},
  handlers::{PageQuery, author_or_404, profile_url},
  views::{Chrome, FollowTemplate, render},
};

/// Posts by every author the visitor follows.
pub async fn follow_index<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Query(query): Query<PageQuery>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  let page = feed::assemble(&*state.store, FeedScope::Following(user.id), query.page.as_deref())
    .await
    .map_err(Error::store)?;
  render(&FollowTemplate { chrome: Chrome::new(Some(&user)), page })
}

/// Following yourself is silently ignored; following twice is logged and
/// otherwise a no-op.
pub async fn profile_follow<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Path(username): Path<String>,
) -> Result<Redirect>
where
  S: BlogStore + Clone + 'static,
{
  let author = author_or_404(&*state.store, &username).await?;
  if author.id != user.id {
    match state.store.follow(user.id, author.id).await {
      Ok(_) => info!(follower = %user.username, author = %author.username, "followed"),
      Err(e) if matches!(e.domain(), Some(DomainError::AlreadyFollowing { .. })) => {
        warn!(follower = %user.username, author = %author.username, "already following");
      }
      Err(e) => return Err(Error::store(e)),
    }
  }
  Ok(Redirect::to(&profile_url(&author.username)))
}

pub async fn profile_unfollow<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Path(username): Path<String>,
) -> Result<Redirect>
where
  S: BlogStore + Clone + 'static,
{
  let author = author_or_404(&*state.store, &username).await?;
  match state.store.unfollow(user.id, author.id).await {
    Ok(()) => info!(follower = %user.username, author = %author.username, "unfollowed"),
    Err(e) if matches!(e.domain(), Some(DomainError::NotFollowing { .. })) => {
      warn!(follower = %user.username, author = %author.username, "was not following");
    }
    Err(e) => return Err(Error::store(e)),
  }
  Ok(Redirect::to(&profile_url(&author.username)))
}
