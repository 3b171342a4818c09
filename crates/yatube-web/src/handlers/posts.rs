//! Feeds, single posts, the post form and comments.

use std::sync::Arc;

use askama::Template as _;
use axum::{
  Form,
  extract::{Path, Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Multipart;
use tracing::{debug, info};
use yatube_core::{
  feed::{self, FeedScope},
  post::{ImageChange, NewComment, NewPost, Post, PostEdit},
  store::BlogStore,
  user::User,
};

use crate::{
  AppState,
  auth::{CurrentUser, LoginRequired},
  cache::fragment_key,
  error::{Error, Result},
  forms::{CommentForm, PostForm, PostFormErrors, ValidPost},
  handlers::{
    PageQuery, author_or_404, feed_post_or_404, post_or_404, post_url, profile_card,
  },
  media,
  views::{
    Chrome, FeedFragment, GroupOption, GroupTemplate, IndexTemplate, PostFormTemplate,
    PostTemplate, ProfileTemplate, render,
  },
};

/// Cache fragment name of the home page's post list.
pub const INDEX_FRAGMENT: &str = "index_page";

/// The home page's only vary argument, so every request shares one slot.
pub const INDEX_VARY: &str = "1";

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// The home page. The post list lives in a single global cache slot: it may
/// lag behind the database by up to the cache TTL, and whichever page filled
/// the slot is served to every request until it expires.
pub async fn index<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(query): Query<PageQuery>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  let key = fragment_key(INDEX_FRAGMENT, &[INDEX_VARY]);
  let feed_html = match state.cache.get(&key).await {
    Some(html) => html,
    None => {
      debug!(%key, "page cache miss");
      let page = feed::assemble(&*state.store, FeedScope::All, query.page.as_deref())
        .await
        .map_err(Error::store)?;
      let html: Arc<str> = FeedFragment { page }.render()?.into();
      state.cache.set(key, html.clone(), state.cache.default_ttl()).await;
      html
    }
  };
  render(&IndexTemplate { chrome: Chrome::new(user.as_ref()), feed_html })
}

pub async fn group_posts<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(slug): Path<String>,
  Query(query): Query<PageQuery>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  let group = state
    .store
    .get_group_by_slug(&slug)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;
  let page = feed::assemble(&*state.store, FeedScope::Group(group.id), query.page.as_deref())
    .await
    .map_err(Error::store)?;
  render(&GroupTemplate { chrome: Chrome::new(user.as_ref()), group, page })
}

pub async fn profile<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(username): Path<String>,
  Query(query): Query<PageQuery>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  let author = author_or_404(&*state.store, &username).await?;
  let page = feed::assemble(&*state.store, FeedScope::Author(author.id), query.page.as_deref())
    .await
    .map_err(Error::store)?;
  let profile = profile_card(&*state.store, &author, user.as_ref()).await?;
  render(&ProfileTemplate { chrome: Chrome::new(user.as_ref()), profile, page })
}

// ─── Single post and comments ────────────────────────────────────────────────

async fn post_page<S: BlogStore>(
  store: &S,
  viewer: Option<&User>,
  username: &str,
  post_id: &str,
  comment_text: String,
  comment_error: Option<String>,
) -> Result<Html<String>> {
  let (author, post) = feed_post_or_404(store, username, post_id).await?;
  let comments = store.list_comments(post.id).await.map_err(Error::store)?;
  let profile = profile_card(store, &author, viewer).await?;
  render(&PostTemplate {
    chrome: Chrome::new(viewer),
    profile,
    can_edit: viewer.is_some_and(|v| v.id == author.id),
    can_comment: viewer.is_some(),
    post,
    comments,
    comment_text,
    comment_error,
  })
}

pub async fn post_view<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((username, post_id)): Path<(String, String)>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  post_page(&*state.store, user.as_ref(), &username, &post_id, String::new(), None).await
}

/// GET on the comment URL just shows the post.
pub async fn comment_redirect<S>(
  State(state): State<AppState<S>>,
  LoginRequired(_): LoginRequired,
  Path((username, post_id)): Path<(String, String)>,
) -> Result<Redirect>
where
  S: BlogStore + Clone + 'static,
{
  let (author, post) = feed_post_or_404(&*state.store, &username, &post_id).await?;
  Ok(Redirect::to(&post_url(&author.username, post.id)))
}

pub async fn add_comment<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Path((username, post_id)): Path<(String, String)>,
  Form(form): Form<CommentForm>,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let (author, post) = feed_post_or_404(&*state.store, &username, &post_id).await?;
  let text = match form.validate() {
    Ok(text) => text,
    Err(message) => {
      let page = post_page(
        &*state.store,
        Some(&user),
        &username,
        &post_id,
        form.text,
        Some(message.to_owned()),
      )
      .await?;
      return Ok(page.into_response());
    }
  };
  let comment = state
    .store
    .add_comment(NewComment { post_id: post.id, author_id: user.id, text })
    .await
    .map_err(Error::store)?;
  info!(comment_id = comment.id, post_id = post.id, user = %user.username, "comment added");
  Ok(Redirect::to(&post_url(&author.username, post.id)).into_response())
}

// ─── Creating and editing ────────────────────────────────────────────────────

async fn post_form_page<S: BlogStore>(
  store: &S,
  user: &User,
  action: String,
  existing: Option<&Post>,
  form: Option<&PostForm>,
  errors: PostFormErrors,
) -> Result<Html<String>> {
  let groups = store.list_groups().await.map_err(Error::store)?;
  // A resubmitted form wins over the stored post.
  let (text, selected) = match (form, existing) {
    (Some(form), _) => (form.text.clone(), form.group.trim().parse().ok()),
    (None, Some(post)) => (post.text.clone(), post.group_id),
    (None, None) => (String::new(), None),
  };
  render(&PostFormTemplate {
    chrome: Chrome::new(Some(user)),
    is_edit: existing.is_some(),
    action,
    text,
    groups: GroupOption::list(&groups, selected),
    current_image: existing.and_then(|p| p.image.clone()),
    errors,
  })
}

/// Validate a submitted post form. `Err` carries the re-rendered form.
async fn validated<S: BlogStore>(
  store: &S,
  user: &User,
  action: String,
  existing: Option<&Post>,
  form: &PostForm,
) -> Result<Result<ValidPost, Html<String>>> {
  let groups = store.list_groups().await.map_err(Error::store)?;
  match form.validate(&groups) {
    Ok(valid) => Ok(Ok(valid)),
    Err(errors) => {
      debug!(user = %user.username, "post form rejected");
      let page = post_form_page(store, user, action, existing, Some(form), errors).await?;
      Ok(Err(page))
    }
  }
}

pub async fn new_post_form<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  post_form_page(&*state.store, &user, "/new/".into(), None, None, PostFormErrors::default())
    .await
}

pub async fn new_post<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  multipart: Multipart,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let form = PostForm::from_multipart(multipart).await?;
  let valid = match validated(&*state.store, &user, "/new/".into(), None, &form).await? {
    Ok(valid) => valid,
    Err(page) => return Ok(page.into_response()),
  };

  let image = match &valid.image {
    Some((bytes, ext)) => Some(media::save_image(&state.config.media_dir, bytes, ext).await?),
    None => None,
  };
  let post = state
    .store
    .create_post(NewPost {
      author_id: user.id,
      text: valid.text,
      group_id: valid.group_id,
      image,
    })
    .await
    .map_err(Error::store)?;
  info!(post_id = post.id, author = %user.username, "post created");
  Ok(Redirect::to("/").into_response())
}

pub async fn edit_post_form<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Path((username, post_id)): Path<(String, String)>,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let (author, post) = post_or_404(&*state.store, &username, &post_id).await?;
  if author.id != user.id {
    return Ok(Redirect::to(&post_url(&author.username, post.id)).into_response());
  }
  let action = format!("{}edit/", post_url(&author.username, post.id));
  let page = post_form_page(
    &*state.store,
    &user,
    action,
    Some(&post),
    None,
    PostFormErrors::default(),
  )
  .await?;
  Ok(page.into_response())
}

pub async fn edit_post<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Path((username, post_id)): Path<(String, String)>,
  multipart: Multipart,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let (author, post) = post_or_404(&*state.store, &username, &post_id).await?;
  let target = post_url(&author.username, post.id);
  if author.id != user.id {
    debug!(post_id = post.id, user = %user.username, "edit by non-author ignored");
    return Ok(Redirect::to(&target).into_response());
  }

  let form = PostForm::from_multipart(multipart).await?;
  let action = format!("{target}edit/");
  let valid = match validated(&*state.store, &user, action, Some(&post), &form).await? {
    Ok(valid) => valid,
    Err(page) => return Ok(page.into_response()),
  };

  let image = match &valid.image {
    Some((bytes, ext)) => {
      ImageChange::Replace(media::save_image(&state.config.media_dir, bytes, ext).await?)
    }
    None if valid.clear_image => ImageChange::Clear,
    None => ImageChange::Keep,
  };
  state
    .store
    .update_post(post.id, PostEdit { text: valid.text, group_id: valid.group_id, image })
    .await
    .map_err(Error::store)?;
  info!(post_id = post.id, author = %user.username, "post edited");
  Ok(Redirect::to(&target).into_response())
}
