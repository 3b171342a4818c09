//! HTTP front end for Yatube.
//!
//! Exposes an axum [`Router`] serving the server-rendered site, backed by any
//! [`BlogStore`].

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod mail;
pub mod media;
pub mod views;

pub use crate::config::ServerConfig;
pub use error::Error;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};
use yatube_core::store::BlogStore;

use cache::PageCache;
use handlers::{accounts, follow, pages, posts};
use mail::Mailer;

/// Largest accepted request body; bounds image uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BlogStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub cache:  PageCache,
  pub mailer: Arc<Mailer>,
}

impl<S: BlogStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, mailer: Mailer) -> Self {
    Self {
      store:  Arc::new(store),
      cache:  PageCache::new(config.cache_ttl()),
      config: Arc::new(config),
      mailer: Arc::new(mailer),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the whole site.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BlogStore + Clone + 'static,
{
  let media = ServeDir::new(&state.config.media_dir);

  Router::new()
    .route("/",                               get(posts::index::<S>))
    .route("/new/",                           get(posts::new_post_form::<S>).post(posts::new_post::<S>))
    .route("/follow/",                        get(follow::follow_index::<S>))
    .route("/group/{slug}/",                  get(posts::group_posts::<S>))
    .route("/about-author/",                  get(pages::about_author::<S>))
    .route("/about-spec/",                    get(pages::about_tech::<S>))
    .route("/auth/signup/",                   get(accounts::signup_form::<S>).post(accounts::signup::<S>))
    .route("/auth/login/",                    get(accounts::login_form::<S>).post(accounts::login::<S>))
    .route("/auth/logout/",                   get(accounts::logout::<S>))
    .route("/auth/password_change/",          get(accounts::password_change_form::<S>).post(accounts::password_change::<S>))
    .route("/auth/password_change/done/",     get(accounts::password_change_done::<S>))
    .route("/{username}/",                    get(posts::profile::<S>))
    .route("/{username}/follow/",             get(follow::profile_follow::<S>))
    .route("/{username}/unfollow/",           get(follow::profile_unfollow::<S>))
    .route("/{username}/{post_id}/",          get(posts::post_view::<S>))
    .route("/{username}/{post_id}/edit/",     get(posts::edit_post_form::<S>).post(posts::edit_post::<S>))
    .route("/{username}/{post_id}/comment/",  get(posts::comment_redirect::<S>).post(posts::add_comment::<S>))
    .nest_service("/media", media)
    .fallback(pages::not_found)
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(middleware::from_fn(views::render_error_pages))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
