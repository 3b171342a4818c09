//! Askama page templates and the glue that turns them into responses.

use std::sync::Arc;

use askama::Template;
use axum::{
  extract::Request,
  http::StatusCode,
  middleware::Next,
  response::{Html, IntoResponse, Response},
};
use chrono::Datelike as _;
use tracing::error;
use yatube_core::{
  group::Group,
  paginate::Page,
  post::{CommentView, FeedPost},
  user::User,
};

use crate::{
  error::{Error, ErrorPage},
  forms::{PasswordChangeErrors, PostFormErrors, SignupErrors, SignupForm},
};

pub fn render<T: Template>(template: &T) -> Result<Html<String>, Error> {
  Ok(Html(template.render()?))
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Values the base layout needs on every page.
#[derive(Debug, Clone)]
pub struct Chrome {
  /// Username of the logged-in visitor.
  pub username: Option<String>,
  pub year:     i32,
}

impl Chrome {
  pub fn new(user: Option<&User>) -> Self {
    Self {
      username: user.map(|u| u.username.clone()),
      year:     chrono::Utc::now().year(),
    }
  }

  pub fn anonymous() -> Self { Self::new(None) }
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// The post list and paginator of a feed page. Rendered on its own for the
/// home page so the result can be cached.
#[derive(Template)]
#[template(path = "includes/feed.html")]
pub struct FeedFragment {
  pub page: Page<FeedPost>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub chrome:    Chrome,
  pub feed_html: Arc<str>,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
  pub chrome: Chrome,
  pub group:  Group,
  pub page:   Page<FeedPost>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
  pub chrome: Chrome,
  pub page:   Page<FeedPost>,
}

// ─── Profiles and posts ──────────────────────────────────────────────────────

/// Author card shown beside a profile feed and a single post.
#[derive(Debug, Clone)]
pub struct ProfileCard {
  pub username:   String,
  pub name:       String,
  pub post_count: u64,
  /// Users following this author.
  pub followers:  u64,
  /// Authors this user follows.
  pub following:  u64,
  /// The visitor already follows this author.
  pub subscribed: bool,
  /// Show follow/unfollow controls: the visitor is logged in and is not the
  /// author.
  pub can_follow: bool,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
  pub chrome:  Chrome,
  pub profile: ProfileCard,
  pub page:    Page<FeedPost>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
  pub chrome:        Chrome,
  pub profile:       ProfileCard,
  pub post:          FeedPost,
  pub comments:      Vec<CommentView>,
  pub can_edit:      bool,
  pub can_comment:   bool,
  pub comment_text:  String,
  pub comment_error: Option<String>,
}

/// One entry of the group selector.
#[derive(Debug, Clone)]
pub struct GroupOption {
  pub id:       i64,
  pub title:    String,
  pub selected: bool,
}

impl GroupOption {
  pub fn list(groups: &[Group], selected: Option<i64>) -> Vec<Self> {
    groups
      .iter()
      .map(|g| GroupOption {
        id:       g.id,
        title:    g.title.clone(),
        selected: selected == Some(g.id),
      })
      .collect()
  }
}

/// Shared by the new-post and edit-post pages.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
  pub chrome:        Chrome,
  pub is_edit:       bool,
  pub action:        String,
  pub text:          String,
  pub groups:        Vec<GroupOption>,
  pub current_image: Option<String>,
  pub errors:        PostFormErrors,
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
  pub chrome: Chrome,
  pub form:   SignupForm,
  pub errors: SignupErrors,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
  pub chrome:   Chrome,
  pub username: String,
  pub next:     String,
  pub error:    Option<String>,
}

#[derive(Template)]
#[template(path = "auth/logged_out.html")]
pub struct LoggedOutTemplate {
  pub chrome: Chrome,
}

#[derive(Template)]
#[template(path = "auth/password_change.html")]
pub struct PasswordChangeTemplate {
  pub chrome: Chrome,
  pub errors: PasswordChangeErrors,
}

#[derive(Template)]
#[template(path = "auth/password_change_done.html")]
pub struct PasswordChangeDoneTemplate {
  pub chrome: Chrome,
}

// ─── Static pages ────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
  pub chrome: Chrome,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
  pub chrome: Chrome,
}

// ─── Error pages ─────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "misc/404.html")]
pub struct NotFoundTemplate {
  pub chrome: Chrome,
  pub path:   String,
}

#[derive(Template)]
#[template(path = "misc/500.html")]
pub struct ServerErrorTemplate {
  pub chrome: Chrome,
}

/// Render the HTML error page for `status`.
pub fn error_page(status: StatusCode, path: &str) -> Response {
  let chrome = Chrome::anonymous();
  let rendered = if status == StatusCode::NOT_FOUND {
    NotFoundTemplate { chrome, path: path.to_owned() }.render()
  } else {
    ServerErrorTemplate { chrome }.render()
  };
  match rendered {
    Ok(html) => (status, Html(html)).into_response(),
    Err(e) => {
      error!(error = %e, %status, "error page failed to render");
      status.into_response()
    }
  }
}

/// Middleware: replace the body of any response marked with [`ErrorPage`]
/// by the rendered error page.
pub async fn render_error_pages(req: Request, next: Next) -> Response {
  let path = req.uri().path().to_owned();
  let res = next.run(req).await;
  match res.extensions().get::<ErrorPage>().copied() {
    Some(ErrorPage(status)) => error_page(status, &path),
    None => res,
  }
}
