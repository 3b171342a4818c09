//! Static pages and the not-found fallback.

use axum::{
  http::{StatusCode, Uri},
  response::{Html, Response},
};
use yatube_core::store::BlogStore;

use crate::{
  auth::CurrentUser,
  error::Result,
  views::{self, AboutAuthorTemplate, AboutTechTemplate, Chrome, render},
};

pub async fn about_author<S>(CurrentUser(user): CurrentUser) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&AboutAuthorTemplate { chrome: Chrome::new(user.as_ref()) })
}

pub async fn about_tech<S>(CurrentUser(user): CurrentUser) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&AboutTechTemplate { chrome: Chrome::new(user.as_ref()) })
}

pub async fn not_found(uri: Uri) -> Response {
  views::error_page(StatusCode::NOT_FOUND, uri.path())
}
