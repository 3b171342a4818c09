//! Error types and axum `IntoResponse` implementation.
//!
//! Handlers return [`Error`]; the response it produces carries an
//! [`ErrorPage`] marker that [`crate::views::render_error_pages`] turns into
//! the HTML 404/500 page, since only the middleware knows the request path.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use yatube_core::store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found")]
  NotFound,
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("template error: {0}")]
  Template(#[from] askama::Error),
  #[error("mail error: {0}")]
  Mail(#[from] crate::mail::Error),
  #[error("password hashing failed: {0}")]
  PasswordHash(String),
  #[error("multipart error: {0}")]
  Multipart(#[from] axum_extra::extract::multipart::MultipartError),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Wrap a backend error. Use as `.map_err(Error::store)`.
  pub fn store<E: StoreError>(err: E) -> Self {
    Error::Store(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::NotFound => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// Response extension asking the error-page middleware to render the HTML
/// page for this status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage(pub StatusCode);

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    let mut res = status.into_response();
    res.extensions_mut().insert(ErrorPage(status));
    res
  }
}
