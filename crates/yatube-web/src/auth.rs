//! Session-cookie authentication.
//!
//! A successful login stores a random session key in the `sessionid` cookie.
//! [`CurrentUser`] resolves that cookie for any page; [`LoginRequired`]
//! additionally bounces anonymous visitors to the login form with a `next`
//! parameter pointing back at the page they asked for.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::request::Parts,
  response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand_core::OsRng;
use yatube_core::{store::BlogStore, user::User};

use crate::{AppState, error::Error};

pub const SESSION_COOKIE: &str = "sessionid";

pub const LOGIN_URL: &str = "/auth/login/";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// False for a wrong password and for a hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Cookies and redirects ───────────────────────────────────────────────────

pub fn session_cookie(key: String) -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE, key))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .build()
}

/// A cookie that, passed to [`CookieJar::remove`], clears the session.
pub fn expired_session_cookie() -> Cookie<'static> {
  Cookie::build(SESSION_COOKIE).path("/").build()
}

/// `/auth/login/?next=<next>` with `next` form-encoded.
pub fn login_url(next: &str) -> String {
  let query = url::form_urlencoded::Serializer::new(String::new())
    .append_pair("next", next)
    .finish();
  format!("{LOGIN_URL}?{query}")
}

/// Where to send the user after logging in. Only same-site absolute paths are
/// honoured; anything else falls back to the home page.
pub fn safe_next(next: Option<&str>) -> &str {
  match next {
    Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
    _ => "/",
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The logged-in user, if any.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: BlogStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
      return Ok(CurrentUser(None));
    };
    let user = state
      .store
      .session_user(cookie.value())
      .await
      .map_err(Error::store)?;
    Ok(CurrentUser(user))
  }
}

/// A logged-in user; anonymous requests are redirected to the login page.
pub struct LoginRequired(pub User);

impl<S> FromRequestParts<AppState<S>> for LoginRequired
where
  S: BlogStore + Clone + 'static,
{
  type Rejection = Response;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state)
      .await
      .map_err(IntoResponse::into_response)?;
    match user {
      Some(user) => Ok(LoginRequired(user)),
      None => {
        let next = parts
          .uri
          .path_and_query()
          .map(|pq| pq.as_str())
          .unwrap_or("/");
        Err(Redirect::to(&login_url(next)).into_response())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{Request, StatusCode, header};
  use yatube_core::user::NewUser;

  use crate::tests::test_state;

  async fn extract_current(
    req: Request<axum::body::Body>,
    state: &AppState<yatube_store_sqlite::SqliteStore>,
  ) -> Option<User> {
    let (mut parts, _) = req.into_parts();
    CurrentUser::from_request_parts(&mut parts, state).await.unwrap().0
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("s3cret").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("s3cret", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("s3cret", "not a phc string"));
  }

  #[test]
  fn login_url_encodes_next() {
    assert_eq!(login_url("/new/"), "/auth/login/?next=%2Fnew%2F");
    assert_eq!(login_url("/?page=2"), "/auth/login/?next=%2F%3Fpage%3D2");
  }

  #[test]
  fn only_local_next_targets_are_followed() {
    assert_eq!(safe_next(Some("/follow/")), "/follow/");
    assert_eq!(safe_next(Some("//evil.example/")), "/");
    assert_eq!(safe_next(Some("https://evil.example/")), "/");
    assert_eq!(safe_next(Some("/\\evil.example")), "/");
    assert_eq!(safe_next(None), "/");
  }

  #[tokio::test]
  async fn session_cookie_resolves_user() {
    let (state, _) = test_state().await;
    let user = state
      .store
      .create_user(NewUser {
        username:      "leo".into(),
        first_name:    String::new(),
        last_name:     String::new(),
        email:         "leo@example.com".into(),
        password_hash: String::new(),
      })
      .await
      .unwrap();
    let session = state.store.create_session(user.id).await.unwrap();

    let req = Request::builder()
      .header(header::COOKIE, format!("{SESSION_COOKIE}={}", session.key))
      .body(axum::body::Body::empty())
      .unwrap();
    assert_eq!(extract_current(req, &state).await.map(|u| u.id), Some(user.id));
  }

  #[tokio::test]
  async fn unknown_or_missing_cookie_is_anonymous() {
    let (state, _) = test_state().await;
    let req = Request::builder()
      .header(header::COOKIE, format!("{SESSION_COOKIE}=bogus"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(extract_current(req, &state).await.is_none());

    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(extract_current(req, &state).await.is_none());
  }

  #[tokio::test]
  async fn login_required_redirects_with_next() {
    let (state, _) = test_state().await;
    let req = Request::builder()
      .uri("/new/")
      .body(axum::body::Body::empty())
      .unwrap();
    let (mut parts, _) = req.into_parts();
    let Err(res) = LoginRequired::from_request_parts(&mut parts, &state).await else {
      panic!("anonymous request was let through");
    };
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/auth/login/?next=%2Fnew%2F");
  }
}
