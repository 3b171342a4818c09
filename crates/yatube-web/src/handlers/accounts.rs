//! Sign-up, login, logout and password change.

use axum::{
  Form,
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;
use yatube_core::{
  Error as DomainError,
  store::{BlogStore, StoreError as _},
  user::NewUser,
};

use crate::{
  AppState,
  auth::{
    CurrentUser, LOGIN_URL, LoginRequired, SESSION_COOKIE, expired_session_cookie,
    hash_password, safe_next, session_cookie, verify_password,
  },
  error::{Error, Result},
  forms::{
    BAD_LOGIN, LoginForm, NextQuery, PasswordChangeErrors, PasswordChangeForm, SignupErrors,
    SignupForm, USERNAME_TAKEN, WRONG_OLD_PASSWORD,
  },
  views::{
    Chrome, LoggedOutTemplate, LoginTemplate, PasswordChangeDoneTemplate,
    PasswordChangeTemplate, SignupTemplate, render,
  },
};

pub const PASSWORD_CHANGE_DONE_URL: &str = "/auth/password_change/done/";

// ─── Sign-up ─────────────────────────────────────────────────────────────────

pub async fn signup_form<S>(CurrentUser(user): CurrentUser) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&SignupTemplate {
    chrome: Chrome::new(user.as_ref()),
    form:   SignupForm::default(),
    errors: SignupErrors::default(),
  })
}

/// Send the confirmation mail, create the account and go to the login page.
///
/// The mail goes out before the user row is written, so a delivery failure
/// leaves nothing behind and the same username can be tried again.
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<SignupForm>,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let mut errors = form.validate();
  let username = form.username.trim();
  if errors.is_empty()
    && state.store.get_user_by_username(username).await.map_err(Error::store)?.is_some()
  {
    errors.username = Some(USERNAME_TAKEN.into());
  }

  if errors.is_empty() {
    let input = NewUser {
      username:      username.to_owned(),
      first_name:    form.first_name.trim().to_owned(),
      last_name:     form.last_name.trim().to_owned(),
      email:         form.email.trim().to_owned(),
      password_hash: hash_password(&form.password1)?,
    };
    state.mailer.send_signup_confirmation(&input.email).await?;

    match state.store.create_user(input).await {
      Ok(user) => {
        info!(user_id = user.id, username = %user.username, "user signed up");
        return Ok(Redirect::to(LOGIN_URL).into_response());
      }
      Err(e) if matches!(e.domain(), Some(DomainError::UsernameTaken(_))) => {
        errors.username = Some(USERNAME_TAKEN.into());
      }
      Err(e) => return Err(Error::store(e)),
    }
  }

  // Passwords are never echoed back.
  let form = SignupForm { password1: String::new(), password2: String::new(), ..form };
  let page = render(&SignupTemplate { chrome: Chrome::anonymous(), form, errors })?;
  Ok(page.into_response())
}

// ─── Login / logout ──────────────────────────────────────────────────────────

pub async fn login_form<S>(
  CurrentUser(user): CurrentUser,
  Query(query): Query<NextQuery>,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&LoginTemplate {
    chrome:   Chrome::new(user.as_ref()),
    username: String::new(),
    next:     query.next.unwrap_or_default(),
    error:    None,
  })
}

pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  Form(form): Form<LoginForm>,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let username = form.username.trim();
  let user = state
    .store
    .get_user_by_username(username)
    .await
    .map_err(Error::store)?
    .filter(|user| verify_password(&form.password, &user.password_hash));

  let Some(user) = user else {
    info!(username, "failed login");
    let page = render(&LoginTemplate {
      chrome:   Chrome::anonymous(),
      username: username.to_owned(),
      next:     form.next.clone().unwrap_or_default(),
      error:    Some(BAD_LOGIN.into()),
    })?;
    return Ok(page.into_response());
  };

  let session = state
    .store
    .create_session(user.id)
    .await
    .map_err(Error::store)?;
  info!(user_id = user.id, username = %user.username, "logged in");

  let next = safe_next(form.next.as_deref().filter(|n| !n.is_empty())).to_owned();
  Ok((jar.add(session_cookie(session.key)), Redirect::to(&next)).into_response())
}

pub async fn logout<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  if let Some(cookie) = jar.get(SESSION_COOKIE) {
    state
      .store
      .delete_session(cookie.value())
      .await
      .map_err(Error::store)?;
  }
  let page = render(&LoggedOutTemplate { chrome: Chrome::anonymous() })?;
  Ok((jar.remove(expired_session_cookie()), page).into_response())
}

// ─── Password change ─────────────────────────────────────────────────────────

pub async fn password_change_form<S>(
  LoginRequired(user): LoginRequired,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&PasswordChangeTemplate {
    chrome: Chrome::new(Some(&user)),
    errors: PasswordChangeErrors::default(),
  })
}

pub async fn password_change<S>(
  State(state): State<AppState<S>>,
  LoginRequired(user): LoginRequired,
  Form(form): Form<PasswordChangeForm>,
) -> Result<Response>
where
  S: BlogStore + Clone + 'static,
{
  let mut errors = form.validate();
  if errors.old_password.is_none() && !verify_password(&form.old_password, &user.password_hash) {
    errors.old_password = Some(WRONG_OLD_PASSWORD.into());
  }
  if !errors.is_empty() {
    let page = render(&PasswordChangeTemplate { chrome: Chrome::new(Some(&user)), errors })?;
    return Ok(page.into_response());
  }

  let hash = hash_password(&form.new_password1)?;
  state
    .store
    .set_password_hash(user.id, hash)
    .await
    .map_err(Error::store)?;
  info!(user_id = user.id, "password changed");
  Ok(Redirect::to(PASSWORD_CHANGE_DONE_URL).into_response())
}

pub async fn password_change_done<S>(
  LoginRequired(user): LoginRequired,
) -> Result<Html<String>>
where
  S: BlogStore + Clone + 'static,
{
  render(&PasswordChangeDoneTemplate { chrome: Chrome::new(Some(&user)) })
}
