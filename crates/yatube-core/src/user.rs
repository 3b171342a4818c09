//! Users and their login sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Credentials are an argon2 PHC string; the plain
/// password never reaches this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:            i64,
  pub username:      String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub date_joined:   DateTime<Utc>,
}

impl User {
  /// "First Last" when either part is set, otherwise the username.
  pub fn display_name(&self) -> String {
    display_name(&self.first_name, &self.last_name, &self.username)
  }
}

/// Shared by [`User::display_name`] and backends that only load the name
/// columns.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
  let full = format!("{first_name} {last_name}");
  let full = full.trim();
  if full.is_empty() {
    username.to_owned()
  } else {
    full.to_owned()
  }
}

/// Input to [`crate::store::BlogStore::create_user`].
/// `date_joined` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub password_hash: String,
}

/// A logged-in browser session, identified by the opaque `key` stored in the
/// session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub key:        String,
  pub user_id:    i64,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(first: &str, last: &str) -> User {
    User {
      id:            1,
      username:      "leo".into(),
      first_name:    first.into(),
      last_name:     last.into(),
      email:         "leo@example.com".into(),
      password_hash: String::new(),
      date_joined:   Utc::now(),
    }
  }

  #[test]
  fn display_name_prefers_full_name() {
    assert_eq!(user("Leo", "Tolstoy").display_name(), "Leo Tolstoy");
    assert_eq!(user("Leo", "").display_name(), "Leo");
  }

  #[test]
  fn display_name_falls_back_to_username() {
    assert_eq!(user("", "").display_name(), "leo");
  }
}
