//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexicographic order equals chronological
//! order in `ORDER BY`.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use yatube_core::{
  post::{CommentView, FeedPost, Post},
  user::{User, display_name},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision a timestamp column keeps, so a record
/// returned from a create call equals the one read back later.
pub fn now() -> DateTime<Utc> {
  Utc::now().trunc_subsecs(6)
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Constraint classification ───────────────────────────────────────────────

/// True if `err` is a UNIQUE constraint violation (as opposed to, say, a
/// foreign-key failure, which shares the primary result code).
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "id, username, first_name, last_name, email, password_hash, date_joined";

/// Raw values read directly from a `users` row selected with
/// [`USER_COLUMNS`].
pub struct RawUser {
  pub id:            i64,
  pub username:      String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub password_hash: String,
  pub date_joined:   String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      first_name:    row.get(2)?,
      last_name:     row.get(3)?,
      email:         row.get(4)?,
      password_hash: row.get(5)?,
      date_joined:   row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      username:      self.username,
      first_name:    self.first_name,
      last_name:     self.last_name,
      email:         self.email,
      password_hash: self.password_hash,
      date_joined:   decode_dt(&self.date_joined)?,
    })
  }
}

pub const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

/// Raw values from a `posts` row selected with [`POST_COLUMNS`].
pub struct RawPost {
  pub id:        i64,
  pub text:      String,
  pub pub_date:  String,
  pub author_id: i64,
  pub group_id:  Option<i64>,
  pub image:     Option<String>,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      text:      row.get(1)?,
      pub_date:  row.get(2)?,
      author_id: row.get(3)?,
      group_id:  row.get(4)?,
      image:     row.get(5)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:        self.id,
      text:      self.text,
      pub_date:  decode_dt(&self.pub_date)?,
      author_id: self.author_id,
      group_id:  self.group_id,
      image:     self.image,
    })
  }
}

/// Select list for feed rows. Expects `posts p`, `users u` and a LEFT JOIN
/// of `post_groups g` in the FROM clause.
pub const FEED_COLUMNS: &str = "
  p.id, p.text, p.pub_date, p.image, p.author_id,
  u.username, u.first_name, u.last_name,
  g.slug, g.title,
  (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count";

/// Raw values from a feed query selected with [`FEED_COLUMNS`].
pub struct RawFeedPost {
  pub id:            i64,
  pub text:          String,
  pub pub_date:      String,
  pub image:         Option<String>,
  pub author_id:     i64,
  pub username:      String,
  pub first_name:    String,
  pub last_name:     String,
  pub group_slug:    Option<String>,
  pub group_title:   Option<String>,
  pub comment_count: i64,
}

impl RawFeedPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      text:          row.get(1)?,
      pub_date:      row.get(2)?,
      image:         row.get(3)?,
      author_id:     row.get(4)?,
      username:      row.get(5)?,
      first_name:    row.get(6)?,
      last_name:     row.get(7)?,
      group_slug:    row.get(8)?,
      group_title:   row.get(9)?,
      comment_count: row.get(10)?,
    })
  }

  pub fn into_feed_post(self) -> Result<FeedPost> {
    Ok(FeedPost {
      id:              self.id,
      text:            self.text,
      pub_date:        decode_dt(&self.pub_date)?,
      image:           self.image,
      author_id:       self.author_id,
      author_name:     display_name(&self.first_name, &self.last_name, &self.username),
      author_username: self.username,
      group_slug:      self.group_slug,
      group_title:     self.group_title,
      comment_count:   self.comment_count.max(0) as u64,
    })
  }
}

/// Raw values from a comments-joined-users row.
pub struct RawComment {
  pub id:       i64,
  pub text:     String,
  pub created:  String,
  pub username: String,
}

impl RawComment {
  pub fn into_view(self) -> Result<CommentView> {
    Ok(CommentView {
      id:              self.id,
      text:            self.text,
      created:         decode_dt(&self.created)?,
      author_username: self.username,
    })
  }
}
