//! Posts and comments.
//!
//! A post's author and publication timestamp are fixed when it is created;
//! an edit may only change the text, the group and the image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub id:        i64,
  pub text:      String,
  /// Server-assigned; never changes after creation.
  pub pub_date:  DateTime<Utc>,
  pub author_id: i64,
  pub group_id:  Option<i64>,
  /// Path relative to the configured media directory, e.g.
  /// `posts/3f2a….png`. No image bytes live in the database.
  pub image:     Option<String>,
}

/// Input to [`crate::store::BlogStore::create_post`].
/// `pub_date` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id: i64,
  pub text:      String,
  pub group_id:  Option<i64>,
  pub image:     Option<String>,
}

/// What an edit does to the post's image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
  #[default]
  Keep,
  Replace(String),
  Clear,
}

/// Input to [`crate::store::BlogStore::update_post`].
#[derive(Debug, Clone)]
pub struct PostEdit {
  pub text:     String,
  pub group_id: Option<i64>,
  pub image:    ImageChange,
}

/// A post as it appears in a feed: joined with its author and group and
/// annotated with a comment count computed at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
  pub id:              i64,
  pub text:            String,
  pub pub_date:        DateTime<Utc>,
  pub image:           Option<String>,
  pub author_id:       i64,
  pub author_username: String,
  pub author_name:     String,
  pub group_slug:      Option<String>,
  pub group_title:     Option<String>,
  pub comment_count:   u64,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:        i64,
  pub post_id:   i64,
  pub author_id: i64,
  pub text:      String,
  pub created:   DateTime<Utc>,
}

/// Input to [`crate::store::BlogStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   i64,
  pub author_id: i64,
  pub text:      String,
}

/// A comment joined with its author's username, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
  pub id:              i64,
  pub text:            String,
  pub created:         DateTime<Utc>,
  pub author_username: String,
}
