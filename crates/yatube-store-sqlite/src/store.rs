//! [`SqliteStore`], the SQLite implementation of [`BlogStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};
use tracing::debug;
use uuid::Uuid;

use yatube_core::{
  follow::Follow,
  group::{Group, NewGroup},
  post::{Comment, CommentView, FeedPost, ImageChange, NewComment, NewPost, Post, PostEdit},
  store::{BlogStore, PostFilter},
  user::{NewUser, Session, User},
};

use crate::{
  Result,
  encode::{
    FEED_COLUMNS, POST_COLUMNS, RawComment, RawFeedPost, RawPost, RawUser, USER_COLUMNS,
    encode_dt, is_unique_violation, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Yatube store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_user(&self, column: &'static str, value: Value) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn count_where(&self, sql: &'static str, id: i64) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, rusqlite::params![id], |r| r.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }
}

/// WHERE clause and its single optional argument for a [`PostFilter`].
fn filter_sql(filter: PostFilter) -> (&'static str, Option<i64>) {
  match filter {
    PostFilter::All => ("1 = 1", None),
    PostFilter::Group(id) => ("p.group_id = ?", Some(id)),
    PostFilter::Author(id) => ("p.author_id = ?", Some(id)),
    PostFilter::FollowedBy(id) => (
      "p.author_id IN (SELECT author_id FROM follows WHERE follower_id = ?)",
      Some(id),
    ),
  }
}

// ─── BlogStore impl ──────────────────────────────────────────────────────────

impl BlogStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let date_joined = now();
    let at_str      = encode_dt(date_joined);
    let row         = input.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (username, first_name, last_name, email, password_hash, date_joined)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            row.username,
            row.first_name,
            row.last_name,
            row.email,
            row.password_hash,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let id = id.ok_or_else(|| yatube_core::Error::UsernameTaken(input.username.clone()))?;

    Ok(User {
      id,
      username: input.username,
      first_name: input.first_name,
      last_name: input.last_name,
      email: input.email,
      password_hash: input.password_hash,
      date_joined,
    })
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    self.find_user("id", Value::Integer(id)).await
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    self.find_user("username", Value::Text(username.to_owned())).await
  }

  async fn set_password_hash(&self, user_id: i64, password_hash: String) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE id = ?2",
          rusqlite::params![password_hash, user_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(yatube_core::Error::UserNotFound(user_id).into());
    }
    Ok(())
  }

  async fn delete_user(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(yatube_core::Error::UserNotFound(id).into());
    }
    debug!(user_id = id, "user deleted with cascades");
    Ok(())
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, user_id: i64) -> Result<Session> {
    let session = Session {
      key:        Uuid::new_v4().simple().to_string(),
      user_id,
      created_at: now(),
    };

    let key    = session.key.clone();
    let at_str = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_key, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![key, user_id, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn session_user(&self, key: &str) -> Result<Option<User>> {
    let key = key.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.id, u.username, u.first_name, u.last_name, u.email,
                    u.password_hash, u.date_joined
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.session_key = ?1",
            rusqlite::params![key],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_session(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE session_key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn create_group(&self, input: NewGroup) -> Result<Group> {
    input.validate()?;
    let row = input.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO post_groups (title, slug, description, rules) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.title, row.slug, row.description, row.rules],
        );
        match inserted {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let id = id.ok_or_else(|| yatube_core::Error::SlugTaken(input.slug.clone()))?;

    Ok(Group {
      id,
      title: input.title,
      slug: input.slug,
      description: input.description,
      rules: input.rules,
    })
  }

  async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
    let slug = slug.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn
            .query_row(
              "SELECT id, title, slug, description, rules FROM post_groups WHERE slug = ?1",
              rusqlite::params![slug],
              |row| {
                Ok(Group {
                  id:          row.get(0)?,
                  title:       row.get(1)?,
                  slug:        row.get(2)?,
                  description: row.get(3)?,
                  rules:       row.get(4)?,
                })
              },
            )
            .optional()?)
        })
        .await?,
    )
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT id, title, slug, description, rules FROM post_groups ORDER BY title, id",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(Group {
                id:          row.get(0)?,
                title:       row.get(1)?,
                slug:        row.get(2)?,
                description: row.get(3)?,
                rules:       row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn delete_group(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM post_groups WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if changed == 0 {
      return Err(yatube_core::Error::GroupNotFound(id.to_string()).into());
    }
    Ok(())
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let pub_date = now();
    let at_str   = encode_dt(pub_date);
    let row      = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (text, pub_date, author_id, group_id, image)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.text, at_str, row.author_id, row.group_id, row.image],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Post {
      id,
      text: input.text,
      pub_date,
      author_id: input.author_id,
      group_id: input.group_id,
      image: input.image,
    })
  }

  async fn get_post(&self, id: i64) -> Result<Option<Post>> {
    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            rusqlite::params![id],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn update_post(&self, id: i64, edit: PostEdit) -> Result<Post> {
    let changed = self
      .conn
      .call(move |conn| {
        let changed = match edit.image {
          ImageChange::Keep => conn.execute(
            "UPDATE posts SET text = ?1, group_id = ?2 WHERE id = ?3",
            rusqlite::params![edit.text, edit.group_id, id],
          )?,
          ImageChange::Replace(path) => conn.execute(
            "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
            rusqlite::params![edit.text, edit.group_id, path, id],
          )?,
          ImageChange::Clear => conn.execute(
            "UPDATE posts SET text = ?1, group_id = ?2, image = NULL WHERE id = ?3",
            rusqlite::params![edit.text, edit.group_id, id],
          )?,
        };
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(yatube_core::Error::PostNotFound(id).into());
    }

    self
      .get_post(id)
      .await?
      .ok_or_else(|| yatube_core::Error::PostNotFound(id).into())
  }

  async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
    let (clause, arg) = filter_sql(filter);

    let n: i64 = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM posts p WHERE {clause}");
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(arg), |r| r.get(0))?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  async fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<FeedPost>> {
    let (clause, arg) = filter_sql(filter);

    let mut args: Vec<Value> = arg.into_iter().map(Value::Integer).collect();
    args.push(Value::Integer(limit as i64));
    args.push(Value::Integer(offset as i64));

    let raws: Vec<RawFeedPost> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FEED_COLUMNS}
           FROM posts p
           JOIN users u ON u.id = p.author_id
           LEFT JOIN post_groups g ON g.id = p.group_id
           WHERE {clause}
           ORDER BY p.pub_date DESC, p.id DESC
           LIMIT ? OFFSET ?"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawFeedPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedPost::into_feed_post).collect()
  }

  async fn get_feed_post(&self, id: i64) -> Result<Option<FeedPost>> {
    let raw: Option<RawFeedPost> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FEED_COLUMNS}
           FROM posts p
           JOIN users u ON u.id = p.author_id
           LEFT JOIN post_groups g ON g.id = p.group_id
           WHERE p.id = ?1"
        );
        Ok(conn
          .query_row(&sql, rusqlite::params![id], RawFeedPost::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawFeedPost::into_feed_post).transpose()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let created = now();
    let at_str  = encode_dt(created);
    let row     = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (post_id, author_id, text, created) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.post_id, row.author_id, row.text, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comment {
      id,
      post_id: input.post_id,
      author_id: input.author_id,
      text: input.text,
      created,
    })
  }

  async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.id, c.text, c.created, u.username
           FROM comments c JOIN users u ON u.id = c.author_id
           WHERE c.post_id = ?1
           ORDER BY c.created, c.id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![post_id], |row| {
            Ok(RawComment {
              id:       row.get(0)?,
              text:     row.get(1)?,
              created:  row.get(2)?,
              username: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_view).collect()
  }

  // ── Follow graph ──────────────────────────────────────────────────────────

  async fn follow(&self, follower: i64, author: i64) -> Result<Follow> {
    let edge = Follow {
      follower_id: follower,
      author_id:   author,
      created_at:  now(),
    };
    let at_str = encode_dt(edge.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO follows (follower_id, author_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![follower, author, at_str],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(yatube_core::Error::AlreadyFollowing { follower, author }.into());
    }
    Ok(edge)
  }

  async fn unfollow(&self, follower: i64, author: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND author_id = ?2",
          rusqlite::params![follower, author],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(yatube_core::Error::NotFollowing { follower, author }.into());
    }
    Ok(())
  }

  async fn is_following(&self, follower: i64, author: i64) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn
            .query_row(
              "SELECT 1 FROM follows WHERE follower_id = ?1 AND author_id = ?2",
              rusqlite::params![follower, author],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false))
        })
        .await?,
    )
  }

  async fn follower_count(&self, user: i64) -> Result<u64> {
    self
      .count_where("SELECT COUNT(*) FROM follows WHERE author_id = ?1", user)
      .await
  }

  async fn following_count(&self, user: i64) -> Result<u64> {
    self
      .count_where("SELECT COUNT(*) FROM follows WHERE follower_id = ?1", user)
      .await
  }
}
