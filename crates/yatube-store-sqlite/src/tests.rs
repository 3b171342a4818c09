//! Integration tests for `SqliteStore` against an in-memory database.

use yatube_core::{
  feed::{self, FeedScope},
  group::NewGroup,
  post::{ImageChange, NewComment, NewPost, PostEdit},
  store::{BlogStore, PostFilter, StoreError as _},
  user::{NewUser, User},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(NewUser {
    username:      username.into(),
    first_name:    String::new(),
    last_name:     String::new(),
    email:         format!("{username}@example.com"),
    password_hash: "not-a-real-hash".into(),
  })
  .await
  .unwrap()
}

fn group(slug: &str) -> NewGroup {
  NewGroup {
    title:       slug.to_uppercase(),
    slug:        slug.into(),
    description: "about".into(),
    rules:       "be kind".into(),
  }
}

fn new_post(author_id: i64, text: &str, group_id: Option<i64>) -> NewPost {
  NewPost { author_id, text: text.into(), group_id, image: None }
}

fn domain(err: &Error) -> &yatube_core::Error {
  err.domain().expect("domain error")
}

// ─── Users & sessions ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_lookup_user() {
  let s = store().await;
  let leo = user(&s, "leo").await;

  let by_name = s.get_user_by_username("leo").await.unwrap().unwrap();
  assert_eq!(by_name.id, leo.id);
  assert_eq!(by_name.email, "leo@example.com");

  let by_id = s.get_user(leo.id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "leo");

  assert!(s.get_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  user(&s, "leo").await;

  let err = s
    .create_user(NewUser {
      username:      "leo".into(),
      first_name:    String::new(),
      last_name:     String::new(),
      email:         String::new(),
      password_hash: "x".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::UsernameTaken(u) if u == "leo"));
}

#[tokio::test]
async fn password_hash_can_be_replaced() {
  let s = store().await;
  let leo = user(&s, "leo").await;

  s.set_password_hash(leo.id, "new-hash".into()).await.unwrap();
  let fetched = s.get_user(leo.id).await.unwrap().unwrap();
  assert_eq!(fetched.password_hash, "new-hash");
}

#[tokio::test]
async fn session_resolves_to_user_until_deleted() {
  let s = store().await;
  let leo = user(&s, "leo").await;

  let session = s.create_session(leo.id).await.unwrap();
  let resolved = s.session_user(&session.key).await.unwrap().unwrap();
  assert_eq!(resolved.id, leo.id);

  s.delete_session(&session.key).await.unwrap();
  assert!(s.session_user(&session.key).await.unwrap().is_none());
  // Deleting again is harmless.
  s.delete_session(&session.key).await.unwrap();
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_slug_is_unique_and_validated() {
  let s = store().await;
  let cats = s.create_group(group("cats")).await.unwrap();
  assert_eq!(s.get_group_by_slug("cats").await.unwrap(), Some(cats));

  let err = s.create_group(group("cats")).await.unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::SlugTaken(_)));

  let err = s.create_group(group("no spaces")).await.unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::InvalidSlug(_)));
}

#[tokio::test]
async fn groups_are_listed_by_title() {
  let s = store().await;
  s.create_group(group("zebras")).await.unwrap();
  s.create_group(group("cats")).await.unwrap();

  let slugs: Vec<_> = s
    .list_groups()
    .await
    .unwrap()
    .into_iter()
    .map(|g| g.slug)
    .collect();
  assert_eq!(slugs, ["cats", "zebras"]);
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_preserves_author_and_timestamp() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let cats = s.create_group(group("cats")).await.unwrap();

  let mut input = new_post(leo.id, "first draft", None);
  input.image = Some("posts/a.png".into());
  let post = s.create_post(input).await.unwrap();

  let edited = s
    .update_post(post.id, PostEdit {
      text:     "final text".into(),
      group_id: Some(cats.id),
      image:    ImageChange::Keep,
    })
    .await
    .unwrap();

  assert_eq!(edited.id, post.id);
  assert_eq!(edited.author_id, leo.id);
  assert_eq!(edited.pub_date, post.pub_date);
  assert_eq!(edited.text, "final text");
  assert_eq!(edited.group_id, Some(cats.id));
  assert_eq!(edited.image.as_deref(), Some("posts/a.png"));

  let cleared = s
    .update_post(post.id, PostEdit {
      text:     "final text".into(),
      group_id: None,
      image:    ImageChange::Clear,
    })
    .await
    .unwrap();
  assert!(cleared.image.is_none());
  assert!(cleared.group_id.is_none());
}

#[tokio::test]
async fn created_records_match_what_is_read_back() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  assert_eq!(s.get_user(leo.id).await.unwrap(), Some(leo.clone()));

  let post = s.create_post(new_post(leo.id, "hello", None)).await.unwrap();
  assert_eq!(s.get_post(post.id).await.unwrap(), Some(post.clone()));

  let comment = s
    .add_comment(NewComment { post_id: post.id, author_id: leo.id, text: "nice".into() })
    .await
    .unwrap();
  let listed = s.list_comments(post.id).await.unwrap();
  assert_eq!(listed[0].created, comment.created);
}

#[tokio::test]
async fn editing_missing_post_errors() {
  let s = store().await;
  let err = s
    .update_post(404, PostEdit {
      text:     "x".into(),
      group_id: None,
      image:    ImageChange::Keep,
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::PostNotFound(404)));
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feeds_are_newest_first_and_filtered() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;
  let cats = s.create_group(group("cats")).await.unwrap();
  let dogs = s.create_group(group("dogs")).await.unwrap();

  let p1 = s.create_post(new_post(leo.id, "one", Some(cats.id))).await.unwrap();
  let p2 = s.create_post(new_post(ann.id, "two", None)).await.unwrap();
  let p3 = s.create_post(new_post(leo.id, "three", None)).await.unwrap();

  let all = s.list_posts(PostFilter::All, 10, 0).await.unwrap();
  let ids: Vec<_> = all.iter().map(|p| p.id).collect();
  assert_eq!(ids, [p3.id, p2.id, p1.id]);

  let in_cats = s.list_posts(PostFilter::Group(cats.id), 10, 0).await.unwrap();
  assert_eq!(in_cats.len(), 1);
  assert_eq!(in_cats[0].id, p1.id);
  assert_eq!(in_cats[0].group_slug.as_deref(), Some("cats"));

  assert!(s.list_posts(PostFilter::Group(dogs.id), 10, 0).await.unwrap().is_empty());

  let by_leo = s.list_posts(PostFilter::Author(leo.id), 10, 0).await.unwrap();
  assert_eq!(by_leo.len(), 2);
  assert!(by_leo.iter().all(|p| p.author_username == "leo"));

  assert_eq!(s.count_posts(PostFilter::All).await.unwrap(), 3);
  assert_eq!(s.count_posts(PostFilter::Author(ann.id)).await.unwrap(), 1);
}

#[tokio::test]
async fn feed_posts_carry_comment_counts() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;
  let post = s.create_post(new_post(leo.id, "hello", None)).await.unwrap();
  let quiet = s.create_post(new_post(leo.id, "quiet", None)).await.unwrap();

  for text in ["nice", "agreed"] {
    s.add_comment(NewComment { post_id: post.id, author_id: ann.id, text: text.into() })
      .await
      .unwrap();
  }

  let feed = s.list_posts(PostFilter::All, 10, 0).await.unwrap();
  let count = |id| feed.iter().find(|p| p.id == id).unwrap().comment_count;
  assert_eq!(count(post.id), 2);
  assert_eq!(count(quiet.id), 0);

  let comments = s.list_comments(post.id).await.unwrap();
  let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
  assert_eq!(texts, ["nice", "agreed"]);
  assert_eq!(comments[0].author_username, "ann");

  let single = s.get_feed_post(post.id).await.unwrap().unwrap();
  assert_eq!(single.comment_count, 2);
}

#[tokio::test]
async fn assembled_pages_clamp_to_last() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  for i in 0..12 {
    s.create_post(new_post(leo.id, &format!("post {i}"), None)).await.unwrap();
  }

  let first = feed::assemble(&s, FeedScope::All, None).await.unwrap();
  let meta = first.meta.unwrap();
  assert_eq!(first.items.len(), 10);
  assert_eq!(meta.num_pages, 2);
  assert_eq!(first.items[0].text, "post 11");

  let clamped = feed::assemble(&s, FeedScope::All, Some("7")).await.unwrap();
  assert_eq!(clamped.meta.unwrap().number, 2);
  assert_eq!(clamped.items.len(), 2);

  let profile = feed::assemble(&s, FeedScope::Author(leo.id), Some("3")).await.unwrap();
  assert_eq!(profile.items.len(), 2);
  assert_eq!(profile.meta.unwrap().num_pages, 3);
}

// ─── Follow graph ────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_feed_tracks_edges() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;
  let bob = user(&s, "bob").await;

  s.create_post(new_post(ann.id, "from ann", None)).await.unwrap();
  s.create_post(new_post(bob.id, "from bob", None)).await.unwrap();

  let before = feed::assemble(&s, FeedScope::Following(leo.id), None).await.unwrap();
  assert!(before.is_empty());
  assert!(before.meta.is_none());

  s.follow(leo.id, ann.id).await.unwrap();
  assert!(s.is_following(leo.id, ann.id).await.unwrap());
  assert!(!s.is_following(ann.id, leo.id).await.unwrap());

  let during = feed::assemble(&s, FeedScope::Following(leo.id), None).await.unwrap();
  let texts: Vec<_> = during.items.iter().map(|p| p.text.as_str()).collect();
  assert_eq!(texts, ["from ann"]);

  s.unfollow(leo.id, ann.id).await.unwrap();
  let after = feed::assemble(&s, FeedScope::Following(leo.id), None).await.unwrap();
  assert!(after.is_empty());
}

#[tokio::test]
async fn duplicate_follow_and_missing_unfollow_fail() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;

  s.follow(leo.id, ann.id).await.unwrap();
  let err = s.follow(leo.id, ann.id).await.unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::AlreadyFollowing { .. }));

  let err = s.unfollow(ann.id, leo.id).await.unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::NotFollowing { .. }));
}

#[tokio::test]
async fn self_follow_is_not_blocked_by_storage() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  s.follow(leo.id, leo.id).await.unwrap();
  assert!(s.is_following(leo.id, leo.id).await.unwrap());
}

#[tokio::test]
async fn follow_counts() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;
  let bob = user(&s, "bob").await;

  s.follow(ann.id, leo.id).await.unwrap();
  s.follow(bob.id, leo.id).await.unwrap();
  s.follow(leo.id, ann.id).await.unwrap();

  let stats = s.follow_stats(leo.id).await.unwrap();
  assert_eq!(stats.followers, 2);
  assert_eq!(stats.following, 1);
  assert_eq!(s.follower_count(bob.id).await.unwrap(), 0);
  assert_eq!(s.following_count(bob.id).await.unwrap(), 1);
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_user_cascades() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let ann = user(&s, "ann").await;

  let leos = s.create_post(new_post(leo.id, "by leo", None)).await.unwrap();
  let anns = s.create_post(new_post(ann.id, "by ann", None)).await.unwrap();
  s.add_comment(NewComment { post_id: anns.id, author_id: leo.id, text: "hi".into() })
    .await
    .unwrap();
  s.follow(ann.id, leo.id).await.unwrap();
  let session = s.create_session(leo.id).await.unwrap();

  s.delete_user(leo.id).await.unwrap();

  assert!(s.get_post(leos.id).await.unwrap().is_none());
  assert!(s.list_comments(anns.id).await.unwrap().is_empty());
  assert_eq!(s.following_count(ann.id).await.unwrap(), 0);
  assert!(s.session_user(&session.key).await.unwrap().is_none());

  let err = s.delete_user(leo.id).await.unwrap_err();
  assert!(matches!(domain(&err), yatube_core::Error::UserNotFound(_)));
}

#[tokio::test]
async fn deleting_group_keeps_posts() {
  let s = store().await;
  let leo = user(&s, "leo").await;
  let cats = s.create_group(group("cats")).await.unwrap();
  let post = s.create_post(new_post(leo.id, "meow", Some(cats.id))).await.unwrap();

  s.delete_group(cats.id).await.unwrap();

  let survivor = s.get_post(post.id).await.unwrap().unwrap();
  assert!(survivor.group_id.is_none());
  assert!(s.get_group_by_slug("cats").await.unwrap().is_none());
}
