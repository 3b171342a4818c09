//! Time-bounded cache for rendered HTML fragments.
//!
//! Entries are never invalidated by writes: a new post shows up on the home
//! page only once the cached fragment expires or the cache is cleared.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use moka::{Expiry, future::Cache};
use sha2::{Digest, Sha256};

/// Upper bound on cached fragments.
const MAX_ENTRIES: u64 = 1_000;

/// Build the cache key for a fragment and the arguments its content varies
/// by: `template.cache.<fragment>.<sha256 of args joined by ':'>`.
pub fn fragment_key(fragment: &str, vary_on: &[&str]) -> String {
  let digest = Sha256::digest(vary_on.join(":").as_bytes());
  format!("template.cache.{fragment}.{}", hex::encode(digest))
}

#[derive(Clone)]
struct Entry {
  html: Arc<str>,
  ttl:  Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
  fn expire_after_create(
    &self,
    _key: &String,
    value: &Entry,
    _created_at: Instant,
  ) -> Option<Duration> {
    Some(value.ttl)
  }

  fn expire_after_update(
    &self,
    _key: &String,
    value: &Entry,
    _updated_at: Instant,
    _duration_until_expiry: Option<Duration>,
  ) -> Option<Duration> {
    Some(value.ttl)
  }
}

/// Shared fragment cache. Cloning is cheap and clones share entries.
#[derive(Clone)]
pub struct PageCache {
  inner:       Cache<String, Entry>,
  default_ttl: Duration,
}

impl PageCache {
  pub fn new(default_ttl: Duration) -> Self {
    let inner = Cache::builder()
      .max_capacity(MAX_ENTRIES)
      .expire_after(EntryTtl)
      .build();
    Self { inner, default_ttl }
  }

  pub fn default_ttl(&self) -> Duration { self.default_ttl }

  pub async fn get(&self, key: &str) -> Option<Arc<str>> {
    self.inner.get(key).await.map(|entry| entry.html)
  }

  pub async fn set(&self, key: String, html: impl Into<Arc<str>>, ttl: Duration) {
    let entry = Entry { html: html.into(), ttl };
    self.inner.insert(key, entry).await;
  }

  /// Drop every entry.
  pub fn clear(&self) {
    self.inner.invalidate_all();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_depends_on_fragment_and_arguments() {
    let page_one = fragment_key("index_page", &["1"]);
    assert!(page_one.starts_with("template.cache.index_page."));
    assert_eq!(page_one, fragment_key("index_page", &["1"]));
    assert_ne!(page_one, fragment_key("index_page", &["2"]));
    assert_ne!(page_one, fragment_key("group_page", &["1"]));
    // 64 hex chars of SHA-256 after the prefix.
    assert_eq!(page_one.len(), "template.cache.index_page.".len() + 64);
  }

  #[test]
  fn key_joins_arguments_with_colon() {
    let digest = hex::encode(Sha256::digest(b"a:b"));
    assert_eq!(fragment_key("f", &["a", "b"]), format!("template.cache.f.{digest}"));
  }

  #[tokio::test]
  async fn set_then_get() {
    let cache = PageCache::new(Duration::from_secs(20));
    assert!(cache.get("k").await.is_none());
    cache.set("k".into(), "<p>hi</p>", cache.default_ttl()).await;
    assert_eq!(cache.get("k").await.as_deref(), Some("<p>hi</p>"));
  }

  #[tokio::test]
  async fn entries_expire_after_their_ttl() {
    let cache = PageCache::new(Duration::from_secs(20));
    cache.set("short".into(), "x", Duration::from_millis(50)).await;
    cache.set("long".into(), "y", Duration::from_secs(60)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(cache.get("short").await.is_none());
    assert!(cache.get("long").await.is_some());
  }

  #[tokio::test]
  async fn clear_drops_everything() {
    let cache = PageCache::new(Duration::from_secs(20));
    cache.set("a".into(), "1", cache.default_ttl()).await;
    cache.set("b".into(), "2", cache.default_ttl()).await;
    cache.clear();
    assert!(cache.get("a").await.is_none());
    assert!(cache.get("b").await.is_none());
  }
}
