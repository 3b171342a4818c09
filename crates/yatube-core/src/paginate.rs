//! Page-number pagination.
//!
//! Follows the conventional web paginator contract: pages are 1-based, an
//! empty result still has one (empty) first page, and a requested page that
//! cannot be served is resolved to a page that can instead of failing.

use serde::Serialize;

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
  count:    u64,
  per_page: u64,
}

impl Paginator {
  /// `per_page` of zero is treated as one.
  pub fn new(count: u64, per_page: u64) -> Self {
    Self { count, per_page: per_page.max(1) }
  }

  /// Total number of pages; at least one, even when there are no items.
  pub fn num_pages(&self) -> u64 {
    if self.count == 0 {
      1
    } else {
      self.count.div_ceil(self.per_page)
    }
  }

  /// Resolve a raw `?page=` value to a valid page number.
  ///
  /// Missing or non-numeric input gives page 1. Numbers outside
  /// `1..=num_pages` (zero and negatives included) give the last page.
  pub fn resolve(&self, raw: Option<&str>) -> u64 {
    let last = self.num_pages();
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
      None => 1,
      Some(n) if n >= 1 && (n as u64) <= last => n as u64,
      Some(_) => last,
    }
  }

  /// Metadata for page `number`, which must come from [`Self::resolve`].
  pub fn meta(&self, number: u64) -> PageMeta {
    PageMeta {
      number,
      num_pages: self.num_pages(),
      count: self.count,
      per_page: self.per_page,
    }
  }
}

/// Where a page sits within its paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
  pub number:    u64,
  pub num_pages: u64,
  pub count:     u64,
  pub per_page:  u64,
}

impl PageMeta {
  pub fn has_next(&self) -> bool { self.number < self.num_pages }

  pub fn has_previous(&self) -> bool { self.number > 1 }

  pub fn has_other_pages(&self) -> bool { self.num_pages > 1 }

  pub fn next_page_number(&self) -> u64 { self.number + 1 }

  pub fn previous_page_number(&self) -> u64 { self.number.saturating_sub(1) }

  /// Row offset of the first item on this page.
  pub fn offset(&self) -> u64 { (self.number - 1) * self.per_page }
}

/// One page of items.
///
/// `meta` is `None` for a page that was produced without a paginator at all
/// (the "following" feed of a user who follows nobody).
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub meta:  Option<PageMeta>,
}

impl<T> Page<T> {
  pub fn paginated(items: Vec<T>, meta: PageMeta) -> Self {
    Self { items, meta: Some(meta) }
  }

  /// An empty page that carries no pagination metadata.
  pub fn unpaginated() -> Self {
    Self { items: Vec::new(), meta: None }
  }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}
