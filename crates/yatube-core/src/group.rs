//! Groups (communities) that posts may optionally belong to.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id:          i64,
  pub title:       String,
  /// Globally unique URL segment, e.g. `cats` in `/group/cats/`.
  pub slug:        String,
  pub description: String,
  pub rules:       String,
}

/// Input to [`crate::store::BlogStore::create_group`].
#[derive(Debug, Clone)]
pub struct NewGroup {
  pub title:       String,
  pub slug:        String,
  pub description: String,
  pub rules:       String,
}

impl NewGroup {
  /// Reject slugs that are empty or contain anything other than ASCII
  /// letters, digits, underscores and hyphens.
  pub fn validate(&self) -> Result<()> {
    validate_slug(&self.slug)
  }
}

pub fn validate_slug(slug: &str) -> Result<()> {
  let ok = !slug.is_empty()
    && slug
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if ok {
    Ok(())
  } else {
    Err(Error::InvalidSlug(slug.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_plain_slugs() {
    assert!(validate_slug("cats").is_ok());
    assert!(validate_slug("rust-lang_2024").is_ok());
  }

  #[test]
  fn rejects_bad_slugs() {
    assert!(matches!(validate_slug(""), Err(Error::InvalidSlug(_))));
    assert!(matches!(validate_slug("two words"), Err(Error::InvalidSlug(_))));
    assert!(matches!(validate_slug("a/b"), Err(Error::InvalidSlug(_))));
  }
}
